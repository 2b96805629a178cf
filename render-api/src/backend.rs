//! Trait for render backends. Host uses this to call prepare/render_frame uniformly.

use crate::{ExtractedMeshes, ExtractedView};

/// Render backend driven by the host once per frame.
pub trait RenderBackend: Send {
    /// Prepare phase: upload extracted meshes to GPU (baking outline data for new meshes).
    fn prepare(&mut self, extracted: &ExtractedMeshes);

    /// Render one frame. Submits work internally; caller does not need to submit command buffers.
    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String>;
}
