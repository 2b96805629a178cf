//! Shared render backend API.
//! Defines Extract types and the RenderBackend trait so the host drives the outline renderer
//! through one code path (prepare + render_frame).

mod extract;
mod backend;

pub use extract::{ExtractedMesh, ExtractedMeshes, ExtractedView, OutlineMaterial, IDENTITY};
pub use backend::RenderBackend;
