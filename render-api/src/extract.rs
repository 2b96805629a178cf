//! Data types for extraction from the host engine into the render world.
//! Host fills these each frame.

use std::collections::HashMap;

/// Column-major 4x4 identity.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Outline material parameters for one mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineMaterial {
    /// Extrusion distance along the normal, object-space units. Negative values are treated as 0.
    pub thickness: f32,
    /// Flat RGBA outline color.
    pub color: [f32; 4],
    /// Depth push away from the camera in NDC depth units, clamped to [0, 1].
    pub depth_offset: f32,
    /// Extrude along precomputed cospatial-smoothed normals instead of the raw vertex normals.
    pub use_smoothed_normals: bool,
}

impl Default for OutlineMaterial {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            color: [1.0, 1.0, 1.0, 1.0],
            depth_offset: 0.0,
            use_smoothed_normals: false,
        }
    }
}

/// Per-mesh instance data extracted from the main world.
#[derive(Clone, Debug)]
pub struct ExtractedMesh {
    /// Host-defined entity or instance id.
    pub entity_id: u64,
    /// Object-space positions.
    pub positions: Vec<[f32; 3]>,
    /// Object-space vertex normals, one per position.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list (u32 indices, counter-clockwise front faces).
    pub indices: Vec<u32>,
    /// World transform: column-major 4x4 matrix (WGSL/wgpu convention).
    /// Index [col*4+row]; e.g. m[0..4] is the first column.
    pub transform: [f32; 16],
    /// Whether this instance is visible.
    pub visible: bool,
    /// Outline material; `None` draws the mesh without an outline.
    pub outline: Option<OutlineMaterial>,
}

/// All extracted meshes for the current frame.
#[derive(Default, Debug)]
pub struct ExtractedMeshes {
    pub meshes: HashMap<u64, ExtractedMesh>,
}

/// View/camera data for the current frame.
#[derive(Clone, Debug)]
pub struct ExtractedView {
    pub view_proj: [f32; 16],
    pub viewport_size: (u32, u32),
}

impl Default for ExtractedView {
    fn default() -> Self {
        Self {
            view_proj: IDENTITY,
            viewport_size: (800, 600),
        }
    }
}
