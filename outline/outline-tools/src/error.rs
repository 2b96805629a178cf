//! Error types for mesh preprocessing.

use thiserror::Error;

/// Errors raised before or while smoothing a mesh. Nothing is written back to the mesh
/// when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// Index list is not triangulated or references a vertex that does not exist.
    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),

    /// Cospatial distance threshold is negative or not finite.
    #[error("Invalid cospatial epsilon: {0}")]
    InvalidEpsilon(f32),

    /// Vector channel index past the last channel slot.
    #[error("Vector channel {channel} out of range (mesh has {max} channels)")]
    ChannelOutOfRange { channel: usize, max: usize },

    /// Per-vertex attribute does not have one entry per vertex.
    #[error("Attribute '{name}' has {len} entries, expected {expected}")]
    AttributeLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    /// Flat position slice is not a multiple of 3 floats.
    #[error("Flat position slice length {0} is not a multiple of 3")]
    MalformedPositions(usize),
}

/// Convenience alias for `Result<T, MeshError>`.
pub type MeshResult<T> = Result<T, MeshError>;
