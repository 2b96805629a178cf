//! Mesh asset: positions, normals, triangle indices and numbered per-vertex vector channels.
//!
//! Vector channels are free-form `[f32; 3]` side data (the slots a host would otherwise use for
//! texture coordinates). Smoothed outline normals are stored in one of them.

use crate::error::{MeshError, MeshResult};
use crate::geometry::Vec3;

/// Number of vector channel slots on a mesh.
pub const MAX_VECTOR_CHANNELS: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle list, counter-clockwise front faces.
    pub indices: Vec<u32>,
    pub(crate) channels: [Option<Vec<Vec3>>; MAX_VECTOR_CHANNELS],
}

impl MeshData {
    /// Build a mesh from positions, normals and a triangle list. `normals` may be empty.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> MeshResult<Self> {
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(MeshError::AttributeLength {
                name: "normals",
                len: normals.len(),
                expected: positions.len(),
            });
        }
        Ok(Self {
            positions,
            normals,
            indices,
            channels: Default::default(),
        })
    }

    /// Build from flat `x, y, z` float arrays, e.g. as loaded from OBJ.
    pub fn from_flat(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> MeshResult<Self> {
        Self::new(to_vec3(positions)?, to_vec3(normals)?, indices)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Indices of triangle `t`, `None` past the last full triangle.
    pub fn triangle(&self, t: usize) -> Option<[u32; 3]> {
        let start = t.checked_mul(3)?;
        match self.indices.get(start..start.checked_add(3)?)? {
            &[a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&[Vec3]> {
        self.channels.get(channel)?.as_deref()
    }

    /// Replace the contents of a vector channel. Data must have one entry per vertex.
    pub fn set_channel(&mut self, channel: usize, data: Vec<Vec3>) -> MeshResult<()> {
        check_channel(channel)?;
        if data.len() != self.vertex_count() {
            return Err(MeshError::AttributeLength {
                name: "vector channel",
                len: data.len(),
                expected: self.vertex_count(),
            });
        }
        self.channels[channel] = Some(data);
        Ok(())
    }

    pub fn clear_channel(&mut self, channel: usize) -> MeshResult<Option<Vec<Vec3>>> {
        check_channel(channel)?;
        Ok(self.channels[channel].take())
    }
}

pub(crate) fn check_channel(channel: usize) -> MeshResult<()> {
    if channel >= MAX_VECTOR_CHANNELS {
        return Err(MeshError::ChannelOutOfRange {
            channel,
            max: MAX_VECTOR_CHANNELS,
        });
    }
    Ok(())
}

fn to_vec3(flat: &[f32]) -> MeshResult<Vec<Vec3>> {
    if flat.len() % 3 != 0 {
        return Err(MeshError::MalformedPositions(flat.len()));
    }
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}
