//! Angle-weighted smoothed normals shared across cospatial vertices.
//!
//! Each non-degenerate triangle adds its unit face normal, weighted by the interior angle at
//! each corner, to the cluster owning that corner. Every vertex then receives the normalized
//! sum of its cluster, so seam duplicates get one normal and an outline extruded along it
//! does not tear at hard edges.

use log::{debug, warn};

use crate::cospatial::{cluster_vertices, ClusterStrategy, CospatialClusters};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{add, corner_angles, face_normal, scale, try_normalize, Vec3};
use crate::mesh::{check_channel, MeshData};

pub const DEFAULT_COSPATIAL_EPSILON: f32 = 0.01;
pub const DEFAULT_SMOOTHED_NORMAL_CHANNEL: usize = 1;

/// Triangles whose angle at the first corner has a sine at or below this contribute nothing.
/// Relative to the edge lengths, so it holds for meshes in any unit.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug)]
pub struct SmoothOptions {
    /// Max distance from a cluster's representative for a vertex to join it (default 0.01).
    pub epsilon: f32,
    /// Vector channel receiving the result in [`bake_smoothed_normals`] (default 1).
    pub channel: usize,
    pub strategy: ClusterStrategy,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_COSPATIAL_EPSILON,
            channel: DEFAULT_SMOOTHED_NORMAL_CHANNEL,
            strategy: ClusterStrategy::default(),
        }
    }
}

/// Output of one smoothing run.
#[derive(Clone, Debug)]
pub struct SmoothedNormals {
    /// One normal per input vertex, same order as the positions.
    pub normals: Vec<Vec3>,
    pub clusters: CospatialClusters,
    /// Zero-area triangles left out of the accumulation.
    pub skipped_triangles: usize,
    /// Clusters no contributing triangle touched; their vertices get `[0, 0, 0]`.
    pub empty_clusters: usize,
}

/// Summary returned by [`bake_smoothed_normals`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmoothReport {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub cluster_count: usize,
    pub skipped_triangles: usize,
    pub empty_clusters: usize,
    pub channel: usize,
}

/// Reject index lists that are not triangulated or reference missing vertices.
pub fn validate_topology(vertex_count: usize, indices: &[u32]) -> MeshResult<()> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::InvalidTopology(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some((pos, &bad)) = indices
        .iter()
        .enumerate()
        .find(|&(_, &i)| i as usize >= vertex_count)
    {
        return Err(MeshError::InvalidTopology(format!(
            "index {} at position {} out of bounds for {} vertices",
            bad, pos, vertex_count
        )));
    }
    Ok(())
}

/// Compute one smoothed normal per vertex from positions and a triangle list.
pub fn smooth_normals(
    positions: &[Vec3],
    indices: &[u32],
    options: &SmoothOptions,
) -> MeshResult<SmoothedNormals> {
    if !options.epsilon.is_finite() || options.epsilon < 0.0 {
        return Err(MeshError::InvalidEpsilon(options.epsilon));
    }
    validate_topology(positions.len(), indices)?;

    let mut clusters = cluster_vertices(positions, options.epsilon, options.strategy);

    let mut skipped_triangles = 0usize;
    for tri in indices.chunks_exact(3) {
        let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let [a, b, c] = corners.map(|i| positions[i]);
        let Some(n) = face_normal(a, b, c, DEGENERATE_EPSILON) else {
            skipped_triangles += 1;
            continue;
        };
        let angles = corner_angles(a, b, c);
        for (&vertex, angle) in corners.iter().zip(angles) {
            let cluster = &mut clusters.clusters[clusters.vertex_to_cluster[vertex] as usize];
            cluster.normal_sum = add(cluster.normal_sum, scale(n, angle));
        }
    }

    let mut empty_clusters = 0usize;
    let cluster_normals: Vec<Vec3> = clusters
        .clusters
        .iter()
        .map(|c| {
            try_normalize(c.normal_sum).unwrap_or_else(|| {
                empty_clusters += 1;
                [0.0; 3]
            })
        })
        .collect();
    let normals = clusters
        .vertex_to_cluster
        .iter()
        .map(|&c| cluster_normals[c as usize])
        .collect();

    if skipped_triangles > 0 {
        debug!("smooth_normals: skipped {} degenerate triangles", skipped_triangles);
    }
    if empty_clusters > 0 {
        warn!(
            "smooth_normals: {} of {} clusters have no contributing triangle; their normals are zero",
            empty_clusters,
            clusters.len()
        );
    }
    debug!(
        "smooth_normals: {} vertices -> {} clusters, {} triangles (epsilon {})",
        positions.len(),
        clusters.len(),
        indices.len() / 3,
        options.epsilon
    );

    Ok(SmoothedNormals {
        normals,
        clusters,
        skipped_triangles,
        empty_clusters,
    })
}

/// Smooth `mesh` and store the result in vector channel `options.channel`.
/// On error the mesh is left untouched.
pub fn bake_smoothed_normals(mesh: &mut MeshData, options: &SmoothOptions) -> MeshResult<SmoothReport> {
    check_channel(options.channel)?;
    let result = smooth_normals(&mesh.positions, &mesh.indices, options)?;
    let report = SmoothReport {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        cluster_count: result.clusters.len(),
        skipped_triangles: result.skipped_triangles,
        empty_clusters: result.empty_clusters,
        channel: options.channel,
    };
    mesh.set_channel(options.channel, result.normals)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::length;

    fn assert_close(a: Vec3, b: Vec3, tol: f32) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() <= tol, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn single_triangle_gets_face_normal() {
        let positions = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.3, 1.0, 0.0]];
        let out = smooth_normals(&positions, &[0, 1, 2], &SmoothOptions::default()).unwrap();
        for n in &out.normals {
            assert_close(*n, [0.0, 0.0, 1.0], 1e-6);
        }
        assert_eq!(out.skipped_triangles, 0);
        assert_eq!(out.empty_clusters, 0);
    }

    #[test]
    fn rejects_bad_topology() {
        let positions = [[0.0; 3]; 3];
        let opts = SmoothOptions::default();
        assert!(matches!(
            smooth_normals(&positions, &[0, 1], &opts),
            Err(MeshError::InvalidTopology(_))
        ));
        assert!(matches!(
            smooth_normals(&positions, &[0, 1, 3], &opts),
            Err(MeshError::InvalidTopology(_))
        ));
    }

    #[test]
    fn rejects_bad_epsilon() {
        let positions = [[0.0; 3]; 3];
        for eps in [-0.1, f32::NAN, f32::INFINITY] {
            let opts = SmoothOptions { epsilon: eps, ..Default::default() };
            assert!(matches!(
                smooth_normals(&positions, &[0, 1, 2], &opts),
                Err(MeshError::InvalidEpsilon(_))
            ));
        }
    }

    #[test]
    fn degenerate_triangle_is_skipped() {
        // Triangle 1 is collinear and shares vertex 0 with a proper triangle.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let out = smooth_normals(&positions, &[0, 1, 2, 0, 3, 4], &SmoothOptions::default()).unwrap();
        assert_eq!(out.skipped_triangles, 1);
        assert_close(out.normals[0], [0.0, 0.0, 1.0], 1e-6);
        // Vertices 3 and 4 only touch the degenerate triangle.
        assert_eq!(out.empty_clusters, 2);
        assert_eq!(out.normals[3], [0.0; 3]);
        assert_eq!(out.normals[4], [0.0; 3]);
        assert!(out.normals.iter().all(|n| n.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn tiny_scale_triangles_still_contribute() {
        let positions = [[0.0, 0.0, 0.0], [2e-7, 0.0, 0.0], [0.0, 1e-7, 0.0]];
        let out = smooth_normals(&positions, &[0, 1, 2], &SmoothOptions { epsilon: 0.0, ..Default::default() })
            .unwrap();
        assert_eq!(out.skipped_triangles, 0);
        assert_eq!(out.empty_clusters, 0);
        for n in &out.normals {
            assert_close(*n, [0.0, 0.0, 1.0], 1e-6);
        }
    }

    #[test]
    fn unreferenced_vertex_gets_zero_normal() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let out = smooth_normals(&positions, &[0, 1, 2], &SmoothOptions::default()).unwrap();
        assert_eq!(out.empty_clusters, 1);
        assert_eq!(out.normals[3], [0.0; 3]);
        assert!((length(out.normals[0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_mesh() {
        let out = smooth_normals(&[], &[], &SmoothOptions::default()).unwrap();
        assert!(out.normals.is_empty());
        assert!(out.clusters.is_empty());
    }

    #[test]
    fn bake_writes_channel() {
        let mut mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![],
            vec![0, 1, 2],
        )
        .unwrap();
        let report = bake_smoothed_normals(&mut mesh, &SmoothOptions::default()).unwrap();
        assert_eq!(report.channel, DEFAULT_SMOOTHED_NORMAL_CHANNEL);
        assert_eq!(report.cluster_count, 3);
        assert_eq!(report.triangle_count, 1);
        let channel = mesh.channel(DEFAULT_SMOOTHED_NORMAL_CHANNEL).unwrap();
        assert_eq!(channel.len(), 3);
        assert_close(channel[1], [0.0, 0.0, 1.0], 1e-6);
    }

    #[test]
    fn bake_leaves_mesh_untouched_on_error() {
        let mut mesh = MeshData::new(vec![[0.0; 3]; 3], vec![], vec![0, 1, 7]).unwrap();
        assert!(bake_smoothed_normals(&mut mesh, &SmoothOptions::default()).is_err());
        assert!(mesh.channel(DEFAULT_SMOOTHED_NORMAL_CHANNEL).is_none());

        let opts = SmoothOptions { channel: 99, ..Default::default() };
        assert!(matches!(
            bake_smoothed_normals(&mut mesh, &opts),
            Err(MeshError::ChannelOutOfRange { channel: 99, .. })
        ));
    }
}
