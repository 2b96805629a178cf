//! Offline tools for outline rendering: mesh preprocessing, cospatial vertex clustering,
//! smoothed-normal baking.

pub mod cospatial;
pub mod error;
pub mod generators;
pub mod geometry;
pub mod mesh;
pub mod smooth;

pub use cospatial::{cluster_vertices, Cluster, ClusterStrategy, CospatialClusters};
pub use error::{MeshError, MeshResult};
pub use generators::{hard_edged_cube, uv_sphere};
pub use mesh::{MeshData, MAX_VECTOR_CHANNELS};
pub use smooth::{
    bake_smoothed_normals, smooth_normals, validate_topology, SmoothOptions, SmoothReport,
    SmoothedNormals, DEFAULT_COSPATIAL_EPSILON, DEFAULT_SMOOTHED_NORMAL_CHANNEL,
    DEGENERATE_EPSILON,
};
