//! Cospatial vertex clustering: group vertices whose positions coincide within a tolerance
//! (seam duplicates from UV/normal splits) so they can share one smoothed normal.
//!
//! Vertices are visited in index order and each joins the first-created cluster whose
//! representative lies within `epsilon`; otherwise it founds a new cluster. The result is
//! order-dependent by construction. [`ClusterStrategy::Grid`] reaches the same assignment as
//! the plain linear scan using a uniform grid keyed by quantized position.

use std::collections::HashMap;

use crate::geometry::Vec3;

/// Smallest grid cell edge; keeps the quantization finite when `epsilon == 0`.
const MIN_CELL_SIZE: f32 = 1e-6;
/// Cells are slightly wider than `epsilon` so a match never sits two cells away after rounding.
const CELL_PADDING: f32 = 1.01;

/// One cospatial group. Stored in an arena and addressed by `u32` index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    /// Position of the vertex that created the cluster.
    pub position: Vec3,
    /// Unnormalized sum of weighted face normals.
    pub normal_sum: Vec3,
}

impl Cluster {
    fn new(position: Vec3) -> Self {
        Self {
            position,
            normal_sum: [0.0; 3],
        }
    }
}

/// How candidate clusters are found for each vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClusterStrategy {
    /// Scan every existing cluster in creation order. O(V * C).
    Linear,
    /// Uniform grid hash with cell size `epsilon`; only the 27 neighbouring cells are searched.
    #[default]
    Grid,
}

/// Cluster arena plus the dense vertex -> cluster map.
#[derive(Clone, Debug, Default)]
pub struct CospatialClusters {
    pub clusters: Vec<Cluster>,
    /// One entry per input vertex.
    pub vertex_to_cluster: Vec<u32>,
}

impl CospatialClusters {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_to_cluster.len()
    }

    /// Cluster owning `vertex`, `None` past the end of the vertex map.
    pub fn cluster_of(&self, vertex: usize) -> Option<&Cluster> {
        let id = *self.vertex_to_cluster.get(vertex)?;
        self.clusters.get(id as usize)
    }

    /// Number of vertices assigned to each cluster.
    pub fn member_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.clusters.len()];
        for &c in &self.vertex_to_cluster {
            counts[c as usize] += 1;
        }
        counts
    }

    fn push(&mut self, position: Vec3) -> u32 {
        let id = self.clusters.len() as u32;
        self.clusters.push(Cluster::new(position));
        id
    }
}

/// Group `positions` into cospatial clusters.
///
/// `epsilon` is an inclusive Euclidean distance to the cluster representative. Callers are
/// expected to have validated it (finite, `>= 0`).
pub fn cluster_vertices(
    positions: &[Vec3],
    epsilon: f32,
    strategy: ClusterStrategy,
) -> CospatialClusters {
    match strategy {
        ClusterStrategy::Linear => cluster_linear(positions, epsilon),
        ClusterStrategy::Grid => cluster_grid(positions, epsilon),
    }
}

/// Squared distance in f64 so `epsilon * epsilon` cannot overflow for large tolerances.
fn within(a: Vec3, b: Vec3, eps2: f64) -> bool {
    let d2: f64 = (0..3).map(|k| (a[k] as f64 - b[k] as f64).powi(2)).sum();
    d2 <= eps2
}

fn cluster_linear(positions: &[Vec3], epsilon: f32) -> CospatialClusters {
    let eps2 = (epsilon as f64).powi(2);
    let mut out = CospatialClusters {
        clusters: Vec::new(),
        vertex_to_cluster: Vec::with_capacity(positions.len()),
    };
    for &p in positions {
        let found = out
            .clusters
            .iter()
            .position(|c| within(c.position, p, eps2));
        let id = match found {
            Some(i) => i as u32,
            None => out.push(p),
        };
        out.vertex_to_cluster.push(id);
    }
    out
}

struct GridIndex {
    inv_cell_size: f32,
    cells: HashMap<(i32, i32, i32), Vec<u32>>,
}

impl GridIndex {
    fn new(cell_size: f32) -> Self {
        Self {
            inv_cell_size: 1.0 / (cell_size.max(MIN_CELL_SIZE) * CELL_PADDING),
            cells: HashMap::new(),
        }
    }

    fn cell_key(&self, p: Vec3) -> (i32, i32, i32) {
        (
            (p[0] * self.inv_cell_size).floor() as i32,
            (p[1] * self.inv_cell_size).floor() as i32,
            (p[2] * self.inv_cell_size).floor() as i32,
        )
    }

    fn insert(&mut self, p: Vec3, cluster: u32) {
        let key = self.cell_key(p);
        self.cells.entry(key).or_default().push(cluster);
    }

    /// Lowest cluster id among neighbours whose representative is within `sqrt(eps2)` of `p`.
    fn first_match(&self, clusters: &[Cluster], p: Vec3, eps2: f64) -> Option<u32> {
        let (cx, cy, cz) = self.cell_key(p);
        let mut best: Option<u32> = None;
        for dx in -1..=1_i32 {
            for dy in -1..=1_i32 {
                for dz in -1..=1_i32 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    let Some(ids) = self.cells.get(&key) else {
                        continue;
                    };
                    for &id in ids {
                        if best.is_some_and(|b| b <= id) {
                            continue;
                        }
                        if within(clusters[id as usize].position, p, eps2) {
                            best = Some(id);
                        }
                    }
                }
            }
        }
        best
    }
}

fn cluster_grid(positions: &[Vec3], epsilon: f32) -> CospatialClusters {
    let eps2 = (epsilon as f64).powi(2);
    let mut grid = GridIndex::new(epsilon);
    let mut out = CospatialClusters {
        clusters: Vec::new(),
        vertex_to_cluster: Vec::with_capacity(positions.len()),
    };
    for &p in positions {
        let id = match grid.first_match(&out.clusters, p, eps2) {
            Some(id) => id,
            None => {
                let id = out.push(p);
                grid.insert(p, id);
                id
            }
        };
        out.vertex_to_cluster.push(id);
    }
    out
}
