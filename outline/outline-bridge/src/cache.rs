//! Per-entity cache bookkeeping without GPU handles: which geometry an entry was built from and
//! whether its smoothed normals were baked or failed to bake.

use outline_tools::{bake_smoothed_normals, MeshData, MeshResult, SmoothOptions};
use render_api::{ExtractedMesh, OutlineMaterial};

pub(crate) struct BakeState {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    outline: Option<OutlineMaterial>,
    smoothed: bool,
    /// Baking already failed for this geometry; don't retry every frame.
    smoothing_failed: bool,
}

/// What the plugin has to do on the GPU after one `prepare` step.
pub(crate) struct PrepareOutcome {
    /// Geometry is new or changed: vertex and index buffers must be rebuilt.
    pub upload: bool,
    /// Freshly baked smoothed normals, one per vertex.
    pub smoothed_normals: Option<Vec<[f32; 3]>>,
}

impl BakeState {
    fn new(mesh: &ExtractedMesh) -> Self {
        Self {
            positions: mesh.positions.clone(),
            normals: mesh.normals.clone(),
            indices: mesh.indices.clone(),
            outline: mesh.outline,
            smoothed: false,
            smoothing_failed: false,
        }
    }

    /// Advance the entry for `mesh`. Changed geometry starts from a clean state, so a bake
    /// that failed for the old geometry is attempted again.
    pub fn prepare(
        previous: Option<Self>,
        entity_id: u64,
        mesh: &ExtractedMesh,
        options: &SmoothOptions,
    ) -> (Self, PrepareOutcome) {
        let (mut state, upload) = match previous {
            Some(state) if state.same_geometry(mesh) => (state, false),
            _ => (Self::new(mesh), true),
        };
        state.outline = mesh.outline;
        let smoothed_normals = if state.wants_smoothing() {
            state.bake(entity_id, options)
        } else {
            None
        };
        (state, PrepareOutcome { upload, smoothed_normals })
    }

    fn same_geometry(&self, mesh: &ExtractedMesh) -> bool {
        self.positions == mesh.positions && self.normals == mesh.normals && self.indices == mesh.indices
    }

    fn wants_smoothing(&self) -> bool {
        self.outline.is_some_and(|m| m.use_smoothed_normals) && !self.smoothed && !self.smoothing_failed
    }

    fn bake(&mut self, entity_id: u64, options: &SmoothOptions) -> Option<Vec<[f32; 3]>> {
        match smoothed_normals_for_upload(&self.positions, &self.normals, &self.indices, options) {
            Ok(normals) => {
                self.smoothed = true;
                Some(normals)
            }
            Err(e) => {
                log::warn!(
                    "outline plugin: smoothing entity {} failed ({}), outlining with raw normals",
                    entity_id,
                    e
                );
                self.smoothing_failed = true;
                None
            }
        }
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothed
    }

    /// Material handed to the renderer for this entry.
    pub fn draw_material(&self) -> Option<OutlineMaterial> {
        draw_material(self.outline, self.smoothed)
    }
}

/// Bake smoothed normals into the configured vector channel and take them back out for upload.
fn smoothed_normals_for_upload(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    indices: &[u32],
    options: &SmoothOptions,
) -> MeshResult<Vec<[f32; 3]>> {
    let mut mesh = MeshData::new(positions.to_vec(), normals.to_vec(), indices.to_vec())?;
    let report = bake_smoothed_normals(&mut mesh, options)?;
    log::debug!("outline plugin: baked smoothed normals {:?}", report);
    Ok(mesh.clear_channel(options.channel)?.unwrap_or_default())
}

/// Smoothed normals only when they were actually baked.
fn draw_material(outline: Option<OutlineMaterial>, has_smoothed: bool) -> Option<OutlineMaterial> {
    outline.map(|m| OutlineMaterial {
        use_smoothed_normals: m.use_smoothed_normals && has_smoothed,
        ..m
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_api::IDENTITY;

    fn quad(use_smoothed_normals: bool) -> ExtractedMesh {
        ExtractedMesh {
            entity_id: 7,
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            transform: IDENTITY,
            visible: true,
            outline: Some(OutlineMaterial {
                use_smoothed_normals,
                ..Default::default()
            }),
        }
    }

    fn bad_channel() -> SmoothOptions {
        SmoothOptions {
            channel: 99,
            ..Default::default()
        }
    }

    #[test]
    fn repeated_prepare_bakes_once() {
        let mesh = quad(true);
        let opts = SmoothOptions::default();
        let (state, first) = BakeState::prepare(None, 7, &mesh, &opts);
        assert!(first.upload);
        assert_eq!(first.smoothed_normals.map(|n| n.len()), Some(4));
        let (state, second) = BakeState::prepare(Some(state), 7, &mesh, &opts);
        assert!(!second.upload);
        assert!(second.smoothed_normals.is_none());
        assert!(state.is_smoothed());
        assert!(state.draw_material().unwrap().use_smoothed_normals);
    }

    #[test]
    fn geometry_change_rebakes() {
        let opts = SmoothOptions::default();
        let (state, _) = BakeState::prepare(None, 7, &quad(true), &opts);
        let mut moved = quad(true);
        moved.positions[2] = [1.0, 1.0, 0.5];
        let (state, outcome) = BakeState::prepare(Some(state), 7, &moved, &opts);
        assert!(outcome.upload);
        let normals = outcome.smoothed_normals.unwrap();
        assert!(normals[2][2] < 0.999);
        assert!(state.is_smoothed());
    }

    #[test]
    fn failed_bake_is_not_retried_for_same_geometry() {
        let mesh = quad(true);
        let (state, first) = BakeState::prepare(None, 7, &mesh, &bad_channel());
        assert!(first.smoothed_normals.is_none());
        assert!(state.smoothing_failed);
        assert!(!state.draw_material().unwrap().use_smoothed_normals);

        // Even with working options the same geometry keeps its failed state.
        let (state, second) = BakeState::prepare(Some(state), 7, &mesh, &SmoothOptions::default());
        assert!(!second.upload);
        assert!(second.smoothed_normals.is_none());
        assert!(!state.draw_material().unwrap().use_smoothed_normals);

        let mut moved = mesh.clone();
        moved.positions[3] = [0.0, 2.0, 0.0];
        let (state, third) = BakeState::prepare(Some(state), 7, &moved, &SmoothOptions::default());
        assert!(third.upload);
        assert!(third.smoothed_normals.is_some());
        assert!(!state.smoothing_failed);
        assert!(state.draw_material().unwrap().use_smoothed_normals);
    }

    #[test]
    fn enabling_smoothed_normals_bakes_without_reupload() {
        let opts = SmoothOptions::default();
        let (state, first) = BakeState::prepare(None, 7, &quad(false), &opts);
        assert!(first.smoothed_normals.is_none());
        assert!(!state.is_smoothed());

        let (state, second) = BakeState::prepare(Some(state), 7, &quad(true), &opts);
        assert!(!second.upload);
        assert!(second.smoothed_normals.is_some());
        let (state, third) = BakeState::prepare(Some(state), 7, &quad(true), &opts);
        assert!(third.smoothed_normals.is_none());
        assert!(state.is_smoothed());
    }

    #[test]
    fn no_outline_never_bakes() {
        let mut mesh = quad(true);
        mesh.outline = None;
        let (state, outcome) = BakeState::prepare(None, 7, &mesh, &SmoothOptions::default());
        assert!(outcome.smoothed_normals.is_none());
        assert_eq!(state.draw_material(), None);
    }

    #[test]
    fn smoothed_normals_cover_every_vertex() {
        let mesh = quad(true);
        let normals =
            smoothed_normals_for_upload(&mesh.positions, &mesh.normals, &mesh.indices, &SmoothOptions::default())
                .unwrap();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn smoothed_flag_requires_bake() {
        let wants = Some(OutlineMaterial {
            use_smoothed_normals: true,
            ..Default::default()
        });
        assert!(!draw_material(wants, false).unwrap().use_smoothed_normals);
        assert!(draw_material(wants, true).unwrap().use_smoothed_normals);
        assert_eq!(draw_material(None, true), None);
    }
}
