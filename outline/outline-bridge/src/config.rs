use outline_renderer::OutlineConfig;
use outline_tools::SmoothOptions;

/// Plugin settings: renderer state plus the options used when baking smoothed normals.
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    pub renderer: OutlineConfig,
    pub smoothing: SmoothOptions,
}
