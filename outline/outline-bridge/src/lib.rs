//! Outline bridge: implements render_api::RenderBackend using outline-renderer, with smoothed
//! outline normals baked by outline-tools.

mod cache;
mod config;
mod plugin;

pub use config::BridgeConfig;
pub use plugin::OutlinePlugin;
