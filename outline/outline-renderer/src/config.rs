//! Outline renderer configuration: target formats, depth convention, base/clear colors.

/// Renderer-wide settings. Per-mesh outline parameters live in `render_api::OutlineMaterial`.
#[derive(Clone, Debug)]
pub struct OutlineConfig {
    /// Color target format (also the readback format; must be 4 bytes per texel for readback).
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    /// Reversed-Z depth (near = 1, far = 0). Flips the depth test and the outline depth bias.
    pub reversed_z: bool,
    /// Unlit color of the base mesh under the outline.
    pub base_color: [f32; 4],
    pub clear_color: wgpu::Color,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Rgba8Unorm,
            depth_format: wgpu::TextureFormat::Depth32Float,
            reversed_z: false,
            base_color: [0.55, 0.6, 0.7, 1.0],
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl OutlineConfig {
    /// Value the depth target is cleared to (the far plane).
    pub fn depth_clear_value(&self) -> f32 {
        if self.reversed_z {
            0.0
        } else {
            1.0
        }
    }

    /// Depth test that keeps fragments at or closer than the stored depth.
    pub fn depth_compare(&self) -> wgpu::CompareFunction {
        if self.reversed_z {
            wgpu::CompareFunction::GreaterEqual
        } else {
            wgpu::CompareFunction::LessEqual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_z_flips_depth_state() {
        let standard = OutlineConfig::default();
        assert_eq!(standard.depth_clear_value(), 1.0);
        assert_eq!(standard.depth_compare(), wgpu::CompareFunction::LessEqual);
        let reversed = OutlineConfig {
            reversed_z: true,
            ..Default::default()
        };
        assert_eq!(reversed.depth_clear_value(), 0.0);
        assert_eq!(reversed.depth_compare(), wgpu::CompareFunction::GreaterEqual);
    }
}
