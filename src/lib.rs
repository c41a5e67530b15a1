//! Raster Engine - a data-parallel software rasterizer
//!
//! Turns triangle, line and point meshes into a color image with a fixed
//! forward pipeline: vertex processing, primitive assembly, scan conversion
//! with atomic depth resolution, and fragment shading.
//!
//! # Features
//! - One task per vertex, primitive and pixel, scheduled with rayon
//! - Order-independent visibility through a packed atomic depth buffer
//! - Perspective-correct or linear attribute interpolation
//! - Nearest and bilinear texture filtering
//! - Diffuse, Blinn-Phong and toon shading

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod resources;
pub mod scene;

pub use engine::{Rasterizer, RenderStats};
pub use error::{RasterError, RasterResult};
pub use pipeline::{
    FrameTransforms, Framebuffer, Interpolation, ShadingModel, ShadingParams, Viewport,
};
pub use resources::{PrimitiveGroup, PrimitiveTopology, Texture, TextureFilter};
pub use scene::{Camera, DirectionalLight, NodeTransform, SceneStore, Transform};

use glam::Vec3;

/// Configuration for creating a [`Rasterizer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    /// Render target width in pixels
    pub width: u32,
    /// Render target height in pixels
    pub height: u32,
    /// Texture coordinate interpolation
    pub interpolation: Interpolation,
    /// Texture filtering
    pub texture_filter: TextureFilter,
    /// Lighting model for textured fragments
    pub shading: ShadingModel,
    /// Color written by the rasterizer for every covered fragment
    pub flat_color: Vec3,
    /// Color of pixels no primitive covers
    pub clear_color: Vec3,
    /// The single directional light
    pub light: DirectionalLight,
    /// Decode texels from gamma 2.2 before lighting and re-encode after
    pub gamma_correct: bool,
    /// Skip primitives with a vertex at or behind the eye
    pub cull_behind_camera: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            interpolation: Interpolation::PerspectiveCorrect,
            texture_filter: TextureFilter::Bilinear,
            shading: ShadingModel::Diffuse,
            flat_color: Vec3::ONE,
            clear_color: Vec3::ZERO,
            light: DirectionalLight::default(),
            gamma_correct: false,
            cull_behind_camera: true,
        }
    }
}

impl RasterConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_texture_filter(mut self, filter: TextureFilter) -> Self {
        self.texture_filter = filter;
        self
    }

    pub fn with_shading(mut self, shading: ShadingModel) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_flat_color(mut self, color: Vec3) -> Self {
        self.flat_color = color;
        self
    }

    pub fn with_clear_color(mut self, color: Vec3) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_light(mut self, light: DirectionalLight) -> Self {
        self.light = light;
        self
    }

    pub fn with_gamma_correct(mut self, enabled: bool) -> Self {
        self.gamma_correct = enabled;
        self
    }

    pub fn with_cull_behind_camera(mut self, enabled: bool) -> Self {
        self.cull_behind_camera = enabled;
        self
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn shading_params(&self) -> ShadingParams {
        ShadingParams {
            model: self.shading,
            filter: self.texture_filter,
            light: self.light,
            gamma_correct: self.gamma_correct,
            clear_color: self.clear_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = RasterConfig::new(64, 32)
            .with_shading(ShadingModel::Toon)
            .with_texture_filter(TextureFilter::Nearest)
            .with_clear_color(Vec3::X)
            .with_gamma_correct(true);

        assert_eq!(config.viewport(), Viewport::new(64, 32));
        assert_eq!(config.interpolation, Interpolation::PerspectiveCorrect);

        let params = config.shading_params();
        assert_eq!(params.model, ShadingModel::Toon);
        assert_eq!(params.filter, TextureFilter::Nearest);
        assert_eq!(params.clear_color, Vec3::X);
        assert!(params.gamma_correct);
    }
}
