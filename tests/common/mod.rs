//! Common utilities for pipeline integration tests.
//!
//! Scenes here use identity frame transforms unless noted, so object-space
//! positions are NDC directly and pixel `(x, y)` samples NDC
//! `(1 - 2x / w, 1 - 2y / h)`.

use glam::{Vec2, Vec3};
use raster_engine::{
    DirectionalLight, PrimitiveGroup, RasterConfig, Rasterizer, ShadingModel, Texture,
    TextureFilter,
};

// ============================================================================
// Configuration
// ============================================================================

/// A config whose light faces the +Z normals of the test geometry head on,
/// so diffuse shading returns the texel color unchanged.
pub fn head_on_config(width: u32, height: u32) -> RasterConfig {
    RasterConfig::new(width, height)
        .with_light(DirectionalLight::new(Vec3::Z, Vec3::ONE))
        .with_shading(ShadingModel::Diffuse)
}

pub fn rasterizer(config: RasterConfig) -> Rasterizer {
    let _ = env_logger::builder().is_test(true).try_init();
    Rasterizer::new(config).expect("rasterizer init")
}

// ============================================================================
// Geometry
// ============================================================================

/// A triangle in NDC at depth `z` large enough to cover the whole viewport.
pub fn fullscreen_triangle(z: f32) -> PrimitiveGroup {
    PrimitiveGroup::triangle(
        Vec3::new(-1.0, -1.0, z),
        Vec3::new(3.0, -1.0, z),
        Vec3::new(-1.0, 3.0, z),
    )
}

/// [`fullscreen_triangle`] with every texcoord set to `uv` and a texture.
pub fn textured_fullscreen(z: f32, uv: Vec2, texture: Texture) -> PrimitiveGroup {
    fullscreen_triangle(z)
        .with_texcoords(vec![uv; 3])
        .with_texture(texture)
}

pub fn solid(color: [u8; 3]) -> Texture {
    Texture::solid_color(color, "solid")
}

/// 2x1 texture: black on the left, white on the right.
pub fn black_white() -> Texture {
    Texture::from_rgb8(2, 1, vec![0, 0, 0, 255, 255, 255], "black_white").expect("valid texture")
}

pub fn filter_name(filter: TextureFilter) -> &'static str {
    match filter {
        TextureFilter::Nearest => "nearest",
        TextureFilter::Bilinear => "bilinear",
    }
}

// ============================================================================
// Pixel Verification
// ============================================================================

/// Expected RGBA8 value for a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedPixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ExpectedPixel {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Read one pixel of a tightly packed RGBA8 image.
pub fn get_pixel(data: &[u8], width: u32, x: u32, y: u32) -> ExpectedPixel {
    let offset = ((y * width + x) * 4) as usize;
    ExpectedPixel {
        r: data.get(offset).copied().unwrap_or(0),
        g: data.get(offset + 1).copied().unwrap_or(0),
        b: data.get(offset + 2).copied().unwrap_or(0),
        a: data.get(offset + 3).copied().unwrap_or(0),
    }
}

/// Check a pixel against `expected`, allowing `tolerance` per channel.
pub fn verify_pixel(
    data: &[u8],
    width: u32,
    x: u32,
    y: u32,
    expected: ExpectedPixel,
    tolerance: u8,
) -> bool {
    let actual = get_pixel(data, width, x, y);
    let close = |a: u8, b: u8| a.abs_diff(b) <= tolerance;
    let ok = close(actual.r, expected.r)
        && close(actual.g, expected.g)
        && close(actual.b, expected.b)
        && close(actual.a, expected.a);
    if !ok {
        eprintln!(
            "Pixel ({}, {}) mismatch: expected {:?}, got {:?}",
            x, y, expected, actual
        );
    }
    ok
}
