//! Diffuse textures and texel sampling

use crate::error::{RasterError, RasterResult};
use glam::{Vec2, Vec3};
use image::DynamicImage;
use std::path::Path;

/// Texture filtering policy used by the fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    /// Nearest texel lookup.
    Nearest,
    /// 2x2 bilinear blend.
    #[default]
    Bilinear,
}

/// 8-bit-per-channel RGB texture, rows top to bottom.
#[derive(Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub name: String,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Texture {
    /// Wrap raw interleaved RGB bytes.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>, name: &str) -> RasterResult<Self> {
        let texture = Self {
            width,
            height,
            data,
            name: name.to_string(),
        };
        texture.validate()?;
        Ok(texture)
    }

    /// Check that the extent is non-zero and `data` holds exactly one RGB
    /// triple per texel.
    pub fn validate(&self) -> RasterResult<()> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidTexture(format!(
                "'{}' has zero extent {width}x{height}",
                self.name
            )));
        }
        let expected = width as usize * height as usize * 3;
        if self.data.len() != expected {
            return Err(RasterError::InvalidTexture(format!(
                "'{}' holds {} bytes, expected {expected} for {width}x{height} RGB",
                self.name,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RasterResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path)?;
        Self::from_image(img, &name)
    }

    /// Load texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: &str) -> RasterResult<Self> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(img, name)
    }

    fn from_image(img: DynamicImage, name: &str) -> RasterResult<Self> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb8(width, height, rgb.into_raw(), name)
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 3], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Create a checkerboard texture with `cell`-sized squares
    pub fn checkerboard(size: u32, cell: u32, color1: [u8; 3], color2: [u8; 3]) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let mut data = Vec::with_capacity((size * size * 3) as usize);

        for y in 0..size {
            for x in 0..size {
                let is_even = ((x / cell) + (y / cell)) % 2 == 0;
                data.extend_from_slice(if is_even { &color1 } else { &color2 });
            }
        }

        Self {
            width: size,
            height: size,
            data,
            name: "checkerboard".to_string(),
        }
    }

    /// Fetch one texel as linear `[0, 1]` floats. Coordinates are clamped
    /// to the texture edge.
    pub fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let offset = (y * self.width as usize + x) * 3;
        let rgb = &self.data[offset..offset + 3];
        Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0
    }

    /// Sample at normalized `uv`, scaled by the texture extent.
    pub fn sample(&self, uv: Vec2, filter: TextureFilter) -> Vec3 {
        let scaled = uv * Vec2::new(self.width as f32, self.height as f32);
        match filter {
            TextureFilter::Nearest => self.sample_nearest(scaled),
            TextureFilter::Bilinear => self.sample_bilinear(scaled),
        }
    }

    fn sample_nearest(&self, scaled: Vec2) -> Vec3 {
        let floor = scaled.floor();
        self.texel(floor.x as i64, floor.y as i64)
    }

    fn sample_bilinear(&self, scaled: Vec2) -> Vec3 {
        let floor = scaled.floor();
        let frac = scaled - floor;
        let (x, y) = (floor.x as i64, floor.y as i64);

        let c00 = self.texel(x, y);
        let c10 = self.texel(x + 1, y);
        let c01 = self.texel(x, y + 1);
        let c11 = self.texel(x + 1, y + 1);

        c00 * ((1.0 - frac.x) * (1.0 - frac.y))
            + c10 * (frac.x * (1.0 - frac.y))
            + c01 * ((1.0 - frac.x) * frac.y)
            + c11 * (frac.x * frac.y)
    }
}
