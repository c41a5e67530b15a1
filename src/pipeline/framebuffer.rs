//! Final color buffer and the 8-bit presentation boundary

use crate::error::{try_alloc, RasterError, RasterResult};
use glam::Vec3;
use rayon::prelude::*;
use std::path::Path;

/// Linear floating-point RGB, one entry per pixel, row-major.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> RasterResult<Self> {
        let pixels = try_alloc("framebuffer", width as usize * height as usize, Vec3::ZERO)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    /// Raw channel view, three floats per pixel.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn clear(&mut self, color: Vec3) {
        self.pixels.par_iter_mut().for_each(|p| *p = color);
    }

    /// Byte length of the RGBA8 surface this buffer converts into.
    pub fn rgba8_len(&self) -> usize {
        self.pixels.len() * 4
    }

    /// Convert into a caller-provided RGBA8 surface: each channel clamped to
    /// `[0, 1]` and scaled by 255, alpha opaque. `out` must hold at least
    /// [`Self::rgba8_len`] bytes; extra bytes are left untouched.
    pub fn write_rgba8(&self, out: &mut [u8]) -> RasterResult<()> {
        let expected = self.rgba8_len();
        if out.len() < expected {
            return Err(RasterError::TargetSizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut out[..expected]);
        texels
            .par_iter_mut()
            .zip(self.pixels.par_iter())
            .for_each(|(texel, color)| *texel = to_rgba8(*color));
        Ok(())
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| to_rgba8(*c)).collect()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> RasterResult<()> {
        let bytes = self.to_rgba8();
        let actual = bytes.len();
        let image = image::RgbaImage::from_raw(self.width, self.height, bytes).ok_or(
            RasterError::TargetSizeMismatch {
                expected: self.width as usize * self.height as usize * 4,
                actual,
            },
        )?;
        image.save(path.as_ref())?;
        log::info!(
            "Saved {}x{} frame to {}",
            self.width,
            self.height,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Free the pixel storage.
    pub fn release(&mut self) {
        self.pixels = Vec::new();
        self.width = 0;
        self.height = 0;
    }
}

/// Clamp one linear color to an opaque 8-bit texel.
pub fn to_rgba8(color: Vec3) -> [u8; 4] {
    let c = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8, 255]
}
