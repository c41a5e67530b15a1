//! Per-frame rasterization pipeline
//!
//! Stages run in this order, each one a flat data-parallel pass:
//! 1. Vertex processing - one task per vertex of a group
//! 2. Primitive assembly - one task per primitive, groups in parallel
//! 3. Rasterization - one task per primitive in the global array
//! 4. Fragment shading - one task per pixel
//!
//! A stage starts only after the previous one has fully completed.

pub mod assembly;
pub mod depth;
pub mod fragment;
pub mod framebuffer;
pub mod raster;
pub mod shading;
pub mod vertex;

pub use assembly::Primitive;
pub use depth::{encode_depth, DepthBuffer, DEPTH_CLEAR};
pub use fragment::{Fragment, FragmentBuffer};
pub use framebuffer::Framebuffer;
pub use raster::{Interpolation, RasterStats, RasterTarget};
pub use shading::{ShadingModel, ShadingParams};
pub use vertex::{FrameTransforms, VertexOut};

/// Render target dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major pixel index. `x` and `y` must be in bounds.
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }
}
