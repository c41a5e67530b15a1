//! Per-pixel fragment storage written by the rasterizer

use crate::error::{try_alloc_with, RasterResult};
use crate::scene::TextureRef;
use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use rayon::prelude::*;

/// Interpolated surface attributes of the visible sample at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fragment {
    pub color: Vec3,
    pub eye_pos: Vec3,
    pub eye_nor: Vec3,
    pub texcoord0: Vec2,
    pub texture: Option<TextureRef>,
}

/// One lockable fragment per pixel.
///
/// The lock only serializes a depth-test winner's re-check and write against
/// other winners of the same pixel; the shading stage reads through `&mut`
/// without locking.
pub struct FragmentBuffer {
    cells: Vec<Mutex<Fragment>>,
}

impl FragmentBuffer {
    pub fn new(pixel_count: usize) -> RasterResult<Self> {
        Ok(Self {
            cells: try_alloc_with("fragment buffer", pixel_count, || {
                Mutex::new(Fragment::default())
            })?,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Zero every fragment.
    pub fn clear(&mut self) {
        self.cells
            .par_iter_mut()
            .for_each(|cell| *cell.get_mut() = Fragment::default());
    }

    /// Lock the fragment at `index` for a conditional write.
    pub fn lock(&self, index: usize) -> parking_lot::MutexGuard<'_, Fragment> {
        self.cells[index].lock()
    }

    /// Copy of the fragment at `index`.
    pub fn get(&self, index: usize) -> Fragment {
        *self.cells[index].lock()
    }

    /// Exclusive access for the shading stage.
    pub fn cells_mut(&mut self) -> &mut [Mutex<Fragment>] {
        &mut self.cells
    }

    pub fn release(&mut self) {
        self.cells = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_clear() {
        let mut buffer = FragmentBuffer::new(3).unwrap();
        buffer.lock(1).color = Vec3::ONE;
        assert_eq!(buffer.get(1).color, Vec3::ONE);
        buffer.clear();
        assert_eq!(buffer.get(1), Fragment::default());
    }
}
