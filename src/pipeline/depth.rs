//! Atomic depth buffer
//!
//! Depth is resolved without sorting: every covered sample issues an atomic
//! minimum against its pixel. Each cell packs the fixed-point depth in the
//! high 32 bits and the primitive index in the low 32 bits, so equal depths
//! resolve to the lowest primitive index and every cell has one well-defined
//! winner regardless of task order.

use crate::error::{try_alloc_with, RasterResult};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-point depth of a cleared pixel.
pub const DEPTH_CLEAR: i32 = i32::MAX;

const CLEAR_CELL: u64 = u64::MAX;
const SIGN_BIT: u32 = 0x8000_0000;

/// Encode a perspective-divided depth as fixed point: `-z * i32::MAX`,
/// saturating at the integer range. Larger `z` (nearer, under reverse-Z)
/// encodes smaller.
pub fn encode_depth(z: f32) -> i32 {
    (-z * i32::MAX as f32) as i32
}

/// Order-preserving pack of signed depth and primitive index.
fn pack(depth: i32, primitive: u32) -> u64 {
    let biased = (depth as u32) ^ SIGN_BIT;
    ((biased as u64) << 32) | primitive as u64
}

fn unpack_depth(cell: u64) -> i32 {
    (((cell >> 32) as u32) ^ SIGN_BIT) as i32
}

/// One atomic cell per pixel.
pub struct DepthBuffer {
    cells: Vec<AtomicU64>,
}

impl DepthBuffer {
    pub fn new(pixel_count: usize) -> RasterResult<Self> {
        Ok(Self {
            cells: try_alloc_with("depth buffer", pixel_count, || AtomicU64::new(CLEAR_CELL))?,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reset every pixel to [`DEPTH_CLEAR`].
    pub fn clear(&mut self) {
        self.cells
            .par_iter_mut()
            .for_each(|cell| *cell.get_mut() = CLEAR_CELL);
    }

    /// Atomically lower the pixel to `(depth, primitive)` if that is nearer.
    /// Returns whether the pixel held exactly this sample right after the
    /// update, i.e. whether the caller currently owns the pixel.
    pub fn test_and_set(&self, index: usize, depth: i32, primitive: u32) -> bool {
        let packed = pack(depth, primitive);
        let previous = self.cells[index].fetch_min(packed, Ordering::AcqRel);
        previous >= packed && self.holds_packed(index, packed)
    }

    /// Re-read the pixel and check that `(depth, primitive)` still owns it.
    pub fn holds(&self, index: usize, depth: i32, primitive: u32) -> bool {
        self.holds_packed(index, pack(depth, primitive))
    }

    fn holds_packed(&self, index: usize, packed: u64) -> bool {
        self.cells[index].load(Ordering::Acquire) == packed
    }

    /// Fixed-point depth stored at a pixel.
    pub fn depth_at(&self, index: usize) -> i32 {
        unpack_depth(self.cells[index].load(Ordering::Acquire))
    }

    /// Primitive that owns a pixel, or `None` if it is still clear.
    pub fn winner_at(&self, index: usize) -> Option<u32> {
        let cell = self.cells[index].load(Ordering::Acquire);
        (cell != CLEAR_CELL).then_some(cell as u32)
    }

    /// Number of pixels written this frame.
    pub fn covered(&self) -> usize {
        self.cells
            .par_iter()
            .filter(|cell| cell.load(Ordering::Relaxed) != CLEAR_CELL)
            .count()
    }

    /// Free the storage. Further use sees an empty buffer.
    pub fn release(&mut self) {
        self.cells = Vec::new();
    }
}
