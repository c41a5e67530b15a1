//! Error types for the rasterizer
//!
//! Errors only surface at initialization and load time. A frame that has
//! started always runs to completion.

use crate::resources::PrimitiveTopology;
use thiserror::Error;

/// Rasterizer error type
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Out of memory allocating {what} ({bytes} bytes)")]
    OutOfMemory { what: &'static str, bytes: usize },
    #[error("Invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
    #[error("Primitive group '{0}' has no indices")]
    EmptyIndices(String),
    #[error("Primitive group '{label}': {count} indices do not form whole {topology:?} primitives")]
    IndexCountMismatch {
        label: String,
        topology: PrimitiveTopology,
        count: usize,
    },
    #[error("Primitive group '{label}': attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeLengthMismatch {
        label: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Primitive group '{label}': index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        label: String,
        slot: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Scene holds {0} primitives, more than a frame can index")]
    TooManyPrimitives(usize),
    #[error("Invalid texture: {0}")]
    InvalidTexture(String),
    #[error("Failed to decode texture: {0}")]
    TextureDecode(#[from] image::ImageError),
    #[error("Color target holds {actual} bytes, expected {expected}")]
    TargetSizeMismatch { expected: usize, actual: usize },
    #[error("Rasterizer resources have been released")]
    Released,
}

pub type RasterResult<T> = Result<T, RasterError>;

/// Allocate a vector of `len` copies of `value`, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_alloc<T: Clone>(
    what: &'static str,
    len: usize,
    value: T,
) -> RasterResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RasterError::OutOfMemory {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Like [`try_alloc`] but builds each element with `f`, for element types
/// that are not `Clone`.
pub(crate) fn try_alloc_with<T>(
    what: &'static str,
    len: usize,
    f: impl FnMut() -> T,
) -> RasterResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RasterError::OutOfMemory {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize_with(len, f);
    Ok(buffer)
}
