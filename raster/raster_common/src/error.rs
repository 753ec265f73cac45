// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while describing buffers and paints.

use thiserror::Error;

/// Errors that can occur when constructing raster buffers, images or gradient tables.
///
/// Drawing itself never fails. Everything that could go wrong is checked when the inputs are
/// built.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The format has no pixel layout and cannot be drawn into or read from.
    #[error("Pixel format `Invalid` cannot be used for storage")]
    InvalidFormat,
    /// Width or height is zero or exceeds [`MAX_DIMENSION`](crate::buffer::MAX_DIMENSION).
    #[error("Image size {0}x{1} is out of range")]
    InvalidSize(u32, u32),
    /// The scanline stride is too small for the width and format.
    #[error("Stride of {stride} bytes is less than the {min} bytes needed per scanline")]
    StrideTooSmall {
        /// The stride that was given.
        stride: usize,
        /// The minimum stride for the width and format.
        min: usize,
    },
    /// The pixel storage cannot hold all scanlines.
    #[error("Buffer of {len} bytes is shorter than the {needed} bytes required")]
    BufferTooSmall {
        /// Length of the storage that was given.
        len: usize,
        /// Bytes needed for all scanlines.
        needed: usize,
    },
    /// An indexed format was given fewer color table entries than it can address.
    #[error("Indexed format needs a color table with {0} entries")]
    MissingColorTable(usize),
    /// A gradient was described without any color stops.
    #[error("Gradient has no color stops")]
    NoColorStops,
}

/// A specialized `Result` for this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
