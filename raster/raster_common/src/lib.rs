// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate includes the pixel formats, conversions and buffer types shared by the raster
//! compositing engine.
//!
//! # Usage
//!
//! Most users want [`raster_cpu`][raster_cpu], which drives spans into a [`RasterBuffer`]. This
//! crate is useful on its own when only pure format conversion is needed, through the
//! [`PixelLayout`] table and [`convert_line`](layout::convert_line).
//!
//! # Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library.
//!
//! # Contents
//!
//! - [`PixelFormat`] and the per-format [`PixelLayout`] table with its channel converters.
//! - The two canonical interchange formats: premultiplied `0xAARRGGBB` words and [`Rgba64`].
//! - Fetch and store of raw pixels by bits-per-pixel class.
//! - [`RasterBuffer`], a bounds-aware view over a destination surface, and the owned [`Image`].
//! - [`Span`]s, clipping, inverse transforms and [`GradientTable`]s.
//!
//! [raster_cpu]: https://crates.io/crates/raster_cpu
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    reason = "Channel packing narrows wider intermediates on purpose, \
and the casts from f64 coordinates to fixed point are range checked by the callers."
)]

pub mod buffer;
pub mod clip;
pub(crate) mod convert;
pub mod error;
pub mod fetch;
pub mod format;
pub mod gradient;
pub mod layout;
pub mod pixel;
pub mod rgba64;
pub mod span;
pub mod transform;

pub use peniko;
pub use peniko::color;
pub use peniko::kurbo;

pub use buffer::{Image, ImageView, RasterBuffer};
pub use convert::{
    a2rgb30_to_argb32, a2rgb30_to_rgba64, argb32_to_a2rgb30, rgb32_to_rgb30, rgba64_to_rgb30,
    Rgb30Order,
};
pub use error::Error;
pub use format::{Bpp, PixelFormat};
pub use gradient::GradientTable;
pub use layout::PixelLayout;
pub use rgba64::Rgba64;
pub use span::Span;

/// The maximum number of pixels processed per fetch, composite and store cycle.
pub const BUFFER_SIZE: usize = 2048;

/// One in 16.16 fixed point.
pub const FIXED_SCALE: i32 = 1 << 16;

/// One half in 16.16 fixed point.
pub const HALF_POINT: i32 = 1 << 15;
