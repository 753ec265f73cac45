// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate composites coverage spans into raster buffers of any supported pixel format.
//!
//! A draw call hands a batch of spans and a [`SpanData`] to [`process_spans`]. The paint of the
//! span data is a solid color, a gradient or a texture, and the composition mode decides how it
//! combines with the destination. Sources and destinations are converted through one of two
//! canonical formats, premultiplied `0xAARRGGBB` words or [`Rgba64`](raster_common::Rgba64)
//! for the formats with more than 8 bits per channel. RGB32, premultiplied ARGB32 and RGB16
//! destinations have specialized drivers that produce the same pixels as the generic path.
//!
//! Mask blits and rectangle fills are reached through the per-format [`DrawHelper`] table.
//!
//! # Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library.
//! - `wide` (enabled by default): Let the [`Registry`] select word-parallel variants of the
//!   source and source-over operators on 64-bit targets.
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
    reason = "Coordinates and coverage are narrowed from wider intermediates whose range is \
known, and channel values are packed after masking."
)]

pub mod blit;
pub(crate) mod canonical;
pub mod compose;
pub(crate) mod dest;
pub mod drivers;
pub mod mode;
pub(crate) mod operator;
pub mod paint;
pub mod registry;
pub mod sampler;
pub mod texture;
mod wide;

pub use raster_common;
pub use raster_common::peniko;

pub use blit::{draw_helper, fill_clipped, DrawHelper, GammaTables, MaskView};
pub use drivers::{process_spans, SpanFn};
pub use mode::CompositionMode;
pub use paint::{GradientKind, Paint, SolidColor, Source, SpanData, TextureOptions};
pub use registry::{Capabilities, Registry};
pub use sampler::TextureBlendType;
pub use texture::{blend_texture, texture_driver};
