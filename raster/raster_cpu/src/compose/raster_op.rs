// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitwise raster operations.
//!
//! These treat pixels as plain bit patterns, ignore coverage and always produce opaque results.

use super::{ComposeFn, ComposeSolidFn};
use crate::mode::CompositionMode;

const OPAQUE: u32 = 0xff000000;

macro_rules! raster_op {
    ($name:ident, $solid:ident, |$s:ident, $d:ident| $op:expr) => {
        fn $name(dst: &mut [u32], src: &[u32], _coverage: u8) {
            for (d, s) in dst.iter_mut().zip(src) {
                let ($s, $d) = (*s, *d);
                *d = ($op) | OPAQUE;
            }
        }

        fn $solid(dst: &mut [u32], color: u32, _coverage: u8) {
            let $s = color;
            for d in dst.iter_mut() {
                let $d = *d;
                *d = ($op) | OPAQUE;
            }
        }
    };
}

raster_op!(source_or_destination, solid_source_or_destination, |s, d| s | d);
raster_op!(source_and_destination, solid_source_and_destination, |s, d| s & d);
raster_op!(source_xor_destination, solid_source_xor_destination, |s, d| s ^ d);
raster_op!(not_source_and_not_destination, solid_not_source_and_not_destination, |s, d| !s & !d);
raster_op!(not_source_or_not_destination, solid_not_source_or_not_destination, |s, d| !s | !d);
raster_op!(not_source_xor_destination, solid_not_source_xor_destination, |s, d| !s ^ d);
raster_op!(not_source, solid_not_source, |s, _d| !s);
raster_op!(not_source_and_destination, solid_not_source_and_destination, |s, d| !s & d);
raster_op!(source_and_not_destination, solid_source_and_not_destination, |s, d| s & !d);
raster_op!(not_source_or_destination, solid_not_source_or_destination, |s, d| !s | d);
raster_op!(source_or_not_destination, solid_source_or_not_destination, |s, d| s | !d);
raster_op!(clear_destination, solid_clear_destination, |_s, _d| 0);
raster_op!(set_destination, solid_set_destination, |_s, _d| 0x00ffffff);
raster_op!(not_destination, solid_not_destination, |_s, d| !d);

/// The raster operation of `mode`.
///
/// Modes that are not raster operations map to [`CompositionMode::SourceOrDestination`], which
/// callers never rely on since those modes have their own functions.
pub(crate) fn function_for_mode(mode: CompositionMode) -> ComposeFn<u32> {
    match mode {
        CompositionMode::SourceAndDestination => source_and_destination,
        CompositionMode::SourceXorDestination => source_xor_destination,
        CompositionMode::NotSourceAndNotDestination => not_source_and_not_destination,
        CompositionMode::NotSourceOrNotDestination => not_source_or_not_destination,
        CompositionMode::NotSourceXorDestination => not_source_xor_destination,
        CompositionMode::NotSource => not_source,
        CompositionMode::NotSourceAndDestination => not_source_and_destination,
        CompositionMode::SourceAndNotDestination => source_and_not_destination,
        CompositionMode::NotSourceOrDestination => not_source_or_destination,
        CompositionMode::SourceOrNotDestination => source_or_not_destination,
        CompositionMode::ClearDestination => clear_destination,
        CompositionMode::SetDestination => set_destination,
        CompositionMode::NotDestination => not_destination,
        _ => source_or_destination,
    }
}

/// The solid raster operation of `mode`. See [`function_for_mode`].
pub(crate) fn solid_function_for_mode(mode: CompositionMode) -> ComposeSolidFn<u32> {
    match mode {
        CompositionMode::SourceAndDestination => solid_source_and_destination,
        CompositionMode::SourceXorDestination => solid_source_xor_destination,
        CompositionMode::NotSourceAndNotDestination => solid_not_source_and_not_destination,
        CompositionMode::NotSourceOrNotDestination => solid_not_source_or_not_destination,
        CompositionMode::NotSourceXorDestination => solid_not_source_xor_destination,
        CompositionMode::NotSource => solid_not_source,
        CompositionMode::NotSourceAndDestination => solid_not_source_and_destination,
        CompositionMode::SourceAndNotDestination => solid_source_and_not_destination,
        CompositionMode::NotSourceOrDestination => solid_not_source_or_destination,
        CompositionMode::SourceOrNotDestination => solid_source_or_not_destination,
        CompositionMode::ClearDestination => solid_clear_destination,
        CompositionMode::SetDestination => solid_set_destination,
        CompositionMode::NotDestination => solid_not_destination,
        _ => solid_source_or_destination,
    }
}
