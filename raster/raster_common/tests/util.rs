// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

use raster_common::layout::convert_line;
use raster_common::{PixelFormat, PixelLayout};

/// All formats that store direct color and support both conversion directions.
pub(crate) fn direct_formats() -> impl Iterator<Item = PixelFormat> {
    PixelFormat::ALL.into_iter().filter(|f| {
        let layout = PixelLayout::of(*f);
        !f.is_indexed()
            && *f != PixelFormat::Invalid
            && layout.to_argb32.is_some()
            && layout.store_converter().is_some()
    })
}

/// Convert one native value to premultiplied `0xAARRGGBB`.
pub(crate) fn to_canonical(format: PixelFormat, native: u32) -> u32 {
    let mut buf = [native];
    assert!(convert_line(
        &mut buf,
        format,
        PixelFormat::Argb32Premultiplied,
        None
    ));
    buf[0]
}

/// Convert one premultiplied `0xAARRGGBB` value to its native encoding.
pub(crate) fn to_native(format: PixelFormat, canonical: u32) -> u32 {
    let mut buf = [canonical];
    assert!(convert_line(
        &mut buf,
        PixelFormat::Argb32Premultiplied,
        format,
        None
    ));
    buf[0]
}

/// A deterministic spread of opaque colors.
pub(crate) fn opaque_colors() -> impl Iterator<Item = u32> {
    (0..256_u32).map(|i| 0xff000000 | i.wrapping_mul(0x9e3779b9).rotate_left(7) & 0x00ffffff)
}
