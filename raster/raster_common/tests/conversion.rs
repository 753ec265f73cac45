// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::util::{direct_formats, opaque_colors, to_canonical, to_native};
use raster_common::layout::convert_line;
use raster_common::pixel::{alpha, blue, green, red};
use raster_common::{PixelFormat, PixelLayout, Rgba64};

#[test]
fn rgb16_white_expands_to_full_range() {
    assert_eq!(to_canonical(PixelFormat::Rgb16, 0xffff), 0xffffffff);
    assert_eq!(to_canonical(PixelFormat::Rgb444, 0x0fff), 0xffffffff);
    assert_eq!(to_canonical(PixelFormat::Rgb555, 0x7fff), 0xffffffff);
}

#[test]
fn half_transparent_black_survives_premultiplication() {
    assert_eq!(to_canonical(PixelFormat::Argb32, 0x80000000), 0x80000000);
    assert_eq!(to_native(PixelFormat::Argb32, 0x80000000), 0x80000000);
}

#[test]
fn native_values_are_stable_through_canonical() {
    for format in direct_formats() {
        for color in opaque_colors() {
            let native = to_native(format, color);
            let again = to_native(format, to_canonical(format, native));
            assert_eq!(native, again, "{format:?} {color:08x}");
        }
    }
}

#[test]
fn eight_bit_formats_are_exact_for_opaque_colors() {
    for format in [
        PixelFormat::Rgb32,
        PixelFormat::Argb32,
        PixelFormat::Argb32Premultiplied,
        PixelFormat::Rgb888,
        PixelFormat::Rgbx8888,
        PixelFormat::Rgba8888,
        PixelFormat::Rgba8888Premultiplied,
        PixelFormat::Bgr30,
        PixelFormat::A2Rgb30Premultiplied,
    ] {
        for color in opaque_colors() {
            assert_eq!(
                to_canonical(format, to_native(format, color)),
                color,
                "{format:?}"
            );
        }
    }
}

#[test]
fn canonical_output_is_premultiplied() {
    for format in [
        PixelFormat::Argb32,
        PixelFormat::Rgba8888,
        PixelFormat::Argb8565Premultiplied,
        PixelFormat::Argb6666Premultiplied,
        PixelFormat::Argb8555Premultiplied,
        PixelFormat::Argb4444Premultiplied,
        PixelFormat::Alpha8,
    ] {
        for value in (0..4096_u32).map(|i| i.wrapping_mul(0x0103_2f1b)) {
            let c = to_canonical(format, value);
            assert!(
                red(c) <= alpha(c) && green(c) <= alpha(c) && blue(c) <= alpha(c),
                "{format:?} {value:08x} -> {c:08x}"
            );
        }
    }
}

#[test]
fn wide_and_narrow_paths_agree() {
    for format in direct_formats() {
        let layout = PixelLayout::of(format);
        let Some(to_rgba64) = layout.to_rgba64 else {
            continue;
        };
        for color in opaque_colors() {
            let native = to_native(format, color);
            let mut wide = [Rgba64::TRANSPARENT];
            to_rgba64(&mut wide, &[native], layout, None);
            let narrow = to_canonical(format, native);
            let widened = wide[0].to_argb32();
            for shift in [0, 8, 16, 24] {
                let a = (widened >> shift) & 0xff;
                let b = (narrow >> shift) & 0xff;
                assert!(a.abs_diff(b) <= 1, "{format:?} {widened:08x} {narrow:08x}");
            }
        }
    }
}

#[test]
fn indexed_formats_use_the_color_table() {
    let table = [0xff0000ff, 0x80ff0000];
    let mut buf = [1, 0];
    assert!(convert_line(
        &mut buf,
        PixelFormat::Indexed8,
        PixelFormat::Argb32Premultiplied,
        Some(&table)
    ));
    assert_eq!(buf, [0x80800000, 0xff0000ff]);
    assert!(!convert_line(
        &mut buf,
        PixelFormat::Argb32Premultiplied,
        PixelFormat::Indexed8,
        None
    ));
}

#[test]
fn invalid_format_has_no_converters() {
    let layout = PixelLayout::of(PixelFormat::Invalid);
    assert!(layout.to_argb32.is_none());
    assert!(layout.store_converter().is_none());
}
