// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-format pixel layout table.

use crate::convert::*;
use crate::format::{Bpp, PixelFormat};
use crate::rgba64::Rgba64;

/// Convert unpacked native values to premultiplied `0xAARRGGBB` in place.
///
/// The optional slice is the color table of indexed formats.
pub type ToArgb32Fn = fn(&mut [u32], &PixelLayout, Option<&[u32]>);

/// Convert canonical pixels to unpacked native values in place.
pub type FromArgb32Fn = fn(&mut [u32], &PixelLayout);

/// Convert unpacked native values to premultiplied [`Rgba64`].
pub type ToRgba64Fn = fn(&mut [Rgba64], &[u32], &PixelLayout, Option<&[u32]>);

/// Bit layout of one pixel format together with its converters.
///
/// Widths and shifts describe where each channel lives inside the unpacked native value.
/// Formats whose channels are 8 bits or wider use dedicated pass-through converters and do not
/// go through bit expansion.
#[derive(Clone, Copy, Debug)]
pub struct PixelLayout {
    /// Bits of red.
    pub red_width: u8,
    /// Position of red.
    pub red_shift: u8,
    /// Bits of green.
    pub green_width: u8,
    /// Position of green.
    pub green_shift: u8,
    /// Bits of blue.
    pub blue_width: u8,
    /// Position of blue.
    pub blue_shift: u8,
    /// Bits of alpha, zero for opaque formats.
    pub alpha_width: u8,
    /// Position of alpha.
    pub alpha_shift: u8,
    /// Whether color channels are stored premultiplied.
    pub premultiplied: bool,
    /// Storage class.
    pub bpp: Bpp,
    /// Native to canonical 32-bit.
    pub to_argb32: Option<ToArgb32Fn>,
    /// Canonical 32-bit to native, unpremultiplying when the format is not premultiplied.
    pub from_argb32_pm: Option<FromArgb32Fn>,
    /// Opaque canonical 32-bit to native, skipping unpremultiplication.
    pub from_rgb32: Option<FromArgb32Fn>,
    /// Native to canonical 64-bit.
    pub to_rgba64: Option<ToRgba64Fn>,
}

impl PixelLayout {
    const INVALID: Self = Self {
        red_width: 0,
        red_shift: 0,
        green_width: 0,
        green_shift: 0,
        blue_width: 0,
        blue_shift: 0,
        alpha_width: 0,
        alpha_shift: 0,
        premultiplied: false,
        bpp: Bpp::None,
        to_argb32: None,
        from_argb32_pm: None,
        from_rgb32: None,
        to_rgba64: None,
    };

    const fn indexed(bpp: Bpp) -> Self {
        Self {
            bpp,
            to_argb32: Some(indexed_to_argb32_pm),
            to_rgba64: Some(indexed_to_rgba64),
            ..Self::INVALID
        }
    }

    const fn rgb(rw: u8, rs: u8, gw: u8, gs: u8, bw: u8, bs: u8, bpp: Bpp) -> Self {
        Self {
            red_width: rw,
            red_shift: rs,
            green_width: gw,
            green_shift: gs,
            blue_width: bw,
            blue_shift: bs,
            bpp,
            to_argb32: Some(rgb_to_rgb32),
            from_argb32_pm: Some(rgb_from_argb32_pm),
            from_rgb32: Some(rgb_from_rgb32),
            to_rgba64: Some(rgb_to_rgba64),
            ..Self::INVALID
        }
    }

    #[expect(clippy::too_many_arguments, reason = "one argument per channel field")]
    const fn argb_pm(
        rw: u8,
        rs: u8,
        gw: u8,
        gs: u8,
        bw: u8,
        bs: u8,
        aw: u8,
        ash: u8,
        bpp: Bpp,
    ) -> Self {
        Self {
            red_width: rw,
            red_shift: rs,
            green_width: gw,
            green_shift: gs,
            blue_width: bw,
            blue_shift: bs,
            alpha_width: aw,
            alpha_shift: ash,
            premultiplied: true,
            bpp,
            to_argb32: Some(argb_pm_to_argb32_pm),
            from_argb32_pm: Some(argb_pm_from_argb32_pm),
            from_rgb32: Some(argb_pm_from_rgb32),
            to_rgba64: Some(argb_pm_to_rgba64),
        }
    }

    const fn rgb30(rs: u8, bs: u8, aw: u8, premultiplied: bool) -> Self {
        Self {
            red_width: 10,
            red_shift: rs,
            green_width: 10,
            green_shift: 10,
            blue_width: 10,
            blue_shift: bs,
            alpha_width: aw,
            alpha_shift: 30,
            premultiplied,
            bpp: Bpp::Bpp32,
            to_argb32: Some(a2rgb30_to_argb32_pm),
            from_argb32_pm: if premultiplied {
                Some(a2rgb30_from_argb32_pm)
            } else {
                Some(rgb30_from_argb32_pm)
            },
            from_rgb32: Some(rgb30_from_rgb32),
            to_rgba64: Some(a2rgb30_to_rgba64_pm),
        }
    }

    #[expect(clippy::too_many_arguments, reason = "one argument per converter")]
    const fn argb8888(
        rs: u8,
        bs: u8,
        aw: u8,
        premultiplied: bool,
        to_argb32: ToArgb32Fn,
        from_argb32_pm: FromArgb32Fn,
        from_rgb32: FromArgb32Fn,
        to_rgba64: ToRgba64Fn,
    ) -> Self {
        Self {
            red_width: 8,
            red_shift: rs,
            green_width: 8,
            green_shift: 8,
            blue_width: 8,
            blue_shift: bs,
            alpha_width: aw,
            alpha_shift: 24,
            premultiplied,
            bpp: Bpp::Bpp32,
            to_argb32: Some(to_argb32),
            from_argb32_pm: Some(from_argb32_pm),
            from_rgb32: Some(from_rgb32),
            to_rgba64: Some(to_rgba64),
        }
    }

    /// The layout of `format` in the default table.
    #[inline]
    pub fn of(format: PixelFormat) -> &'static Self {
        &PIXEL_LAYOUTS[format.index()]
    }

    /// Whether a store into this format should skip unpremultiplication.
    ///
    /// True for formats that are neither premultiplied nor carry alpha, where the canonical pixel
    /// is assumed opaque.
    #[inline]
    pub fn stores_opaque(&self) -> bool {
        !self.premultiplied && self.alpha_width == 0
    }

    /// The converter used to store canonical pixels into this format.
    #[inline]
    pub fn store_converter(&self) -> Option<FromArgb32Fn> {
        if self.stores_opaque() {
            self.from_rgb32
        } else {
            self.from_argb32_pm
        }
    }
}

/// Layouts of all formats, indexed by [`PixelFormat::index`].
pub static PIXEL_LAYOUTS: [PixelLayout; PixelFormat::COUNT] = [
    // Invalid
    PixelLayout::INVALID,
    // Mono
    PixelLayout::indexed(Bpp::Mono),
    // MonoLsb
    PixelLayout::indexed(Bpp::MonoLsb),
    // Indexed8
    PixelLayout::indexed(Bpp::Bpp8),
    // Rgb32
    PixelLayout::argb8888(
        16,
        0,
        0,
        false,
        pass_through,
        pass_through_from,
        pass_through_from,
        rgb32_to_rgba64,
    ),
    // Argb32
    PixelLayout::argb8888(
        16,
        0,
        8,
        false,
        argb32_to_argb32_pm,
        argb32_from_argb32_pm,
        pass_through_from,
        argb32_to_rgba64,
    ),
    // Argb32Premultiplied
    PixelLayout::argb8888(
        16,
        0,
        8,
        true,
        pass_through,
        pass_through_from,
        pass_through_from,
        argb32_pm_to_rgba64,
    ),
    // Rgb16
    PixelLayout::rgb(5, 11, 6, 5, 5, 0, Bpp::Bpp16),
    // Argb8565Premultiplied
    PixelLayout::argb_pm(5, 19, 6, 13, 5, 8, 8, 0, Bpp::Bpp24),
    // Rgb666
    PixelLayout::rgb(6, 12, 6, 6, 6, 0, Bpp::Bpp24),
    // Argb6666Premultiplied
    PixelLayout::argb_pm(6, 12, 6, 6, 6, 0, 6, 18, Bpp::Bpp24),
    // Rgb555
    PixelLayout::rgb(5, 10, 5, 5, 5, 0, Bpp::Bpp16),
    // Argb8555Premultiplied
    PixelLayout::argb_pm(5, 18, 5, 13, 5, 8, 8, 0, Bpp::Bpp24),
    // Rgb888
    PixelLayout::rgb(8, 16, 8, 8, 8, 0, Bpp::Bpp24),
    // Rgb444
    PixelLayout::rgb(4, 8, 4, 4, 4, 0, Bpp::Bpp16),
    // Argb4444Premultiplied
    PixelLayout::argb_pm(4, 8, 4, 4, 4, 0, 4, 12, Bpp::Bpp16),
    // Rgbx8888
    PixelLayout::argb8888(
        0,
        16,
        0,
        false,
        rgba8888_pm_to_argb32_pm,
        rgbx8888_from_argb32_pm,
        rgbx8888_from_rgb32,
        rgbx8888_to_rgba64,
    ),
    // Rgba8888
    PixelLayout::argb8888(
        0,
        16,
        8,
        false,
        rgba8888_to_argb32_pm,
        rgba8888_from_argb32_pm,
        rgbx8888_from_rgb32,
        rgba8888_to_rgba64,
    ),
    // Rgba8888Premultiplied
    PixelLayout::argb8888(
        0,
        16,
        8,
        true,
        rgba8888_pm_to_argb32_pm,
        rgba8888_pm_from_argb32_pm,
        rgbx8888_from_rgb32,
        rgba8888_pm_to_rgba64,
    ),
    // Bgr30
    PixelLayout::rgb30(0, 20, 0, false),
    // A2Bgr30Premultiplied
    PixelLayout::rgb30(0, 20, 2, true),
    // Rgb30
    PixelLayout::rgb30(20, 0, 0, false),
    // A2Rgb30Premultiplied
    PixelLayout::rgb30(20, 0, 2, true),
    // Alpha8
    PixelLayout {
        alpha_width: 8,
        bpp: Bpp::Bpp8,
        to_argb32: Some(alpha8_to_rgb32),
        from_argb32_pm: Some(alpha8_from_argb32_pm),
        to_rgba64: Some(alpha8_to_rgba64),
        ..PixelLayout::INVALID
    },
    // Grayscale8
    PixelLayout {
        bpp: Bpp::Bpp8,
        to_argb32: Some(grayscale8_to_rgb32),
        from_argb32_pm: Some(grayscale8_from_argb32_pm),
        from_rgb32: Some(grayscale8_from_rgb32),
        to_rgba64: Some(grayscale8_to_rgba64),
        ..PixelLayout::INVALID
    },
];

/// Convert a run of unpacked native values from one format to another in place.
///
/// The values travel through canonical premultiplied 32-bit pixels. Returns `false` and leaves
/// `buffer` in an unspecified state when either format has no converter in that direction, as
/// is the case for [`PixelFormat::Invalid`] and for storing into indexed formats.
pub fn convert_line(
    buffer: &mut [u32],
    from: PixelFormat,
    to: PixelFormat,
    color_table: Option<&[u32]>,
) -> bool {
    let src = PixelLayout::of(from);
    let dst = PixelLayout::of(to);
    let (Some(to_argb32), Some(store)) = (src.to_argb32, dst.store_converter()) else {
        return false;
    };
    to_argb32(buffer, src, color_table);
    store(buffer, dst);
    true
}
