// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canonical pixel types as seen by samplers and destination procedures.

use raster_common::pixel::{interpolate_256, interpolate_4_pixels, interpolate_4_pixels_16};
use raster_common::{GradientTable, PixelFormat, PixelLayout, RasterBuffer, Rgba64};

use crate::compose::Premultiplied;
use crate::dest;

/// Fractional weight precision of bilinear filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weights {
    /// Weights in `0..16`.
    Four,
    /// Weights in `0..256`.
    Eight,
}

/// A canonical pixel that can be produced from native pixels and written back to a destination.
pub trait Canonical: Premultiplied {
    /// Convert raw native values of `layout` into canonical pixels.
    ///
    /// `raw` may be clobbered. Formats without a converter produce transparent black.
    fn from_native(out: &mut [Self], raw: &mut [u32], layout: &PixelLayout, table: Option<&[u32]>);

    /// View `len` native pixels of `line` starting at `x` directly, when `format` already is
    /// this canonical format and the storage is aligned.
    fn alias(line: &[u8], x: usize, len: usize, format: PixelFormat) -> Option<&[Self]>;

    /// Widen a premultiplied `0xAARRGGBB` value.
    fn from_argb32(p: u32) -> Self;

    /// Look up a gradient position.
    fn gradient(table: &GradientTable, pos: f64) -> Self;

    /// Look up a fixed-point gradient position, see [`GradientTable::index_fixed`].
    fn gradient_fixed(table: &GradientTable, fixed_pos: i32) -> Self;

    /// `(x * a + y * b) / 256` with `a + b == 256`.
    fn interpolate_256(x: Self, a: u32, y: Self, b: u32) -> Self;

    /// Bilinear blend of four taps with 16-bit fractional distances.
    fn interpolate_4(tl: Self, tr: Self, bl: Self, br: Self, distx: u32, disty: u32, weights: Weights)
        -> Self;

    /// Read destination pixels into `out`.
    fn fetch_dest(buffer: &RasterBuffer<'_>, x: usize, y: usize, out: &mut [Self]);

    /// Write `src` into the destination.
    fn store_dest(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[Self]);
}

impl Canonical for u32 {
    #[inline]
    fn from_native(out: &mut [Self], raw: &mut [u32], layout: &PixelLayout, table: Option<&[u32]>) {
        match layout.to_argb32 {
            Some(convert) => {
                out.copy_from_slice(raw);
                convert(out, layout, table);
            }
            None => out.fill(0),
        }
    }

    #[inline]
    fn alias(line: &[u8], x: usize, len: usize, format: PixelFormat) -> Option<&[Self]> {
        if format != PixelFormat::Argb32Premultiplied {
            return None;
        }
        bytemuck::try_cast_slice(&line[x * 4..(x + len) * 4]).ok()
    }

    #[inline(always)]
    fn from_argb32(p: u32) -> Self {
        p
    }

    #[inline(always)]
    fn gradient(table: &GradientTable, pos: f64) -> Self {
        table.pixel(pos)
    }

    #[inline(always)]
    fn gradient_fixed(table: &GradientTable, fixed_pos: i32) -> Self {
        table.pixel_fixed(fixed_pos)
    }

    #[inline(always)]
    fn interpolate_256(x: Self, a: u32, y: Self, b: u32) -> Self {
        interpolate_256(x, a, y, b)
    }

    #[inline(always)]
    fn interpolate_4(
        tl: Self,
        tr: Self,
        bl: Self,
        br: Self,
        distx: u32,
        disty: u32,
        weights: Weights,
    ) -> Self {
        match weights {
            Weights::Four => interpolate_4_pixels_16(tl, tr, bl, br, distx >> 12, disty >> 12),
            Weights::Eight => interpolate_4_pixels(tl, tr, bl, br, distx >> 8, disty >> 8),
        }
    }

    #[inline]
    fn fetch_dest(buffer: &RasterBuffer<'_>, x: usize, y: usize, out: &mut [Self]) {
        dest::fetch_32(buffer, x, y, out);
    }

    #[inline]
    fn store_dest(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[Self]) {
        dest::store_32(buffer, x, y, src);
    }
}

impl Canonical for Rgba64 {
    #[inline]
    fn from_native(out: &mut [Self], raw: &mut [u32], layout: &PixelLayout, table: Option<&[u32]>) {
        match layout.to_rgba64 {
            Some(convert) => convert(out, raw, layout, table),
            None => out.fill(Self::TRANSPARENT),
        }
    }

    #[inline(always)]
    fn alias(_: &[u8], _: usize, _: usize, _: PixelFormat) -> Option<&[Self]> {
        None
    }

    #[inline(always)]
    fn from_argb32(p: u32) -> Self {
        Self::from_argb32(p)
    }

    #[inline(always)]
    fn gradient(table: &GradientTable, pos: f64) -> Self {
        table.pixel64(pos)
    }

    #[inline(always)]
    fn gradient_fixed(table: &GradientTable, fixed_pos: i32) -> Self {
        table.pixel64_fixed(fixed_pos)
    }

    #[inline(always)]
    fn interpolate_256(x: Self, a: u32, y: Self, b: u32) -> Self {
        Self::interpolate_256(x, a, y, b)
    }

    #[inline(always)]
    fn interpolate_4(
        tl: Self,
        tr: Self,
        bl: Self,
        br: Self,
        distx: u32,
        disty: u32,
        _weights: Weights,
    ) -> Self {
        Self::interpolate_4(tl, tr, bl, br, distx, disty)
    }

    #[inline]
    fn fetch_dest(buffer: &RasterBuffer<'_>, x: usize, y: usize, out: &mut [Self]) {
        dest::fetch_64(buffer, x, y, out);
    }

    #[inline]
    fn store_dest(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[Self]) {
        dest::store_64(buffer, x, y, src);
    }
}

#[cfg(test)]
mod tests {
    use super::{Canonical, Weights};
    use raster_common::{PixelFormat, PixelLayout, Rgba64};

    #[test]
    fn native_rgb16_widens_to_both_precisions() {
        let layout = PixelLayout::of(PixelFormat::Rgb16);
        let mut out32 = [0_u32; 2];
        <u32 as Canonical>::from_native(&mut out32, &mut [0xffff, 0xf800], layout, None);
        assert_eq!(out32, [0xffffffff, 0xffff0000]);
        let mut out64 = [Rgba64::TRANSPARENT; 2];
        <Rgba64 as Canonical>::from_native(&mut out64, &mut [0xffff, 0xf800], layout, None);
        assert_eq!(out64[0], Rgba64::new(65535, 65535, 65535, 65535));
        assert_eq!(out64[1].to_argb32(), 0xffff0000);
    }

    #[test]
    fn bilinear_weights_agree_on_halfway() {
        let (a, b) = (0xff000000_u32, 0xffffffff_u32);
        let four = <u32 as Canonical>::interpolate_4(a, b, a, b, 0x8000, 0, Weights::Four);
        let eight = <u32 as Canonical>::interpolate_4(a, b, a, b, 0x8000, 0, Weights::Eight);
        assert_eq!(four, eight);
        assert_eq!(four & 0xff, 0x7f);
    }
}
