// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Channel converters between native pixel values and the canonical formats.
//!
//! All 32-bit converters work in place on a buffer of unpacked native values as produced by
//! [`fetch`](crate::fetch). The layout record supplies channel widths and shifts, so one
//! implementation serves every format of a family.

use crate::layout::PixelLayout;
use crate::pixel::{self, premultiply, unpremultiply};
use crate::rgba64::Rgba64;

#[inline(always)]
const fn mask(width: u8) -> u32 {
    (1 << width) - 1
}

/// Bit-replicating widening of a channel of `width` bits (4 to 8) to 8 bits.
#[inline(always)]
const fn expand(v: u32, width: u8) -> u32 {
    (v << (8 - width)) | (v >> (2 * width - 8))
}

#[inline(always)]
const fn extract(p: u32, width: u8, shift: u8) -> u32 {
    (p >> shift) & mask(width)
}

/// Pack the top `width` bits of the 8-bit channel at `from` of `c` into `shift`.
#[inline(always)]
const fn pack(c: u32, from: u8, width: u8, shift: u8) -> u32 {
    ((c >> (from + 8 - width)) & mask(width)) << shift
}

fn color(table: Option<&[u32]>, index: u32) -> u32 {
    table
        .and_then(|t| t.get(index as usize).copied())
        .unwrap_or(0)
}

pub(crate) fn pass_through(_: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {}

pub(crate) fn pass_through_from(_: &mut [u32], _: &PixelLayout) {}

pub(crate) fn indexed_to_argb32_pm(buf: &mut [u32], _: &PixelLayout, table: Option<&[u32]>) {
    for p in buf {
        *p = premultiply(color(table, *p));
    }
}

pub(crate) fn indexed_to_rgba64(
    dst: &mut [Rgba64],
    src: &[u32],
    _: &PixelLayout,
    table: Option<&[u32]>,
) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(color(table, *s)).premultiplied();
    }
}

pub(crate) fn rgb32_to_rgba64(dst: &mut [Rgba64], src: &[u32], _: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(0xff000000 | *s);
    }
}

pub(crate) fn argb32_to_argb32_pm(buf: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        *p = premultiply(*p);
    }
}

pub(crate) fn argb32_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = unpremultiply(*p);
    }
}

pub(crate) fn argb32_to_rgba64(dst: &mut [Rgba64], src: &[u32], _: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(*s).premultiplied();
    }
}

pub(crate) fn argb32_pm_to_rgba64(
    dst: &mut [Rgba64],
    src: &[u32],
    _: &PixelLayout,
    _: Option<&[u32]>,
) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(*s);
    }
}

pub(crate) fn rgb_to_rgb32(buf: &mut [u32], l: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        let s = *p;
        let r = expand(extract(s, l.red_width, l.red_shift), l.red_width);
        let g = expand(extract(s, l.green_width, l.green_shift), l.green_width);
        let b = expand(extract(s, l.blue_width, l.blue_shift), l.blue_width);
        *p = 0xff000000 | (r << 16) | (g << 8) | b;
    }
}

pub(crate) fn rgb_to_rgba64(dst: &mut [Rgba64], src: &[u32], l: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        let r = expand(extract(*s, l.red_width, l.red_shift), l.red_width);
        let g = expand(extract(*s, l.green_width, l.green_shift), l.green_width);
        let b = expand(extract(*s, l.blue_width, l.blue_shift), l.blue_width);
        *d = Rgba64::from_rgba8(r as u8, g as u8, b as u8, 255);
    }
}

#[inline(always)]
fn argb_pm_channels(s: u32, l: &PixelLayout) -> [u32; 4] {
    let a = expand(extract(s, l.alpha_width, l.alpha_shift), l.alpha_width);
    let r = expand(extract(s, l.red_width, l.red_shift), l.red_width).min(a);
    let g = expand(extract(s, l.green_width, l.green_shift), l.green_width).min(a);
    let b = expand(extract(s, l.blue_width, l.blue_shift), l.blue_width).min(a);
    [r, g, b, a]
}

pub(crate) fn argb_pm_to_argb32_pm(buf: &mut [u32], l: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        let [r, g, b, a] = argb_pm_channels(*p, l);
        *p = (a << 24) | (r << 16) | (g << 8) | b;
    }
}

pub(crate) fn argb_pm_to_rgba64(
    dst: &mut [Rgba64],
    src: &[u32],
    l: &PixelLayout,
    _: Option<&[u32]>,
) {
    for (d, s) in dst.iter_mut().zip(src) {
        let [r, g, b, a] = argb_pm_channels(*s, l);
        *d = Rgba64::from_rgba8(r as u8, g as u8, b as u8, a as u8);
    }
}

#[inline(always)]
fn pack_rgb(c: u32, l: &PixelLayout) -> u32 {
    pack(c, 16, l.red_width, l.red_shift)
        | pack(c, 8, l.green_width, l.green_shift)
        | pack(c, 0, l.blue_width, l.blue_shift)
}

pub(crate) fn rgb_from_argb32_pm(buf: &mut [u32], l: &PixelLayout) {
    for p in buf {
        *p = pack_rgb(unpremultiply(*p), l);
    }
}

pub(crate) fn rgb_from_rgb32(buf: &mut [u32], l: &PixelLayout) {
    for p in buf {
        *p = pack_rgb(*p, l);
    }
}

pub(crate) fn argb_pm_from_argb32_pm(buf: &mut [u32], l: &PixelLayout) {
    for p in buf {
        *p = pack(*p, 24, l.alpha_width, l.alpha_shift) | pack_rgb(*p, l);
    }
}

pub(crate) fn argb_pm_from_rgb32(buf: &mut [u32], l: &PixelLayout) {
    let alpha = (0xff & mask(l.alpha_width)) << l.alpha_shift;
    for p in buf {
        *p = alpha | pack_rgb(*p, l);
    }
}

pub(crate) fn rgba8888_pm_to_argb32_pm(buf: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        *p = pixel::rgba_to_argb(*p);
    }
}

pub(crate) fn rgba8888_to_argb32_pm(buf: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        *p = premultiply(pixel::rgba_to_argb(*p));
    }
}

pub(crate) fn rgbx8888_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::argb_to_rgba(0xff000000 | unpremultiply(*p));
    }
}

pub(crate) fn rgbx8888_from_rgb32(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::argb_to_rgba(0xff000000 | *p);
    }
}

pub(crate) fn rgba8888_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::argb_to_rgba(unpremultiply(*p));
    }
}

pub(crate) fn rgba8888_pm_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::argb_to_rgba(*p);
    }
}

pub(crate) fn rgbx8888_to_rgba64(dst: &mut [Rgba64], src: &[u32], _: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(0xff000000 | pixel::rgba_to_argb(*s));
    }
}

pub(crate) fn rgba8888_to_rgba64(dst: &mut [Rgba64], src: &[u32], _: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(pixel::rgba_to_argb(*s)).premultiplied();
    }
}

pub(crate) fn rgba8888_pm_to_rgba64(
    dst: &mut [Rgba64],
    src: &[u32],
    _: &PixelLayout,
    _: Option<&[u32]>,
) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_argb32(pixel::rgba_to_argb(*s));
    }
}

/// Order of the 10-bit color channels in a 30-bit pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rgb30Order {
    /// Red in the low bits, blue in bits 20 to 29.
    Bgr,
    /// Blue in the low bits, red in bits 20 to 29.
    Rgb,
}

/// Convert a 2-10-10-10 pixel to `0xAARRGGBB`, truncating each channel to 8 bits.
#[inline]
pub fn a2rgb30_to_argb32(c: u32, order: Rgb30Order) -> u32 {
    let mut a = c >> 30;
    a |= a << 2;
    a |= a << 4;
    match order {
        Rgb30Order::Bgr => {
            (a << 24) | ((c << 14) & 0x00ff0000) | ((c >> 4) & 0x0000ff00) | ((c >> 22) & 0xff)
        }
        Rgb30Order::Rgb => {
            (a << 24) | ((c >> 6) & 0x00ff0000) | ((c >> 4) & 0x0000ff00) | ((c >> 2) & 0xff)
        }
    }
}

#[inline]
fn rgb30_pack(c: u32, order: Rgb30Order) -> u32 {
    match order {
        Rgb30Order::Bgr => {
            ((c << 22) & 0x3fc00000)
                | ((c << 14) & 0x00300000)
                | ((c << 4) & 0x000ff000)
                | ((c >> 4) & 0x00000c00)
                | ((c >> 14) & 0x000003fc)
                | ((c >> 22) & 0x00000003)
        }
        Rgb30Order::Rgb => {
            ((c << 6) & 0x3fc00000)
                | ((c >> 2) & 0x00300000)
                | ((c << 4) & 0x000ff000)
                | ((c >> 4) & 0x00000c00)
                | ((c << 2) & 0x000003fc)
                | ((c >> 6) & 0x00000003)
        }
    }
}

/// Convert a premultiplied `0xAARRGGBB` pixel to 2-10-10-10, reducing alpha to two bits.
#[inline]
pub fn argb32_to_a2rgb30(c: u32, order: Rgb30Order) -> u32 {
    let c = pixel::repremultiply(c, 6);
    (c & 0xc0000000) | rgb30_pack(c, order)
}

/// Convert an opaque `0xAARRGGBB` pixel to 10-10-10 with both alpha bits set.
#[inline]
pub fn rgb32_to_rgb30(c: u32, order: Rgb30Order) -> u32 {
    0xc0000000 | rgb30_pack(c, order)
}

/// Widen a 2-10-10-10 pixel to 16 bits per channel.
#[inline]
pub fn a2rgb30_to_rgba64(c: u32, order: Rgb30Order) -> Rgba64 {
    let mut a = (c >> 30) as u16;
    let hi = ((c >> 20) & 0x3ff) as u16;
    let g = ((c >> 10) & 0x3ff) as u16;
    let lo = (c & 0x3ff) as u16;
    a |= a << 2;
    a |= a << 4;
    a |= a << 8;
    let widen = |v: u16| (v << 6) | (v >> 4);
    let (r, b) = match order {
        Rgb30Order::Bgr => (lo, hi),
        Rgb30Order::Rgb => (hi, lo),
    };
    Rgba64::new(widen(r), widen(g), widen(b), a)
}

/// Reduce alpha of a premultiplied 16-bit color to two bits of precision.
#[inline]
fn repremultiply_rgba64(c: Rgba64) -> Rgba64 {
    if c.is_opaque() || c.is_transparent() {
        return c;
    }
    let u = c.unpremultiplied();
    let a = (65535 / (65535 >> 14)) * (c.a >> 14);
    Rgba64::new(u.r, u.g, u.b, a).premultiplied()
}

/// Narrow a premultiplied 16-bit color to 2-10-10-10.
#[inline]
pub fn rgba64_to_rgb30(c: Rgba64, order: Rgb30Order) -> u32 {
    let c = repremultiply_rgba64(c);
    let a = (c.a >> 14) as u32;
    let r = (c.r >> 6) as u32;
    let g = (c.g >> 6) as u32;
    let b = (c.b >> 6) as u32;
    match order {
        Rgb30Order::Bgr => (a << 30) | (b << 20) | (g << 10) | r,
        Rgb30Order::Rgb => (a << 30) | (r << 20) | (g << 10) | b,
    }
}

fn rgb30_order(l: &PixelLayout) -> Rgb30Order {
    if l.red_shift == 0 {
        Rgb30Order::Bgr
    } else {
        Rgb30Order::Rgb
    }
}

pub(crate) fn a2rgb30_to_argb32_pm(buf: &mut [u32], l: &PixelLayout, _: Option<&[u32]>) {
    let order = rgb30_order(l);
    for p in buf {
        *p = a2rgb30_to_argb32(*p, order);
    }
}

pub(crate) fn rgb30_from_argb32_pm(buf: &mut [u32], l: &PixelLayout) {
    let order = rgb30_order(l);
    for p in buf {
        *p = rgb32_to_rgb30(unpremultiply(*p), order);
    }
}

pub(crate) fn a2rgb30_from_argb32_pm(buf: &mut [u32], l: &PixelLayout) {
    let order = rgb30_order(l);
    for p in buf {
        *p = argb32_to_a2rgb30(*p, order);
    }
}

pub(crate) fn rgb30_from_rgb32(buf: &mut [u32], l: &PixelLayout) {
    let order = rgb30_order(l);
    for p in buf {
        *p = rgb32_to_rgb30(*p, order);
    }
}

pub(crate) fn a2rgb30_to_rgba64_pm(
    dst: &mut [Rgba64],
    src: &[u32],
    l: &PixelLayout,
    _: Option<&[u32]>,
) {
    let order = rgb30_order(l);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = a2rgb30_to_rgba64(*s, order);
    }
}

pub(crate) fn alpha8_to_rgb32(buf: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        *p = pixel::rgba(0, 0, 0, *p);
    }
}

pub(crate) fn alpha8_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::alpha(*p);
    }
}

pub(crate) fn alpha8_to_rgba64(dst: &mut [Rgba64], src: &[u32], _: &PixelLayout, _: Option<&[u32]>) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba64::from_rgba8(0, 0, 0, *s as u8);
    }
}

pub(crate) fn grayscale8_to_rgb32(buf: &mut [u32], _: &PixelLayout, _: Option<&[u32]>) {
    for p in buf {
        *p = pixel::rgb(*p, *p, *p);
    }
}

pub(crate) fn grayscale8_from_argb32_pm(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::gray_of(unpremultiply(*p));
    }
}

pub(crate) fn grayscale8_from_rgb32(buf: &mut [u32], _: &PixelLayout) {
    for p in buf {
        *p = pixel::gray_of(*p);
    }
}

pub(crate) fn grayscale8_to_rgba64(
    dst: &mut [Rgba64],
    src: &[u32],
    _: &PixelLayout,
    _: Option<&[u32]>,
) {
    for (d, s) in dst.iter_mut().zip(src) {
        let g = *s as u8;
        *d = Rgba64::from_rgba8(g, g, g, 255);
    }
}

#[cfg(test)]
mod tests {
    use super::{a2rgb30_to_argb32, argb32_to_a2rgb30, expand, rgba64_to_rgb30, Rgb30Order};
    use crate::Rgba64;

    #[test]
    fn expansion_replicates_top_bits() {
        assert_eq!(expand(0x1f, 5), 0xff);
        assert_eq!(expand(0x3f, 6), 0xff);
        assert_eq!(expand(0xf, 4), 0xff);
        assert_eq!(expand(0x10, 5), 0x84);
        assert_eq!(expand(0xab, 8), 0xab);
    }

    #[test]
    fn rgb30_opaque_round_trip() {
        for order in [Rgb30Order::Bgr, Rgb30Order::Rgb] {
            for p in [0xff000000_u32, 0xffffffff, 0xff102030, 0xff80c0f0] {
                assert_eq!(a2rgb30_to_argb32(argb32_to_a2rgb30(p, order), order), p);
            }
        }
    }

    #[test]
    fn rgb30_channel_positions() {
        let red = Rgba64::new(65535, 0, 0, 65535);
        assert_eq!(rgba64_to_rgb30(red, Rgb30Order::Bgr), 0xc00003ff);
        assert_eq!(rgba64_to_rgb30(red, Rgb30Order::Rgb), 0xfff00000);
    }
}
