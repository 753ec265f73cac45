// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arithmetic on canonical 32-bit pixels.
//!
//! A canonical pixel is a `u32` holding `0xAARRGGBB` with premultiplied color channels. The
//! helpers here work on two channels at once by keeping red and blue in the `0x00ff00ff` lanes
//! and alpha and green in the `0xff00ff00` lanes.

/// The alpha channel of a `0xAARRGGBB` pixel.
#[inline(always)]
pub const fn alpha(p: u32) -> u32 {
    p >> 24
}

/// The red channel of a `0xAARRGGBB` pixel.
#[inline(always)]
pub const fn red(p: u32) -> u32 {
    (p >> 16) & 0xff
}

/// The green channel of a `0xAARRGGBB` pixel.
#[inline(always)]
pub const fn green(p: u32) -> u32 {
    (p >> 8) & 0xff
}

/// The blue channel of a `0xAARRGGBB` pixel.
#[inline(always)]
pub const fn blue(p: u32) -> u32 {
    p & 0xff
}

/// Pack four 8-bit channels into `0xAARRGGBB`. Only the low byte of each argument is used.
#[inline(always)]
pub const fn rgba(r: u32, g: u32, b: u32, a: u32) -> u32 {
    ((a & 0xff) << 24) | ((r & 0xff) << 16) | ((g & 0xff) << 8) | (b & 0xff)
}

/// Pack an opaque color.
#[inline(always)]
pub const fn rgb(r: u32, g: u32, b: u32) -> u32 {
    rgba(r, g, b, 0xff)
}

/// Luminance approximation with weights 11, 16 and 5 out of 32.
#[inline(always)]
pub const fn gray(r: u32, g: u32, b: u32) -> u32 {
    (r * 11 + g * 16 + b * 5) / 32
}

/// Luminance of a `0xAARRGGBB` pixel, ignoring alpha.
#[inline(always)]
pub const fn gray_of(p: u32) -> u32 {
    gray(red(p), green(p), blue(p))
}

/// Approximate division by 255 for values up to `255 * 255 + 255`.
///
/// Exact for all products of two 8-bit values.
#[inline(always)]
pub const fn div_255(val: u32) -> u32 {
    (val + (val >> 8) + 0x80) >> 8
}

/// Approximate division by 65535 for values up to `65535 * 65535`.
///
/// Exact for all products of two 16-bit values.
#[inline(always)]
pub const fn div_65535(val: u32) -> u32 {
    ((val as u64 + (val as u64 >> 16) + 0x8000) >> 16) as u32
}

/// Multiply every channel of `x` by `a / 255`, rounding.
#[inline(always)]
pub const fn byte_mul(x: u32, a: u32) -> u32 {
    let mut t = (x & 0xff00ff) * a;
    t = (t + ((t >> 8) & 0xff00ff) + 0x800080) >> 8;
    t &= 0xff00ff;

    let mut x = ((x >> 8) & 0xff00ff) * a;
    x = x + ((x >> 8) & 0xff00ff) + 0x800080;
    x &= 0xff00ff00;
    x | t
}

/// `x * a / 255 + y * b / 255` for every channel. Requires `a + b <= 255`.
#[inline(always)]
pub const fn interpolate_255(x: u32, a: u32, y: u32, b: u32) -> u32 {
    let mut t = (x & 0xff00ff) * a + (y & 0xff00ff) * b;
    t = (t + ((t >> 8) & 0xff00ff) + 0x800080) >> 8;
    t &= 0xff00ff;

    let mut x = ((x >> 8) & 0xff00ff) * a + ((y >> 8) & 0xff00ff) * b;
    x = x + ((x >> 8) & 0xff00ff) + 0x800080;
    x &= 0xff00ff00;
    x | t
}

/// `(x * a + y * b) / 256` for every channel, truncating. Requires `a + b <= 256`.
#[inline(always)]
pub const fn interpolate_256(x: u32, a: u32, y: u32, b: u32) -> u32 {
    let mut t = (x & 0xff00ff) * a + (y & 0xff00ff) * b;
    t >>= 8;
    t &= 0xff00ff;

    let mut x = ((x >> 8) & 0xff00ff) * a + ((y >> 8) & 0xff00ff) * b;
    x &= 0xff00ff00;
    x | t
}

/// Bilinear interpolation with 8-bit weights.
#[inline(always)]
pub const fn interpolate_4_pixels(tl: u32, tr: u32, bl: u32, br: u32, distx: u32, disty: u32) -> u32 {
    let idistx = 256 - distx;
    let idisty = 256 - disty;
    let xtop = interpolate_256(tl, idistx, tr, distx);
    let xbot = interpolate_256(bl, idistx, br, distx);
    interpolate_256(xtop, idisty, xbot, disty)
}

/// Bilinear interpolation with 4-bit weights. `distx` and `disty` are in `0..16`.
#[inline(always)]
pub const fn interpolate_4_pixels_16(
    tl: u32,
    tr: u32,
    bl: u32,
    br: u32,
    distx: u32,
    disty: u32,
) -> u32 {
    let distxy = distx * disty;
    let tlw = 256 - 16 * distx - 16 * disty + distxy;
    let trw = 16 * distx - distxy;
    let blw = 16 * disty - distxy;
    let brw = distxy;

    let rb = (tl & 0x00ff00ff) * tlw
        + (tr & 0x00ff00ff) * trw
        + (bl & 0x00ff00ff) * blw
        + (br & 0x00ff00ff) * brw;
    let ag = ((tl & 0xff00ff00) >> 8) * tlw
        + ((tr & 0xff00ff00) >> 8) * trw
        + ((bl & 0xff00ff00) >> 8) * blw
        + ((br & 0xff00ff00) >> 8) * brw;

    ((rb >> 8) & 0x00ff00ff) | (ag & 0xff00ff00)
}

/// Premultiply the color channels of a `0xAARRGGBB` pixel by its alpha.
#[inline]
pub const fn premultiply(x: u32) -> u32 {
    let a = alpha(x);
    let mut t = (x & 0xff00ff) * a;
    t = (t + ((t >> 8) & 0xff00ff) + 0x800080) >> 8;
    t &= 0xff00ff;

    let mut g = ((x >> 8) & 0xff) * a;
    g = g + ((g >> 8) & 0xff) + 0x80;
    g &= 0xff00;
    g | t | (a << 24)
}

/// Divide the color channels of a premultiplied pixel by its alpha.
///
/// Opaque pixels and pixels with zero alpha are returned unchanged. Channels larger than alpha
/// saturate at 255.
#[inline]
pub const fn unpremultiply(p: u32) -> u32 {
    let a = alpha(p);
    if a == 255 || a == 0 {
        return p;
    }
    let inv = (255 << 16) / a;
    rgba(
        unpremultiply_channel(red(p), inv),
        unpremultiply_channel(green(p), inv),
        unpremultiply_channel(blue(p), inv),
        a,
    )
}

#[inline(always)]
const fn unpremultiply_channel(c: u32, inv: u32) -> u32 {
    let v = (c * inv + 0x8000) >> 16;
    if v > 255 {
        255
    } else {
        v
    }
}

/// Unpremultiply, reduce alpha to `8 - shift` bits of precision and premultiply again.
///
/// Used before packing into formats with a narrow alpha channel so that the color channels never
/// exceed the alpha that survives packing.
#[inline]
pub const fn repremultiply(p: u32, shift: u32) -> u32 {
    let a = alpha(p);
    if a == 255 || a == 0 {
        return p;
    }
    let p = unpremultiply(p);
    let new_alpha = (255 / (255 >> shift)) * (a >> shift);
    premultiply((p & 0x00ff_ffff) | (new_alpha << 24))
}

/// Swap the red and blue bytes. Converts `0xAARRGGBB` to the little-endian RGBA byte order and
/// back.
#[inline(always)]
pub const fn swap_red_blue(x: u32) -> u32 {
    let ag = x & 0xff00ff00;
    let rg = x & 0x00ff00ff;
    ag | (rg << 16) | (rg >> 16)
}

/// Convert a pixel stored as R, G, B, A bytes to `0xAARRGGBB`.
#[inline(always)]
pub const fn rgba_to_argb(x: u32) -> u32 {
    if cfg!(target_endian = "little") {
        swap_red_blue(x)
    } else {
        x.rotate_right(8)
    }
}

/// Convert `0xAARRGGBB` to a pixel stored as R, G, B, A bytes.
#[inline(always)]
pub const fn argb_to_rgba(x: u32) -> u32 {
    if cfg!(target_endian = "little") {
        swap_red_blue(x)
    } else {
        x.rotate_left(8)
    }
}

/// Expand an RGB565 value to an opaque `0xAARRGGBB` pixel.
#[inline(always)]
pub const fn rgb16_to_32(c: u16) -> u32 {
    let c = c as u32;
    0xff000000
        | (((c << 3) & 0xf8) | ((c >> 2) & 0x7))
        | (((c << 5) & 0xfc00) | ((c >> 1) & 0x300))
        | (((c << 8) & 0xf80000) | ((c << 3) & 0x70000))
}

/// Truncate a `0xAARRGGBB` pixel to RGB565, dropping alpha.
#[inline(always)]
pub const fn rgb32_to_16(c: u32) -> u16 {
    (((c >> 3) & 0x001f) | ((c >> 5) & 0x07e0) | ((c >> 8) & 0xf800)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_255_matches_rounding() {
        for a in 0..=255_u32 {
            for b in 0..=255_u32 {
                assert_eq!(div_255(a * b), ((a * b) as f32 / 255.0).round() as u32);
            }
        }
    }

    #[test]
    fn byte_mul_bounds() {
        assert_eq!(byte_mul(0xffffffff, 255), 0xffffffff);
        assert_eq!(byte_mul(0xffffffff, 0), 0);
        assert_eq!(byte_mul(0x80402010, 128), 0x40201008);
    }

    #[test]
    fn premultiply_never_exceeds_alpha() {
        for a in 0..=255 {
            for c in [0, 1, 17, 128, 200, 255] {
                let p = premultiply(rgba(c, 255 - c, c / 2, a));
                assert!(red(p) <= a && green(p) <= a && blue(p) <= a);
                assert_eq!(alpha(p), a);
            }
        }
    }

    #[test]
    fn premultiply_unpremultiply_opaque_identity() {
        let p = 0xff123456;
        assert_eq!(premultiply(p), p);
        assert_eq!(unpremultiply(p), p);
        assert_eq!(unpremultiply(0x00000000), 0);
    }

    #[test]
    fn rgb16_round_trip() {
        for v in [0_u16, 0xffff, 0xf800, 0x07e0, 0x001f, 0x1234] {
            assert_eq!(rgb32_to_16(rgb16_to_32(v)), v);
        }
        assert_eq!(rgb16_to_32(0xffff), 0xffffffff);
    }

    #[test]
    fn swap_is_involution() {
        assert_eq!(swap_red_blue(0x11223344), 0x11443322);
        assert_eq!(swap_red_blue(swap_red_blue(0x11223344)), 0x11223344);
    }

    #[test]
    fn bilinear_corners() {
        let (tl, tr, bl, br) = (0xff000000, 0xffffffff, 0xff00ff00, 0xffff0000);
        assert_eq!(interpolate_4_pixels(tl, tr, bl, br, 0, 0), tl);
        assert_eq!(interpolate_4_pixels_16(tl, tr, bl, br, 0, 0), tl);
    }
}
