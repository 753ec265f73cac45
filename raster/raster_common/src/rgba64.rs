// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The 16-bit per channel canonical pixel.

use bytemuck::{Pod, Zeroable};

use crate::pixel::{self, div_65535};

/// A color with 16 bits per channel.
///
/// As a canonical pixel it is always premultiplied. It is also used unpremultiplied for
/// gradient stops before they are baked into a [`GradientTable`](crate::GradientTable).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba64 {
    /// Red channel.
    pub r: u16,
    /// Green channel.
    pub g: u16,
    /// Blue channel.
    pub b: u16,
    /// Alpha channel.
    pub a: u16,
}

static_assertions::assert_eq_size!(Rgba64, u64);

/// Division by 257 rounding to the nearest integer, mapping `0..=65535` onto `0..=255`.
#[inline(always)]
const fn div_257(x: u32) -> u32 {
    (x - (x >> 8) + 0x80) >> 8
}

#[inline(always)]
const fn unpremultiply_channel(c: u16, a: u64) -> u16 {
    let v = (c as u64 * 65535 + a / 2) / a;
    if v > 65535 {
        65535
    } else {
        v as u16
    }
}

impl Rgba64 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a new color from 16-bit channels.
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Widen 8-bit channels by replication.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as u16 * 257,
            g as u16 * 257,
            b as u16 * 257,
            a as u16 * 257,
        )
    }

    /// Widen a `0xAARRGGBB` pixel. Premultiplication is preserved as is.
    pub const fn from_argb32(p: u32) -> Self {
        Self::from_rgba8(
            pixel::red(p) as u8,
            pixel::green(p) as u8,
            pixel::blue(p) as u8,
            pixel::alpha(p) as u8,
        )
    }

    /// Narrow to a `0xAARRGGBB` pixel, rounding.
    pub const fn to_argb32(self) -> u32 {
        pixel::rgba(
            div_257(self.r as u32),
            div_257(self.g as u32),
            div_257(self.b as u32),
            div_257(self.a as u32),
        )
    }

    /// Whether alpha is at its maximum.
    pub const fn is_opaque(self) -> bool {
        self.a == u16::MAX
    }

    /// Whether alpha is zero.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Multiply the color channels by alpha.
    pub const fn premultiplied(self) -> Self {
        if self.is_opaque() {
            return self;
        }
        if self.is_transparent() {
            return Self::TRANSPARENT;
        }
        let a = self.a as u32;
        Self::new(
            div_65535(self.r as u32 * a) as u16,
            div_65535(self.g as u32 * a) as u16,
            div_65535(self.b as u32 * a) as u16,
            self.a,
        )
    }

    /// Divide the color channels by alpha. Opaque and fully transparent colors are unchanged.
    pub const fn unpremultiplied(self) -> Self {
        if self.is_opaque() || self.is_transparent() {
            return self;
        }
        let a = self.a as u64;
        Self::new(
            unpremultiply_channel(self.r, a),
            unpremultiply_channel(self.g, a),
            unpremultiply_channel(self.b, a),
            self.a,
        )
    }

    /// Scale every channel by `alpha / 65535`.
    #[inline]
    pub const fn multiply_alpha_65535(self, alpha: u32) -> Self {
        Self::new(
            div_65535(self.r as u32 * alpha) as u16,
            div_65535(self.g as u32 * alpha) as u16,
            div_65535(self.b as u32 * alpha) as u16,
            div_65535(self.a as u32 * alpha) as u16,
        )
    }

    /// Scale every channel by `alpha / 255`.
    #[inline]
    pub const fn multiply_alpha_255(self, alpha: u32) -> Self {
        self.multiply_alpha_65535(alpha * 257)
    }

    /// Scale every channel by `alpha / 256`, truncating.
    #[inline]
    pub const fn multiply_alpha_256(self, alpha: u32) -> Self {
        Self::new(
            ((self.r as u32 * alpha) >> 8) as u16,
            ((self.g as u32 * alpha) >> 8) as u16,
            ((self.b as u32 * alpha) >> 8) as u16,
            ((self.a as u32 * alpha) >> 8) as u16,
        )
    }

    /// Scale only alpha by `alpha256 / 256`. Used on unpremultiplied colors.
    #[inline]
    pub const fn combine_alpha_256(self, alpha256: u32) -> Self {
        Self::new(
            self.r,
            self.g,
            self.b,
            ((self.a as u32 * alpha256) >> 8) as u16,
        )
    }

    /// Channel-wise wrapping sum. Callers guarantee that the weights sum to at most one.
    #[inline]
    const fn add(self, o: Self) -> Self {
        Self::new(
            self.r.wrapping_add(o.r),
            self.g.wrapping_add(o.g),
            self.b.wrapping_add(o.b),
            self.a.wrapping_add(o.a),
        )
    }

    /// Channel-wise saturating sum.
    #[inline]
    pub const fn add_with_saturation(self, o: Self) -> Self {
        Self::new(
            self.r.saturating_add(o.r),
            self.g.saturating_add(o.g),
            self.b.saturating_add(o.b),
            self.a.saturating_add(o.a),
        )
    }

    /// `x * a1 / 256 + y * a2 / 256` with `a1 + a2 <= 256`.
    #[inline]
    pub const fn interpolate_256(x: Self, a1: u32, y: Self, a2: u32) -> Self {
        x.multiply_alpha_256(a1).add(y.multiply_alpha_256(a2))
    }

    /// `x * a1 / 255 + y * a2 / 255` with `a1 + a2 <= 255`.
    #[inline]
    pub const fn interpolate_255(x: Self, a1: u32, y: Self, a2: u32) -> Self {
        x.multiply_alpha_255(a1).add(y.multiply_alpha_255(a2))
    }

    /// `x * a1 / 65535 + y * a2 / 65535` with `a1 + a2 <= 65535`.
    #[inline]
    pub const fn interpolate_65535(x: Self, a1: u32, y: Self, a2: u32) -> Self {
        x.multiply_alpha_65535(a1).add(y.multiply_alpha_65535(a2))
    }

    /// Bilinear interpolation with 16-bit fractions, reduced to 8-bit weights.
    #[inline]
    pub const fn interpolate_4(tl: Self, tr: Self, bl: Self, br: Self, distx: u32, disty: u32) -> Self {
        let dx = distx >> 8;
        let dy = disty >> 8;
        let idx = 256 - dx;
        let idy = 256 - dy;
        let xtop = Self::interpolate_256(tl, idx, tr, dx);
        let xbot = Self::interpolate_256(bl, idx, br, dx);
        Self::interpolate_256(xtop, idy, xbot, dy)
    }
}

impl From<u32> for Rgba64 {
    fn from(p: u32) -> Self {
        Self::from_argb32(p)
    }
}
