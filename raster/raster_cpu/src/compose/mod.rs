// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition functions.
//!
//! Every function combines a run of source pixels with a run of destination pixels in one of
//! the two canonical formats and writes the result over the destination. Operands are always
//! premultiplied. Coverage scales the effect of the mode: zero leaves the destination untouched
//! and 255 applies the mode at full strength.

pub(crate) mod blend;
pub(crate) mod porter_duff;
pub(crate) mod raster_op;

use raster_common::pixel::{self, byte_mul, interpolate_255};
use raster_common::Rgba64;

use crate::mode::CompositionMode;

/// Composite `src` over `dst` in place, with the coverage applying to the whole run.
pub type ComposeFn<P> = fn(dst: &mut [P], src: &[P], coverage: u8);

/// Composite one repeated source color over `dst` in place.
pub type ComposeSolidFn<P> = fn(dst: &mut [P], color: P, coverage: u8);

/// A canonical premultiplied pixel.
///
/// Implemented for packed `0xAARRGGBB` words and for [`Rgba64`]. The composition operators are
/// written once against this trait.
pub trait Premultiplied: Copy + Default + PartialEq + core::fmt::Debug + Send + Sync + 'static {
    /// The maximum channel value.
    const MAX: u32;

    /// Fully transparent black.
    const TRANSPARENT: Self;

    /// Widen an 8-bit coverage to the channel range.
    fn coverage(coverage: u8) -> u32;

    /// The alpha channel.
    fn alpha(self) -> u32;

    /// Scale every channel by `a / MAX`.
    fn mul(self, a: u32) -> Self;

    /// `x * a / MAX + y * b / MAX` with `a + b <= MAX`.
    fn interpolate(x: Self, a: u32, y: Self, b: u32) -> Self;

    /// Channel-wise sum. Callers guarantee that no channel overflows.
    fn add(self, other: Self) -> Self;

    /// Channel-wise sum clamped to `MAX`.
    fn add_saturate(self, other: Self) -> Self;

    /// The channels as `[r, g, b, a]`.
    fn channels(self) -> [u32; 4];

    /// Pack `[r, g, b, a]`. Each channel must be at most `MAX`.
    fn from_channels(channels: [u32; 4]) -> Self;
}

impl Premultiplied for u32 {
    const MAX: u32 = 255;
    const TRANSPARENT: Self = 0;

    #[inline(always)]
    fn coverage(coverage: u8) -> u32 {
        coverage as u32
    }

    #[inline(always)]
    fn alpha(self) -> u32 {
        self >> 24
    }

    #[inline(always)]
    fn mul(self, a: u32) -> Self {
        byte_mul(self, a)
    }

    #[inline(always)]
    fn interpolate(x: Self, a: u32, y: Self, b: u32) -> Self {
        interpolate_255(x, a, y, b)
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline(always)]
    fn add_saturate(self, other: Self) -> Self {
        let [r0, g0, b0, a0] = self.channels();
        let [r1, g1, b1, a1] = other.channels();
        pixel::rgba(
            (r0 + r1).min(255),
            (g0 + g1).min(255),
            (b0 + b1).min(255),
            (a0 + a1).min(255),
        )
    }

    #[inline(always)]
    fn channels(self) -> [u32; 4] {
        [
            pixel::red(self),
            pixel::green(self),
            pixel::blue(self),
            pixel::alpha(self),
        ]
    }

    #[inline(always)]
    fn from_channels([r, g, b, a]: [u32; 4]) -> Self {
        pixel::rgba(r, g, b, a)
    }
}

impl Premultiplied for Rgba64 {
    const MAX: u32 = 65535;
    const TRANSPARENT: Self = Self::TRANSPARENT;

    #[inline(always)]
    fn coverage(coverage: u8) -> u32 {
        coverage as u32 * 257
    }

    #[inline(always)]
    fn alpha(self) -> u32 {
        self.a as u32
    }

    #[inline(always)]
    fn mul(self, a: u32) -> Self {
        self.multiply_alpha_65535(a)
    }

    #[inline(always)]
    fn interpolate(x: Self, a: u32, y: Self, b: u32) -> Self {
        Self::interpolate_65535(x, a, y, b)
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self::new(
            self.r.wrapping_add(other.r),
            self.g.wrapping_add(other.g),
            self.b.wrapping_add(other.b),
            self.a.wrapping_add(other.a),
        )
    }

    #[inline(always)]
    fn add_saturate(self, other: Self) -> Self {
        self.add_with_saturation(other)
    }

    #[inline(always)]
    fn channels(self) -> [u32; 4] {
        [self.r as u32, self.g as u32, self.b as u32, self.a as u32]
    }

    #[inline(always)]
    fn from_channels([r, g, b, a]: [u32; 4]) -> Self {
        Self::new(r as u16, g as u16, b as u16, a as u16)
    }
}

/// A per-pixel composition operator.
pub(crate) trait Operation {
    /// Combine source `s` with destination `d` at widened coverage `ca`.
    ///
    /// `ca` is in `1..=P::MAX`; zero coverage never reaches the operator.
    fn apply<P: Premultiplied>(s: P, d: P, ca: u32) -> P;
}

#[inline(always)]
pub(crate) fn compose<P: Premultiplied, O: Operation>(dst: &mut [P], src: &[P], coverage: u8) {
    if coverage == 0 {
        return;
    }
    let ca = P::coverage(coverage);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = O::apply(*s, *d, ca);
    }
}

#[inline(always)]
pub(crate) fn compose_solid<P: Premultiplied, O: Operation>(dst: &mut [P], color: P, coverage: u8) {
    if coverage == 0 {
        return;
    }
    let ca = P::coverage(coverage);
    for d in dst.iter_mut() {
        *d = O::apply(color, *d, ca);
    }
}

/// The composition function of `mode`, or `None` for raster operations on wide pixels.
pub fn function_for_mode<P: Premultiplied>(mode: CompositionMode) -> Option<ComposeFn<P>> {
    use porter_duff::*;
    Some(match mode {
        CompositionMode::SourceOver => compose::<P, SourceOver>,
        CompositionMode::DestinationOver => compose::<P, DestinationOver>,
        CompositionMode::Clear => compose::<P, Clear>,
        CompositionMode::Source => compose::<P, Source>,
        CompositionMode::Destination => compose::<P, Destination>,
        CompositionMode::SourceIn => compose::<P, SourceIn>,
        CompositionMode::DestinationIn => compose::<P, DestinationIn>,
        CompositionMode::SourceOut => compose::<P, SourceOut>,
        CompositionMode::DestinationOut => compose::<P, DestinationOut>,
        CompositionMode::SourceAtop => compose::<P, SourceAtop>,
        CompositionMode::DestinationAtop => compose::<P, DestinationAtop>,
        CompositionMode::Xor => compose::<P, Xor>,
        CompositionMode::Plus => compose::<P, Plus>,
        mode if mode.is_separable_blend() => return blend::function_for_mode(mode),
        _ => return None,
    })
}

/// The solid composition function of `mode`, or `None` for raster operations on wide pixels.
pub fn solid_function_for_mode<P: Premultiplied>(
    mode: CompositionMode,
) -> Option<ComposeSolidFn<P>> {
    use porter_duff::*;
    Some(match mode {
        CompositionMode::SourceOver => compose_solid::<P, SourceOver>,
        CompositionMode::DestinationOver => compose_solid::<P, DestinationOver>,
        CompositionMode::Clear => compose_solid::<P, Clear>,
        CompositionMode::Source => compose_solid::<P, Source>,
        CompositionMode::Destination => compose_solid::<P, Destination>,
        CompositionMode::SourceIn => compose_solid::<P, SourceIn>,
        CompositionMode::DestinationIn => compose_solid::<P, DestinationIn>,
        CompositionMode::SourceOut => compose_solid::<P, SourceOut>,
        CompositionMode::DestinationOut => compose_solid::<P, DestinationOut>,
        CompositionMode::SourceAtop => compose_solid::<P, SourceAtop>,
        CompositionMode::DestinationAtop => compose_solid::<P, DestinationAtop>,
        CompositionMode::Xor => compose_solid::<P, Xor>,
        CompositionMode::Plus => compose_solid::<P, Plus>,
        mode if mode.is_separable_blend() => return blend::solid_function_for_mode(mode),
        _ => return None,
    })
}

/// The 8-bit composition function of `mode`, including raster operations.
pub fn function_for_mode_32(mode: CompositionMode) -> ComposeFn<u32> {
    function_for_mode::<u32>(mode).unwrap_or_else(|| raster_op::function_for_mode(mode))
}

/// The 8-bit solid composition function of `mode`, including raster operations.
pub fn solid_function_for_mode_32(mode: CompositionMode) -> ComposeSolidFn<u32> {
    solid_function_for_mode::<u32>(mode).unwrap_or_else(|| raster_op::solid_function_for_mode(mode))
}
