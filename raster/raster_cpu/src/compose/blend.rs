// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Separable blend modes on premultiplied channels.
//!
//! Each mode computes one color channel from the source and destination channels and alphas,
//! including the `s * (1 - da) + d * (1 - sa)` terms of source over. Alpha always follows
//! source over. Arithmetic is done in `i64` so that the same formulas serve 8-bit and 16-bit
//! channels.

use super::{compose, compose_solid, ComposeFn, ComposeSolidFn, Operation, Premultiplied};
use crate::mode::CompositionMode;

/// Approximate division by `m`, exact for products of two channel values.
#[inline(always)]
fn div(x: i64, m: i64) -> i64 {
    if m == 255 {
        (x + (x >> 8) + 0x80) >> 8
    } else {
        (x + (x >> 16) + 0x8000) >> 16
    }
}

trait Separable {
    /// One color channel of the premultiplied result before clamping.
    fn channel(s: i64, d: i64, sa: i64, da: i64, m: i64) -> i64;
}

struct Blend<B>(core::marker::PhantomData<B>);

impl<B: Separable> Operation for Blend<B> {
    #[inline(always)]
    fn apply<P: Premultiplied>(s: P, d: P, ca: u32) -> P {
        let m = P::MAX as i64;
        let [sr, sg, sb, sa] = s.channels().map(i64::from);
        let [dr, dg, db, da] = d.channels().map(i64::from);
        let clamp = |v: i64| v.clamp(0, m) as u32;
        let result = P::from_channels([
            clamp(B::channel(sr, dr, sa, da, m)),
            clamp(B::channel(sg, dg, sa, da, m)),
            clamp(B::channel(sb, db, sa, da, m)),
            clamp(sa + da - div(sa * da, m)),
        ]);
        if ca == P::MAX {
            result
        } else {
            P::interpolate(result, ca, d, P::MAX - ca)
        }
    }
}

macro_rules! separable_mix {
    ($name:ident, |$s:ident, $d:ident, $sa:ident, $da:ident, $m:ident| $calc:expr) => {
        pub(crate) struct $name;

        impl Separable for $name {
            #[inline(always)]
            #[allow(unused_variables, reason = "not every mode reads every operand")]
            fn channel($s: i64, $d: i64, $sa: i64, $da: i64, $m: i64) -> i64 {
                $calc
            }
        }
    };
}

/// The source over terms shared by most modes.
#[inline(always)]
fn over(s: i64, d: i64, sa: i64, da: i64, m: i64) -> i64 {
    s * (m - da) + d * (m - sa)
}

separable_mix!(Multiply, |s, d, sa, da, m| div(s * d + over(s, d, sa, da, m), m));

separable_mix!(Screen, |s, d, sa, da, m| s + d - div(s * d, m));

separable_mix!(Overlay, |s, d, sa, da, m| {
    let temp = over(s, d, sa, da, m);
    if 2 * d < da {
        div(2 * s * d + temp, m)
    } else {
        div(sa * da - 2 * (da - d) * (sa - s) + temp, m)
    }
});

separable_mix!(Darken, |s, d, sa, da, m| {
    div((s * da).min(d * sa) + over(s, d, sa, da, m), m)
});

separable_mix!(Lighten, |s, d, sa, da, m| {
    div((s * da).max(d * sa) + over(s, d, sa, da, m), m)
});

separable_mix!(ColorDodge, |s, d, sa, da, m| {
    let sa_da = sa * da;
    let d_sa = d * sa;
    let s_da = s * da;
    let temp = over(s, d, sa, da, m);
    if s_da + d_sa >= sa_da {
        div(sa_da + temp, m)
    } else if s == sa || sa == 0 {
        div(temp, m)
    } else {
        div(m * d_sa / (m - m * s / sa) + temp, m)
    }
});

separable_mix!(ColorBurn, |s, d, sa, da, m| {
    let sa_da = sa * da;
    let d_sa = d * sa;
    let s_da = s * da;
    let temp = over(s, d, sa, da, m);
    if s_da + d_sa <= sa_da {
        div(temp, m)
    } else if s == 0 {
        div(d_sa + temp, m)
    } else {
        div(sa * (s_da + d_sa - sa_da) / s + temp, m)
    }
});

separable_mix!(HardLight, |s, d, sa, da, m| {
    let temp = over(s, d, sa, da, m);
    if 2 * s < sa {
        div(2 * s * d + temp, m)
    } else {
        div(sa * da - 2 * (da - d) * (sa - s) + temp, m)
    }
});

separable_mix!(SoftLight, |s, d, sa, da, m| {
    let s2 = 2 * s;
    let d_np = if da == 0 { 0 } else { m * d / da };
    let temp = over(s, d, sa, da, m) * m;
    let mm = m * m;
    if s2 < sa {
        (d * (sa * m + (s2 - sa) * (m - d_np)) + temp) / mm
    } else if 4 * d <= da {
        let curve = ((16 * d_np - 12 * m) * d_np + 3 * mm) * d_np / mm;
        (d * sa * m + da * (s2 - sa) * curve + temp) / mm
    } else {
        let root = ((d_np * m) as f64).sqrt() as i64;
        (d * sa * m + da * (s2 - sa) * (root - d_np) + temp) / mm
    }
});

separable_mix!(Difference, |s, d, sa, da, m| {
    s + d - div(2 * (s * da).min(d * sa), m)
});

separable_mix!(Exclusion, |s, d, sa, da, m| s + d - div(2 * s * d, m));

pub(crate) fn function_for_mode<P: Premultiplied>(mode: CompositionMode) -> Option<ComposeFn<P>> {
    Some(match mode {
        CompositionMode::Multiply => compose::<P, Blend<Multiply>>,
        CompositionMode::Screen => compose::<P, Blend<Screen>>,
        CompositionMode::Overlay => compose::<P, Blend<Overlay>>,
        CompositionMode::Darken => compose::<P, Blend<Darken>>,
        CompositionMode::Lighten => compose::<P, Blend<Lighten>>,
        CompositionMode::ColorDodge => compose::<P, Blend<ColorDodge>>,
        CompositionMode::ColorBurn => compose::<P, Blend<ColorBurn>>,
        CompositionMode::HardLight => compose::<P, Blend<HardLight>>,
        CompositionMode::SoftLight => compose::<P, Blend<SoftLight>>,
        CompositionMode::Difference => compose::<P, Blend<Difference>>,
        CompositionMode::Exclusion => compose::<P, Blend<Exclusion>>,
        _ => return None,
    })
}

pub(crate) fn solid_function_for_mode<P: Premultiplied>(
    mode: CompositionMode,
) -> Option<ComposeSolidFn<P>> {
    Some(match mode {
        CompositionMode::Multiply => compose_solid::<P, Blend<Multiply>>,
        CompositionMode::Screen => compose_solid::<P, Blend<Screen>>,
        CompositionMode::Overlay => compose_solid::<P, Blend<Overlay>>,
        CompositionMode::Darken => compose_solid::<P, Blend<Darken>>,
        CompositionMode::Lighten => compose_solid::<P, Blend<Lighten>>,
        CompositionMode::ColorDodge => compose_solid::<P, Blend<ColorDodge>>,
        CompositionMode::ColorBurn => compose_solid::<P, Blend<ColorBurn>>,
        CompositionMode::HardLight => compose_solid::<P, Blend<HardLight>>,
        CompositionMode::SoftLight => compose_solid::<P, Blend<SoftLight>>,
        CompositionMode::Difference => compose_solid::<P, Blend<Difference>>,
        CompositionMode::Exclusion => compose_solid::<P, Blend<Exclusion>>,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::Rgba64;

    fn blend(mode: CompositionMode, src: u32, dst: u32) -> u32 {
        let mut d = [dst];
        function_for_mode::<u32>(mode).unwrap()(&mut d, &[src], 255);
        d[0]
    }

    #[test]
    fn multiply_by_white_is_identity() {
        assert_eq!(blend(CompositionMode::Multiply, 0xffffffff, 0xff336699), 0xff336699);
        assert_eq!(blend(CompositionMode::Multiply, 0xff000000, 0xff336699), 0xff000000);
    }

    #[test]
    fn screen_with_black_is_identity() {
        assert_eq!(blend(CompositionMode::Screen, 0xff000000, 0xff336699), 0xff336699);
    }

    #[test]
    fn darken_and_lighten_pick_channels() {
        assert_eq!(blend(CompositionMode::Darken, 0xff80ff00, 0xff00ff80), 0xff00ff00);
        assert_eq!(blend(CompositionMode::Lighten, 0xff80ff00, 0xff00ff80), 0xff80ff80);
    }

    #[test]
    fn difference_of_equal_colors_is_black() {
        assert_eq!(blend(CompositionMode::Difference, 0xff336699, 0xff336699), 0xff000000);
    }

    #[test]
    fn transparent_source_keeps_destination() {
        for mode in CompositionMode::ALL.into_iter().filter(|m| m.is_separable_blend()) {
            assert_eq!(blend(mode, 0, 0xff336699), 0xff336699, "{mode:?}");
        }
    }

    #[test]
    fn wide_channels_agree_with_narrow() {
        let pairs = [(0xff336699_u32, 0xff996633_u32), (0x80402010, 0xc0604020), (0xffffffff, 0x40404040)];
        for mode in CompositionMode::ALL.into_iter().filter(|m| m.is_separable_blend()) {
            for (s, d) in pairs {
                let narrow = blend(mode, s, d);
                let mut wide = [Rgba64::from_argb32(d)];
                function_for_mode::<Rgba64>(mode).unwrap()(&mut wide, &[Rgba64::from_argb32(s)], 255);
                let w = wide[0].to_argb32();
                for shift in [0, 8, 16, 24] {
                    let a = (narrow >> shift) & 0xff;
                    let b = (w >> shift) & 0xff;
                    assert!(a.abs_diff(b) <= 3, "{mode:?} {s:08x} {d:08x}: {narrow:08x} vs {w:08x}");
                }
            }
        }
    }
}
