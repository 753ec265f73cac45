// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Word-parallel variants of the hottest 8-bit operators.
//!
//! The four channels of a pixel are spread into the 16-bit lanes of a `u64`, so one multiply
//! scales all of them. Results are bit-identical to the per-channel-pair arithmetic in
//! [`raster_common::pixel`].

const LANES: u64 = 0x00ff_00ff_00ff_00ff;
const HALF: u64 = 0x0080_0080_0080_0080;

/// Spread `0xAARRGGBB` into lanes `[B, R, G, A]`.
#[inline(always)]
fn spread(x: u32) -> u64 {
    let x = x as u64;
    (x | x << 24) & LANES
}

/// Divide every lane by 255 and pack it back.
#[inline(always)]
fn pack(t: u64) -> u32 {
    let t = ((t + ((t >> 8) & LANES) + HALF) >> 8) & LANES;
    t as u32 | (t >> 24) as u32
}

/// Multiply every channel of `x` by `a / 255`.
#[inline(always)]
pub(crate) fn byte_mul(x: u32, a: u32) -> u32 {
    pack(spread(x) * a as u64)
}

/// `x * a / 255 + y * b / 255` for every channel. Requires `a + b <= 255`.
#[inline(always)]
pub(crate) fn interpolate_255(x: u32, a: u32, y: u32, b: u32) -> u32 {
    pack(spread(x) * a as u64 + spread(y) * b as u64)
}

#[inline(always)]
fn source_over(s: u32, d: u32) -> u32 {
    match s >> 24 {
        255 => s,
        0 => d,
        a => s.wrapping_add(byte_mul(d, 255 - a)),
    }
}

pub(crate) fn compose_source_over(dst: &mut [u32], src: &[u32], coverage: u8) {
    let ca = coverage as u32;
    match ca {
        0 => {}
        255 => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = source_over(*s, *d);
            }
        }
        _ => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = source_over(byte_mul(*s, ca), *d);
            }
        }
    }
}

pub(crate) fn compose_solid_source_over(dst: &mut [u32], color: u32, coverage: u8) {
    let ca = coverage as u32;
    if ca == 0 {
        return;
    }
    let s = if ca == 255 { color } else { byte_mul(color, ca) };
    match s >> 24 {
        255 => dst.fill(s),
        0 => {}
        a => {
            let ia = 255 - a;
            for d in dst.iter_mut() {
                *d = s.wrapping_add(byte_mul(*d, ia));
            }
        }
    }
}

pub(crate) fn compose_source(dst: &mut [u32], src: &[u32], coverage: u8) {
    let ca = coverage as u32;
    match ca {
        0 => {}
        255 => {
            let n = dst.len().min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
        _ => {
            let cia = 255 - ca;
            for (d, s) in dst.iter_mut().zip(src) {
                *d = interpolate_255(*s, ca, *d, cia);
            }
        }
    }
}

pub(crate) fn compose_solid_source(dst: &mut [u32], color: u32, coverage: u8) {
    let ca = coverage as u32;
    match ca {
        0 => {}
        255 => dst.fill(color),
        _ => {
            let cia = 255 - ca;
            for d in dst.iter_mut() {
                *d = interpolate_255(color, ca, *d, cia);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::function_for_mode_32;
    use crate::compose::solid_function_for_mode_32;
    use crate::mode::CompositionMode;
    use raster_common::pixel;

    /// A deterministic spread of pixels covering extreme and mid values.
    fn samples() -> Vec<u32> {
        let mut state = 0x1234_5678_u32;
        let mut out = vec![0, 0xffffffff, 0xff000000, 0x80808080, 0x01010101, 0xfefefefe];
        for _ in 0..200 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            out.push(pixel::premultiply(state));
        }
        out
    }

    #[test]
    fn byte_mul_is_bit_exact() {
        for x in samples() {
            for a in 0..=255 {
                assert_eq!(byte_mul(x, a), pixel::byte_mul(x, a), "{x:08x} * {a}");
            }
        }
    }

    #[test]
    fn interpolate_is_bit_exact() {
        let samples = samples();
        for (x, y) in samples.iter().zip(samples.iter().rev()) {
            for a in (0..=255).step_by(7) {
                let b = 255 - a;
                assert_eq!(
                    interpolate_255(*x, a, *y, b),
                    pixel::interpolate_255(*x, a, *y, b)
                );
            }
        }
    }

    #[test]
    fn operators_match_the_scalar_path() {
        let src = samples();
        let dst: Vec<u32> = src.iter().rev().copied().collect();
        for coverage in [0_u8, 1, 77, 128, 254, 255] {
            for (mode, wide, wide_solid) in [
                (
                    CompositionMode::SourceOver,
                    compose_source_over as fn(&mut [u32], &[u32], u8),
                    compose_solid_source_over as fn(&mut [u32], u32, u8),
                ),
                (CompositionMode::Source, compose_source, compose_solid_source),
            ] {
                let mut expected = dst.clone();
                function_for_mode_32(mode)(&mut expected, &src, coverage);
                let mut actual = dst.clone();
                wide(&mut actual, &src, coverage);
                assert_eq!(actual, expected, "{mode:?} at {coverage}");

                for color in [src[3], src[10], 0xff336699] {
                    let mut expected = dst.clone();
                    solid_function_for_mode_32(mode)(&mut expected, color, coverage);
                    let mut actual = dst.clone();
                    wide_solid(&mut actual, color, coverage);
                    assert_eq!(actual, expected, "solid {mode:?} at {coverage}");
                }
            }
        }
    }
}
