// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precomputed gradient color lookup tables.

use peniko::color::{AlphaColor, Srgb};
use peniko::Extend;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::rgba64::Rgba64;

/// Number of entries in a gradient lookup table.
pub const GRADIENT_TABLE_SIZE: usize = 1024;

/// Fractional bits of the fixed-point gradient positions used by the linear fast path.
pub const FIXPT_BITS: u32 = 8;

/// One in the fixed-point gradient position format.
pub const FIXPT_SIZE: i32 = 1 << FIXPT_BITS;

const TABLE_SIZE_I32: i32 = GRADIENT_TABLE_SIZE as i32;

/// How colors between two stops are blended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpolationMode {
    /// Interpolate premultiplied colors.
    #[default]
    Color,
    /// Interpolate unpremultiplied channels, premultiplying each result.
    Component,
}

/// A color at a position along a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position in `[0, 1]`.
    pub offset: f32,
    /// Unpremultiplied color.
    pub color: Rgba64,
}

impl GradientStop {
    /// Create a stop from an sRGB color. The offset is clamped to `[0, 1]`.
    pub fn new(offset: f32, color: AlphaColor<Srgb>) -> Self {
        let c = color.to_rgba8();
        Self {
            offset: sanitize_offset(offset),
            color: Rgba64::from_rgba8(c.r, c.g, c.b, c.a),
        }
    }
}

fn sanitize_offset(offset: f32) -> f32 {
    if offset.is_nan() {
        0.0
    } else {
        offset.clamp(0.0, 1.0)
    }
}

/// Round half up, as the table generation expects.
#[inline]
fn round(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// A 1024-entry color ramp together with its spread policy.
///
/// Entries are premultiplied and available at both canonical precisions. The table is
/// immutable once built.
#[derive(Clone, Debug)]
pub struct GradientTable {
    colors64: Box<[Rgba64; GRADIENT_TABLE_SIZE]>,
    colors32: Box<[u32; GRADIENT_TABLE_SIZE]>,
    spread: Extend,
    alpha_color: bool,
}

impl GradientTable {
    /// Bake `stops` into a lookup table.
    ///
    /// Stops are sorted by offset. `opacity` scales every stop's alpha by `opacity / 256` and
    /// is clamped to `0..=256`.
    pub fn new(
        stops: &[GradientStop],
        spread: Extend,
        mode: InterpolationMode,
        opacity: u32,
    ) -> Result<Self> {
        if stops.is_empty() {
            return Err(Error::NoColorStops);
        }
        let opacity = opacity.min(256);
        let mut sorted: SmallVec<[GradientStop; 4]> = stops
            .iter()
            .map(|s| GradientStop {
                offset: sanitize_offset(s.offset),
                color: s.color,
            })
            .collect();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        log::trace!(
            "building gradient table from {} stops, {:?} interpolation",
            sorted.len(),
            mode
        );

        let mut colors64 = Box::new([Rgba64::TRANSPARENT; GRADIENT_TABLE_SIZE]);
        match sorted.as_slice() {
            [stop] => colors64.fill(stop.color.combine_alpha_256(opacity).premultiplied()),
            [first, second] => two_stop_ramp(&mut colors64, first, second, mode, opacity),
            _ => multi_stop_ramp(&mut colors64, &sorted, mode, opacity),
        }

        let mut colors32 = Box::new([0_u32; GRADIENT_TABLE_SIZE]);
        for (c32, c64) in colors32.iter_mut().zip(colors64.iter()) {
            *c32 = c64.to_argb32();
        }
        let opaque = sorted.iter().all(|s| s.color.is_opaque());
        Ok(Self {
            colors64,
            colors32,
            spread,
            alpha_color: !opaque || opacity != 256,
        })
    }

    /// The spread policy.
    #[inline]
    pub fn spread(&self) -> Extend {
        self.spread
    }

    /// Whether any entry may be non-opaque, either from the stops or from the opacity.
    #[inline]
    pub fn alpha_color(&self) -> bool {
        self.alpha_color
    }

    /// All entries as `0xAARRGGBB`.
    #[inline]
    pub fn colors32(&self) -> &[u32; GRADIENT_TABLE_SIZE] {
        &self.colors32
    }

    /// All entries at 16 bits per channel.
    #[inline]
    pub fn colors64(&self) -> &[Rgba64; GRADIENT_TABLE_SIZE] {
        &self.colors64
    }

    /// Map any table index into `0..1024` according to the spread policy.
    #[inline]
    pub fn clamp(&self, index: i32) -> usize {
        if (0..TABLE_SIZE_I32).contains(&index) {
            return index as usize;
        }
        let index = match self.spread {
            Extend::Repeat => index.rem_euclid(TABLE_SIZE_I32),
            Extend::Reflect => {
                let limit = TABLE_SIZE_I32 * 2;
                let i = index.rem_euclid(limit);
                if i >= TABLE_SIZE_I32 {
                    limit - 1 - i
                } else {
                    i
                }
            }
            _ => index.clamp(0, TABLE_SIZE_I32 - 1),
        };
        index as usize
    }

    /// Table index of a position where `0` maps to the first and `1` to the last entry.
    #[inline]
    pub fn index(&self, pos: f64) -> usize {
        self.clamp((pos * (GRADIENT_TABLE_SIZE - 1) as f64 + 0.5) as i32)
    }

    /// Table index of a fixed-point position already scaled by `1023 * 256`.
    #[inline]
    pub fn index_fixed(&self, fixed_pos: i32) -> usize {
        self.clamp(fixed_pos.wrapping_add(FIXPT_SIZE / 2) >> FIXPT_BITS)
    }

    /// Look up a position.
    #[inline]
    pub fn pixel(&self, pos: f64) -> u32 {
        self.colors32[self.index(pos)]
    }

    /// Look up a fixed-point position.
    #[inline]
    pub fn pixel_fixed(&self, fixed_pos: i32) -> u32 {
        self.colors32[self.index_fixed(fixed_pos)]
    }

    /// Look up a position at 16 bits per channel.
    #[inline]
    pub fn pixel64(&self, pos: f64) -> Rgba64 {
        self.colors64[self.index(pos)]
    }

    /// Look up a fixed-point position at 16 bits per channel.
    #[inline]
    pub fn pixel64_fixed(&self, fixed_pos: i32) -> Rgba64 {
        self.colors64[self.index_fixed(fixed_pos)]
    }
}

fn two_stop_ramp(
    table: &mut [Rgba64; GRADIENT_TABLE_SIZE],
    first: &GradientStop,
    second: &GradientStop,
    mode: InterpolationMode,
    opacity: u32,
) {
    let color_mode = mode == InterpolationMode::Color;
    let mut first_color = first.color.combine_alpha_256(opacity);
    let mut second_color = second.color.combine_alpha_256(opacity);
    if color_mode {
        first_color = first_color.premultiplied();
        second_color = second_color.premultiplied();
    }
    let emit = |c: Rgba64| if color_mode { c } else { c.premultiplied() };

    let last = GRADIENT_TABLE_SIZE - 1;
    let first_index = round(first.offset as f64 * last as f64);
    let second_index = round(second.offset as f64 * last as f64);

    let mut i = 0_usize;
    while i <= first_index.min(last as i32) as usize {
        table[i] = emit(first_color);
        i += 1;
    }

    if (i as i32) < second_index {
        let reciprocal = 1.0 / (second_index - first_index) as f64;
        let start = |c: u16| (u32::from(c) << 16) + (1 << 15);
        let delta = |a: u16, b: u16| {
            round((f64::from(u32::from(b) << 16) - f64::from(u32::from(a) << 16)) * reciprocal)
        };
        let mut acc = [
            start(first_color.r),
            start(first_color.g),
            start(first_color.b),
            start(first_color.a),
        ];
        let deltas = [
            delta(first_color.r, second_color.r),
            delta(first_color.g, second_color.g),
            delta(first_color.b, second_color.b),
            delta(first_color.a, second_color.a),
        ];
        while (i as i32) < second_index {
            for (a, d) in acc.iter_mut().zip(deltas) {
                *a = a.wrapping_add_signed(d);
            }
            let c = Rgba64::new(
                (acc[0] >> 16) as u16,
                (acc[1] >> 16) as u16,
                (acc[2] >> 16) as u16,
                (acc[3] >> 16) as u16,
            );
            table[i] = emit(c);
            i += 1;
        }
    }

    for entry in &mut table[i..] {
        *entry = emit(second_color);
    }
}

fn multi_stop_ramp(
    table: &mut [Rgba64; GRADIENT_TABLE_SIZE],
    stops: &[GradientStop],
    mode: InterpolationMode,
    opacity: u32,
) {
    let color_mode = mode == InterpolationMode::Color;
    let size = GRADIENT_TABLE_SIZE;
    let stop_color = |i: usize| {
        let c = stops[i].color.combine_alpha_256(opacity);
        if color_mode {
            c.premultiplied()
        } else {
            c
        }
    };
    let offset = |i: usize| f64::from(stops[i].offset);
    let segment = |i: usize, dpos: f64| {
        let diff = offset(i + 1) - offset(i);
        let c = if diff == 0.0 { 0.0 } else { 256.0 / diff };
        ((dpos - offset(i)) * c, c)
    };

    let begin_pos = offset(0);
    let end_pos = offset(stops.len() - 1);
    let incr = 1.0 / size as f64;
    let mut dpos = 1.5 * incr;
    let mut pos = 0;

    table[pos] = stops[0].color.combine_alpha_256(opacity).premultiplied();
    pos += 1;
    while dpos <= begin_pos && pos < size {
        table[pos] = table[pos - 1];
        pos += 1;
        dpos += incr;
    }

    if dpos < end_pos {
        let mut current_stop = 0;
        while dpos > offset(current_stop + 1) {
            current_stop += 1;
        }
        let mut current_color = stop_color(current_stop);
        let mut next_color = stop_color(current_stop + 1);
        let (mut t, c) = segment(current_stop, dpos);
        let mut t_delta = incr * c;

        while pos < size {
            let dist = round(t).clamp(0, 256) as u32;
            let color = Rgba64::interpolate_256(current_color, 256 - dist, next_color, dist);
            table[pos] = if color_mode {
                color
            } else {
                color.premultiplied()
            };
            pos += 1;
            dpos += incr;
            if dpos >= end_pos {
                break;
            }
            t += t_delta;

            let mut skip = 0;
            while current_stop + skip + 2 < stops.len() && dpos > offset(current_stop + skip + 1) {
                skip += 1;
            }
            if skip != 0 {
                current_stop += skip;
                current_color = if skip == 1 {
                    next_color
                } else {
                    stop_color(current_stop)
                };
                next_color = stop_color(current_stop + 1);
                let (nt, c) = segment(current_stop, dpos);
                t = nt;
                t_delta = incr * c;
            }
        }
    }

    let last_color = stops[stops.len() - 1]
        .color
        .combine_alpha_256(opacity)
        .premultiplied();
    for entry in &mut table[pos.min(size - 1)..] {
        *entry = last_color;
    }
}

#[cfg(test)]
mod tests {
    use super::{GradientStop, GradientTable, InterpolationMode, FIXPT_SIZE};
    use crate::Rgba64;
    use peniko::Extend;

    fn stop(offset: f32, argb: u32) -> GradientStop {
        GradientStop {
            offset,
            color: Rgba64::from_argb32(argb),
        }
    }

    fn black_to_white(spread: Extend) -> GradientTable {
        GradientTable::new(
            &[stop(0.0, 0xff000000), stop(1.0, 0xffffffff)],
            spread,
            InterpolationMode::Color,
            256,
        )
        .unwrap()
    }

    #[test]
    fn two_stop_ends_and_midpoint() {
        let table = black_to_white(Extend::Pad);
        assert_eq!(table.colors32()[0], 0xff000000);
        assert_eq!(table.colors32()[1023], 0xffffffff);
        let mid = table.pixel(0.5) & 0xff;
        assert!((127..=128).contains(&mid), "{mid}");
        assert!(!table.alpha_color());
    }

    #[test]
    fn ramp_is_monotonic() {
        let table = black_to_white(Extend::Pad);
        for w in table.colors64().windows(2) {
            assert!(w[0].r <= w[1].r);
        }
    }

    #[test]
    fn spread_policies() {
        let pad = black_to_white(Extend::Pad);
        assert_eq!(pad.clamp(-5), 0);
        assert_eq!(pad.clamp(5000), 1023);
        let repeat = black_to_white(Extend::Repeat);
        assert_eq!(repeat.clamp(1024), 0);
        assert_eq!(repeat.clamp(-1), 1023);
        let reflect = black_to_white(Extend::Reflect);
        assert_eq!(reflect.clamp(1024), 1023);
        assert_eq!(reflect.clamp(-1), 0);
        assert_eq!(reflect.clamp(2048), 0);
    }

    #[test]
    fn fixed_lookup_rounds() {
        let table = black_to_white(Extend::Pad);
        assert_eq!(table.index_fixed(10 * FIXPT_SIZE + FIXPT_SIZE / 2), 11);
        assert_eq!(table.index_fixed(10 * FIXPT_SIZE + FIXPT_SIZE / 2 - 1), 10);
    }

    #[test]
    fn multi_stop_hits_middle_color() {
        let table = GradientTable::new(
            &[stop(0.0, 0xffff0000), stop(0.5, 0xff00ff00), stop(1.0, 0xff0000ff)],
            Extend::Pad,
            InterpolationMode::Color,
            256,
        )
        .unwrap();
        assert_eq!(table.colors32()[0], 0xffff0000);
        assert_eq!(table.colors32()[1023], 0xff0000ff);
        let mid = table.pixel(0.5);
        assert!((mid >> 8) & 0xff >= 0xfc, "{mid:08x}");
    }

    #[test]
    fn opacity_and_transparent_stops_set_alpha_flag() {
        let faded = GradientTable::new(
            &[stop(0.0, 0xff000000), stop(1.0, 0xffffffff)],
            Extend::Pad,
            InterpolationMode::Color,
            128,
        )
        .unwrap();
        assert!(faded.alpha_color());
        assert_eq!(faded.colors32()[0] >> 24, 0x80);
        assert!(GradientTable::new(&[], Extend::Pad, InterpolationMode::Color, 256).is_err());
    }

    #[test]
    fn single_stop_fills() {
        let table =
            GradientTable::new(&[stop(0.3, 0x80ff0000)], Extend::Pad, InterpolationMode::Color, 256)
                .unwrap();
        assert!(table.colors32().iter().all(|c| *c == table.colors32()[0]));
        assert_eq!(table.colors32()[0], 0x80800000);
    }
}
