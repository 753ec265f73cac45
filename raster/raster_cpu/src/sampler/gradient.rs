// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear, radial and conical gradient samplers.
//!
//! Each sampler maps the centers of a run of device pixels back into gradient space and
//! computes the position `t` on the color ramp. Affine transforms step `t` incrementally along
//! the run; perspective transforms divide per pixel.

use core::f64::consts::PI;

use raster_common::gradient::FIXPT_SIZE;
use raster_common::kurbo::Point;
use raster_common::transform::Matrix;
use raster_common::GradientTable;

use crate::canonical::Canonical;
use crate::paint::GradientKind;

/// Largest table position that can be stepped in fixed point without overflow.
const FIXED_LIMIT: f64 = (i32::MAX >> 9) as f64;

const TABLE_MAX: f64 = 1023.0;

#[inline]
fn fuzzy_null(v: f64) -> bool {
    v.abs() <= 1e-12
}

/// The values of a linear gradient that stay constant over a draw.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinearValues {
    /// Direction of the gradient divided by its squared length.
    pub(crate) dx: f64,
    pub(crate) dy: f64,
    /// Squared length of the gradient vector.
    pub(crate) l: f64,
    /// `t` at the paint space origin.
    pub(crate) off: f64,
}

impl LinearValues {
    fn new(start: Point, end: Point) -> Self {
        let (mut dx, mut dy) = (end.x - start.x, end.y - start.y);
        let l = dx * dx + dy * dy;
        let mut off = 0.0;
        if l != 0.0 {
            dx /= l;
            dy /= l;
            off = -dx * start.x - dy * start.y;
        }
        Self { dx, dy, l, off }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RadialValues {
    focal: Point,
    focal_radius: f64,
    dx: f64,
    dy: f64,
    dr: f64,
    sqrfr: f64,
    a: f64,
    inv2a: f64,
    extended: bool,
}

impl RadialValues {
    fn new(center: Point, radius: f64, focal: Point, focal_radius: f64) -> Self {
        let dx = center.x - focal.x;
        let dy = center.y - focal.y;
        let dr = radius - focal_radius;
        let a = dr * dr - dx * dx - dy * dy;
        Self {
            focal,
            focal_radius,
            dx,
            dy,
            dr,
            sqrfr: focal_radius * focal_radius,
            a,
            inv2a: 1.0 / (2.0 * a),
            extended: !fuzzy_null(focal_radius) || a <= 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ConicalValues {
    center: Point,
    angle: f64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Shape {
    Linear(LinearValues),
    Radial(RadialValues),
    Conical(ConicalValues),
}

/// Samples a gradient table through the inverse paint transform.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GradientSampler<'a> {
    table: &'a GradientTable,
    m: Matrix,
    pub(crate) shape: Shape,
}

impl<'a> GradientSampler<'a> {
    pub(crate) fn new(table: &'a GradientTable, kind: &GradientKind, inverse: Matrix) -> Self {
        let shape = match *kind {
            GradientKind::Linear { start, end } => Shape::Linear(LinearValues::new(start, end)),
            GradientKind::Radial {
                center,
                radius,
                focal,
                focal_radius,
            } => Shape::Radial(RadialValues::new(center, radius, focal, focal_radius)),
            GradientKind::Conical { center, angle } => {
                Shape::Conical(ConicalValues { center, angle })
            }
        };
        Self {
            table,
            m: inverse,
            shape,
        }
    }

    pub(crate) fn table(&self) -> &'a GradientTable {
        self.table
    }

    /// Fill `out` with the gradient at the pixels starting at `(x, y)`.
    pub(crate) fn fetch<'b, P: Canonical>(&self, out: &'b mut [P], x: i32, y: i32) -> &'b [P] {
        let cx = x as f64 + 0.5;
        let cy = y as f64 + 0.5;
        match &self.shape {
            Shape::Linear(v) => self.fetch_linear(out, v, cx, cy),
            Shape::Radial(v) => self.fetch_radial(out, v, cx, cy),
            Shape::Conical(v) => self.fetch_conical(out, v, cx, cy),
        }
        out
    }

    /// The fixed-point row increment and offset of a gradient that only varies along `y`.
    ///
    /// Returns `None` unless the gradient axis is vertical and the transform is at most a scale.
    pub(crate) fn vertical_steps(&self, kind: &GradientKind) -> Option<(i32, i32)> {
        let (GradientKind::Linear { start, end }, Shape::Linear(v)) = (kind, &self.shape) else {
            return None;
        };
        let m = &self.m;
        let scale_only = m.is_affine() && m.m12 == 0.0 && m.m21 == 0.0;
        if !scale_only || start.x != end.x {
            return None;
        }
        let fixed = FIXPT_SIZE as f64;
        let yinc = (v.dy * m.m22 * TABLE_MAX * fixed) as i32;
        let off = ((v.dy * (m.m22 * 0.5 + m.dy) + v.off) * TABLE_MAX * fixed) as i32;
        Some((yinc, off))
    }

    fn fetch_linear<P: Canonical>(&self, out: &mut [P], v: &LinearValues, cx: f64, cy: f64) {
        let m = &self.m;
        let table = self.table;
        let (mut t, mut inc) = (0.0, 0.0);
        let mut affine = true;
        let mut rx = 0.0;
        let mut ry = 0.0;
        if v.l != 0.0 {
            rx = m.m21 * cy + m.m11 * cx + m.dx;
            ry = m.m22 * cy + m.m12 * cx + m.dy;
            t = v.dx * rx + v.dy * ry + v.off;
            inc = v.dx * m.m11 + v.dy * m.m12;
            affine = m.is_affine();
            if affine {
                t *= TABLE_MAX;
                inc *= TABLE_MAX;
            }
        }

        let fixed = FIXPT_SIZE as f64;
        if affine {
            let end = t + inc * out.len() as f64;
            if inc.abs() < 1e-5 {
                out.fill(P::gradient_fixed(table, (t * fixed) as i32));
            } else if t.abs() < FIXED_LIMIT && end.abs() < FIXED_LIMIT {
                let mut t_fixed = (t * fixed) as i32;
                let inc_fixed = (inc * fixed) as i32;
                for o in out.iter_mut() {
                    *o = P::gradient_fixed(table, t_fixed);
                    t_fixed = t_fixed.wrapping_add(inc_fixed);
                }
            } else {
                for o in out.iter_mut() {
                    *o = P::gradient(table, t / TABLE_MAX);
                    t += inc;
                }
            }
        } else {
            let mut rw = m.m23 * cy + m.m13 * cx + m.m33;
            for o in out.iter_mut() {
                let x = rx / rw;
                let y = ry / rw;
                *o = P::gradient(table, v.dx * x + v.dy * y + v.off);
                rx += m.m11;
                ry += m.m12;
                rw += m.m13;
                if rw == 0.0 {
                    rw += m.m13;
                }
            }
        }
    }

    fn fetch_radial<P: Canonical>(&self, out: &mut [P], v: &RadialValues, cx: f64, cy: f64) {
        if fuzzy_null(v.a) {
            out.fill(P::TRANSPARENT);
            return;
        }
        let m = &self.m;
        let table = self.table;
        let mut rx = m.m21 * cy + m.dx + m.m11 * cx;
        let mut ry = m.m22 * cy + m.dy + m.m12 * cx;

        if m.is_affine() {
            rx -= v.focal.x;
            ry -= v.focal.y;
            let mut inv_a = 1.0 / (2.0 * v.a);
            let (delta_rx, delta_ry) = (m.m11, m.m12);

            let mut b = 2.0 * (v.dr * v.focal_radius + rx * v.dx + ry * v.dy);
            let mut delta_b = 2.0 * (delta_rx * v.dx + delta_ry * v.dy);
            let b_delta_b = 2.0 * b * delta_b;
            let delta_b_delta_b = 2.0 * delta_b * delta_b;
            let bb = b * b;
            let delta_bb = delta_b * delta_b;
            b *= inv_a;
            delta_b *= inv_a;

            let rxrxryry = rx * rx + ry * ry;
            let delta_rxrxryry = delta_rx * delta_rx + delta_ry * delta_ry;
            let rx_plus_ry = 2.0 * (rx * delta_rx + ry * delta_ry);
            let delta_rx_plus_ry = 2.0 * delta_rxrxryry;

            inv_a *= inv_a;
            let four_a = 4.0 * v.a;
            let mut det = (bb - four_a * (v.sqrfr - rxrxryry)) * inv_a;
            let mut delta_det =
                (b_delta_b + delta_bb + four_a * (rx_plus_ry + delta_rxrxryry)) * inv_a;
            let delta_delta_det = (delta_b_delta_b + four_a * delta_rx_plus_ry) * inv_a;

            for o in out.iter_mut() {
                *o = if v.extended {
                    let mut result = P::TRANSPARENT;
                    if det >= 0.0 {
                        let w = det.sqrt() - b;
                        if v.focal_radius + v.dr * w >= 0.0 {
                            result = P::gradient(table, w);
                        }
                    }
                    result
                } else {
                    P::gradient(table, det.sqrt() - b)
                };
                det += delta_det;
                delta_det += delta_delta_det;
                b += delta_b;
            }
        } else {
            let mut rw = m.m23 * cy + m.m33 + m.m13 * cx;
            for o in out.iter_mut() {
                let mut result = P::TRANSPARENT;
                if rw != 0.0 {
                    let inv_rw = 1.0 / rw;
                    let gx = rx * inv_rw - v.focal.x;
                    let gy = ry * inv_rw - v.focal.y;
                    let b = 2.0 * (v.dr * v.focal_radius + gx * v.dx + gy * v.dy);
                    let det = b * b - 4.0 * v.a * (v.sqrfr - (gx * gx + gy * gy));
                    if det >= 0.0 {
                        let det_sqrt = det.sqrt();
                        let s0 = (-b - det_sqrt) * v.inv2a;
                        let s1 = (-b + det_sqrt) * v.inv2a;
                        let s = s0.max(s1);
                        if v.focal_radius + v.dr * s >= 0.0 {
                            result = P::gradient(table, s);
                        }
                    }
                }
                *o = result;
                rx += m.m11;
                ry += m.m12;
                rw += m.m13;
            }
        }
    }

    fn fetch_conical<P: Canonical>(&self, out: &mut [P], v: &ConicalValues, cx: f64, cy: f64) {
        let m = &self.m;
        let table = self.table;
        let mut rx = m.m21 * cy + m.dx + m.m11 * cx;
        let mut ry = m.m22 * cy + m.dy + m.m12 * cx;

        if m.is_affine() {
            rx -= v.center.x;
            ry -= v.center.y;
            for o in out.iter_mut() {
                let angle = ry.atan2(rx) + v.angle;
                *o = P::gradient(table, 1.0 - angle / (2.0 * PI));
                rx += m.m11;
                ry += m.m12;
            }
        } else {
            let mut rw = m.m23 * cy + m.m33 + m.m13 * cx;
            if rw == 0.0 {
                rw = 1.0;
            }
            for o in out.iter_mut() {
                let angle = (ry / rw - v.center.y).atan2(rx / rw - v.center.x) + v.angle;
                *o = P::gradient(table, 1.0 - angle / (2.0 * PI));
                rx += m.m11;
                ry += m.m12;
                rw += m.m13;
                if rw == 0.0 {
                    rw += m.m13;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::color::{AlphaColor, Srgb};
    use raster_common::gradient::{GradientStop, InterpolationMode};
    use raster_common::peniko::Extend;
    use raster_common::transform::SpanTransform;
    use raster_common::Rgba64;

    fn table(spread: Extend) -> GradientTable {
        let stops = [
            GradientStop::new(0.0, AlphaColor::<Srgb>::from_rgba8(0, 0, 0, 255)),
            GradientStop::new(1.0, AlphaColor::<Srgb>::from_rgba8(255, 255, 255, 255)),
        ];
        GradientTable::new(&stops, spread, InterpolationMode::Color, 256).unwrap()
    }

    fn linear(table: &GradientTable, x1: f64) -> GradientSampler<'_> {
        let kind = GradientKind::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(x1, 0.0),
        };
        GradientSampler::new(table, &kind, SpanTransform::default().inverse)
    }

    #[test]
    fn linear_ramp_increases_along_axis() {
        let table = table(Extend::Pad);
        let sampler = linear(&table, 100.0);
        let mut out = [0_u32; 100];
        sampler.fetch(&mut out, 0, 0);
        assert!(out[0] & 0xff <= 2);
        assert!(out[99] & 0xff >= 253);
        assert!(out.windows(2).all(|w| (w[0] & 0xff) <= (w[1] & 0xff)));
    }

    #[test]
    fn linear_midpoint_is_mean_of_stops() {
        let table = table(Extend::Pad);
        let kind = GradientKind::Linear {
            start: Point::new(-100.0, 0.0),
            end: Point::new(101.0, 0.0),
        };
        let sampler = GradientSampler::new(&table, &kind, SpanTransform::default().inverse);
        let mut narrow = [0_u32; 1];
        let mut wide = [Rgba64::TRANSPARENT; 1];
        sampler.fetch(&mut narrow, 0, 0);
        sampler.fetch(&mut wide, 0, 0);
        assert_eq!(narrow[0] >> 24, 0xff);
        for shift in [0, 8, 16] {
            assert!(((narrow[0] >> shift) & 0xff).abs_diff(0x80) <= 1, "{:08x}", narrow[0]);
        }
        assert!((wide[0].r >> 8).abs_diff(0x80) <= 1);
    }

    #[test]
    fn degenerate_linear_uses_first_entry() {
        let table = table(Extend::Pad);
        let sampler = linear(&table, 0.0);
        let mut out = [1_u32; 4];
        sampler.fetch(&mut out, 3, 7);
        assert_eq!(out, [table.colors32()[0]; 4]);
    }

    #[test]
    fn repeat_spread_wraps() {
        let table = table(Extend::Repeat);
        let sampler = linear(&table, 10.0);
        let mut a = [0_u32; 4];
        let mut b = [0_u32; 4];
        sampler.fetch(&mut a, 2, 0);
        sampler.fetch(&mut b, 12, 0);
        for (x, y) in a.iter().zip(&b) {
            assert!((x & 0xff).abs_diff(y & 0xff) <= 1);
        }
    }

    #[test]
    fn radial_is_symmetric() {
        let table = table(Extend::Pad);
        let kind = GradientKind::Radial {
            center: Point::new(8.0, 8.0),
            radius: 8.0,
            focal: Point::new(8.0, 8.0),
            focal_radius: 0.0,
        };
        let sampler = GradientSampler::new(&table, &kind, SpanTransform::default().inverse);
        let mut row = [0_u32; 16];
        sampler.fetch(&mut row, 0, 8);
        for i in 0..8 {
            assert!((row[i] & 0xff).abs_diff(row[15 - i] & 0xff) <= 1, "{i}");
        }
        assert!(row[8] & 0xff < 0x20);
        assert!(row[0] & 0xff > 0xd0);
    }

    #[test]
    fn degenerate_radial_is_transparent() {
        let table = table(Extend::Pad);
        let kind = GradientKind::Radial {
            center: Point::new(0.0, 0.0),
            radius: 0.0,
            focal: Point::new(0.0, 0.0),
            focal_radius: 0.0,
        };
        let sampler = GradientSampler::new(&table, &kind, SpanTransform::default().inverse);
        let mut out = [0xffffffff_u32; 3];
        sampler.fetch(&mut out, 0, 0);
        assert_eq!(out, [0; 3]);
    }

    #[test]
    fn conical_sweeps_the_table() {
        let table = table(Extend::Pad);
        let kind = GradientKind::Conical {
            center: Point::new(0.0, 0.0),
            angle: 0.0,
        };
        let sampler = GradientSampler::new(&table, &kind, SpanTransform::default().inverse);
        let mut right = [0_u32; 1];
        let mut below = [0_u32; 1];
        // Pixel centers just right of and just below the center.
        sampler.fetch(&mut right, 50, -1);
        sampler.fetch(&mut below, -1, 50);
        assert!(right[0] & 0xff > 0xf0);
        assert!((below[0] & 0xff).abs_diff(0xbf) <= 2, "{:08x}", below[0]);
    }

    #[test]
    fn vertical_steps_need_vertical_axis() {
        let table = table(Extend::Pad);
        let kind = GradientKind::Linear {
            start: Point::new(3.0, 0.0),
            end: Point::new(3.0, 64.0),
        };
        let sampler = GradientSampler::new(&table, &kind, SpanTransform::default().inverse);
        let (yinc, off) = sampler.vertical_steps(&kind).unwrap();
        let mut out = [0_u32; 1];
        sampler.fetch(&mut out, 5, 20);
        assert_eq!(table.pixel_fixed(yinc * 20 + off), out[0]);
        let horizontal = GradientKind::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(5.0, 0.0),
        };
        let sampler = GradientSampler::new(&table, &horizontal, SpanTransform::default().inverse);
        assert!(sampler.vertical_steps(&horizontal).is_none());
    }
}
