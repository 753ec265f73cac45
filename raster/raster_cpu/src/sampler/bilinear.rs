// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bilinear texture filtering.
//!
//! Taps are gathered as raw native values in batches, converted to the canonical format a batch
//! at a time and then blended. Pure horizontal scaling up takes a separable path that blends
//! the two source rows once and interpolates horizontally from the intermediate row.

use raster_common::fetch::fetch_pixel;
use raster_common::{Bpp, ImageView, PixelLayout, FIXED_SCALE, HALF_POINT};

use super::texture::TextureSampler;
use crate::canonical::{Canonical, Weights};

const BATCH: usize = 256;

/// Pixel bounds along one axis.
#[derive(Clone, Copy, Debug)]
struct Axis {
    tiled: bool,
    max: i32,
    l1: i32,
    l2: i32,
}

impl Axis {
    /// The two neighboring taps around `v`.
    #[inline]
    fn bounds(&self, v: i32) -> (usize, usize) {
        let (v1, v2) = if self.tiled {
            let v1 = v.rem_euclid(self.max);
            (v1, if v1 + 1 == self.max { 0 } else { v1 + 1 })
        } else if v < self.l1 {
            (self.l1, self.l1)
        } else if v >= self.l2 {
            (self.l2, self.l2)
        } else {
            (v, v + 1)
        };
        (v1 as usize, v2 as usize)
    }

    #[inline]
    fn column(&self, v: i32) -> usize {
        if self.tiled {
            v.rem_euclid(self.max) as usize
        } else {
            v.clamp(self.l1, self.l2) as usize
        }
    }
}

struct Taps<'a> {
    image: ImageView<'a>,
    bpp: Bpp,
    layout: &'static PixelLayout,
    x: Axis,
    y: Axis,
}

impl<'a> Taps<'a> {
    fn new(sampler: &TextureSampler<'a>) -> Self {
        let texture = &sampler.texture;
        let tiled = texture.tiled;
        Self {
            image: texture.image,
            bpp: texture.image.format().bpp(),
            layout: sampler.layout(),
            x: Axis {
                tiled,
                max: sampler.width(),
                l1: texture.bounds.x0,
                l2: texture.bounds.x1 - 1,
            },
            y: Axis {
                tiled,
                max: sampler.height(),
                l1: texture.bounds.y0,
                l2: texture.bounds.y1 - 1,
            },
        }
    }

    /// Gather the four taps of one output pixel at index `i`.
    #[inline]
    fn gather(&self, raw: &mut [[u32; BATCH]; 4], i: usize, x: i32, y: i32) {
        let (x1, x2) = self.x.bounds(x);
        let (y1, y2) = self.y.bounds(y);
        let top = self.image.scan_line(y1);
        let bottom = self.image.scan_line(y2);
        raw[0][i] = fetch_pixel(self.bpp, top, x1);
        raw[1][i] = fetch_pixel(self.bpp, top, x2);
        raw[2][i] = fetch_pixel(self.bpp, bottom, x1);
        raw[3][i] = fetch_pixel(self.bpp, bottom, x2);
    }

    fn blend<P: Canonical>(
        &self,
        out: &mut [P],
        raw: &mut [[u32; BATCH]; 4],
        distx: &[u32; BATCH],
        disty: &[u32; BATCH],
        weights: Weights,
    ) {
        let n = out.len();
        let mut taps = [[P::TRANSPARENT; BATCH]; 4];
        for (t, r) in taps.iter_mut().zip(raw.iter_mut()) {
            P::from_native(&mut t[..n], &mut r[..n], self.layout, self.image.color_table());
        }
        let [tl, tr, bl, br] = &taps;
        for (i, o) in out.iter_mut().enumerate() {
            *o = P::interpolate_4(tl[i], tr[i], bl[i], br[i], distx[i], disty[i], weights);
        }
    }
}

/// Sample `out.len()` pixels starting at device position `(x, y)` with bilinear filtering.
pub(crate) fn fetch<'b, P: Canonical>(
    sampler: &TextureSampler<'_>,
    out: &'b mut [P],
    x: i32,
    y: i32,
) -> &'b [P] {
    let taps = Taps::new(sampler);
    let m = &sampler.transform.inverse;
    let cx = x as f64 + 0.5;
    let cy = y as f64 + 0.5;

    if !sampler.transform.fast_matrix {
        fetch_projective(&taps, out, m, cx, cy);
        return out;
    }

    let scale = FIXED_SCALE as f64;
    let fdx = (m.m11 * scale) as i32;
    let fdy = (m.m12 * scale) as i32;
    let fx = ((m.m21 * cy + m.m11 * cx + m.dx) * scale) as i32 - HALF_POINT;
    let fy = ((m.m22 * cy + m.m12 * cx + m.dy) * scale) as i32 - HALF_POINT;

    if fdy == 0 {
        if fdx > 0 && fdx <= FIXED_SCALE {
            scale_up(&taps, out, fx, fy, fdx);
        } else {
            let weights = if (fdx < 0 && fdx > -(FIXED_SCALE / 8)) || m.m22.abs() < 1. / 8. {
                Weights::Eight
            } else {
                Weights::Four
            };
            fetch_affine(&taps, out, (fx, fy), (fdx, 0), weights);
        }
    } else {
        let weights = if m.m11.abs() > 8. || m.m22.abs() > 8. {
            Weights::Eight
        } else {
            Weights::Four
        };
        fetch_affine(&taps, out, (fx, fy), (fdx, fdy), weights);
    }
    out
}

fn fetch_affine<P: Canonical>(
    taps: &Taps<'_>,
    out: &mut [P],
    (mut fx, mut fy): (i32, i32),
    (fdx, fdy): (i32, i32),
    weights: Weights,
) {
    let mut raw = [[0_u32; BATCH]; 4];
    let mut distx = [0_u32; BATCH];
    let mut disty = [0_u32; BATCH];
    for chunk in out.chunks_mut(BATCH) {
        for i in 0..chunk.len() {
            taps.gather(&mut raw, i, fx >> 16, fy >> 16);
            distx[i] = (fx & 0xffff) as u32;
            disty[i] = (fy & 0xffff) as u32;
            fx = fx.wrapping_add(fdx);
            fy = fy.wrapping_add(fdy);
        }
        taps.blend(chunk, &mut raw, &distx, &disty, weights);
    }
}

fn fetch_projective<P: Canonical>(
    taps: &Taps<'_>,
    out: &mut [P],
    m: &raster_common::transform::Matrix,
    cx: f64,
    cy: f64,
) {
    let (fdx, fdy, fdw) = (m.m11, m.m12, m.m13);
    let mut fx = m.m21 * cy + m.m11 * cx + m.dx;
    let mut fy = m.m22 * cy + m.m12 * cx + m.dy;
    let mut fw = m.m23 * cy + m.m13 * cx + m.m33;

    let mut raw = [[0_u32; BATCH]; 4];
    let mut distx = [0_u32; BATCH];
    let mut disty = [0_u32; BATCH];
    for chunk in out.chunks_mut(BATCH) {
        for i in 0..chunk.len() {
            let iw = if fw == 0. { 1. } else { 1. / fw };
            let px = fx * iw - 0.5;
            let py = fy * iw - 0.5;
            let x1 = px.floor();
            let y1 = py.floor();
            distx[i] = (((px - x1) * 65536.) as u32).min(0xffff);
            disty[i] = (((py - y1) * 65536.) as u32).min(0xffff);
            taps.gather(&mut raw, i, x1 as i32, y1 as i32);
            fx += fdx;
            fy += fdy;
            fw += fdw;
            if fw == 0. {
                fw += fdw;
            }
        }
        taps.blend(chunk, &mut raw, &distx, &disty, Weights::Eight);
    }
}

/// Horizontal magnification without rotation.
///
/// Both source rows are blended vertically into an intermediate row once, which is then
/// interpolated horizontally with 8-bit weights.
fn scale_up<P: Canonical>(taps: &Taps<'_>, out: &mut [P], mut fx: i32, fy: i32, fdx: i32) {
    let (y1, y2) = taps.y.bounds(fy >> 16);
    let top = taps.image.scan_line(y1);
    let bottom = taps.image.scan_line(y2);
    let disty = ((fy & 0xffff) >> 8) as u32;
    let table = taps.image.color_table();

    let mut raw_top = [0_u32; BATCH + 2];
    let mut raw_bottom = [0_u32; BATCH + 2];
    let mut row_top = [P::TRANSPARENT; BATCH + 2];
    let mut row_bottom = [P::TRANSPARENT; BATCH + 2];
    for chunk in out.chunks_mut(BATCH) {
        let len = chunk.len();
        let count = ((len as i64 * fdx as i64 + 0xffff) / FIXED_SCALE as i64) as usize + 2;
        let x = fx >> 16;
        for i in 0..count {
            let column = taps.x.column(x + i as i32);
            raw_top[i] = fetch_pixel(taps.bpp, top, column);
            raw_bottom[i] = fetch_pixel(taps.bpp, bottom, column);
        }
        P::from_native(&mut row_top[..count], &mut raw_top[..count], taps.layout, table);
        P::from_native(&mut row_bottom[..count], &mut raw_bottom[..count], taps.layout, table);
        for (t, b) in row_top[..count].iter_mut().zip(&row_bottom[..count]) {
            *t = P::interpolate_256(*t, 256 - disty, *b, disty);
        }

        let mut local = fx & 0xffff;
        for o in chunk.iter_mut() {
            let x1 = (local >> 16) as usize;
            let distx = ((local & 0xffff) >> 8) as u32;
            *o = P::interpolate_256(row_top[x1], 256 - distx, row_top[x1 + 1], distx);
            local += fdx;
        }
        fx = fx.wrapping_add(fdx.wrapping_mul(len as i32));
    }
}
