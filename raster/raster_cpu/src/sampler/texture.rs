// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nearest-neighbor texture sampling.

use raster_common::fetch::{fetch_pixel, fetch_pixels};
use raster_common::transform::SpanTransform;
use raster_common::{PixelLayout, BUFFER_SIZE, FIXED_SCALE};

use super::{bilinear, TextureBlendType};
use crate::canonical::Canonical;
use crate::paint::Texture;

/// Round half up.
#[inline]
fn round(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Samples an image through the inverse paint transform.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextureSampler<'a> {
    pub(crate) texture: Texture<'a>,
    pub(crate) transform: SpanTransform,
    pub(crate) blend_type: TextureBlendType,
}

impl<'a> TextureSampler<'a> {
    pub(crate) fn new(texture: Texture<'a>, transform: SpanTransform, bilinear: bool) -> Self {
        Self {
            texture,
            transform,
            blend_type: TextureBlendType::classify(&transform, texture.tiled, bilinear),
        }
    }

    #[inline]
    pub(crate) fn width(&self) -> i32 {
        self.texture.image.width() as i32
    }

    #[inline]
    pub(crate) fn height(&self) -> i32 {
        self.texture.image.height() as i32
    }

    #[inline]
    pub(crate) fn layout(&self) -> &'static PixelLayout {
        PixelLayout::of(self.texture.image.format())
    }

    /// The translation from device to image pixels of an untransformed draw.
    pub(crate) fn offset(&self) -> (i32, i32) {
        let m = &self.transform.inverse;
        (-round(-m.dx), -round(-m.dy))
    }

    /// Canonical pixels of image row `sy` starting at column `sx`.
    ///
    /// Aliases the image when it is already stored in the requested canonical format.
    ///
    /// # Panics
    ///
    /// Panics if the run leaves the image.
    pub(crate) fn fetch_row<'b, P: Canonical>(
        &'b self,
        out: &'b mut [P],
        sx: usize,
        sy: usize,
    ) -> &'b [P] {
        let image = &self.texture.image;
        if let Some(pixels) = P::alias(image.scan_line(sy), sx, out.len(), image.format()) {
            return pixels;
        }
        self.convert_row(out, sx, sy);
        out
    }

    fn convert_row<P: Canonical>(&self, out: &mut [P], sx: usize, sy: usize) {
        let image = &self.texture.image;
        let line = image.scan_line(sy);
        let layout = self.layout();
        let mut raw = [0_u32; BUFFER_SIZE];
        for (n, chunk) in out.chunks_mut(BUFFER_SIZE).enumerate() {
            let raw = &mut raw[..chunk.len()];
            fetch_pixels(image.format().bpp(), raw, line, sx + n * BUFFER_SIZE);
            P::from_native(chunk, raw, layout, image.color_table());
        }
    }

    /// Pixels of an integer translated texture starting at device position `(x, y)`.
    ///
    /// Tiled textures wrap around. Untransformed textures must have been clipped to the image
    /// by the caller.
    pub(crate) fn fetch_translated<'b, P: Canonical>(
        &'b self,
        out: &'b mut [P],
        x: i32,
        y: i32,
    ) -> &'b [P] {
        let (xoff, yoff) = self.offset();
        if !self.texture.tiled {
            return self.fetch_row(out, (x + xoff) as usize, (y + yoff) as usize);
        }
        let (w, h) = (self.width(), self.height());
        let sy = (y + yoff).rem_euclid(h) as usize;
        let mut sx = (x + xoff).rem_euclid(w) as usize;
        let mut rest = &mut out[..];
        while !rest.is_empty() {
            let l = (w as usize - sx).min(rest.len());
            let (part, tail) = core::mem::take(&mut rest).split_at_mut(l);
            let image = &self.texture.image;
            match P::alias(image.scan_line(sy), sx, l, image.format()) {
                Some(pixels) => part.copy_from_slice(pixels),
                None => self.convert_row(part, sx, sy),
            }
            rest = tail;
            sx = 0;
        }
        out
    }

    /// Sample the pixels starting at device position `(x, y)` through the transform.
    pub(crate) fn fetch<'b, P: Canonical>(&self, out: &'b mut [P], x: i32, y: i32) -> &'b [P] {
        match self.blend_type {
            TextureBlendType::TransformedBilinear | TextureBlendType::TransformedBilinearTiled => {
                bilinear::fetch(self, out, x, y)
            }
            _ => {
                for (n, chunk) in out.chunks_mut(BUFFER_SIZE).enumerate() {
                    self.fetch_nearest(chunk, x + (n * BUFFER_SIZE) as i32, y);
                }
                out
            }
        }
    }

    fn fetch_nearest<P: Canonical>(&self, out: &mut [P], x: i32, y: i32) {
        let image = &self.texture.image;
        let (w, h) = (self.width(), self.height());
        let tiled = self.texture.tiled;
        let b = self.texture.bounds;
        let place = |px: i32, py: i32| -> (usize, usize) {
            if tiled {
                (px.rem_euclid(w) as usize, py.rem_euclid(h) as usize)
            } else {
                (px.clamp(b.x0, b.x1 - 1) as usize, py.clamp(b.y0, b.y1 - 1) as usize)
            }
        };
        let bpp = image.format().bpp();
        let m = &self.transform.inverse;
        let cx = x as f64 + 0.5;
        let cy = y as f64 + 0.5;

        let mut raw = [0_u32; BUFFER_SIZE];
        let raw = &mut raw[..out.len()];
        if self.transform.fast_matrix {
            let scale = FIXED_SCALE as f64;
            let fdx = (m.m11 * scale) as i32;
            let fdy = (m.m12 * scale) as i32;
            let mut fx = ((m.m21 * cy + m.m11 * cx + m.dx) * scale) as i32;
            let mut fy = ((m.m22 * cy + m.m12 * cx + m.dy) * scale) as i32;
            for r in raw.iter_mut() {
                let (px, py) = place(fx >> 16, fy >> 16);
                *r = fetch_pixel(bpp, image.scan_line(py), px);
                fx = fx.wrapping_add(fdx);
                fy = fy.wrapping_add(fdy);
            }
        } else {
            let (fdx, fdy, fdw) = (m.m11, m.m12, m.m13);
            let mut fx = m.m21 * cy + m.m11 * cx + m.dx;
            let mut fy = m.m22 * cy + m.m12 * cx + m.dy;
            let mut fw = m.m23 * cy + m.m13 * cx + m.m33;
            for r in raw.iter_mut() {
                let iw = if fw == 0.0 { 1.0 } else { 1.0 / fw };
                let (px, py) = place((fx * iw).floor() as i32, (fy * iw).floor() as i32);
                *r = fetch_pixel(bpp, image.scan_line(py), px);
                fx += fdx;
                fy += fdy;
                fw += fdw;
                if fw == 0.0 {
                    fw += fdw;
                }
            }
        }
        P::from_native(out, raw, self.layout(), image.color_table());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Texture;
    use raster_common::clip::IntRect;
    use raster_common::kurbo::Affine;
    use raster_common::{Image, PixelFormat, Rgba64};

    fn image() -> Image {
        let pixels: Vec<u32> = (0..16).map(|i| 0xff000000 | i).collect();
        Image::from_argb32(4, 4, PixelFormat::Argb32Premultiplied, &pixels).unwrap()
    }

    fn sampler(image: &Image, affine: Affine, tiled: bool) -> TextureSampler<'_> {
        let texture = Texture {
            image: image.view(),
            bounds: IntRect::from_xywh(0, 0, 4, 4),
            tiled,
            const_alpha: 256,
        };
        TextureSampler::new(texture, SpanTransform::from_affine(affine), false)
    }

    #[test]
    fn translation_offset_rounds_to_whole_pixels() {
        let image = image();
        let s = sampler(&image, Affine::translate((2.0, -3.0)), false);
        assert_eq!(s.offset(), (-2, 3));
        assert_eq!(s.blend_type, TextureBlendType::Untransformed);
    }

    #[test]
    fn rows_alias_canonical_images() {
        let image = image();
        let s = sampler(&image, Affine::IDENTITY, false);
        let mut scratch = [0_u32; 2];
        let row = s.fetch_row(&mut scratch, 1, 2);
        assert_eq!(row, &[0xff000009, 0xff00000a]);
        let mut wide = [Rgba64::TRANSPARENT; 2];
        let row = s.fetch_row(&mut wide, 1, 2);
        assert_eq!(row[1], Rgba64::from_argb32(0xff00000a));
    }

    #[test]
    fn tiled_translation_wraps_rows_and_columns() {
        let image = image();
        let s = sampler(&image, Affine::translate((1.0, 0.0)), true);
        assert_eq!(s.blend_type, TextureBlendType::Tiled);
        let mut out = [0_u32; 6];
        s.fetch_translated(&mut out, -1, 5);
        assert_eq!(out.map(|p| p & 0xff), [6, 7, 4, 5, 6, 7]);
    }

    #[test]
    fn scaled_nearest_repeats_pixels() {
        let image = image();
        let s = sampler(&image, Affine::scale(2.0), false);
        assert_eq!(s.blend_type, TextureBlendType::Transformed);
        let mut out = [0_u32; 10];
        s.fetch(&mut out, 0, 0);
        assert_eq!(out.map(|p| p & 0xff), [0, 0, 1, 1, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn tiled_nearest_wraps_negative_coordinates() {
        let image = image();
        let s = sampler(&image, Affine::scale(2.0), true);
        let mut left = [0_u32; 2];
        let mut right = [0_u32; 2];
        s.fetch(&mut left, -2, 0);
        s.fetch(&mut right, 6, 0);
        assert_eq!(left, right);
        assert_eq!(left.map(|p| p & 0xff), [3, 3]);
    }

    #[test]
    fn perspective_agrees_with_affine_at_unit_weight() {
        let image = image();
        let mut s = sampler(&image, Affine::scale(2.0), false);
        let mut fast = [0_u32; 8];
        s.fetch(&mut fast, 0, 1);
        s.transform.fast_matrix = false;
        let mut slow = [0_u32; 8];
        s.fetch(&mut slow, 0, 1);
        assert_eq!(fast, slow);
    }
}
