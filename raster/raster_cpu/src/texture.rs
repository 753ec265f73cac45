// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture drivers and their dispatch table.

use raster_common::pixel::{rgb16_to_32, rgb32_to_16};
use raster_common::{PixelFormat, RasterBuffer, Rgba64, Span, BUFFER_SIZE};

use crate::canonical::Canonical;
use crate::compose::ComposeFn;
use crate::dest;
use crate::drivers::{blend_src_argb, blend_src_generic, SpanFn};
use crate::mode::CompositionMode;
use crate::operator::{build_operator, Operator};
use crate::paint::{Source, SpanData};
use crate::sampler::{Sampler, TextureBlendType, TextureSampler};

/// Composite `spans` with the texture of `data`, picking the driver by blend type and
/// destination format.
///
/// # Panics
///
/// Panics if a span extends past the destination.
pub fn blend_texture(spans: &[Span], data: &mut SpanData<'_>) {
    let Source::Texture(texture) = data.paint.source else {
        return;
    };
    let paint = &data.paint;
    let blend_type = TextureBlendType::classify(&paint.transform, texture.tiled, paint.bilinear);
    let format = data.buffer.format();
    match texture_driver(blend_type, format) {
        Some(driver) => {
            log::trace!("{blend_type:?} texture into {format:?}");
            driver(spans, data);
        }
        None => log::trace!("no texture driver for {format:?}"),
    }
}

/// The texture driver for a blend type and destination format.
pub fn texture_driver(blend_type: TextureBlendType, format: PixelFormat) -> Option<SpanFn> {
    TEXTURE_DRIVERS[format.index()][blend_type.index()]
}

type Row = [Option<SpanFn>; TextureBlendType::COUNT];

const NONE: Row = [None; TextureBlendType::COUNT];

const GENERIC: Row = [
    Some(blend_untransformed_generic),
    Some(blend_tiled_generic),
    Some(blend_src_generic),
    Some(blend_src_generic),
    Some(blend_src_generic),
    Some(blend_src_generic),
];

const ARGB: Row = [
    Some(blend_untransformed_argb),
    Some(blend_tiled_argb),
    Some(blend_src_argb),
    Some(blend_src_argb),
    Some(blend_src_argb),
    Some(blend_src_argb),
];

const RGB16: Row = [
    Some(blend_untransformed_rgb16),
    Some(blend_tiled_rgb16),
    Some(blend_src_generic),
    Some(blend_src_generic),
    Some(blend_src_generic),
    Some(blend_src_generic),
];

static TEXTURE_DRIVERS: [Row; PixelFormat::COUNT] = [
    NONE,    // Invalid
    GENERIC, // Mono
    GENERIC, // MonoLsb
    NONE,    // Indexed8
    ARGB,    // Rgb32
    GENERIC, // Argb32
    ARGB,    // Argb32Premultiplied
    RGB16,   // Rgb16
    GENERIC, // Argb8565Premultiplied
    GENERIC, // Rgb666
    GENERIC, // Argb6666Premultiplied
    GENERIC, // Rgb555
    GENERIC, // Argb8555Premultiplied
    GENERIC, // Rgb888
    GENERIC, // Rgb444
    GENERIC, // Argb4444Premultiplied
    GENERIC, // Rgbx8888
    GENERIC, // Rgba8888
    GENERIC, // Rgba8888Premultiplied
    GENERIC, // Bgr30
    GENERIC, // A2Bgr30Premultiplied
    GENERIC, // Rgb30
    GENERIC, // A2Rgb30Premultiplied
    GENERIC, // Alpha8
    GENERIC, // Grayscale8
];

static_assertions::const_assert_eq!(PixelFormat::COUNT, 25);

fn texture_sampler<'a>(op: &Operator<'a>) -> Option<TextureSampler<'a>> {
    match op.sampler {
        Some(Sampler::Texture(t)) => Some(t),
        _ => None,
    }
}

/// A run of device pixels and the image pixels it copies from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Piece {
    x: usize,
    y: usize,
    sx: usize,
    sy: usize,
    len: usize,
    coverage: u8,
}

/// Split translated texture spans into pieces that stay inside one image row and at most
/// [`BUFFER_SIZE`] pixels.
///
/// Untransformed draws clip each span to the image and skip rows outside it. Tiled draws wrap in
/// both directions.
fn for_each_piece(
    sampler: &TextureSampler<'_>,
    spans: &[Span],
    tiled: bool,
    mut f: impl FnMut(Piece),
) {
    let (xoff, yoff) = sampler.offset();
    let (w, h) = (sampler.width(), sampler.height());
    let const_alpha = sampler.texture.const_alpha;
    for span in spans {
        if span.len == 0 {
            continue;
        }
        let coverage = ((span.coverage as u32 * const_alpha) >> 8) as u8;
        let mut x = span.x;
        let mut len = span.len as i32;
        let (mut sx, sy) = if tiled {
            ((span.x + xoff).rem_euclid(w), (span.y + yoff).rem_euclid(h))
        } else {
            let (sx, sy) = (span.x + xoff, span.y + yoff);
            if sy < 0 || sy >= h || sx >= w {
                continue;
            }
            (sx, sy)
        };
        if !tiled {
            if sx < 0 {
                x -= sx;
                len += sx;
                sx = 0;
            }
            len = len.min(w - sx);
        }
        while len > 0 {
            let l = (w - sx).min(len).min(BUFFER_SIZE as i32);
            f(Piece {
                x: x as usize,
                y: span.y as usize,
                sx: sx as usize,
                sy: sy as usize,
                len: l as usize,
                coverage,
            });
            x += l;
            len -= l;
            sx += l;
            if sx >= w {
                sx = 0;
            }
        }
    }
}

/// Untransformed texture through the destination procedures.
pub(crate) fn blend_untransformed_generic(spans: &[Span], data: &mut SpanData<'_>) {
    translated_generic(spans, data, false);
}

/// Tiled texture through the destination procedures.
pub(crate) fn blend_tiled_generic(spans: &[Span], data: &mut SpanData<'_>) {
    translated_generic(spans, data, true);
}

fn translated_generic(spans: &[Span], data: &mut SpanData<'_>, tiled: bool) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some(sampler) = texture_sampler(&op) else {
        return;
    };
    if op.wide {
        if let Some(func) = op.func_64 {
            translated_spans::<Rgba64>(&mut data.buffer, spans, &op, &sampler, tiled, func);
            return;
        }
    }
    translated_spans::<u32>(&mut data.buffer, spans, &op, &sampler, tiled, op.func);
}

fn translated_spans<P: Canonical>(
    buffer: &mut RasterBuffer<'_>,
    spans: &[Span],
    op: &Operator<'_>,
    sampler: &TextureSampler<'_>,
    tiled: bool,
    func: ComposeFn<P>,
) {
    let mut src_buf = [P::TRANSPARENT; BUFFER_SIZE];
    let mut dst_buf = [P::TRANSPARENT; BUFFER_SIZE];
    for_each_piece(sampler, spans, tiled, |p| {
        let src = sampler.fetch_row(&mut src_buf[..p.len], p.sx, p.sy);
        let dst = &mut dst_buf[..p.len];
        if op.dest_fetch {
            P::fetch_dest(buffer, p.x, p.y, dst);
        }
        func(dst, src, p.coverage);
        P::store_dest(buffer, p.x, p.y, dst);
    });
}

/// Untransformed texture composed in place on RGB32 and premultiplied ARGB32 rows.
pub(crate) fn blend_untransformed_argb(spans: &[Span], data: &mut SpanData<'_>) {
    translated_argb(spans, data, false);
}

/// Tiled texture composed in place on RGB32 and premultiplied ARGB32 rows.
pub(crate) fn blend_tiled_argb(spans: &[Span], data: &mut SpanData<'_>) {
    translated_argb(spans, data, true);
}

fn translated_argb(spans: &[Span], data: &mut SpanData<'_>, tiled: bool) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some(sampler) = texture_sampler(&op) else {
        return;
    };
    let buffer = &mut data.buffer;
    let mut src_buf = [0_u32; BUFFER_SIZE];
    let mut dst_buf = [0_u32; BUFFER_SIZE];
    for_each_piece(&sampler, spans, tiled, |p| {
        let src = sampler.fetch_row(&mut src_buf[..p.len], p.sx, p.sy);
        match buffer.scan_line_u32_mut(p.y) {
            Some(line) => (op.func)(&mut line[p.x..p.x + p.len], src, p.coverage),
            None => {
                let dst = &mut dst_buf[..p.len];
                dest::fetch_32(buffer, p.x, p.y, dst);
                (op.func)(dst, src, p.coverage);
                dest::store_32(buffer, p.x, p.y, dst);
            }
        }
    });
}

/// Untransformed texture on RGB16 rows, copying RGB16 images directly.
pub(crate) fn blend_untransformed_rgb16(spans: &[Span], data: &mut SpanData<'_>) {
    translated_rgb16(spans, data, false);
}

/// Tiled texture on RGB16 rows, copying RGB16 images directly.
pub(crate) fn blend_tiled_rgb16(spans: &[Span], data: &mut SpanData<'_>) {
    translated_rgb16(spans, data, true);
}

fn translated_rgb16(spans: &[Span], data: &mut SpanData<'_>, tiled: bool) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let rgb16_image =
        matches!(data.paint.source, Source::Texture(t) if t.image.format() == PixelFormat::Rgb16);
    let direct = rgb16_image
        && matches!(op.mode, CompositionMode::Source | CompositionMode::SourceOver);
    let Some(sampler) = texture_sampler(&op).filter(|_| direct) else {
        translated_generic(spans, data, tiled);
        return;
    };
    let image = sampler.texture.image;
    let buffer = &mut data.buffer;
    let mut fallback = [0_u32; BUFFER_SIZE];
    let mut src_buf = [0_u32; BUFFER_SIZE];
    for_each_piece(&sampler, spans, tiled, |p| {
        let row: Option<&[u16]> = bytemuck::try_cast_slice(image.scan_line(p.sy)).ok();
        if let Some(src) = row {
            if let Some(line) = buffer.scan_line_u16_mut(p.y) {
                let src = &src[p.sx..p.sx + p.len];
                let line = &mut line[p.x..p.x + p.len];
                if p.coverage == 255 && op.mode == CompositionMode::Source {
                    line.copy_from_slice(src);
                } else {
                    let (s, d) = (&mut src_buf[..p.len], &mut fallback[..p.len]);
                    for (s, from) in s.iter_mut().zip(src) {
                        *s = rgb16_to_32(*from);
                    }
                    for (d, to) in d.iter_mut().zip(line.iter()) {
                        *d = rgb16_to_32(*to);
                    }
                    (op.func)(d, s, p.coverage);
                    for (to, d) in line.iter_mut().zip(d.iter()) {
                        *to = rgb32_to_16(*d);
                    }
                }
                return;
            }
        }
        let src = sampler.fetch_row(&mut src_buf[..p.len], p.sx, p.sy);
        let dst = &mut fallback[..p.len];
        dest::fetch_32(buffer, p.x, p.y, dst);
        (op.func)(dst, src, p.coverage);
        dest::store_32(buffer, p.x, p.y, dst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_writable_formats_have_drivers() {
        for format in PixelFormat::ALL {
            for blend_type in TextureBlendType::ALL {
                assert_eq!(
                    texture_driver(blend_type, format).is_some(),
                    dest::is_writable(format),
                    "{format:?} {blend_type:?}"
                );
            }
        }
    }
}
