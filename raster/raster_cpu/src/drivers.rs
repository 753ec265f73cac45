// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Span drivers.
//!
//! A driver walks a batch of spans in chunks of at most [`BUFFER_SIZE`] pixels. For every chunk
//! it obtains source pixels, reads the destination when the operator needs it, composes and
//! stores. RGB32 and premultiplied ARGB32 destinations are composed in place, RGB16 has a
//! direct path for plain copies, and every other format goes through the destination
//! procedures.

use raster_common::{RasterBuffer, Rgba64, Span, BUFFER_SIZE};
use smallvec::SmallVec;

use crate::canonical::Canonical;
use crate::compose::{ComposeFn, ComposeSolidFn};
use crate::dest;
use crate::mode::CompositionMode;
use crate::operator::{build_operator, Operator};
use crate::paint::{SpanData, Source};
use crate::sampler::Sampler;

/// A span driver.
pub type SpanFn = fn(spans: &[Span], data: &mut SpanData<'_>);

/// Composite `spans` into the destination of `data` with its current paint.
///
/// Spans must be sorted by `y` and then `x` and lie inside the destination.
///
/// # Panics
///
/// Panics if a span extends past the destination.
pub fn process_spans(spans: &[Span], data: &mut SpanData<'_>) {
    if spans.is_empty() {
        return;
    }
    let format = data.buffer.format();
    if !dest::is_writable(format) {
        log::trace!("{format:?} cannot be drawn into");
        return;
    }
    let Some(helper) = crate::blit::draw_helper(format) else {
        return;
    };
    match data.paint.source {
        Source::None => {}
        Source::Solid(_) => (helper.blend_color)(spans, data),
        Source::Gradient(_) => (helper.blend_gradient)(spans, data),
        Source::Texture(_) => crate::texture::blend_texture(spans, data),
    }
}

/// Pixel run in device space.
#[inline]
pub(crate) fn runs(x: i32, len: u32) -> impl Iterator<Item = (usize, usize)> {
    let len = len as usize;
    (0..len)
        .step_by(BUFFER_SIZE)
        .map(move |off| (x as usize + off, (len - off).min(BUFFER_SIZE)))
}

/// One span's share of a merged run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Part {
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) coverage: u8,
}

/// Merge horizontally adjacent spans into runs of at most [`BUFFER_SIZE`] pixels.
///
/// `run` receives the start, row and length of each run together with the parts of the spans it
/// covers. Coverage is scaled by `const_alpha` in `0..=256`.
pub(crate) fn handle_spans(
    spans: &[Span],
    const_alpha: u32,
    mut run: impl FnMut(usize, usize, usize, &[Part]),
) {
    let mut parts: SmallVec<[Part; 16]> = SmallVec::new();
    let mut i = 0;
    while i < spans.len() {
        let first = spans[i];
        let y = first.y;
        let mut right = first.end();
        let mut end = i + 1;
        while end < spans.len() && spans[end].y == y && spans[end].x == right {
            right += spans[end].len as i32;
            end += 1;
        }

        let mut x = first.x;
        let mut k = i;
        let mut used = 0;
        while x < right {
            let l = ((right - x) as usize).min(BUFFER_SIZE);
            parts.clear();
            let mut offset = 0;
            while offset < l {
                let span = &spans[k];
                let n = (span.len as usize - used).min(l - offset);
                if n > 0 {
                    parts.push(Part {
                        offset,
                        len: n,
                        coverage: ((span.coverage as u32 * const_alpha) >> 8) as u8,
                    });
                }
                offset += n;
                used += n;
                if used == span.len as usize {
                    k += 1;
                    used = 0;
                }
            }
            run(x as usize, y as usize, l, &parts);
            x += l as i32;
        }
        i = end;
    }
}

/// Solid color through the destination procedures.
pub(crate) fn blend_color_generic(spans: &[Span], data: &mut SpanData<'_>) {
    let Source::Solid(color) = data.paint.source else {
        return;
    };
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    if op.wide {
        if let Some(func) = op.solid_func_64 {
            color_spans::<Rgba64>(&mut data.buffer, spans, &op, color.rgba64, func);
            return;
        }
    }
    color_spans::<u32>(&mut data.buffer, spans, &op, color.argb32, op.solid_func);
}

fn color_spans<P: Canonical>(
    buffer: &mut RasterBuffer<'_>,
    spans: &[Span],
    op: &Operator<'_>,
    color: P,
    func: ComposeSolidFn<P>,
) {
    let fill = op.mode == CompositionMode::Source && buffer.format().bpp().bits() >= 8;
    let mut scratch = [P::TRANSPARENT; BUFFER_SIZE];
    for span in spans {
        if span.len == 0 {
            continue;
        }
        let y = span.y as usize;
        if fill && span.coverage == 255 {
            P::store_dest(buffer, span.x as usize, y, &[color]);
            dest::fill_from_first(buffer, span.x as usize, y, span.len as usize);
            continue;
        }
        for (x, len) in runs(span.x, span.len) {
            let dst = &mut scratch[..len];
            if op.dest_fetch {
                P::fetch_dest(buffer, x, y, dst);
            }
            func(dst, color, span.coverage);
            P::store_dest(buffer, x, y, dst);
        }
    }
}

/// Solid color composed in place on RGB32 and premultiplied ARGB32 rows.
pub(crate) fn blend_color_argb(spans: &[Span], data: &mut SpanData<'_>) {
    let Source::Solid(color) = data.paint.source else {
        return;
    };
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    for span in spans {
        color_span_argb(&mut data.buffer, span, &op, color.argb32, op.solid_func);
    }
}

fn color_span_argb(
    buffer: &mut RasterBuffer<'_>,
    span: &Span,
    op: &Operator<'_>,
    color: u32,
    func: ComposeSolidFn<u32>,
) {
    let (x, len) = (span.x as usize, span.len as usize);
    match buffer.scan_line_u32_mut(span.y as usize) {
        Some(line) => func(&mut line[x..x + len], color, span.coverage),
        None => color_spans::<u32>(buffer, core::slice::from_ref(span), op, color, func),
    }
}

/// Solid color on RGB16 rows, with plain copies done directly in 16 bits.
pub(crate) fn blend_color_rgb16(spans: &[Span], data: &mut SpanData<'_>) {
    let Source::Solid(color) = data.paint.source else {
        return;
    };
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    for span in spans {
        color_span_rgb16(&mut data.buffer, span, &op, color.argb32);
    }
}

fn color_span_rgb16(buffer: &mut RasterBuffer<'_>, span: &Span, op: &Operator<'_>, color: u32) {
    use raster_common::pixel::{interpolate_255, rgb16_to_32, rgb32_to_16};

    let mut mode = op.mode;
    if mode == CompositionMode::SourceOver && color >> 24 == 255 {
        mode = CompositionMode::Source;
    }
    if mode != CompositionMode::Source {
        let func = crate::registry::Registry::global().compose_solid(mode);
        color_spans::<u32>(buffer, core::slice::from_ref(span), op, color, func);
        return;
    }
    let (x, len) = (span.x as usize, span.len as usize);
    let Some(line) = buffer.scan_line_u16_mut(span.y as usize) else {
        let func = crate::registry::Registry::global().compose_solid(mode);
        color_spans::<u32>(buffer, core::slice::from_ref(span), op, color, func);
        return;
    };
    let target = &mut line[x..x + len];
    match span.coverage {
        0 => {}
        255 => target.fill(rgb32_to_16(color)),
        coverage => {
            // Blended in 8 bits per channel, as the destination procedures do.
            let (ca, cia) = (coverage as u32, 255 - coverage as u32);
            for d in target.iter_mut() {
                *d = rgb32_to_16(interpolate_255(color, ca, rgb16_to_32(*d), cia));
            }
        }
    }
}

/// Sampled source through the destination procedures.
pub(crate) fn blend_src_generic(spans: &[Span], data: &mut SpanData<'_>) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some(sampler) = op.sampler else {
        return;
    };
    let const_alpha = const_alpha(data);
    if op.wide {
        if let Some(func) = op.func_64 {
            src_spans::<Rgba64>(&mut data.buffer, spans, &op, &sampler, const_alpha, func);
            return;
        }
    }
    src_spans::<u32>(&mut data.buffer, spans, &op, &sampler, const_alpha, op.func);
}

fn src_spans<P: Canonical>(
    buffer: &mut RasterBuffer<'_>,
    spans: &[Span],
    op: &Operator<'_>,
    sampler: &Sampler<'_>,
    const_alpha: u32,
    func: ComposeFn<P>,
) {
    let mut src_buf = [P::TRANSPARENT; BUFFER_SIZE];
    let mut dst_buf = [P::TRANSPARENT; BUFFER_SIZE];
    handle_spans(spans, const_alpha, |x, y, len, parts| {
        let src = sampler.fetch(&mut src_buf[..len], x as i32, y as i32);
        let dst = &mut dst_buf[..len];
        if op.dest_fetch {
            P::fetch_dest(buffer, x, y, dst);
        }
        for p in parts {
            let r = p.offset..p.offset + p.len;
            func(&mut dst[r.clone()], &src[r], p.coverage);
        }
        P::store_dest(buffer, x, y, dst);
    });
}

/// Sampled source composed in place on RGB32 and premultiplied ARGB32 rows.
pub(crate) fn blend_src_argb(spans: &[Span], data: &mut SpanData<'_>) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some(sampler) = op.sampler else {
        return;
    };
    let const_alpha = const_alpha(data);
    let buffer = &mut data.buffer;
    let mut src_buf = [0_u32; BUFFER_SIZE];
    let mut dst_buf = [0_u32; BUFFER_SIZE];
    handle_spans(spans, const_alpha, |x, y, len, parts| {
        let src = sampler.fetch(&mut src_buf[..len], x as i32, y as i32);
        match buffer.scan_line_u32_mut(y) {
            Some(line) => {
                let dst = &mut line[x..x + len];
                for p in parts {
                    let r = p.offset..p.offset + p.len;
                    (op.func)(&mut dst[r.clone()], &src[r], p.coverage);
                }
            }
            None => {
                let dst = &mut dst_buf[..len];
                dest::fetch_32(buffer, x, y, dst);
                for p in parts {
                    let r = p.offset..p.offset + p.len;
                    (op.func)(&mut dst[r.clone()], &src[r], p.coverage);
                }
                dest::store_32(buffer, x, y, dst);
            }
        }
    });
}

fn const_alpha(data: &SpanData<'_>) -> u32 {
    match data.paint.source {
        Source::Texture(t) => t.const_alpha,
        _ => 256,
    }
}

/// The fixed-point table position step per scanline and its offset, for gradients that only
/// vary vertically.
fn vertical_gradient(op: &Operator<'_>, data: &SpanData<'_>) -> Option<(i32, i32)> {
    let (Some(Sampler::Gradient(g)), Source::Gradient(gradient)) = (op.sampler, data.paint.source)
    else {
        return None;
    };
    g.vertical_steps(&gradient.kind)
}

/// Gradient through the destination procedures, one lookup per row for vertical gradients.
pub(crate) fn blend_gradient_generic(spans: &[Span], data: &mut SpanData<'_>) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some((yinc, off)) = vertical_gradient(&op, data) else {
        blend_src_generic(spans, data);
        return;
    };
    let Some(Sampler::Gradient(g)) = op.sampler else {
        return;
    };
    let table = g.table();
    for span in spans {
        let pos = yinc.wrapping_mul(span.y).wrapping_add(off);
        let one = core::slice::from_ref(span);
        match (op.wide, op.solid_func_64) {
            (true, Some(func)) => {
                let color = <Rgba64 as Canonical>::gradient_fixed(table, pos);
                color_spans::<Rgba64>(&mut data.buffer, one, &op, color, func);
            }
            _ => {
                let color = table.pixel_fixed(pos);
                color_spans::<u32>(&mut data.buffer, one, &op, color, op.solid_func);
            }
        }
    }
}

/// Gradient composed in place on RGB32 and premultiplied ARGB32 rows.
pub(crate) fn blend_gradient_argb(spans: &[Span], data: &mut SpanData<'_>) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some((yinc, off)) = vertical_gradient(&op, data) else {
        blend_src_argb(spans, data);
        return;
    };
    let Some(Sampler::Gradient(g)) = op.sampler else {
        return;
    };
    for span in spans {
        let color = g.table().pixel_fixed(yinc.wrapping_mul(span.y).wrapping_add(off));
        color_span_argb(&mut data.buffer, span, &op, color, op.solid_func);
    }
}

/// Gradient on RGB16 rows, with vertical gradients filled per row.
pub(crate) fn blend_gradient_rgb16(spans: &[Span], data: &mut SpanData<'_>) {
    let op = build_operator(&data.paint, data.buffer.format(), spans);
    let Some((yinc, off)) = vertical_gradient(&op, data) else {
        blend_src_generic(spans, data);
        return;
    };
    let Some(Sampler::Gradient(g)) = op.sampler else {
        return;
    };
    let op = Operator {
        mode: data.paint.mode,
        ..op
    };
    for span in spans {
        let color = g.table().pixel_fixed(yinc.wrapping_mul(span.y).wrapping_add(off));
        color_span_rgb16(&mut data.buffer, span, &op, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(spans: &[Span], const_alpha: u32) -> Vec<(usize, usize, usize, Vec<Part>)> {
        let mut out = Vec::new();
        handle_spans(spans, const_alpha, |x, y, len, parts| {
            out.push((x, y, len, parts.to_vec()));
        });
        out
    }

    #[test]
    fn adjacent_spans_are_merged_into_one_run() {
        let spans = [
            Span::new(2, 0, 3, 255),
            Span::new(5, 0, 2, 100),
            Span::new(9, 0, 1, 255),
            Span::new(0, 1, 4, 50),
        ];
        let runs = collect(&spans, 256);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].0..runs[0].0 + runs[0].2, 2..7);
        assert_eq!(
            runs[0].3,
            vec![
                Part {
                    offset: 0,
                    len: 3,
                    coverage: 255
                },
                Part {
                    offset: 3,
                    len: 2,
                    coverage: 100
                },
            ]
        );
        assert_eq!((runs[1].0, runs[1].2), (9, 1));
        assert_eq!((runs[2].0, runs[2].1, runs[2].2), (0, 1, 4));
    }

    #[test]
    fn long_runs_split_at_the_buffer_size() {
        let spans = [
            Span::new(0, 3, BUFFER_SIZE as u32 - 1, 255),
            Span::new(BUFFER_SIZE as i32 - 1, 3, 10, 128),
        ];
        let runs = collect(&spans, 128);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].2, BUFFER_SIZE);
        assert_eq!(runs[0].3[0].coverage, 127);
        assert_eq!(runs[0].3[1].len, 1);
        assert_eq!(runs[1].0, BUFFER_SIZE);
        assert_eq!(
            runs[1].3,
            vec![Part {
                offset: 0,
                len: 9,
                coverage: 64
            }]
        );
    }

    #[test]
    fn chunked_runs_cover_the_span() {
        let r: Vec<_> = runs(10, 2 * BUFFER_SIZE as u32 + 5).collect();
        assert_eq!(
            r,
            vec![
                (10, BUFFER_SIZE),
                (10 + BUFFER_SIZE, BUFFER_SIZE),
                (10 + 2 * BUFFER_SIZE, 5)
            ]
        );
    }
}
