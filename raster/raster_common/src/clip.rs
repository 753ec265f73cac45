// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipping of span batches against rectangles and span regions.

use core::ops::Range;

use smallvec::SmallVec;

use crate::pixel::div_255;
use crate::span::Span;

/// An integer rectangle with exclusive maximum edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x0: i32,
    /// Top edge.
    pub y0: i32,
    /// One past the right edge.
    pub x1: i32,
    /// One past the bottom edge.
    pub y1: i32,
}

impl IntRect {
    /// Create a rectangle from its origin and size.
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + width,
            y1: y + height,
        }
    }

    /// Width, zero when empty.
    #[inline]
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    /// Height, zero when empty.
    #[inline]
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    /// Whether the rectangle contains no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// The common area of both rectangles.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
}

/// Clip `spans` to `rect`, appending the visible parts to `out`.
///
/// Relies on the spans being sorted by `y` and stops at the first span below the rectangle.
pub fn intersect_spans(spans: &[Span], rect: &IntRect, out: &mut Vec<Span>) {
    if rect.is_empty() {
        return;
    }
    let (minx, miny, maxx, maxy) = (rect.x0, rect.y0, rect.x1 - 1, rect.y1 - 1);
    for span in spans {
        if span.y > maxy {
            break;
        }
        if span.y < miny || span.x > maxx || span.end() <= minx {
            continue;
        }
        let (x, len) = if span.x < minx {
            (minx, (span.end() - minx).min(maxx - minx + 1))
        } else {
            (span.x, (span.len as i32).min(maxx - span.x + 1))
        };
        if len <= 0 {
            continue;
        }
        out.push(Span::new(x, span.y, len as u32, span.coverage));
    }
}

/// A clip shape stored as coverage spans, indexed by scanline.
#[derive(Clone, Debug, Default)]
pub struct ClipRegion {
    spans: Vec<Span>,
    /// First scanline covered by `lines`.
    top: i32,
    /// Range into `spans` for each scanline from `top`.
    lines: Vec<Range<usize>>,
    bounds: IntRect,
}

impl ClipRegion {
    /// Build a region from spans sorted by `y` then `x`.
    ///
    /// # Panics
    ///
    /// Panics if the spans are not sorted by scanline.
    pub fn from_spans(spans: Vec<Span>) -> Self {
        let spans: Vec<Span> = spans.into_iter().filter(|s| s.len > 0).collect();
        let Some(first) = spans.first() else {
            return Self::default();
        };
        let top = first.y;
        let bottom = spans.last().map_or(top, |s| s.y);
        assert!(bottom >= top, "clip spans must be sorted by scanline");
        let mut lines = vec![0..0; (bottom - top + 1) as usize];
        let mut bounds = IntRect {
            x0: i32::MAX,
            y0: top,
            x1: i32::MIN,
            y1: bottom + 1,
        };
        let mut start = 0;
        while start < spans.len() {
            let y = spans[start].y;
            let mut end = start;
            while end < spans.len() && spans[end].y == y {
                bounds.x0 = bounds.x0.min(spans[end].x);
                bounds.x1 = bounds.x1.max(spans[end].end());
                end += 1;
            }
            assert!(y >= top, "clip spans must be sorted by scanline");
            lines[(y - top) as usize] = start..end;
            start = end;
        }
        Self {
            spans,
            top,
            lines,
            bounds,
        }
    }

    /// A fully covered rectangular region.
    pub fn from_rect(rect: &IntRect) -> Self {
        if rect.is_empty() {
            return Self::default();
        }
        let spans = (rect.y0..rect.y1)
            .map(|y| Span::new(rect.x0, y, rect.width() as u32, 255))
            .collect();
        Self::from_spans(spans)
    }

    /// The bounding box of all clip spans.
    #[inline]
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    /// Whether the region covers nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All spans of the region.
    #[inline]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The clip spans of scanline `y`, empty outside the region.
    #[inline]
    pub fn line(&self, y: i32) -> &[Span] {
        if y < self.top {
            return &[];
        }
        self.lines
            .get((y - self.top) as usize)
            .map_or(&[], |r| &self.spans[r.clone()])
    }

    /// Intersect `spans` with the region, appending the result to `out`.
    ///
    /// Coverage of overlapping parts is the product of both coverages.
    pub fn intersect_spans<const N: usize>(&self, spans: &[Span], out: &mut SmallVec<[Span; N]>)
    where
        [Span; N]: smallvec::Array<Item = Span>,
    {
        for span in spans {
            let (sx1, sx2) = (span.x, span.end());
            for clip in self.line(span.y) {
                let (cx1, cx2) = (clip.x, clip.end());
                if cx2 <= sx1 {
                    continue;
                }
                if cx1 >= sx2 {
                    break;
                }
                let x = sx1.max(cx1);
                let len = sx2.min(cx2) - x;
                if len > 0 {
                    out.push(Span::new(
                        x,
                        span.y,
                        len as u32,
                        div_255(span.coverage as u32 * clip.coverage as u32) as u8,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{intersect_spans, ClipRegion, IntRect};
    use crate::Span;
    use smallvec::SmallVec;

    #[test]
    fn rect_clipping_trims_both_ends() {
        let rect = IntRect::from_xywh(2, 0, 4, 2);
        let spans = [
            Span::new(0, 0, 10, 255),
            Span::new(3, 1, 1, 128),
            Span::new(6, 1, 3, 255),
            Span::new(0, 2, 10, 255),
        ];
        let mut out = Vec::new();
        intersect_spans(&spans, &rect, &mut out);
        assert_eq!(out, vec![Span::new(2, 0, 4, 255), Span::new(3, 1, 1, 128)]);
    }

    #[test]
    fn region_multiplies_coverage() {
        let region = ClipRegion::from_spans(vec![Span::new(0, 5, 4, 128), Span::new(6, 5, 2, 255)]);
        let mut out: SmallVec<[Span; 8]> = SmallVec::new();
        region.intersect_spans(&[Span::new(2, 5, 6, 255), Span::new(0, 6, 6, 255)], &mut out);
        assert_eq!(
            out.as_slice(),
            &[Span::new(2, 5, 2, 128), Span::new(6, 5, 2, 255)]
        );
        assert_eq!(region.bounds(), IntRect::from_xywh(0, 5, 8, 1));
    }
}
