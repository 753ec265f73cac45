// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coverage spans, the interface between a scan converter and the span drivers.

/// A horizontal run of pixels on one scanline, all with the same coverage.
///
/// Spans are produced by an external scan converter. Within one batch they are ordered by
/// ascending `y` and then `x`, and spans on the same scanline never overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// The first pixel of the run.
    pub x: i32,
    /// The scanline.
    pub y: i32,
    /// Number of pixels.
    pub len: u32,
    /// Antialiasing weight, where 255 is full coverage.
    pub coverage: u8,
}

impl Span {
    /// Create a new span.
    pub const fn new(x: i32, y: i32, len: u32, coverage: u8) -> Self {
        Self {
            x,
            y,
            len,
            coverage,
        }
    }

    /// One past the last pixel of the run.
    #[inline]
    pub const fn end(&self) -> i32 {
        self.x + self.len as i32
    }
}

/// Whether every span of the batch has full coverage.
pub fn all_opaque(spans: &[Span]) -> bool {
    spans.iter().all(|s| s.coverage == 255)
}
