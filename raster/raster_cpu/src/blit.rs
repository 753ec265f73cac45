// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mask blits, rectangle fills and the per-format table of draw helpers.
//!
//! Masks are placed at a device position and clipped to the destination. Bitmap blits and
//! rectangle fills write the color unblended. Alpha masks composite the color with source over
//! at the coverage of each mask pixel, and alpha-RGB masks do so per channel for subpixel text.

use raster_common::clip::ClipRegion;
use raster_common::fetch::store_pixel;
use raster_common::pixel::{
    alpha, blue, byte_mul, div_255, green, red, rgb, rgb16_to_32, rgb32_to_16,
};
use raster_common::{Error, PixelFormat, RasterBuffer, Rgba64, Span, BUFFER_SIZE};
use smallvec::SmallVec;

use crate::canonical::Canonical;
use crate::compose::ComposeSolidFn;
use crate::dest;
use crate::drivers::{
    blend_color_argb, blend_color_generic, blend_color_rgb16, blend_gradient_argb,
    blend_gradient_generic, blend_gradient_rgb16, process_spans, SpanFn,
};
use crate::mode::CompositionMode;
use crate::paint::{SolidColor, SpanData};
use crate::registry::Registry;

/// A read-only view of mask rows.
///
/// Strides are counted in elements of `T`.
#[derive(Clone, Copy, Debug)]
pub struct MaskView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
    row_len: usize,
}

impl<'a, T> MaskView<'a, T> {
    /// A mask with one element per pixel.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> Result<Self, Error> {
        Self::with_row_len(data, width, height, stride, width)
    }

    fn with_row_len(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
        row_len: usize,
    ) -> Result<Self, Error> {
        if stride < row_len {
            return Err(Error::StrideTooSmall {
                stride,
                min: row_len,
            });
        }
        let needed = match height {
            0 => 0,
            h => (h - 1) * stride + row_len,
        };
        if data.len() < needed {
            return Err(Error::BufferTooSmall {
                len: data.len(),
                needed,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            row_len,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The elements of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "mask row {y} out of range");
        let start = y * self.stride;
        &self.data[start..start + self.row_len]
    }
}

impl<'a> MaskView<'a, u8> {
    /// A 1-bit mask, most significant bit first.
    pub fn bitmap(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, Error> {
        Self::with_row_len(data, width, height, stride, width.div_ceil(8))
    }
}

/// Lookup tables between gamma-encoded 8-bit channels and linear light.
#[derive(Clone, Debug)]
pub struct GammaTables {
    to_linear: [u16; 256],
    from_linear: [u8; 4096],
}

impl GammaTables {
    /// Tables for the exponent `gamma`. Values that are not positive select 1.
    pub fn new(gamma: f32) -> Self {
        let gamma = if gamma > 0.0 { gamma } else { 1.0 };
        Self {
            to_linear: core::array::from_fn(|i| {
                ((i as f32 / 255.0).powf(gamma) * 65535.0 + 0.5) as u16
            }),
            from_linear: core::array::from_fn(|i| {
                ((i as f32 / 4095.0).powf(1.0 / gamma) * 255.0 + 0.5) as u8
            }),
        }
    }

    /// Blend channel `d` towards `s` by `m / 255` in linear light.
    #[inline]
    fn mix(&self, d: u32, s: u32, m: u32) -> u32 {
        match m {
            0 => d,
            255 => s,
            _ => {
                let dl = self.to_linear[d as usize] as u32;
                let sl = self.to_linear[s as usize] as u32;
                let l = (sl * m + dl * (255 - m)) / 255;
                self.from_linear[(l >> 4) as usize] as u32
            }
        }
    }
}

/// Writes `width` x `height` pixels at (`x`, `y`) with a color, unblended.
pub type RectFillFn = fn(&mut RasterBuffer<'_>, i32, i32, u32, u32, SolidColor);

/// Writes a color where a 1-bit mask placed at (`x`, `y`) is set.
pub type BitmapBlitFn = fn(&mut RasterBuffer<'_>, i32, i32, SolidColor, MaskView<'_, u8>);

/// Composites a color through an 8-bit coverage mask, optionally restricted to a clip region.
pub type AlphamapBlitFn =
    fn(&mut RasterBuffer<'_>, i32, i32, SolidColor, MaskView<'_, u8>, Option<&ClipRegion>);

/// Composites a color through a `0x00RRGGBB` per-channel coverage mask.
pub type AlphaRgbBlitFn = fn(
    &mut RasterBuffer<'_>,
    i32,
    i32,
    SolidColor,
    MaskView<'_, u32>,
    Option<&ClipRegion>,
    Option<&GammaTables>,
);

/// The drawing entry points of one destination format.
#[derive(Clone, Copy, Debug)]
pub struct DrawHelper {
    /// Spans with a solid color.
    pub blend_color: SpanFn,
    /// Spans with a gradient.
    pub blend_gradient: SpanFn,
    /// 1-bit masks.
    pub bitmap_blit: BitmapBlitFn,
    /// 8-bit coverage masks.
    pub alphamap_blit: AlphamapBlitFn,
    /// Per-channel coverage masks.
    pub alpha_rgb_blit: AlphaRgbBlitFn,
    /// Solid rectangles.
    pub fill_rect: RectFillFn,
}

/// The draw helper of `format`, `None` for formats that cannot be drawn into.
pub fn draw_helper(format: PixelFormat) -> Option<&'static DrawHelper> {
    DRAW_HELPERS[format.index()].as_ref()
}

/// Composite `spans` restricted to `clip`.
///
/// Coverage where both overlap is the product of the span and clip coverage.
pub fn fill_clipped(spans: &[Span], clip: &ClipRegion, data: &mut SpanData<'_>) {
    let mut clipped: SmallVec<[Span; 32]> = SmallVec::new();
    clip.intersect_spans(spans, &mut clipped);
    log::trace!("{} spans clipped to {}", spans.len(), clipped.len());
    process_spans(&clipped, data);
}

const ARGB: DrawHelper = DrawHelper {
    blend_color: blend_color_argb,
    blend_gradient: blend_gradient_argb,
    bitmap_blit: bitmap_blit::<Argb>,
    alphamap_blit: alphamap_blit_argb,
    alpha_rgb_blit: alpha_rgb_blit_argb,
    fill_rect: fill_rect::<Argb>,
};

const RGB16: DrawHelper = DrawHelper {
    blend_color: blend_color_rgb16,
    blend_gradient: blend_gradient_rgb16,
    bitmap_blit: bitmap_blit::<Rgb16>,
    alphamap_blit: alphamap_blit_rgb16,
    alpha_rgb_blit: alpha_rgb_blit_generic,
    fill_rect: fill_rect::<Rgb16>,
};

const MONO: DrawHelper = DrawHelper {
    blend_color: blend_color_generic,
    blend_gradient: blend_gradient_generic,
    bitmap_blit: bitmap_blit::<Dithered>,
    alphamap_blit: alphamap_blit_generic,
    alpha_rgb_blit: alpha_rgb_blit_generic,
    fill_rect: fill_rect::<Dithered>,
};

const NATIVE: DrawHelper = DrawHelper {
    blend_color: blend_color_generic,
    blend_gradient: blend_gradient_generic,
    bitmap_blit: bitmap_blit::<Native>,
    alphamap_blit: alphamap_blit_generic,
    alpha_rgb_blit: alpha_rgb_blit_generic,
    fill_rect: fill_rect::<Native>,
};

const RGB30: DrawHelper = DrawHelper {
    blend_color: blend_color_generic,
    blend_gradient: blend_gradient_generic,
    bitmap_blit: bitmap_blit::<Wide>,
    alphamap_blit: alphamap_blit_generic,
    alpha_rgb_blit: alpha_rgb_blit_generic,
    fill_rect: fill_rect::<Wide>,
};

static DRAW_HELPERS: [Option<DrawHelper>; PixelFormat::COUNT] = [
    None,         // Invalid
    Some(MONO),   // Mono
    Some(MONO),   // MonoLsb
    None,         // Indexed8
    Some(ARGB),   // Rgb32
    Some(NATIVE), // Argb32
    Some(ARGB),   // Argb32Premultiplied
    Some(RGB16),  // Rgb16
    Some(NATIVE), // Argb8565Premultiplied
    Some(NATIVE), // Rgb666
    Some(NATIVE), // Argb6666Premultiplied
    Some(NATIVE), // Rgb555
    Some(NATIVE), // Argb8555Premultiplied
    Some(NATIVE), // Rgb888
    Some(NATIVE), // Rgb444
    Some(NATIVE), // Argb4444Premultiplied
    Some(NATIVE), // Rgbx8888
    Some(NATIVE), // Rgba8888
    Some(NATIVE), // Rgba8888Premultiplied
    Some(RGB30),  // Bgr30
    Some(RGB30),  // A2Bgr30Premultiplied
    Some(RGB30),  // Rgb30
    Some(RGB30),  // A2Rgb30Premultiplied
    Some(NATIVE), // Alpha8
    Some(NATIVE), // Grayscale8
];

/// The part of one mask row that lands inside the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MaskPiece {
    x: usize,
    y: usize,
    len: usize,
    /// Mask row and column of the first pixel.
    row: usize,
    col: usize,
    /// Clip coverage over the piece.
    coverage: u8,
}

/// Split a `width` x `height` mask placed at (`x`, `y`) into row pieces inside a destination
/// of size `bounds` and, if given, inside `clip`.
fn for_each_piece(
    bounds: (u32, u32),
    (x, y): (i32, i32),
    (width, height): (usize, usize),
    clip: Option<&ClipRegion>,
    mut f: impl FnMut(MaskPiece),
) {
    let (x, y) = (x as i64, y as i64);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i64).min(bounds.0 as i64);
    let y1 = (y + height as i64).min(bounds.1 as i64);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    for dy in y0..y1 {
        let row = (dy - y) as usize;
        let Some(clip) = clip else {
            f(MaskPiece {
                x: x0 as usize,
                y: dy as usize,
                len: (x1 - x0) as usize,
                row,
                col: (x0 - x) as usize,
                coverage: 255,
            });
            continue;
        };
        for span in clip.line(dy as i32) {
            let start = (span.x as i64).max(x0);
            let end = (span.end() as i64).min(x1);
            if start < end {
                f(MaskPiece {
                    x: start as usize,
                    y: dy as usize,
                    len: (end - start) as usize,
                    row,
                    col: (start - x) as usize,
                    coverage: span.coverage,
                });
            }
        }
    }
}

/// How a run of one color is written into a destination.
trait RunFill {
    type Value: Copy;

    /// The value written for `color`, `None` if the destination has no encoding for it.
    fn prepare(buffer: &RasterBuffer<'_>, color: SolidColor) -> Option<Self::Value>;

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: Self::Value);
}

/// 32-bit words written directly.
struct Argb;

/// 16-bit words written directly.
struct Rgb16;

/// Any format of at least 8 bits per pixel, through its native encoding.
struct Native;

/// 30-bit formats, keeping 16-bit channel precision.
struct Wide;

/// Monochrome, through the dithered store.
struct Dithered;

impl RunFill for Native {
    type Value = u32;

    fn prepare(buffer: &RasterBuffer<'_>, color: SolidColor) -> Option<u32> {
        dest::to_native(buffer, color.argb32)
    }

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: u32) {
        let bpp = buffer.format().bpp();
        store_pixel(bpp, buffer.scan_line_mut(y), x, value);
        dest::fill_from_first(buffer, x, y, len);
    }
}

impl RunFill for Argb {
    type Value = u32;

    fn prepare(buffer: &RasterBuffer<'_>, color: SolidColor) -> Option<u32> {
        match buffer.format() {
            PixelFormat::Rgb32 => Some(color.argb32 | 0xff00_0000),
            _ => Some(color.argb32),
        }
    }

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: u32) {
        match buffer.scan_line_u32_mut(y) {
            Some(line) => line[x..x + len].fill(value),
            None => Native::run(buffer, x, y, len, value),
        }
    }
}

impl RunFill for Rgb16 {
    type Value = u16;

    fn prepare(_: &RasterBuffer<'_>, color: SolidColor) -> Option<u16> {
        Some(rgb32_to_16(color.argb32))
    }

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: u16) {
        match buffer.scan_line_u16_mut(y) {
            Some(line) => line[x..x + len].fill(value),
            None => Native::run(buffer, x, y, len, value as u32),
        }
    }
}

impl RunFill for Wide {
    type Value = Rgba64;

    fn prepare(_: &RasterBuffer<'_>, color: SolidColor) -> Option<Rgba64> {
        Some(color.rgba64)
    }

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: Rgba64) {
        dest::store_64(buffer, x, y, &[value]);
        dest::fill_from_first(buffer, x, y, len);
    }
}

impl RunFill for Dithered {
    type Value = u32;

    fn prepare(_: &RasterBuffer<'_>, color: SolidColor) -> Option<u32> {
        Some(color.argb32)
    }

    fn run(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize, value: u32) {
        let chunk = [value; 64];
        let mut at = 0;
        while at < len {
            let n = (len - at).min(chunk.len());
            dest::store_32(buffer, x + at, y, &chunk[..n]);
            at += n;
        }
    }
}

fn fill_rect<F: RunFill>(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: SolidColor,
) {
    let Some(value) = F::prepare(buffer, color) else {
        return;
    };
    let bounds = (buffer.width(), buffer.height());
    let size = (width as usize, height as usize);
    for_each_piece(bounds, (x, y), size, None, |p| {
        F::run(buffer, p.x, p.y, p.len, value);
    });
}

/// Call `f` with the offset and length of every run of set bits in columns
/// `start..start + len` of a 1-bit row.
fn set_runs(bits: &[u8], start: usize, len: usize, mut f: impl FnMut(usize, usize)) {
    let mut run = None;
    let mut i = 0;
    while i < len {
        let c = start + i;
        // Whole clear bytes are skipped at once.
        if c & 7 == 0 && run.is_none() && bits[c >> 3] == 0 {
            i += 8;
            continue;
        }
        let set = bits[c >> 3] & (0x80 >> (c & 7)) != 0;
        match (set, run) {
            (true, None) => run = Some(i),
            (false, Some(s)) => {
                f(s, i - s);
                run = None;
            }
            _ => {}
        }
        i += 1;
    }
    if let Some(s) = run {
        f(s, len - s);
    }
}

fn bitmap_blit<F: RunFill>(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u8>,
) {
    let Some(value) = F::prepare(buffer, color) else {
        return;
    };
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, (x, y), size, None, |p| {
        set_runs(mask.row(p.row), p.col, p.len, |off, n| {
            F::run(buffer, p.x + off, p.y, n, value);
        });
    });
}

/// Apply `func` over the runs of equal coverage in `mask`, scaled by the clip coverage `clip`.
fn coverage_runs<P: Copy>(
    dst: &mut [P],
    mask: &[u8],
    clip: u8,
    color: P,
    func: ComposeSolidFn<P>,
) {
    let scale = |m: u8| match clip {
        255 => m,
        c => div_255(m as u32 * c as u32) as u8,
    };
    let mut i = 0;
    while i < mask.len() {
        let coverage = scale(mask[i]);
        let mut j = i + 1;
        while j < mask.len() && scale(mask[j]) == coverage {
            j += 1;
        }
        if coverage != 0 {
            func(&mut dst[i..j], color, coverage);
        }
        i = j;
    }
}

/// One alpha-mask piece through the destination procedures.
fn alphamap_piece<P: Canonical>(
    buffer: &mut RasterBuffer<'_>,
    p: &MaskPiece,
    mask: &[u8],
    color: P,
    func: ComposeSolidFn<P>,
    scratch: &mut [P; BUFFER_SIZE],
) {
    let mut at = 0;
    while at < p.len {
        let n = (p.len - at).min(BUFFER_SIZE);
        let dst = &mut scratch[..n];
        P::fetch_dest(buffer, p.x + at, p.y, dst);
        coverage_runs(dst, &mask[at..at + n], p.coverage, color, func);
        P::store_dest(buffer, p.x + at, p.y, dst);
        at += n;
    }
}

fn alphamap_generic<P: Canonical>(
    buffer: &mut RasterBuffer<'_>,
    at: (i32, i32),
    color: P,
    mask: MaskView<'_, u8>,
    clip: Option<&ClipRegion>,
    func: ComposeSolidFn<P>,
) {
    let mut scratch = [P::TRANSPARENT; BUFFER_SIZE];
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, at, size, clip, |p| {
        let m = &mask.row(p.row)[p.col..p.col + p.len];
        alphamap_piece(buffer, &p, m, color, func, &mut scratch);
    });
}

fn alphamap_blit_generic(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u8>,
    clip: Option<&ClipRegion>,
) {
    let registry = Registry::global();
    if dest::wants_64(buffer.format()) {
        if let Some(func) = registry.compose_solid_64(CompositionMode::SourceOver) {
            alphamap_generic::<Rgba64>(buffer, (x, y), color.rgba64, mask, clip, func);
            return;
        }
    }
    let func = registry.compose_solid(CompositionMode::SourceOver);
    alphamap_generic::<u32>(buffer, (x, y), color.argb32, mask, clip, func);
}

fn alphamap_blit_argb(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u8>,
    clip: Option<&ClipRegion>,
) {
    let func = Registry::global().compose_solid(CompositionMode::SourceOver);
    let mut scratch = [0_u32; BUFFER_SIZE];
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, (x, y), size, clip, |p| {
        let m = &mask.row(p.row)[p.col..p.col + p.len];
        match buffer.scan_line_u32_mut(p.y) {
            Some(line) => {
                coverage_runs(&mut line[p.x..p.x + p.len], m, p.coverage, color.argb32, func);
            }
            None => alphamap_piece(buffer, &p, m, color.argb32, func, &mut scratch),
        }
    });
}

fn alphamap_blit_rgb16(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u8>,
    clip: Option<&ClipRegion>,
) {
    let func = Registry::global().compose_solid(CompositionMode::SourceOver);
    let mut scratch = [0_u32; BUFFER_SIZE];
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, (x, y), size, clip, |p| {
        let m = &mask.row(p.row)[p.col..p.col + p.len];
        match buffer.scan_line_u16_mut(p.y) {
            Some(line) => {
                let line = &mut line[p.x..p.x + p.len];
                for (row, m) in line.chunks_mut(BUFFER_SIZE).zip(m.chunks(BUFFER_SIZE)) {
                    let dst = &mut scratch[..row.len()];
                    for (d, s) in dst.iter_mut().zip(row.iter()) {
                        *d = rgb16_to_32(*s);
                    }
                    coverage_runs(dst, m, p.coverage, color.argb32, func);
                    for (s, d) in row.iter_mut().zip(dst.iter()) {
                        *s = rgb32_to_16(*d);
                    }
                }
            }
            None => alphamap_piece(buffer, &p, m, color.argb32, func, &mut scratch),
        }
    });
}

#[inline]
fn source_over(s: u32, d: u32) -> u32 {
    match alpha(s) {
        255 => s,
        0 => d,
        a => s.wrapping_add(byte_mul(d, 255 - a)),
    }
}

/// Blend `src` onto `d` through the per-channel coverage `coverage` (`0x00RRGGBB`).
///
/// Destinations that are not opaque fall back to a gray coverage.
fn alpha_rgb_pixel(d: u32, src: u32, coverage: u32, gamma: Option<&GammaTables>) -> u32 {
    if coverage == 0 {
        return d;
    }
    if coverage == 0x00ff_ffff && alpha(src) == 255 {
        return src;
    }
    if alpha(d) != 255 {
        let gray = (red(coverage) * 5 + green(coverage) * 6 + blue(coverage) * 5) / 16;
        return source_over(byte_mul(src, gray), d);
    }
    let s = source_over(src, d);
    let mix = |dc: u32, sc: u32, m: u32| match gamma {
        Some(g) => g.mix(dc, sc, m),
        None => div_255(sc * m + dc * (255 - m)),
    };
    rgb(
        mix(red(d), red(s), red(coverage)),
        mix(green(d), green(s), green(coverage)),
        mix(blue(d), blue(s), blue(coverage)),
    )
}

fn alpha_rgb_row(dst: &mut [u32], mask: &[u32], clip: u8, src: u32, gamma: Option<&GammaTables>) {
    for (d, &m) in dst.iter_mut().zip(mask) {
        let m = match clip {
            255 => m,
            c => byte_mul(m, c as u32),
        };
        *d = alpha_rgb_pixel(*d, src, m & 0x00ff_ffff, gamma);
    }
}

fn alpha_rgb_piece(
    buffer: &mut RasterBuffer<'_>,
    p: &MaskPiece,
    mask: &[u32],
    src: u32,
    gamma: Option<&GammaTables>,
    scratch: &mut [u32; BUFFER_SIZE],
) {
    let mut at = 0;
    while at < p.len {
        let n = (p.len - at).min(BUFFER_SIZE);
        let dst = &mut scratch[..n];
        dest::fetch_32(buffer, p.x + at, p.y, dst);
        alpha_rgb_row(dst, &mask[at..at + n], p.coverage, src, gamma);
        dest::store_32(buffer, p.x + at, p.y, dst);
        at += n;
    }
}

fn alpha_rgb_blit_generic(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u32>,
    clip: Option<&ClipRegion>,
    gamma: Option<&GammaTables>,
) {
    let mut scratch = [0_u32; BUFFER_SIZE];
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, (x, y), size, clip, |p| {
        let m = &mask.row(p.row)[p.col..p.col + p.len];
        alpha_rgb_piece(buffer, &p, m, color.argb32, gamma, &mut scratch);
    });
}

fn alpha_rgb_blit_argb(
    buffer: &mut RasterBuffer<'_>,
    x: i32,
    y: i32,
    color: SolidColor,
    mask: MaskView<'_, u32>,
    clip: Option<&ClipRegion>,
    gamma: Option<&GammaTables>,
) {
    let mut scratch = [0_u32; BUFFER_SIZE];
    let bounds = (buffer.width(), buffer.height());
    let size = (mask.width(), mask.height());
    for_each_piece(bounds, (x, y), size, clip, |p| {
        let m = &mask.row(p.row)[p.col..p.col + p.len];
        match buffer.scan_line_u32_mut(p.y) {
            Some(line) => {
                alpha_rgb_row(&mut line[p.x..p.x + p.len], m, p.coverage, color.argb32, gamma);
            }
            None => alpha_rgb_piece(buffer, &p, m, color.argb32, gamma, &mut scratch),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_placed_and_clipped_to_the_destination() {
        let mut pieces = Vec::new();
        for_each_piece((10, 4), (-2, 2), (5, 5), None, |p| pieces.push(p));
        assert_eq!(pieces.len(), 2);
        assert_eq!(
            pieces[0],
            MaskPiece {
                x: 0,
                y: 2,
                len: 3,
                row: 0,
                col: 2,
                coverage: 255
            }
        );
        assert_eq!(pieces[1].y, 3);
        assert_eq!(pieces[1].row, 1);

        pieces.clear();
        for_each_piece((10, 4), (12, 0), (5, 5), None, |p| pieces.push(p));
        assert!(pieces.is_empty());
    }

    #[test]
    fn clip_lines_split_pieces() {
        let clip = ClipRegion::from_spans(vec![Span::new(0, 1, 2, 255), Span::new(4, 1, 10, 100)]);
        let mut pieces = Vec::new();
        for_each_piece((16, 4), (1, 0), (6, 3), Some(&clip), |p| pieces.push(p));
        assert_eq!(
            pieces,
            vec![
                MaskPiece {
                    x: 1,
                    y: 1,
                    len: 1,
                    row: 1,
                    col: 0,
                    coverage: 255
                },
                MaskPiece {
                    x: 4,
                    y: 1,
                    len: 3,
                    row: 1,
                    col: 3,
                    coverage: 100
                },
            ]
        );
    }

    #[test]
    fn set_bit_runs() {
        let mut runs = Vec::new();
        set_runs(&[0b1110_0000, 0, 0b0000_0011], 0, 24, |s, n| runs.push((s, n)));
        assert_eq!(runs, vec![(0, 3), (22, 2)]);

        runs.clear();
        set_runs(&[0b1111_1111, 0b1000_0000], 2, 7, |s, n| runs.push((s, n)));
        assert_eq!(runs, vec![(0, 7)]);
    }

    #[test]
    fn mask_views_check_their_storage() {
        let data = [0_u8; 10];
        assert!(MaskView::new(&data[..], 2, 3, 4).is_ok());
        assert_eq!(
            MaskView::new(&data[..], 4, 3, 3).unwrap_err(),
            Error::StrideTooSmall { stride: 3, min: 4 }
        );
        assert_eq!(
            MaskView::new(&data[..], 4, 3, 4).unwrap_err(),
            Error::BufferTooSmall { len: 10, needed: 12 }
        );
        let bits = MaskView::bitmap(&data[..], 9, 5, 2).unwrap();
        assert_eq!(bits.row(4).len(), 2);
    }

    #[test]
    fn full_lcd_coverage_of_an_opaque_color_writes_it() {
        assert_eq!(alpha_rgb_pixel(0xff102030, 0xffa0b0c0, 0x00ffffff, None), 0xffa0b0c0);
        assert_eq!(alpha_rgb_pixel(0xff102030, 0xffa0b0c0, 0, None), 0xff102030);
    }

    #[test]
    fn lcd_coverage_is_per_channel() {
        let d = 0xff000000;
        let out = alpha_rgb_pixel(d, 0xffffffff, 0x00ff0080, None);
        assert_eq!(red(out), 255);
        assert_eq!(green(out), 0);
        assert_eq!(blue(out), 128);
        assert_eq!(alpha(out), 255);
    }

    #[test]
    fn translucent_destinations_use_gray_coverage() {
        let out = alpha_rgb_pixel(0, 0xffffffff, 0x00808080, None);
        assert_eq!(out, byte_mul(0xffffffff, 128));
    }

    #[test]
    fn gamma_mix_keeps_end_points() {
        let g = GammaTables::new(2.2);
        for v in [0, 1, 17, 128, 254, 255] {
            assert_eq!(g.mix(v, 255 - v, 0), v);
            assert_eq!(g.mix(v, 255 - v, 255), 255 - v);
        }
        let linear = GammaTables::new(1.0);
        let mid = linear.mix(0, 255, 128);
        assert!((127..=129).contains(&mid), "{mid}");
        // Gamma pushes the mid point of black and white above the linear mean.
        assert!(g.mix(0, 255, 128) > mid);
    }

    #[test]
    fn only_writable_formats_have_helpers() {
        for format in PixelFormat::ALL {
            assert_eq!(draw_helper(format).is_some(), dest::is_writable(format), "{format:?}");
        }
    }
}
