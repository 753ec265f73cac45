// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

use raster_common::pixel::{alpha, blue, green, red};
use raster_common::{Image, PixelFormat, Span};
use raster_cpu::{process_spans, SpanData};

/// An image of `format` with every pixel set to the premultiplied `argb`.
pub(crate) fn filled(width: u32, height: u32, format: PixelFormat, argb: u32) -> Image {
    let pixels = vec![argb; (width * height) as usize];
    Image::from_argb32(width, height, format, &pixels).unwrap()
}

/// An opaque image where every pixel is distinct.
pub(crate) fn pattern(width: u32, height: u32, format: PixelFormat) -> Image {
    let pixels: Vec<u32> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let r = (x * 29 + 7) & 0xff;
            let g = (y * 31 + 3) & 0xff;
            let b = ((x ^ y) * 5) & 0xff;
            0xff000000 | r << 16 | g << 8 | b
        })
        .collect();
    Image::from_argb32(width, height, format, &pixels).unwrap()
}

/// A spread of premultiplied colors with varying alpha, in row-major order.
pub(crate) fn translucent(width: u32, height: u32, format: PixelFormat) -> Image {
    let pixels: Vec<u32> = (0..width * height)
        .map(|i| {
            let a = (i * 37 + 11) & 0xff;
            let c = |k: u32| ((i * k) & 0xff) * a / 255;
            a << 24 | c(53) << 16 | c(91) << 8 | c(17)
        })
        .collect();
    Image::from_argb32(width, height, format, &pixels).unwrap()
}

/// All pixels as premultiplied `0xAARRGGBB`, row-major.
pub(crate) fn pixels(image: &Image) -> Vec<u32> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| image.pixel(x, y))
        .collect()
}

/// The bytes of `image` placed one byte into a new allocation. A buffer over `[1..]` has
/// misaligned rows and takes the generic fetch and store paths.
pub(crate) fn misaligned(image: &Image) -> Vec<u8> {
    let mut storage = vec![0_u8; image.data().len() + 1];
    storage[1..].copy_from_slice(image.data());
    storage
}

/// One full-row span per scanline.
pub(crate) fn rows(width: u32, height: u32, coverage: u8) -> Vec<Span> {
    (0..height as i32)
        .map(|y| Span::new(0, y, width, coverage))
        .collect()
}

/// Spans of varying length and coverage, sorted and inside a `width` x `height` buffer.
pub(crate) fn ragged(width: u32, height: u32) -> Vec<Span> {
    let mut spans = Vec::new();
    for y in 0..height as i32 {
        let mut x = (y * 3) % 5;
        let mut k = y as u32;
        while x < width as i32 {
            let len = ((k * 7) % 9 + 1).min(width - x as u32);
            let coverage = [255, 0, 128, 1, 254, 77][(k % 6) as usize];
            spans.push(Span::new(x, y, len, coverage));
            x += len as i32 + (k % 3) as i32;
            k += 1;
        }
    }
    spans
}

/// Draw `spans` into `image` with the paint set up by `setup`.
pub(crate) fn draw<'a>(
    image: &'a mut Image,
    spans: &[Span],
    setup: impl FnOnce(&mut SpanData<'a>),
) {
    let mut data = SpanData::new(image.as_raster_buffer());
    setup(&mut data);
    process_spans(spans, &mut data);
}

/// The largest difference between corresponding channels.
pub(crate) fn channel_diff(a: u32, b: u32) -> u32 {
    let channels: [fn(u32) -> u32; 4] = [alpha, red, green, blue];
    channels
        .iter()
        .map(|f| f(a).abs_diff(f(b)))
        .max()
        .unwrap_or(0)
}
