// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Destination fetch and store procedures.
//!
//! A fetch reads a run of destination pixels into canonical form and a store writes canonical
//! pixels back in the native encoding of the buffer. Monochrome stores quantize either against
//! the attached palette or, without one, with an ordered dither.

use raster_common::fetch::{fetch_pixels, store_pixel, store_pixels};
use raster_common::pixel::{argb_to_rgba, gray_of, rgb16_to_32, rgb32_to_16};
use raster_common::{rgba64_to_rgb30, PixelFormat, RasterBuffer, Rgb30Order, Rgba64, BUFFER_SIZE};

/// The 16x16 ordered dither matrix used for monochrome stores without a palette.
pub(crate) static BAYER: [[u8; 16]; 16] = [
    [
        0x1, 0xc0, 0x30, 0xf0, 0xc, 0xcc, 0x3c, 0xfc, 0x3, 0xc3, 0x33, 0xf3, 0xf, 0xcf, 0x3f, 0xff,
    ],
    [
        0x80, 0x40, 0xb0, 0x70, 0x8c, 0x4c, 0xbc, 0x7c, 0x83, 0x43, 0xb3, 0x73, 0x8f, 0x4f, 0xbf,
        0x7f,
    ],
    [
        0x20, 0xe0, 0x10, 0xd0, 0x2c, 0xec, 0x1c, 0xdc, 0x23, 0xe3, 0x13, 0xd3, 0x2f, 0xef, 0x1f,
        0xdf,
    ],
    [
        0xa0, 0x60, 0x90, 0x50, 0xac, 0x6c, 0x9c, 0x5c, 0xa3, 0x63, 0x93, 0x53, 0xaf, 0x6f, 0x9f,
        0x5f,
    ],
    [
        0x8, 0xc8, 0x38, 0xf8, 0x4, 0xc4, 0x34, 0xf4, 0xb, 0xcb, 0x3b, 0xfb, 0x7, 0xc7, 0x37, 0xf7,
    ],
    [
        0x88, 0x48, 0xb8, 0x78, 0x84, 0x44, 0xb4, 0x74, 0x8b, 0x4b, 0xbb, 0x7b, 0x87, 0x47, 0xb7,
        0x77,
    ],
    [
        0x28, 0xe8, 0x18, 0xd8, 0x24, 0xe4, 0x14, 0xd4, 0x2b, 0xeb, 0x1b, 0xdb, 0x27, 0xe7, 0x17,
        0xd7,
    ],
    [
        0xa8, 0x68, 0x98, 0x58, 0xa4, 0x64, 0x94, 0x54, 0xab, 0x6b, 0x9b, 0x5b, 0xa7, 0x67, 0x97,
        0x57,
    ],
    [
        0x2, 0xc2, 0x32, 0xf2, 0xe, 0xce, 0x3e, 0xfe, 0x1, 0xc1, 0x31, 0xf1, 0xd, 0xcd, 0x3d, 0xfd,
    ],
    [
        0x82, 0x42, 0xb2, 0x72, 0x8e, 0x4e, 0xbe, 0x7e, 0x81, 0x41, 0xb1, 0x71, 0x8d, 0x4d, 0xbd,
        0x7d,
    ],
    [
        0x22, 0xe2, 0x12, 0xd2, 0x2e, 0xee, 0x1e, 0xde, 0x21, 0xe1, 0x11, 0xd1, 0x2d, 0xed, 0x1d,
        0xdd,
    ],
    [
        0xa2, 0x62, 0x92, 0x52, 0xae, 0x6e, 0x9e, 0x5e, 0xa1, 0x61, 0x91, 0x51, 0xad, 0x6d, 0x9d,
        0x5d,
    ],
    [
        0xa, 0xca, 0x3a, 0xfa, 0x6, 0xc6, 0x36, 0xf6, 0x9, 0xc9, 0x39, 0xf9, 0x5, 0xc5, 0x35, 0xf5,
    ],
    [
        0x8a, 0x4a, 0xba, 0x7a, 0x86, 0x46, 0xb6, 0x76, 0x89, 0x49, 0xb9, 0x79, 0x85, 0x45, 0xb5,
        0x75,
    ],
    [
        0x2a, 0xea, 0x1a, 0xda, 0x26, 0xe6, 0x16, 0xd6, 0x29, 0xe9, 0x19, 0xd9, 0x25, 0xe5, 0x15,
        0xd5,
    ],
    [
        0xaa, 0x6a, 0x9a, 0x5a, 0xa6, 0x66, 0x96, 0x56, 0xa9, 0x69, 0x99, 0x59, 0xa5, 0x65, 0x95,
        0x55,
    ],
];

/// Colors read back from a monochrome buffer without a palette.
const MONO_WHITE: u32 = 0xffffffff;
const MONO_BLACK: u32 = 0xff000000;

/// Whether destinations of `format` are composited at 16 bits per channel.
#[inline]
pub(crate) fn wants_64(format: PixelFormat) -> bool {
    matches!(
        format,
        PixelFormat::Bgr30
            | PixelFormat::A2Bgr30Premultiplied
            | PixelFormat::Rgb30
            | PixelFormat::A2Rgb30Premultiplied
    )
}

/// Whether destinations of `format` can be composited without any destination procedure.
#[inline]
pub(crate) fn is_canonical(format: PixelFormat) -> bool {
    matches!(format, PixelFormat::Rgb32 | PixelFormat::Argb32Premultiplied)
}

/// Whether `format` has destination procedures at all.
///
/// Indexed color is read-only, and [`PixelFormat::Invalid`] is never a destination.
#[inline]
pub(crate) fn is_writable(format: PixelFormat) -> bool {
    !matches!(format, PixelFormat::Invalid | PixelFormat::Indexed8)
}

fn rgb30_order(buffer: &RasterBuffer<'_>) -> Rgb30Order {
    if buffer.layout().red_shift == 0 {
        Rgb30Order::Bgr
    } else {
        Rgb30Order::Rgb
    }
}

/// Read `out.len()` pixels of row `y` starting at `x` as premultiplied `0xAARRGGBB`.
///
/// # Panics
///
/// Panics if the run extends past the buffer.
pub(crate) fn fetch_32(buffer: &RasterBuffer<'_>, x: usize, y: usize, out: &mut [u32]) {
    let format = buffer.format();
    let bpp = format.bpp();
    let line = buffer.scan_line(y);
    match format {
        PixelFormat::Mono | PixelFormat::MonoLsb => {
            let (c0, c1) = match buffer.mono_palette() {
                Some(m) => (m.color0, m.color1),
                None => (MONO_WHITE, MONO_BLACK),
            };
            fetch_pixels(bpp, out, line, x);
            for p in out.iter_mut() {
                *p = if *p == 0 { c0 } else { c1 };
            }
        }
        PixelFormat::Rgb16 => {
            fetch_pixels(bpp, out, line, x);
            for p in out.iter_mut() {
                *p = rgb16_to_32(*p as u16);
            }
        }
        PixelFormat::Rgb32 | PixelFormat::Argb32Premultiplied => fetch_pixels(bpp, out, line, x),
        PixelFormat::Invalid | PixelFormat::Indexed8 => out.fill(0),
        _ => {
            fetch_pixels(bpp, out, line, x);
            let layout = buffer.layout();
            match layout.to_argb32 {
                Some(convert) => convert(out, layout, None),
                None => out.fill(0),
            }
        }
    }
}

/// Write premultiplied `0xAARRGGBB` pixels to row `y` starting at `x`.
///
/// # Panics
///
/// Panics if the run extends past the buffer.
pub(crate) fn store_32(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[u32]) {
    let format = buffer.format();
    let bpp = format.bpp();
    match format {
        PixelFormat::Mono | PixelFormat::MonoLsb => store_mono(buffer, x, y, src),
        PixelFormat::Rgb16 => {
            let line = buffer.scan_line_mut(y);
            for (i, p) in src.iter().enumerate() {
                store_pixel(bpp, line, x + i, rgb32_to_16(*p) as u32);
            }
        }
        PixelFormat::Rgb32 | PixelFormat::Argb32Premultiplied => {
            store_pixels(bpp, buffer.scan_line_mut(y), x, src);
        }
        PixelFormat::Invalid | PixelFormat::Indexed8 => {}
        _ => {
            let layout = buffer.layout();
            let Some(convert) = layout.store_converter() else {
                return;
            };
            let mut scratch = [0_u32; BUFFER_SIZE];
            for (n, chunk) in src.chunks(BUFFER_SIZE).enumerate() {
                let tmp = &mut scratch[..chunk.len()];
                tmp.copy_from_slice(chunk);
                convert(tmp, layout);
                store_pixels(bpp, buffer.scan_line_mut(y), x + n * BUFFER_SIZE, tmp);
            }
        }
    }
}

fn store_mono(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[u32]) {
    let bpp = buffer.format().bpp();
    let palette = buffer.mono_palette();
    let dither = &BAYER[y & 15];
    let line = buffer.scan_line_mut(y);
    for (i, p) in src.iter().enumerate() {
        let px = x + i;
        let set = match palette {
            Some(m) if *p == m.color0 => false,
            Some(m) if *p == m.color1 => true,
            Some(m) => m.nearest_is_color1(*p),
            None => gray_of(*p) < dither[px & 15] as u32,
        };
        store_pixel(bpp, line, px, set as u32);
    }
}

/// Read `out.len()` pixels of row `y` starting at `x` at 16 bits per channel.
///
/// # Panics
///
/// Panics if the run extends past the buffer.
pub(crate) fn fetch_64(buffer: &RasterBuffer<'_>, x: usize, y: usize, out: &mut [Rgba64]) {
    let format = buffer.format();
    let layout = buffer.layout();
    let mut raw = [0_u32; BUFFER_SIZE];
    for (n, chunk) in out.chunks_mut(BUFFER_SIZE).enumerate() {
        let raw = &mut raw[..chunk.len()];
        let at = x + n * BUFFER_SIZE;
        match layout.to_rgba64 {
            Some(convert) if !format.is_indexed() => {
                fetch_pixels(format.bpp(), raw, buffer.scan_line(y), at);
                convert(chunk, raw, layout, None);
            }
            _ => {
                fetch_32(buffer, at, y, raw);
                for (d, s) in chunk.iter_mut().zip(raw.iter()) {
                    *d = Rgba64::from_argb32(*s);
                }
            }
        }
    }
}

/// Write 16-bit per channel pixels to row `y` starting at `x`.
///
/// Formats that cannot hold more than 8 bits per channel are stored through [`store_32`].
///
/// # Panics
///
/// Panics if the run extends past the buffer.
pub(crate) fn store_64(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, src: &[Rgba64]) {
    let format = buffer.format();
    let bpp = format.bpp();
    let order = rgb30_order(buffer);
    let mut scratch = [0_u32; BUFFER_SIZE];
    for (n, chunk) in src.chunks(BUFFER_SIZE).enumerate() {
        let tmp = &mut scratch[..chunk.len()];
        let at = x + n * BUFFER_SIZE;
        match format {
            PixelFormat::Argb32 => {
                for (d, s) in tmp.iter_mut().zip(chunk) {
                    *d = s.unpremultiplied().to_argb32();
                }
                store_pixels(bpp, buffer.scan_line_mut(y), at, tmp);
            }
            PixelFormat::Rgba8888 => {
                for (d, s) in tmp.iter_mut().zip(chunk) {
                    *d = argb_to_rgba(s.unpremultiplied().to_argb32());
                }
                store_pixels(bpp, buffer.scan_line_mut(y), at, tmp);
            }
            f if wants_64(f) => {
                for (d, s) in tmp.iter_mut().zip(chunk) {
                    *d = rgba64_to_rgb30(*s, order);
                }
                store_pixels(bpp, buffer.scan_line_mut(y), at, tmp);
            }
            _ => {
                for (d, s) in tmp.iter_mut().zip(chunk) {
                    *d = s.to_argb32();
                }
                store_32(buffer, at, y, tmp);
            }
        }
    }
}

/// The native value of the premultiplied color `argb`, for formats of at least 8 bits per pixel.
pub(crate) fn to_native(buffer: &RasterBuffer<'_>, argb: u32) -> Option<u32> {
    match buffer.format() {
        PixelFormat::Rgb32 | PixelFormat::Argb32Premultiplied => Some(argb),
        PixelFormat::Rgb16 => Some(rgb32_to_16(argb) as u32),
        PixelFormat::Invalid
        | PixelFormat::Mono
        | PixelFormat::MonoLsb
        | PixelFormat::Indexed8 => None,
        _ => {
            let layout = buffer.layout();
            let convert = layout.store_converter()?;
            let mut v = [argb];
            convert(&mut v, layout);
            Some(v[0])
        }
    }
}

/// Replicate the pixel at `x` over the following `len - 1` pixels of row `y`.
///
/// Only valid for formats of at least 8 bits per pixel.
///
/// # Panics
///
/// Panics if the run extends past the buffer.
pub(crate) fn fill_from_first(buffer: &mut RasterBuffer<'_>, x: usize, y: usize, len: usize) {
    let size = (buffer.format().bpp().bits() / 8) as usize;
    if size == 0 || len < 2 {
        return;
    }
    let line = &mut buffer.scan_line_mut(y)[x * size..(x + len) * size];
    let (first, rest) = line.split_at_mut(size);
    for pixel in rest.chunks_exact_mut(size) {
        pixel.copy_from_slice(first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::Image;

    #[test]
    fn first_pixel_is_replicated_bytewise() {
        let mut image = Image::new(5, 1, PixelFormat::Rgb888).unwrap();
        let mut buffer = image.as_raster_buffer();
        let native = to_native(&buffer, 0xff102030).unwrap();
        store_pixel(PixelFormat::Rgb888.bpp(), buffer.scan_line_mut(0), 1, native);
        fill_from_first(&mut buffer, 1, 0, 3);
        assert_eq!(image.pixel(0, 0), 0xff000000);
        for x in 1..4 {
            assert_eq!(image.pixel(x, 0), 0xff102030);
        }
        assert_eq!(image.pixel(4, 0), 0xff000000);
    }

    #[test]
    fn dither_matrix_is_a_permutation() {
        let mut seen = [false; 256];
        for row in BAYER {
            for v in row {
                seen[v as usize] = true;
            }
        }
        // 0x00 never appears, 0x01 takes its place in the top-left corner.
        assert_eq!(seen.iter().filter(|s| !**s).count(), 1);
        assert!(!seen[0]);
    }

    #[test]
    fn mono_store_dithers_mid_gray() {
        let mut image = Image::new(16, 1, PixelFormat::Mono).unwrap();
        let mut buffer = image.as_raster_buffer();
        store_32(&mut buffer, 0, 0, &[0xff808080; 16]);
        let mut back = [0_u32; 16];
        fetch_32(&buffer, 0, 0, &mut back);
        let black = back.iter().filter(|p| **p == MONO_BLACK).count();
        assert!((6..=10).contains(&black), "{black} of 16 set");
    }

    #[test]
    fn mono_store_with_palette_quantizes() {
        let mut image = Image::new(3, 1, PixelFormat::MonoLsb)
            .unwrap()
            .with_color_table(vec![0xff0000ff, 0xffff0000]);
        let mut buffer = image.as_raster_buffer();
        store_32(&mut buffer, 0, 0, &[0xff0000ff, 0xffff0000, 0xfff00010]);
        let mut back = [0_u32; 3];
        fetch_32(&buffer, 0, 0, &mut back);
        assert_eq!(back, [0xff0000ff, 0xffff0000, 0xffff0000]);
    }

    #[test]
    fn rgb16_round_trips_through_canonical() {
        let mut image = Image::new(2, 1, PixelFormat::Rgb16).unwrap();
        let mut buffer = image.as_raster_buffer();
        store_32(&mut buffer, 0, 0, &[0xffffffff, 0xff00ff00]);
        let mut back = [0_u32; 2];
        fetch_32(&buffer, 0, 0, &mut back);
        assert_eq!(back, [0xffffffff, 0xff00ff00]);
    }

    #[test]
    fn rgb30_keeps_wide_precision() {
        let mut image = Image::new(1, 1, PixelFormat::A2Rgb30Premultiplied).unwrap();
        let mut buffer = image.as_raster_buffer();
        let c = Rgba64::new(0x1040, 0x8000, 0xffff, 0xffff);
        store_64(&mut buffer, 0, 0, &[c]);
        let mut back = [Rgba64::TRANSPARENT];
        fetch_64(&buffer, 0, 0, &mut back);
        assert_eq!(back[0].a, 0xffff);
        assert!(back[0].r.abs_diff(c.r) < 64);
        assert!(back[0].g.abs_diff(c.g) < 64);
        assert_eq!(back[0].b, 0xffff);
    }

    #[test]
    fn unpremultiplied_store_from_wide() {
        let mut image = Image::new(1, 1, PixelFormat::Argb32).unwrap();
        let mut buffer = image.as_raster_buffer();
        store_64(&mut buffer, 0, 0, &[Rgba64::new(0x8080, 0, 0, 0x8080)]);
        assert_eq!(image.raw_pixel(0, 0), 0x80ff0000);
    }
}
