// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reading and writing raw pixel values by bits-per-pixel class.
//!
//! These functions know nothing about channels. They move packed pixel values between a
//! scanline and an unpacked buffer of one `u32` per pixel. Channel conversion happens afterwards
//! through the [`PixelLayout`](crate::PixelLayout) converters.

use crate::format::Bpp;

/// Read the pixel at `index` of `line`.
///
/// # Panics
///
/// Panics if the pixel lies outside `line`.
#[inline]
pub fn fetch_pixel(bpp: Bpp, line: &[u8], index: usize) -> u32 {
    match bpp {
        Bpp::None => 0,
        Bpp::Mono => ((line[index >> 3] >> (!index & 7)) & 1) as u32,
        Bpp::MonoLsb => ((line[index >> 3] >> (index & 7)) & 1) as u32,
        Bpp::Bpp8 => line[index] as u32,
        Bpp::Bpp16 => {
            let i = index * 2;
            u16::from_ne_bytes([line[i], line[i + 1]]) as u32
        }
        Bpp::Bpp24 => {
            let i = index * 3;
            ((line[i] as u32) << 16) | ((line[i + 1] as u32) << 8) | line[i + 2] as u32
        }
        Bpp::Bpp32 => {
            let i = index * 4;
            u32::from_ne_bytes([line[i], line[i + 1], line[i + 2], line[i + 3]])
        }
    }
}

/// Write `value` as the pixel at `index` of `line`. Only the low `bpp` bits are used.
///
/// # Panics
///
/// Panics if the pixel lies outside `line`.
#[inline]
pub fn store_pixel(bpp: Bpp, line: &mut [u8], index: usize, value: u32) {
    match bpp {
        Bpp::None => {}
        Bpp::Mono => {
            let bit = 0x80 >> (index & 7);
            if value & 1 != 0 {
                line[index >> 3] |= bit;
            } else {
                line[index >> 3] &= !bit;
            }
        }
        Bpp::MonoLsb => {
            let bit = 1 << (index & 7);
            if value & 1 != 0 {
                line[index >> 3] |= bit;
            } else {
                line[index >> 3] &= !bit;
            }
        }
        Bpp::Bpp8 => line[index] = value as u8,
        Bpp::Bpp16 => {
            let i = index * 2;
            line[i..i + 2].copy_from_slice(&(value as u16).to_ne_bytes());
        }
        Bpp::Bpp24 => {
            let i = index * 3;
            line[i] = (value >> 16) as u8;
            line[i + 1] = (value >> 8) as u8;
            line[i + 2] = value as u8;
        }
        Bpp::Bpp32 => {
            let i = index * 4;
            line[i..i + 4].copy_from_slice(&value.to_ne_bytes());
        }
    }
}

/// Read `out.len()` pixels starting at `index` of `line`.
///
/// # Panics
///
/// Panics if the run extends past `line`.
pub fn fetch_pixels(bpp: Bpp, out: &mut [u32], line: &[u8], index: usize) {
    match bpp {
        Bpp::Bpp8 => {
            let n = out.len();
            for (o, s) in out.iter_mut().zip(&line[index..index + n]) {
                *o = *s as u32;
            }
        }
        Bpp::Bpp16 => {
            let bytes = &line[index * 2..(index + out.len()) * 2];
            for (o, s) in out.iter_mut().zip(bytes.chunks_exact(2)) {
                *o = u16::from_ne_bytes([s[0], s[1]]) as u32;
            }
        }
        Bpp::Bpp24 => {
            let bytes = &line[index * 3..(index + out.len()) * 3];
            for (o, s) in out.iter_mut().zip(bytes.chunks_exact(3)) {
                *o = ((s[0] as u32) << 16) | ((s[1] as u32) << 8) | s[2] as u32;
            }
        }
        Bpp::Bpp32 => {
            let bytes = &line[index * 4..(index + out.len()) * 4];
            for (o, s) in out.iter_mut().zip(bytes.chunks_exact(4)) {
                *o = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
            }
        }
        Bpp::None | Bpp::Mono | Bpp::MonoLsb => {
            for (i, o) in out.iter_mut().enumerate() {
                *o = fetch_pixel(bpp, line, index + i);
            }
        }
    }
}

/// Write the pixels of `src` starting at `index` of `line`.
///
/// # Panics
///
/// Panics if the run extends past `line`.
pub fn store_pixels(bpp: Bpp, line: &mut [u8], index: usize, src: &[u32]) {
    match bpp {
        Bpp::Bpp8 => {
            for (d, s) in line[index..index + src.len()].iter_mut().zip(src) {
                *d = *s as u8;
            }
        }
        Bpp::Bpp16 => {
            let bytes = &mut line[index * 2..(index + src.len()) * 2];
            for (d, s) in bytes.chunks_exact_mut(2).zip(src) {
                d.copy_from_slice(&(*s as u16).to_ne_bytes());
            }
        }
        Bpp::Bpp24 => {
            let bytes = &mut line[index * 3..(index + src.len()) * 3];
            for (d, s) in bytes.chunks_exact_mut(3).zip(src) {
                d[0] = (*s >> 16) as u8;
                d[1] = (*s >> 8) as u8;
                d[2] = *s as u8;
            }
        }
        Bpp::Bpp32 => {
            let bytes = &mut line[index * 4..(index + src.len()) * 4];
            match bytemuck::try_cast_slice_mut::<u8, u32>(bytes) {
                Ok(words) => words.copy_from_slice(src),
                Err(_) => {
                    for (d, s) in bytes.chunks_exact_mut(4).zip(src) {
                        d.copy_from_slice(&s.to_ne_bytes());
                    }
                }
            }
        }
        Bpp::None | Bpp::Mono | Bpp::MonoLsb => {
            for (i, s) in src.iter().enumerate() {
                store_pixel(bpp, line, index + i, *s);
            }
        }
    }
}

/// A run of 32-bit pixels, either aliasing the scanline or copied into the scratch buffer.
///
/// Returns the aliased words when the scanline is suitably aligned, which is always the case for
/// [`Image`](crate::Image) storage.
///
/// # Panics
///
/// Panics if the run extends past `line` or `scratch` is shorter than `len`.
pub fn fetch_32<'a>(line: &'a [u8], index: usize, len: usize, scratch: &'a mut [u32]) -> &'a [u32] {
    let bytes = &line[index * 4..(index + len) * 4];
    match bytemuck::try_cast_slice::<u8, u32>(bytes) {
        Ok(words) => words,
        Err(_) => {
            let out = &mut scratch[..len];
            fetch_pixels(Bpp::Bpp32, out, line, index);
            out
        }
    }
}
