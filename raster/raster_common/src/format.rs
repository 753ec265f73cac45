// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel format identifiers.

/// A concrete in-memory pixel encoding.
///
/// Every per-format table in the engine is indexed by [`PixelFormat::index`] and sized to
/// [`PixelFormat::COUNT`]. [`PixelFormat::Invalid`] has no conversion functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PixelFormat {
    /// Not a format.
    #[default]
    Invalid,
    /// 1 bit per pixel, most significant bit first.
    Mono,
    /// 1 bit per pixel, least significant bit first.
    MonoLsb,
    /// 8-bit indices into a color table.
    Indexed8,
    /// `0xffRRGGBB`.
    Rgb32,
    /// `0xAARRGGBB`, not premultiplied.
    Argb32,
    /// `0xAARRGGBB`, premultiplied. This is the canonical 32-bit format.
    Argb32Premultiplied,
    /// 5-6-5 RGB in a native-endian `u16`.
    Rgb16,
    /// 8-bit alpha followed by 5-6-5 RGB, premultiplied.
    Argb8565Premultiplied,
    /// 6-6-6 RGB in 24 bits.
    Rgb666,
    /// 6-6-6-6 ARGB in 24 bits, premultiplied.
    Argb6666Premultiplied,
    /// 5-5-5 RGB in a native-endian `u16`.
    Rgb555,
    /// 8-bit alpha followed by 5-5-5 RGB, premultiplied.
    Argb8555Premultiplied,
    /// 8-8-8 RGB in 24 bits.
    Rgb888,
    /// 4-4-4 RGB in a native-endian `u16`.
    Rgb444,
    /// 4-4-4-4 ARGB in a native-endian `u16`, premultiplied.
    Argb4444Premultiplied,
    /// R, G, B, X bytes in memory order.
    Rgbx8888,
    /// R, G, B, A bytes in memory order, not premultiplied.
    Rgba8888,
    /// R, G, B, A bytes in memory order, premultiplied.
    Rgba8888Premultiplied,
    /// 10-10-10 with blue in the low bits and two unused alpha bits.
    Bgr30,
    /// 2-10-10-10 with blue in the low bits, premultiplied.
    A2Bgr30Premultiplied,
    /// 10-10-10 with red in the low bits and two unused alpha bits.
    Rgb30,
    /// 2-10-10-10 with red in the low bits, premultiplied.
    A2Rgb30Premultiplied,
    /// 8-bit alpha only.
    Alpha8,
    /// 8-bit luminance.
    Grayscale8,
}

impl PixelFormat {
    /// The number of formats, including [`PixelFormat::Invalid`].
    pub const COUNT: usize = 25;

    /// All formats in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Invalid,
        Self::Mono,
        Self::MonoLsb,
        Self::Indexed8,
        Self::Rgb32,
        Self::Argb32,
        Self::Argb32Premultiplied,
        Self::Rgb16,
        Self::Argb8565Premultiplied,
        Self::Rgb666,
        Self::Argb6666Premultiplied,
        Self::Rgb555,
        Self::Argb8555Premultiplied,
        Self::Rgb888,
        Self::Rgb444,
        Self::Argb4444Premultiplied,
        Self::Rgbx8888,
        Self::Rgba8888,
        Self::Rgba8888Premultiplied,
        Self::Bgr30,
        Self::A2Bgr30Premultiplied,
        Self::Rgb30,
        Self::A2Rgb30Premultiplied,
        Self::Alpha8,
        Self::Grayscale8,
    ];

    /// The table index of this format.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The storage class of one pixel.
    pub const fn bpp(self) -> Bpp {
        match self {
            Self::Invalid => Bpp::None,
            Self::Mono => Bpp::Mono,
            Self::MonoLsb => Bpp::MonoLsb,
            Self::Indexed8 | Self::Alpha8 | Self::Grayscale8 => Bpp::Bpp8,
            Self::Rgb16 | Self::Rgb555 | Self::Rgb444 | Self::Argb4444Premultiplied => Bpp::Bpp16,
            Self::Argb8565Premultiplied
            | Self::Rgb666
            | Self::Argb6666Premultiplied
            | Self::Argb8555Premultiplied
            | Self::Rgb888 => Bpp::Bpp24,
            Self::Rgb32
            | Self::Argb32
            | Self::Argb32Premultiplied
            | Self::Rgbx8888
            | Self::Rgba8888
            | Self::Rgba8888Premultiplied
            | Self::Bgr30
            | Self::A2Bgr30Premultiplied
            | Self::Rgb30
            | Self::A2Rgb30Premultiplied => Bpp::Bpp32,
        }
    }

    /// Bits used by one pixel.
    pub const fn depth(self) -> u32 {
        self.bpp().bits()
    }

    /// Whether pixels of this format can carry alpha other than fully opaque.
    ///
    /// Indexed formats report `true` since their color table may contain alpha.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Mono
                | Self::MonoLsb
                | Self::Indexed8
                | Self::Argb32
                | Self::Argb32Premultiplied
                | Self::Argb8565Premultiplied
                | Self::Argb6666Premultiplied
                | Self::Argb8555Premultiplied
                | Self::Argb4444Premultiplied
                | Self::Rgba8888
                | Self::Rgba8888Premultiplied
                | Self::A2Bgr30Premultiplied
                | Self::A2Rgb30Premultiplied
                | Self::Alpha8
        )
    }

    /// Whether pixels are stored as indices into a color table.
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Mono | Self::MonoLsb | Self::Indexed8)
    }

    /// The minimum number of bytes per scanline for `width` pixels, padded to 32 bits.
    pub const fn min_bytes_per_line(self, width: usize) -> usize {
        (width * self.depth() as usize).div_ceil(32) * 4
    }
}

/// The physical storage granularity of a pixel, independent of its channel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bpp {
    /// No storage.
    None,
    /// 1 bit, most significant bit first.
    Mono,
    /// 1 bit, least significant bit first.
    MonoLsb,
    /// 8 bits.
    Bpp8,
    /// 16 bits, native endian.
    Bpp16,
    /// 24 bits, most significant byte first.
    Bpp24,
    /// 32 bits, native endian.
    Bpp32,
}

impl Bpp {
    /// The number of bits per pixel.
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Mono | Self::MonoLsb => 1,
            Self::Bpp8 => 8,
            Self::Bpp16 => 16,
            Self::Bpp24 => 24,
            Self::Bpp32 => 32,
        }
    }
}
