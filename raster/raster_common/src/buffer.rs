// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster buffers: bounds-aware views over pixel storage, and an owned image type.

use crate::error::{Error, Result};
use crate::fetch;
use crate::format::{Bpp, PixelFormat};
use crate::layout::PixelLayout;
use crate::pixel;

/// The largest supported width or height.
///
/// Coordinates are carried as `i32` and scaled by 256 in some fixed-point paths, which must not
/// overflow.
pub const MAX_DIMENSION: u32 = 1 << 22;

/// The two reference colors of a monochrome destination with a color table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonoPalette {
    /// Premultiplied color of a cleared bit.
    pub color0: u32,
    /// Premultiplied color of a set bit.
    pub color1: u32,
}

impl MonoPalette {
    /// Build the palette from the first two entries of an unpremultiplied color table.
    pub fn from_color_table(table: &[u32]) -> Option<Self> {
        match table {
            [c0, c1] => Some(Self {
                color0: pixel::premultiply(*c0),
                color1: pixel::premultiply(*c1),
            }),
            _ => None,
        }
    }

    /// Whether `color` is closer to `color1` than to `color0` in premultiplied RGB space.
    ///
    /// Ties resolve to `color1`.
    pub fn nearest_is_color1(self, color: u32) -> bool {
        let dist = |c: u32| {
            let r = pixel::red(color) as i32 - pixel::red(c) as i32;
            let g = pixel::green(color) as i32 - pixel::green(c) as i32;
            let b = pixel::blue(color) as i32 - pixel::blue(c) as i32;
            r * r + g * g + b * b
        };
        dist(self.color0) >= dist(self.color1)
    }
}

fn validate(
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    len: usize,
) -> Result<()> {
    if format == PixelFormat::Invalid {
        return Err(Error::InvalidFormat);
    }
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::InvalidSize(width, height));
    }
    let min = format.min_bytes_per_line(width as usize);
    let row = (width as usize * format.depth() as usize).div_ceil(8);
    if bytes_per_line < row {
        return Err(Error::StrideTooSmall {
            stride: bytes_per_line,
            min,
        });
    }
    let needed = bytes_per_line * (height as usize - 1) + row;
    if len < needed {
        return Err(Error::BufferTooSmall { len, needed });
    }
    Ok(())
}

/// A destination surface: mutable pixel storage described by format, extent and stride.
///
/// The buffer is only ever written through the store functions of the engine. It is never
/// reallocated.
#[derive(Debug)]
pub struct RasterBuffer<'a> {
    data: &'a mut [u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    mono: Option<MonoPalette>,
}

impl<'a> RasterBuffer<'a> {
    /// Wrap `data` as a surface of `width` by `height` pixels.
    ///
    /// The stride may be larger than needed but scanlines must not overlap.
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        bytes_per_line: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        validate(format, width, height, bytes_per_line, data.len())?;
        Ok(Self {
            data,
            format,
            width,
            height,
            bytes_per_line,
            mono: None,
        })
    }

    /// Attach a two-entry color table for monochrome formats.
    ///
    /// Without a palette, stores into monochrome surfaces use ordered dithering on luminance.
    /// Tables of any other length, or non-monochrome formats, leave the buffer unchanged.
    #[must_use]
    pub fn with_color_table(mut self, table: &[u32]) -> Self {
        if self.format.depth() == 1 {
            self.mono = MonoPalette::from_color_table(table);
        }
        self
    }

    /// The pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The pixel layout of the format.
    #[inline]
    pub fn layout(&self) -> &'static PixelLayout {
        PixelLayout::of(self.format)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between scanlines in bytes.
    #[inline]
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// The monochrome palette, if one was attached.
    #[inline]
    pub fn mono_palette(&self) -> Option<MonoPalette> {
        self.mono
    }

    /// Premultiplied color of a cleared bit of a monochrome surface, zero without a palette.
    #[inline]
    pub fn dest_color0(&self) -> u32 {
        self.mono.map_or(0, |m| m.color0)
    }

    /// Premultiplied color of a set bit of a monochrome surface, zero without a palette.
    #[inline]
    pub fn dest_color1(&self) -> u32 {
        self.mono.map_or(0, |m| m.color1)
    }

    #[inline]
    fn row_range(&self, y: usize) -> core::ops::Range<usize> {
        let start = y * self.bytes_per_line;
        let len = (self.width as usize * self.format.depth() as usize).div_ceil(8);
        start..start + len
    }

    /// The bytes of scanline `y`, trimmed to the pixels of the row.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line(&self, y: usize) -> &[u8] {
        assert!(y < self.height as usize, "scanline {y} out of range");
        &self.data[self.row_range(y)]
    }

    /// The mutable bytes of scanline `y`, trimmed to the pixels of the row.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height as usize, "scanline {y} out of range");
        let range = self.row_range(y);
        &mut self.data[range]
    }

    /// Scanline `y` as 32-bit words, or `None` if the format is not 32-bit or the storage is not
    /// word aligned.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line_u32_mut(&mut self, y: usize) -> Option<&mut [u32]> {
        if self.format.bpp() != Bpp::Bpp32 {
            return None;
        }
        bytemuck::try_cast_slice_mut(self.scan_line_mut(y)).ok()
    }

    /// Scanline `y` as 16-bit words, or `None` if the format is not 16-bit or the storage is not
    /// aligned.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line_u16_mut(&mut self, y: usize) -> Option<&mut [u16]> {
        if self.format.bpp() != Bpp::Bpp16 {
            return None;
        }
        bytemuck::try_cast_slice_mut(self.scan_line_mut(y)).ok()
    }

    /// Read one pixel converted to premultiplied `0xAARRGGBB`.
    ///
    /// Monochrome pixels map to the palette colors. Without a palette a set bit reads as opaque
    /// black and a cleared bit as opaque white, matching the dithered store.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is out of range.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let raw = fetch::fetch_pixel(self.format.bpp(), self.scan_line(y), x);
        match (self.format.depth(), self.mono) {
            (1, Some(m)) => [m.color0, m.color1][raw as usize],
            (1, None) => [0xffffffff, 0xff000000][raw as usize],
            _ => {
                let mut v = [raw];
                if let Some(convert) = self.layout().to_argb32 {
                    convert(&mut v, self.layout(), None);
                }
                v[0]
            }
        }
    }
}

/// A read-only view of pixel storage, used as the source of texture draws.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    data: &'a [u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    color_table: Option<&'a [u32]>,
}

impl<'a> ImageView<'a> {
    /// Wrap `data` as an image of `width` by `height` pixels.
    ///
    /// Indexed formats need a color table covering every index they can hold.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        bytes_per_line: usize,
        format: PixelFormat,
        color_table: Option<&'a [u32]>,
    ) -> Result<Self> {
        validate(format, width, height, bytes_per_line, data.len())?;
        if format.is_indexed() {
            let needed = 1 << format.depth();
            if color_table.map_or(0, <[u32]>::len) < needed {
                return Err(Error::MissingColorTable(needed));
            }
        }
        Ok(Self {
            data,
            format,
            width,
            height,
            bytes_per_line,
            color_table,
        })
    }

    /// The pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between scanlines in bytes.
    #[inline]
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// The color table of indexed formats.
    #[inline]
    pub fn color_table(&self) -> Option<&'a [u32]> {
        self.color_table
    }

    /// Whether the image may contain non-opaque pixels.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    /// The bytes of scanline `y`, trimmed to the pixels of the row.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height as usize, "scanline {y} out of range");
        let start = y * self.bytes_per_line;
        let len = (self.width as usize * self.format.depth() as usize).div_ceil(8);
        &self.data[start..start + len]
    }
}

/// An owned image with word-aligned scanlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u32>,
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    color_table: Vec<u32>,
}

impl Image {
    /// Create a zero-initialized image.
    ///
    /// For premultiplied and alpha formats this is transparent black.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        validate(format, width, height, format.min_bytes_per_line(width as usize), usize::MAX)?;
        let bytes_per_line = format.min_bytes_per_line(width as usize);
        Ok(Self {
            data: vec![0; bytes_per_line / 4 * height as usize],
            format,
            width,
            height,
            bytes_per_line,
            color_table: Vec::new(),
        })
    }

    /// Create an image from premultiplied `0xAARRGGBB` pixels in row-major order.
    ///
    /// The pixels are converted to `format`. Indexed formats cannot be created this way.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` does not hold exactly `width * height` values.
    pub fn from_argb32(width: u32, height: u32, format: PixelFormat, pixels: &[u32]) -> Result<Self> {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel count must match the image size"
        );
        let mut image = Self::new(width, height, format)?;
        let layout = PixelLayout::of(format);
        let Some(store) = layout.store_converter() else {
            return Err(Error::MissingColorTable(1 << format.depth()));
        };
        let mut row = vec![0_u32; width as usize];
        for (y, src) in pixels.chunks_exact(width as usize).enumerate() {
            row.copy_from_slice(src);
            store(&mut row, layout);
            fetch::store_pixels(format.bpp(), image.scan_line_mut(y), 0, &row);
        }
        Ok(image)
    }

    /// Attach an unpremultiplied color table, as used by indexed formats.
    #[must_use]
    pub fn with_color_table(mut self, table: Vec<u32>) -> Self {
        self.color_table = table;
        self
    }

    /// The pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between scanlines in bytes.
    #[inline]
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// The color table, empty unless one was attached.
    #[inline]
    pub fn color_table(&self) -> &[u32] {
        &self.color_table
    }

    /// The raw bytes of all scanlines.
    #[inline]
    pub fn data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// The mutable raw bytes of all scanlines.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// The bytes of scanline `y`, including padding.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line(&self, y: usize) -> &[u8] {
        assert!(y < self.height as usize, "scanline {y} out of range");
        let start = y * self.bytes_per_line;
        &self.data()[start..start + self.bytes_per_line]
    }

    /// The mutable bytes of scanline `y`, including padding.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the height.
    #[inline]
    pub fn scan_line_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height as usize, "scanline {y} out of range");
        let start = y * self.bytes_per_line;
        let stride = self.bytes_per_line;
        &mut self.data_mut()[start..start + stride]
    }

    /// Borrow the image as a destination surface.
    pub fn as_raster_buffer(&mut self) -> RasterBuffer<'_> {
        let mono = if self.format.depth() == 1 {
            MonoPalette::from_color_table(&self.color_table)
        } else {
            None
        };
        let format = self.format;
        let (width, height, bytes_per_line) = (self.width, self.height, self.bytes_per_line);
        RasterBuffer {
            data: bytemuck::cast_slice_mut(&mut self.data),
            format,
            width,
            height,
            bytes_per_line,
            mono,
        }
    }

    /// Borrow the image as a texture source.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: self.data(),
            format: self.format,
            width: self.width,
            height: self.height,
            bytes_per_line: self.bytes_per_line,
            color_table: (!self.color_table.is_empty()).then_some(self.color_table.as_slice()),
        }
    }

    /// Read one pixel converted to premultiplied `0xAARRGGBB`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is out of range.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let raw = fetch::fetch_pixel(self.format.bpp(), self.scan_line(y), x);
        let layout = PixelLayout::of(self.format);
        let mut v = [raw];
        if let Some(convert) = layout.to_argb32 {
            let table = (!self.color_table.is_empty()).then_some(self.color_table.as_slice());
            convert(&mut v, layout, table);
        }
        v[0]
    }

    /// The raw native value of one pixel.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is out of range.
    pub fn raw_pixel(&self, x: usize, y: usize) -> u32 {
        fetch::fetch_pixel(self.format.bpp(), self.scan_line(y), x)
    }
}
