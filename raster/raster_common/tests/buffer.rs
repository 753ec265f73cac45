// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use raster_common::buffer::ImageView;
use raster_common::{Error, Image, PixelFormat, RasterBuffer};

#[test]
fn owned_image_round_trips_through_raster_buffer() {
    let pixels = [0xffff0000, 0x80000080, 0x00000000, 0xff00ff00];
    let mut image = Image::from_argb32(2, 2, PixelFormat::Argb32Premultiplied, &pixels).unwrap();
    {
        let buffer = image.as_raster_buffer();
        assert_eq!(buffer.pixel(1, 0), 0x80000080);
        assert_eq!(buffer.bytes_per_line(), 8);
    }
    assert_eq!(image.pixel(1, 1), 0xff00ff00);
}

#[test]
fn indexed_view_requires_a_full_table() {
    let data = [0_u8; 4];
    assert_eq!(
        ImageView::new(&data, 4, 1, 4, PixelFormat::Indexed8, Some(&[0; 16])).unwrap_err(),
        Error::MissingColorTable(256)
    );
    let table = [0xff000000, 0xffffffff];
    assert!(ImageView::new(&data, 8, 1, 4, PixelFormat::Mono, Some(&table)).is_ok());
}

#[test]
fn zero_sized_buffers_are_rejected() {
    let mut data = [0_u8; 4];
    assert_eq!(
        RasterBuffer::new(&mut data, 0, 1, 4, PixelFormat::Rgb32).unwrap_err(),
        Error::InvalidSize(0, 1)
    );
    assert_eq!(
        RasterBuffer::new(&mut data, 1, 1, 4, PixelFormat::Invalid).unwrap_err(),
        Error::InvalidFormat
    );
}

#[test]
fn mono_buffer_reads_palette_colors() {
    let mut data = [0b0100_0000_u8, 0, 0, 0];
    let buffer = RasterBuffer::new(&mut data, 8, 1, 4, PixelFormat::Mono)
        .unwrap()
        .with_color_table(&[0xff000000, 0xffffffff]);
    assert_eq!(buffer.pixel(0, 0), 0xff000000);
    assert_eq!(buffer.pixel(1, 0), 0xffffffff);
}

#[test]
fn padded_stride_keeps_rows_apart() {
    let mut data = vec![0_u8; 3 * 16];
    let mut buffer = RasterBuffer::new(&mut data, 3, 3, 16, PixelFormat::Rgb888).unwrap();
    buffer.scan_line_mut(1)[0..3].copy_from_slice(&[0x12, 0x34, 0x56]);
    assert_eq!(buffer.scan_line(1).len(), 9);
    assert_eq!(buffer.pixel(0, 1), 0xff123456);
    assert_eq!(buffer.pixel(0, 0), 0xff000000);
}
