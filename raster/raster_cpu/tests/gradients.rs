// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient spans.

use crate::util::{channel_diff, draw, filled, pixels, ragged, rows, translucent};
use raster_common::color::{AlphaColor, Srgb};
use raster_common::gradient::{GradientStop, InterpolationMode};
use raster_common::kurbo::{Affine, Point};
use raster_common::peniko::Extend;
use raster_common::pixel::{blue, red};
use raster_common::{GradientTable, PixelFormat};
use raster_cpu::{CompositionMode, GradientKind};

fn black_to_white(spread: Extend) -> GradientTable {
    let stops = [
        GradientStop::new(0.0, AlphaColor::<Srgb>::from_rgba8(0, 0, 0, 255)),
        GradientStop::new(1.0, AlphaColor::<Srgb>::from_rgba8(255, 255, 255, 255)),
    ];
    GradientTable::new(&stops, spread, InterpolationMode::Color, 256).unwrap()
}

fn horizontal(length: f64) -> GradientKind {
    GradientKind::Linear {
        start: Point::new(0.0, 0.0),
        end: Point::new(length, 0.0),
    }
}

#[test]
fn linear_midpoint_is_mid_gray() {
    let table = black_to_white(Extend::Pad);
    let mut image = filled(256, 1, PixelFormat::Argb32Premultiplied, 0);
    draw(&mut image, &rows(256, 1, 255), |data| {
        data.set_gradient(&table, horizontal(256.0), Affine::IDENTITY);
    });
    let mid = red(image.pixel(128, 0));
    assert!(mid.abs_diff(128) <= 1, "{mid}");
    assert!(red(image.pixel(0, 0)) <= 1);
    assert!(red(image.pixel(255, 0)) >= 254);
}

#[test]
fn linear_ramp_is_monotone() {
    let table = black_to_white(Extend::Pad);
    let mut image = filled(64, 1, PixelFormat::Argb32Premultiplied, 0);
    draw(&mut image, &rows(64, 1, 255), |data| {
        data.set_gradient(&table, horizontal(64.0), Affine::IDENTITY);
    });
    let out = pixels(&image);
    for pair in out.windows(2) {
        assert!(blue(pair[0]) <= blue(pair[1]), "{:08x} {:08x}", pair[0], pair[1]);
    }
}

#[test]
fn pad_spread_holds_the_end_colors() {
    let table = black_to_white(Extend::Pad);
    let mut image = filled(32, 1, PixelFormat::Argb32Premultiplied, 0);
    draw(&mut image, &rows(32, 1, 255), |data| {
        let kind = GradientKind::Linear {
            start: Point::new(8.0, 0.0),
            end: Point::new(24.0, 0.0),
        };
        data.set_gradient(&table, kind, Affine::IDENTITY);
    });
    assert!(pixels(&image)[..8].iter().all(|p| *p == 0xff000000));
    assert!(pixels(&image)[24..].iter().all(|p| *p == 0xffffffff));
}

#[test]
fn repeat_spread_restarts_each_period() {
    let table = black_to_white(Extend::Repeat);
    let mut image = filled(48, 1, PixelFormat::Argb32Premultiplied, 0);
    draw(&mut image, &rows(48, 1, 255), |data| {
        data.set_gradient(&table, horizontal(16.0), Affine::IDENTITY);
    });
    for x in 0..32 {
        let (a, b) = (image.pixel(x, 0), image.pixel(x + 16, 0));
        assert!(channel_diff(a, b) <= 1, "{x}: {a:08x} {b:08x}");
    }
    assert!(red(image.pixel(15, 0)) > red(image.pixel(16, 0)));
}

#[test]
fn vertical_gradient_rows_are_constant() {
    let table = black_to_white(Extend::Pad);
    let kind = GradientKind::Linear {
        start: Point::new(0.0, 0.0),
        end: Point::new(0.0, 16.0),
    };
    let mut image = filled(12, 16, PixelFormat::Argb32Premultiplied, 0);
    draw(&mut image, &rows(12, 16, 255), |data| {
        data.set_mode(CompositionMode::Source);
        data.set_gradient(&table, kind, Affine::IDENTITY);
    });
    let mut previous = 0;
    for y in 0..16 {
        let first = image.pixel(0, y);
        for x in 1..12 {
            assert_eq!(image.pixel(x, y), first, "({x}, {y})");
        }
        assert!(red(first) >= previous, "row {y}");
        previous = red(first);
    }
}

#[test]
fn in_place_path_matches_the_generic_path() {
    let table = black_to_white(Extend::Reflect);
    let kinds = [
        GradientKind::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, 9.0),
        },
        GradientKind::Linear {
            start: Point::new(2.0, 1.0),
            end: Point::new(13.0, 7.0),
        },
        GradientKind::Radial {
            center: Point::new(10.0, 6.0),
            radius: 9.0,
            focal: Point::new(8.0, 5.0),
            focal_radius: 0.0,
        },
        GradientKind::Conical {
            center: Point::new(10.0, 6.0),
            angle: 0.7,
        },
    ];
    let spans = ragged(20, 12);
    for kind in kinds {
        for mode in [CompositionMode::Source, CompositionMode::SourceOver] {
            let run = |format: PixelFormat| {
                let mut image = translucent(20, 12, format);
                draw(&mut image, &spans, |data| {
                    data.set_mode(mode);
                    data.set_gradient(&table, kind, Affine::IDENTITY);
                });
                pixels(&image)
            };
            assert_eq!(
                run(PixelFormat::Argb32Premultiplied),
                run(PixelFormat::Rgba8888Premultiplied),
                "{kind:?} {mode:?}"
            );
        }
    }
}

#[test]
fn wide_formats_agree_with_argb32() {
    let table = black_to_white(Extend::Pad);
    let draw_into = |format: PixelFormat| {
        let mut image = filled(40, 2, format, 0xff000000);
        draw(&mut image, &rows(40, 2, 255), |data| {
            data.set_gradient(&table, horizontal(40.0), Affine::IDENTITY);
        });
        pixels(&image)
    };
    let narrow = draw_into(PixelFormat::Argb32Premultiplied);
    let wide = draw_into(PixelFormat::A2Rgb30Premultiplied);
    for (a, b) in narrow.into_iter().zip(wide) {
        assert!(channel_diff(a, b) <= 1, "{a:08x} {b:08x}");
    }
}
