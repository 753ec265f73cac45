// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-draw state: the destination buffer together with the paint applied to it.

use raster_common::clip::IntRect;
use raster_common::color::{AlphaColor, Srgb};
use raster_common::kurbo::Point;
use raster_common::peniko::ImageQuality;
use raster_common::pixel::{premultiply, rgba};
use raster_common::transform::{Matrix, SpanTransform, TransformKind};
use raster_common::{GradientTable, ImageView, RasterBuffer, Rgba64};

use crate::mode::CompositionMode;

/// A solid color at both canonical precisions, premultiplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidColor {
    /// Premultiplied `0xAARRGGBB`.
    pub argb32: u32,
    /// Premultiplied 16-bit channels.
    pub rgba64: Rgba64,
}

impl SolidColor {
    /// A color from a premultiplied `0xAARRGGBB` value.
    pub fn from_argb32(argb32: u32) -> Self {
        Self {
            argb32,
            rgba64: Rgba64::from_argb32(argb32),
        }
    }

    /// Whether the color is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.rgba64.is_transparent()
    }
}

impl From<AlphaColor<Srgb>> for SolidColor {
    fn from(color: AlphaColor<Srgb>) -> Self {
        let c = color.to_rgba8();
        let wide = |v: f32| (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;
        let [r, g, b, a] = color.components;
        Self {
            argb32: premultiply(rgba(c.r as u32, c.g as u32, c.b as u32, c.a as u32)),
            rgba64: Rgba64::new(wide(r), wide(g), wide(b), wide(a)).premultiplied(),
        }
    }
}

/// Geometry of a gradient in paint space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    /// `t` is the projection onto the segment from `start` to `end`.
    Linear {
        /// Where `t` is 0.
        start: Point,
        /// Where `t` is 1.
        end: Point,
    },
    /// Two-point conical gradient between a focal circle and an outer circle.
    Radial {
        /// Center of the circle where `t` is 1.
        center: Point,
        /// Radius of the circle where `t` is 1.
        radius: f64,
        /// Center of the circle where `t` is 0.
        focal: Point,
        /// Radius of the circle where `t` is 0.
        focal_radius: f64,
    },
    /// `t` is the angle around `center`, counterclockwise from `angle` radians.
    Conical {
        /// The center.
        center: Point,
        /// The start angle in radians.
        angle: f64,
    },
}

/// A gradient source.
#[derive(Clone, Copy, Debug)]
pub struct Gradient<'a> {
    /// The color ramp and its spread policy.
    pub table: &'a GradientTable,
    /// The geometry.
    pub kind: GradientKind,
}

/// An image source.
#[derive(Clone, Copy, Debug)]
pub struct Texture<'a> {
    /// The pixels.
    pub image: ImageView<'a>,
    /// The part of the image that may be sampled, in image pixels.
    pub bounds: IntRect,
    /// Whether the image repeats in both directions.
    pub tiled: bool,
    /// Constant opacity in `0..=256`.
    pub const_alpha: u32,
}

impl Texture<'_> {
    /// Whether sampled pixels may be non-opaque.
    pub fn has_alpha(&self) -> bool {
        self.image.has_alpha() || self.const_alpha != 256
    }
}

/// What is painted.
#[derive(Clone, Copy, Debug, Default)]
pub enum Source<'a> {
    /// Nothing; drawing is a no-op.
    #[default]
    None,
    /// One color.
    Solid(SolidColor),
    /// A gradient.
    Gradient(Gradient<'a>),
    /// An image.
    Texture(Texture<'a>),
}

/// How a texture is drawn.
#[derive(Clone, Copy, Debug)]
pub struct TextureOptions {
    /// Repeat the image in both directions.
    pub tiled: bool,
    /// Constant opacity in `0..=256`.
    pub const_alpha: u32,
    /// [`ImageQuality::Low`] samples the nearest pixel, anything else filters bilinearly.
    pub quality: ImageQuality,
    /// Restrict sampling to part of the image.
    pub clip: Option<IntRect>,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            tiled: false,
            const_alpha: 256,
            quality: ImageQuality::Low,
            clip: None,
        }
    }
}

/// The paint of a draw call, independent of the destination.
#[derive(Clone, Copy, Debug, Default)]
pub struct Paint<'a> {
    /// How the source combines with the destination.
    pub mode: CompositionMode,
    /// What is painted.
    pub source: Source<'a>,
    /// Device to paint space mapping.
    pub transform: SpanTransform,
    /// Filter textures bilinearly.
    pub bilinear: bool,
}

/// A destination together with the paint of the current draw.
///
/// Spans handed to [`process_spans`](crate::process_spans) are composited into `buffer`.
#[derive(Debug)]
pub struct SpanData<'a> {
    /// The destination.
    pub buffer: RasterBuffer<'a>,
    /// The paint.
    pub paint: Paint<'a>,
}

impl<'a> SpanData<'a> {
    /// Start a draw into `buffer` with no source.
    pub fn new(buffer: RasterBuffer<'a>) -> Self {
        Self {
            buffer,
            paint: Paint::default(),
        }
    }

    /// Set the composition mode.
    pub fn set_mode(&mut self, mode: CompositionMode) {
        self.paint.mode = mode;
    }

    /// Paint with a solid color.
    ///
    /// A transparent color drawn with source over has no effect and disables the draw.
    pub fn set_solid(&mut self, color: impl Into<SolidColor>) {
        let color = color.into();
        self.paint.source = if color.is_transparent() && self.paint.mode == CompositionMode::SourceOver
        {
            Source::None
        } else {
            Source::Solid(color)
        };
    }

    /// Paint with a gradient placed by `matrix`.
    pub fn set_gradient(
        &mut self,
        table: &'a GradientTable,
        kind: GradientKind,
        matrix: impl Into<Matrix>,
    ) {
        self.set_transform(matrix);
        self.paint.source = Source::Gradient(Gradient { table, kind });
    }

    /// Paint with an image placed by `matrix`.
    ///
    /// An empty clip disables the draw.
    pub fn set_texture(
        &mut self,
        image: ImageView<'a>,
        matrix: impl Into<Matrix>,
        options: TextureOptions,
    ) {
        self.set_transform(matrix);
        let full = IntRect::from_xywh(0, 0, image.width() as i32, image.height() as i32);
        let bounds = options.clip.map_or(full, |c| c.intersect(&full));
        if bounds.is_empty() {
            self.paint.source = Source::None;
            return;
        }
        self.paint.bilinear = !matches!(options.quality, ImageQuality::Low);
        self.paint.source = Source::Texture(Texture {
            image,
            bounds,
            tiled: options.tiled,
            const_alpha: options.const_alpha.min(256),
        });
    }

    /// Set the paint to device transform.
    pub fn set_transform(&mut self, matrix: impl Into<Matrix>) {
        self.paint.transform = SpanTransform::new(&matrix.into());
        log::trace!("paint transform classified as {:?}", self.paint.transform.kind);
    }

    /// Whether the transform is at most a translation.
    pub fn is_untransformed(&self) -> bool {
        self.paint.transform.kind <= TransformKind::Translate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{Image, PixelFormat};

    #[test]
    fn transparent_source_over_is_a_no_op() {
        let mut image = Image::new(1, 1, PixelFormat::Argb32Premultiplied).unwrap();
        let mut data = SpanData::new(image.as_raster_buffer());
        data.set_solid(SolidColor::from_argb32(0));
        assert!(matches!(data.paint.source, Source::None));
        data.set_mode(CompositionMode::Source);
        data.set_solid(SolidColor::from_argb32(0));
        assert!(matches!(data.paint.source, Source::Solid(_)));
    }

    #[test]
    fn solid_colors_are_premultiplied() {
        let c = SolidColor::from(AlphaColor::<Srgb>::from_rgba8(255, 0, 0, 128));
        assert_eq!(c.argb32, 0x80800000);
        assert_eq!(c.rgba64.a, 0x8080);
        assert_eq!(c.rgba64.r, 0x8080);
    }

    #[test]
    fn texture_clip_is_bounded_by_the_image() {
        let mut image = Image::new(2, 2, PixelFormat::Argb32Premultiplied).unwrap();
        let texture = Image::new(8, 8, PixelFormat::Rgb32).unwrap();
        let mut data = SpanData::new(image.as_raster_buffer());
        let options = TextureOptions {
            clip: Some(IntRect::from_xywh(4, -2, 10, 4)),
            ..TextureOptions::default()
        };
        data.set_texture(texture.view(), Matrix::IDENTITY, options);
        let Source::Texture(t) = data.paint.source else {
            panic!("expected a texture");
        };
        assert_eq!(t.bounds, IntRect::from_xywh(4, 0, 4, 2));
        assert!(!t.has_alpha());
        assert!(data.is_untransformed());
        let options = TextureOptions {
            clip: Some(IntRect::from_xywh(20, 0, 1, 1)),
            ..TextureOptions::default()
        };
        data.set_texture(texture.view(), Matrix::IDENTITY, options);
        assert!(matches!(data.paint.source, Source::None));
    }
}
