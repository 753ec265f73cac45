// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source samplers.
//!
//! A sampler produces a run of canonical source pixels for a device position. Gradients map
//! each pixel center back into gradient space, textures map it back into image space and pick
//! the nearest pixel or filter bilinearly.

mod bilinear;
pub(crate) mod gradient;
pub(crate) mod texture;

use raster_common::transform::{SpanTransform, TransformKind};

use crate::canonical::Canonical;
use crate::paint::{Paint, Source};

pub(crate) use gradient::GradientSampler;
pub(crate) use texture::TextureSampler;

/// How a texture is sampled, derived from its transform, tiling and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureBlendType {
    /// Integer translation, clipped to the image.
    Untransformed,
    /// Integer translation, repeating.
    Tiled,
    /// Nearest neighbor, clamped to the bounds.
    Transformed,
    /// Nearest neighbor, repeating.
    TransformedTiled,
    /// Bilinear, clamped to the bounds.
    TransformedBilinear,
    /// Bilinear, repeating.
    TransformedBilinearTiled,
}

impl TextureBlendType {
    /// The number of blend types.
    pub const COUNT: usize = 6;

    /// Every blend type in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Untransformed,
        Self::Tiled,
        Self::Transformed,
        Self::TransformedTiled,
        Self::TransformedBilinear,
        Self::TransformedBilinearTiled,
    ];

    /// The position in [`Self::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the texture repeats.
    pub const fn is_tiled(self) -> bool {
        matches!(
            self,
            Self::Tiled | Self::TransformedTiled | Self::TransformedBilinearTiled
        )
    }

    /// Classify a texture draw.
    ///
    /// Translations never filter; anything beyond a translation uses `bilinear` to pick between
    /// nearest neighbor and bilinear filtering.
    pub fn classify(transform: &SpanTransform, tiled: bool, bilinear: bool) -> Self {
        match (transform.kind <= TransformKind::Translate, bilinear, tiled) {
            (true, _, false) => Self::Untransformed,
            (true, _, true) => Self::Tiled,
            (false, true, false) => Self::TransformedBilinear,
            (false, true, true) => Self::TransformedBilinearTiled,
            (false, false, false) => Self::Transformed,
            (false, false, true) => Self::TransformedTiled,
        }
    }
}

/// The sampler of a non-solid source.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Sampler<'a> {
    Gradient(GradientSampler<'a>),
    Texture(TextureSampler<'a>),
}

impl<'a> Sampler<'a> {
    /// The sampler for `paint`, or `None` for solid and empty sources.
    pub(crate) fn new(paint: &Paint<'a>) -> Option<Self> {
        match paint.source {
            Source::Gradient(g) => Some(Self::Gradient(GradientSampler::new(
                g.table,
                &g.kind,
                paint.transform.inverse,
            ))),
            Source::Texture(t) => Some(Self::Texture(TextureSampler::new(
                t,
                paint.transform,
                paint.bilinear,
            ))),
            Source::None | Source::Solid(_) => None,
        }
    }

    /// Fill `out` with source pixels starting at device position `(x, y)`.
    ///
    /// The result either aliases the source image or is `out`.
    pub(crate) fn fetch<'b, P: Canonical>(&'b self, out: &'b mut [P], x: i32, y: i32) -> &'b [P] {
        match self {
            Self::Gradient(g) => g.fetch(out, x, y),
            Self::Texture(t) => match t.blend_type {
                TextureBlendType::Untransformed | TextureBlendType::Tiled => {
                    t.fetch_translated(out, x, y)
                }
                _ => t.fetch(out, x, y),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextureBlendType;
    use raster_common::kurbo::Affine;
    use raster_common::transform::SpanTransform;

    #[test]
    fn classification_ignores_filtering_for_translations() {
        let t = SpanTransform::from_affine(Affine::translate((3.0, 4.0)));
        assert_eq!(TextureBlendType::classify(&t, false, true), TextureBlendType::Untransformed);
        assert_eq!(TextureBlendType::classify(&t, true, true), TextureBlendType::Tiled);
        let s = SpanTransform::from_affine(Affine::scale(1.5));
        assert_eq!(
            TextureBlendType::classify(&s, true, true),
            TextureBlendType::TransformedBilinearTiled
        );
        assert_eq!(TextureBlendType::classify(&s, false, false), TextureBlendType::Transformed);
    }

    #[test]
    fn table_order_matches_indices() {
        for (i, t) in TextureBlendType::ALL.into_iter().enumerate() {
            assert_eq!(t.index(), i);
        }
        assert!(TextureBlendType::TransformedTiled.is_tiled());
        assert!(!TextureBlendType::TransformedBilinear.is_tiled());
    }
}
