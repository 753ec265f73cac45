// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition modes.

use crate::peniko::{BlendMode, Compose, Mix};

/// How a source pixel combines with the destination pixel beneath it.
///
/// The Porter-Duff modes and the separable blend modes respect coverage. The raster operations
/// after [`CompositionMode::Exclusion`] are bitwise, ignore coverage, force the result opaque and
/// only exist for 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CompositionMode {
    /// Source over destination.
    #[default]
    SourceOver,
    /// Destination over source.
    DestinationOver,
    /// Clear to transparent.
    Clear,
    /// Replace with the source.
    Source,
    /// Keep the destination.
    Destination,
    /// Source where the destination is.
    SourceIn,
    /// Destination where the source is.
    DestinationIn,
    /// Source where the destination is not.
    SourceOut,
    /// Destination where the source is not.
    DestinationOut,
    /// Source on top of the destination, inside it.
    SourceAtop,
    /// Destination on top of the source, inside it.
    DestinationAtop,
    /// Source and destination where they do not overlap.
    Xor,
    /// Saturating sum.
    Plus,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// `s | d`.
    SourceOrDestination,
    /// `s & d`.
    SourceAndDestination,
    /// `s ^ d`.
    SourceXorDestination,
    /// `!s & !d`.
    NotSourceAndNotDestination,
    /// `!s | !d`.
    NotSourceOrNotDestination,
    /// `!s ^ d`.
    NotSourceXorDestination,
    /// `!s`.
    NotSource,
    /// `!s & d`.
    NotSourceAndDestination,
    /// `s & !d`.
    SourceAndNotDestination,
    /// `!s | d`.
    NotSourceOrDestination,
    /// `s | !d`.
    SourceOrNotDestination,
    /// Black.
    ClearDestination,
    /// White.
    SetDestination,
    /// `!d`.
    NotDestination,
}

impl CompositionMode {
    /// The number of modes.
    pub const COUNT: usize = 38;

    /// All modes in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::SourceOver,
        Self::DestinationOver,
        Self::Clear,
        Self::Source,
        Self::Destination,
        Self::SourceIn,
        Self::DestinationIn,
        Self::SourceOut,
        Self::DestinationOut,
        Self::SourceAtop,
        Self::DestinationAtop,
        Self::Xor,
        Self::Plus,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::SourceOrDestination,
        Self::SourceAndDestination,
        Self::SourceXorDestination,
        Self::NotSourceAndNotDestination,
        Self::NotSourceOrNotDestination,
        Self::NotSourceXorDestination,
        Self::NotSource,
        Self::NotSourceAndDestination,
        Self::SourceAndNotDestination,
        Self::NotSourceOrDestination,
        Self::SourceOrNotDestination,
        Self::ClearDestination,
        Self::SetDestination,
        Self::NotDestination,
    ];

    /// Position of the mode in [`CompositionMode::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the mode is a bitwise raster operation.
    #[inline]
    pub const fn is_raster_op(self) -> bool {
        self as u8 >= Self::SourceOrDestination as u8
    }

    /// Whether the mode is one of the separable blend modes.
    #[inline]
    pub const fn is_separable_blend(self) -> bool {
        self as u8 >= Self::Multiply as u8 && self as u8 <= Self::Exclusion as u8
    }
}

static_assertions::const_assert_eq!(
    CompositionMode::NotDestination as usize + 1,
    CompositionMode::COUNT
);

impl From<BlendMode> for CompositionMode {
    /// Map a brush blend mode onto a composition mode.
    ///
    /// A separable mix wins over the compose operator, since modes here cannot express both at
    /// once. Non-separable mixes have no counterpart and fall back to source over.
    fn from(mode: BlendMode) -> Self {
        let mix = match mode.mix {
            Mix::Normal => None,
            Mix::Multiply => Some(Self::Multiply),
            Mix::Screen => Some(Self::Screen),
            Mix::Overlay => Some(Self::Overlay),
            Mix::Darken => Some(Self::Darken),
            Mix::Lighten => Some(Self::Lighten),
            Mix::ColorDodge => Some(Self::ColorDodge),
            Mix::ColorBurn => Some(Self::ColorBurn),
            Mix::HardLight => Some(Self::HardLight),
            Mix::SoftLight => Some(Self::SoftLight),
            Mix::Difference => Some(Self::Difference),
            Mix::Exclusion => Some(Self::Exclusion),
            other => {
                log::debug!("{other:?} has no composition mode, using source over");
                return Self::SourceOver;
            }
        };
        if let Some(mix) = mix {
            return mix;
        }
        match mode.compose {
            Compose::Clear => Self::Clear,
            Compose::Copy => Self::Source,
            Compose::Dest => Self::Destination,
            Compose::SrcOver => Self::SourceOver,
            Compose::DestOver => Self::DestinationOver,
            Compose::SrcIn => Self::SourceIn,
            Compose::DestIn => Self::DestinationIn,
            Compose::SrcOut => Self::SourceOut,
            Compose::DestOut => Self::DestinationOut,
            Compose::SrcAtop => Self::SourceAtop,
            Compose::DestAtop => Self::DestinationAtop,
            Compose::Xor => Self::Xor,
            Compose::Plus | Compose::PlusLighter => Self::Plus,
            #[allow(unreachable_patterns, reason = "future compose operators")]
            _ => Self::SourceOver,
        }
    }
}
