// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolution of one draw call into the functions its spans run through.

use raster_common::span::all_opaque;
use raster_common::{PixelFormat, Rgba64, Span};

use crate::compose::{ComposeFn, ComposeSolidFn};
use crate::dest;
use crate::mode::CompositionMode;
use crate::paint::{Paint, Source};
use crate::registry::Registry;
use crate::sampler::Sampler;

/// Everything a span driver needs, resolved once per draw call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Operator<'a> {
    /// The effective mode after opaque-source reduction.
    pub(crate) mode: CompositionMode,
    /// The sampler for non-solid sources.
    pub(crate) sampler: Option<Sampler<'a>>,
    /// Whether destination pixels must be read before composing.
    pub(crate) dest_fetch: bool,
    /// Whether the draw composes in 16-bit channels.
    pub(crate) wide: bool,
    pub(crate) func: ComposeFn<u32>,
    pub(crate) solid_func: ComposeSolidFn<u32>,
    pub(crate) func_64: Option<ComposeFn<Rgba64>>,
    pub(crate) solid_func_64: Option<ComposeSolidFn<Rgba64>>,
}

/// Whether every pixel `source` produces is opaque.
fn is_opaque(source: &Source<'_>) -> bool {
    match source {
        Source::None => false,
        Source::Solid(c) => c.rgba64.is_opaque(),
        Source::Gradient(g) => !g.table.alpha_color(),
        Source::Texture(t) => !t.has_alpha(),
    }
}

/// Resolve the operator of a draw of `paint` into a `format` destination.
pub(crate) fn build_operator<'a>(
    paint: &Paint<'a>,
    format: PixelFormat,
    spans: &[Span],
) -> Operator<'a> {
    build_operator_with(Registry::global(), paint, format, spans)
}

pub(crate) fn build_operator_with<'a>(
    registry: &Registry,
    paint: &Paint<'a>,
    format: PixelFormat,
    spans: &[Span],
) -> Operator<'a> {
    let mut mode = paint.mode;
    if mode == CompositionMode::SourceOver && is_opaque(&paint.source) {
        mode = CompositionMode::Source;
    }

    let const_alpha_texture = matches!(paint.source, Source::Texture(t) if t.const_alpha != 256);
    let dest_fetch = !(mode == CompositionMode::Source
        && !dest::is_canonical(format)
        && !const_alpha_texture
        && all_opaque(spans));

    let func_64 = registry.compose_64(mode);
    let solid_func_64 = registry.compose_solid_64(mode);
    let mut wide = dest::wants_64(format);
    if wide && (func_64.is_none() || solid_func_64.is_none()) {
        log::debug!("{mode:?} has no 16-bit function, composing {format:?} in 8 bits");
        wide = false;
    }

    Operator {
        mode,
        sampler: Sampler::new(paint),
        dest_fetch,
        wide,
        func: registry.compose(mode),
        solid_func: registry.compose_solid(mode),
        func_64,
        solid_func_64,
    }
}
