// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The process-wide table of composition functions.
//!
//! The table is filled once from the build target's capabilities and is read-only afterwards.
//! Every variant it selects produces the same pixels as the portable one.

use std::sync::OnceLock;

use raster_common::Rgba64;

use crate::compose::{
    function_for_mode, function_for_mode_32, solid_function_for_mode, solid_function_for_mode_32,
    ComposeFn, ComposeSolidFn,
};
use crate::mode::CompositionMode;

/// Target properties that select the composition functions.
///
/// These are fixed when the crate is built; nothing is probed at run time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// 64-bit words are native and the `wide` feature is on, so four channels are processed
    /// in one multiply.
    pub wide_words: bool,
}

impl Capabilities {
    /// Selects only the portable functions.
    pub const SCALAR: Self = Self { wide_words: false };

    /// The capabilities of the build target.
    pub const fn detect() -> Self {
        Self {
            wide_words: cfg!(all(feature = "wide", target_pointer_width = "64")),
        }
    }
}

/// Composition functions for every mode at both precisions.
#[derive(Debug)]
pub struct Registry {
    capabilities: Capabilities,
    compose_32: [ComposeFn<u32>; CompositionMode::COUNT],
    compose_solid_32: [ComposeSolidFn<u32>; CompositionMode::COUNT],
    compose_64: [Option<ComposeFn<Rgba64>>; CompositionMode::COUNT],
    compose_solid_64: [Option<ComposeSolidFn<Rgba64>>; CompositionMode::COUNT],
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The registry for the build target, built on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let capabilities = Capabilities::detect();
            log::debug!("composition registry built for {capabilities:?}");
            Self::with_capabilities(capabilities)
        })
    }

    /// Build a registry for the given capabilities.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let mut compose_32: [ComposeFn<u32>; CompositionMode::COUNT] =
            core::array::from_fn(|i| function_for_mode_32(CompositionMode::ALL[i]));
        let mut compose_solid_32: [ComposeSolidFn<u32>; CompositionMode::COUNT] =
            core::array::from_fn(|i| solid_function_for_mode_32(CompositionMode::ALL[i]));

        if capabilities.wide_words {
            use crate::wide;
            let over = CompositionMode::SourceOver.index();
            let source = CompositionMode::Source.index();
            compose_32[over] = wide::compose_source_over;
            compose_32[source] = wide::compose_source;
            compose_solid_32[over] = wide::compose_solid_source_over;
            compose_solid_32[source] = wide::compose_solid_source;
        }

        Self {
            capabilities,
            compose_32,
            compose_solid_32,
            compose_64: core::array::from_fn(|i| function_for_mode(CompositionMode::ALL[i])),
            compose_solid_64: core::array::from_fn(|i| {
                solid_function_for_mode(CompositionMode::ALL[i])
            }),
        }
    }

    /// The capabilities the registry was built for.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The 8-bit composition function of `mode`.
    #[inline]
    pub fn compose(&self, mode: CompositionMode) -> ComposeFn<u32> {
        self.compose_32[mode.index()]
    }

    /// The 8-bit solid composition function of `mode`.
    #[inline]
    pub fn compose_solid(&self, mode: CompositionMode) -> ComposeSolidFn<u32> {
        self.compose_solid_32[mode.index()]
    }

    /// The 16-bit composition function of `mode`, `None` for raster operations.
    #[inline]
    pub fn compose_64(&self, mode: CompositionMode) -> Option<ComposeFn<Rgba64>> {
        self.compose_64[mode.index()]
    }

    /// The 16-bit solid composition function of `mode`, `None` for raster operations.
    #[inline]
    pub fn compose_solid_64(&self, mode: CompositionMode) -> Option<ComposeSolidFn<Rgba64>> {
        self.compose_solid_64[mode.index()]
    }
}
