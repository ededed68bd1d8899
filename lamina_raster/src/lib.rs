// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picture rasterization cache and frame compositor for lamina.
//!
//! This crate turns the layer tree produced by
//! [`lamina_core`]'s paint flush into draw calls on an output [`Canvas`]:
//!
//! - [`Compositor`]: walks the layer tree once per frame, drawing cached
//!   images for picture layers that have been stable for more than one
//!   frame and replaying the rest, then purges the cache and draws
//!   statistics overlays.
//! - [`PictureRasterizer`]: caches GPU images per (picture identity,
//!   physical size), with per-frame access counting and eviction.
//! - [`GpuContext`] / [`RenderTarget`]: the offscreen texture allocation
//!   seam the embedder implements.
//! - [`CompositorOptions`]: diagnostic overlays.
//!
//! [`Canvas`]: lamina_core::picture::Canvas

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod checkerboard;
mod compositor;
mod gpu;
mod options;
mod rasterizer;

#[cfg(test)]
mod testing;

pub use checkerboard::draw_checkerboard;
pub use compositor::{Compositor, ScopedFrame};
pub use gpu::{GpuContext, RenderTarget};
pub use options::CompositorOptions;
pub use rasterizer::{CacheKey, PictureRasterizer, scale_factors};
