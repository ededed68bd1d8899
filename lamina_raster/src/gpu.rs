// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen texture allocation.

use alloc::boxed::Box;

use lamina_core::picture::{Canvas, PhysicalSize, ReleaseFn, TextureId};

/// The embedder's GPU texture allocator.
pub trait GpuContext {
    /// Allocates a texture of `size` device pixels that can be drawn into.
    ///
    /// Returns `None` when the allocation fails (for example under memory
    /// pressure); callers fall back to drawing without the texture.
    fn create_render_target(&mut self, size: PhysicalSize) -> Option<Box<dyn RenderTarget>>;
}

/// A texture being drawn into.
pub trait RenderTarget {
    /// Returns the canvas drawing into the texture. Its initial transform
    /// maps one unit to one device pixel.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Flushes drawing and hands over the texture, with the callback that
    /// frees it.
    fn finish(self: Box<Self>) -> (TextureId, ReleaseFn);
}
