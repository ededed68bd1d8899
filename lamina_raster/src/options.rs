// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor diagnostic options.

use bitflags::bitflags;

bitflags! {
    /// Diagnostic overlays drawn by the [`Compositor`](crate::Compositor).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompositorOptions: u8 {
        /// Draw `Frame (N): X.XXms` at the end of each frame.
        const SHOW_FRAME_STATS = 1 << 0;
        /// Draw the cumulative rasterizer hit, fill and eviction counts.
        const SHOW_RASTERIZER_STATS = 1 << 1;
        /// Overlay a checkerboard on every image the rasterizer fills.
        const HIGHLIGHT_RASTERIZED_IMAGES = 1 << 2;
    }
}
