// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline tuning.

use kurbo::Size;

/// Tunables for a [`RenderTree`](super::RenderTree).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// How many times [`flush_layout`](super::RenderTree::flush_layout) may
    /// re-drain the needs-layout queue before giving up on the frame.
    ///
    /// Nodes dirtied by layout callbacks of other relayout roots are handled
    /// in a further pass; a pipeline that never settles is a logic error.
    pub max_layout_passes: u32,
    /// Size (clamped to the node's constraints) given to a node whose layout
    /// callback failed.
    pub error_placeholder_size: Size,
}

impl PipelineConfig {
    /// The default configuration.
    pub const DEFAULT: Self = Self {
        max_layout_passes: 16,
        error_placeholder_size: Size::new(100.0, 100.0),
    };
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
