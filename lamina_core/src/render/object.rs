// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-node behavior contract.

use core::any::Any;

use kurbo::Vec2;

use super::error::RenderError;
use super::layout::LayoutCx;
use super::protocol::Protocol;
use crate::painting::PaintingContext;

/// Layout and paint behavior of a render node.
///
/// The [`RenderTree`](super::RenderTree) owns one boxed `RenderObject` per
/// node and calls into it during [`flush_layout`](super::RenderTree::flush_layout)
/// and [`flush_paint`](super::RenderTree::flush_paint). Node state (dirty
/// flags, constraints, geometry, layers) lives in the tree, not here; the
/// callbacks read and write it through their context.
///
/// [`protocol`](Self::protocol), [`sized_by_parent`](Self::sized_by_parent)
/// and [`has_own_layer`](Self::has_own_layer) are read once, when the node is
/// created, and are fixed for the node's lifetime.
///
/// Errors returned from callbacks are isolated to the node: they are logged,
/// recorded as a [`RenderFailure`](super::RenderFailure), and the node gets
/// an error placeholder while the rest of the frame continues.
pub trait RenderObject: Any {
    /// Name used in logs, failure records and tree dumps.
    fn debug_name(&self) -> &'static str {
        let name = core::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }

    /// The layout protocol this node speaks to its parent.
    fn protocol(&self) -> Protocol;

    /// Whether the node's geometry depends only on its constraints.
    ///
    /// Such nodes compute their geometry in
    /// [`perform_resize`](Self::perform_resize) and are always relayout
    /// roots.
    fn sized_by_parent(&self) -> bool {
        false
    }

    /// Whether the node paints into its own retained layer.
    ///
    /// Owning a layer stops paint invalidation at this node and lets its
    /// content be reused when only an ancestor repaints.
    fn has_own_layer(&self) -> bool {
        false
    }

    /// Computes geometry from constraints alone. Only called for nodes that
    /// are [`sized_by_parent`](Self::sized_by_parent).
    ///
    /// The default takes the smallest geometry the constraints allow.
    fn perform_resize(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError> {
        let smallest = cx.constraints().smallest();
        cx.set_geometry(smallest)
    }

    /// Lays out children and, unless sized by parent, sets the node's
    /// geometry.
    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError>;

    /// Paints the node with its origin at `offset` in the context's
    /// coordinate space.
    fn paint(&self, cx: &mut PaintingContext<'_>, offset: Vec2) -> Result<(), RenderError>;
}
