// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configurable render objects for pipeline tests.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect, RoundedRect, Size, Vec2};

use super::{
    BoxConstraints, Constraints, FULL_TURN, Geometry, LayoutCx, NodeId, Protocol, RenderError,
    RenderObject, SectorConstraints,
};
use crate::painting::PaintingContext;
use crate::picture::{Color, ColorFilter, Paint};

/// One step of a [`BoxNode`]'s paint callback.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PaintOp {
    /// Fill the node's bounds.
    Fill,
    /// Paint every child at its parent-data offset.
    Children,
    /// Paint every child with group opacity.
    OpacityChildren(u8),
    /// Paint every child clipped to the node's bounds.
    ClipChildren,
    /// Paint every child clipped to the node's bounds, rounded by a radius.
    ClipRoundedChildren(f64),
    /// Paint every child clipped to [`triangle`] over the node's bounds.
    ClipTriangleChildren,
    /// Paint every child under a transform.
    TransformChildren(Affine),
    /// Paint every child through a color filter.
    FilterChildren(ColorFilter),
    /// Return an error.
    Fail,
}

/// A box node that lays every child out under the same constraints and
/// stacks them at `child_offset`.
#[derive(Debug)]
pub(crate) struct BoxNode {
    /// Preferred size; `None` takes the biggest size allowed.
    pub(crate) size: Option<Size>,
    pub(crate) child_offset: Vec2,
    /// Constraints for children; `None` loosens the node's own.
    pub(crate) child_constraints: Option<Constraints>,
    pub(crate) parent_uses_size: bool,
    pub(crate) layer: bool,
    pub(crate) sized_by_parent: bool,
    pub(crate) paint: Vec<PaintOp>,
    pub(crate) fail_layout: bool,
    pub(crate) skip_size: bool,
    pub(crate) skip_children: bool,
    /// Marked for layout from inside every layout of this node.
    pub(crate) poke: Option<NodeId>,
    pub(crate) layouts: u32,
    pub(crate) resizes: u32,
}

impl BoxNode {
    pub(crate) fn new() -> Self {
        Self {
            size: None,
            child_offset: Vec2::ZERO,
            child_constraints: None,
            parent_uses_size: true,
            layer: false,
            sized_by_parent: false,
            paint: Vec::new(),
            fail_layout: false,
            skip_size: false,
            skip_children: false,
            poke: None,
            layouts: 0,
            resizes: 0,
        }
    }

    pub(crate) fn with_layer(mut self) -> Self {
        self.layer = true;
        self
    }

    pub(crate) fn with_paint(mut self, op: PaintOp) -> Self {
        self.paint.push(op);
        self
    }

    pub(crate) fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Lays children out as relayout roots.
    pub(crate) fn ignoring_child_size(mut self) -> Self {
        self.parent_uses_size = false;
        self
    }
}

impl RenderObject for BoxNode {
    fn protocol(&self) -> Protocol {
        Protocol::Box
    }

    fn sized_by_parent(&self) -> bool {
        self.sized_by_parent
    }

    fn has_own_layer(&self) -> bool {
        self.layer
    }

    fn perform_resize(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError> {
        self.resizes += 1;
        let biggest = cx.box_constraints()?.biggest();
        cx.set_size(biggest)
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError> {
        self.layouts += 1;
        if self.fail_layout {
            return Err(RenderError::Failed("layout failed".into()));
        }
        if let Some(other) = self.poke {
            cx.invoke_layout_callback(|tree, _| tree.mark_needs_layout(other));
        }
        let constraints = cx.box_constraints()?;
        if !self.skip_children {
            let child_constraints = self
                .child_constraints
                .unwrap_or_else(|| BoxConstraints::loose(constraints.biggest()).into());
            for child in cx.children() {
                cx.layout_child(child, child_constraints, self.parent_uses_size)?;
                cx.set_child_offset(child, self.child_offset)?;
            }
        }
        if self.sized_by_parent || self.skip_size {
            return Ok(());
        }
        let size = self
            .size
            .map_or(constraints.biggest(), |s| constraints.constrain(s));
        cx.set_size(size)
    }

    fn paint(&self, cx: &mut PaintingContext<'_>, offset: Vec2) -> Result<(), RenderError> {
        let node = cx.node();
        for op in &self.paint {
            match op {
                PaintOp::Fill => {
                    let bounds = cx.tree().paint_bounds(node) + offset;
                    cx.canvas().draw_rect(bounds, &Paint::fill(Color::BLACK));
                }
                PaintOp::Children => {
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child(child, offset + at);
                    }
                }
                PaintOp::OpacityChildren(alpha) => {
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child_with_opacity(child, offset + at, *alpha);
                    }
                }
                PaintOp::ClipChildren => {
                    let clip = cx.tree().paint_bounds(node);
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child_with_clip_rect(child, offset + at, clip - at);
                    }
                }
                PaintOp::ClipRoundedChildren(radius) => {
                    let bounds = cx.tree().paint_bounds(node);
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        let clip = RoundedRect::from_rect(bounds - at, *radius);
                        cx.paint_child_with_clip_rounded_rect(child, offset + at, clip);
                    }
                }
                PaintOp::ClipTriangleChildren => {
                    let bounds = cx.tree().paint_bounds(node);
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child_with_clip_path(child, offset + at, &triangle(bounds - at));
                    }
                }
                PaintOp::TransformChildren(transform) => {
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child_with_transform(child, offset + at, *transform);
                    }
                }
                PaintOp::FilterChildren(filter) => {
                    for child in cx.children() {
                        let at = child_offset(cx, child);
                        cx.paint_child_with_color_filter(child, offset + at, *filter);
                    }
                }
                PaintOp::Fail => return Err(RenderError::Failed("paint failed".into())),
            }
        }
        Ok(())
    }
}

fn child_offset(cx: &PaintingContext<'_>, child: NodeId) -> Vec2 {
    cx.tree().parent_data(child).offset().unwrap_or_default()
}

/// The triangle spanning the top edge of `rect` and the middle of its
/// bottom edge.
pub(crate) fn triangle(rect: Rect) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((rect.x0, rect.y0));
    path.line_to((rect.x1, rect.y0));
    path.line_to((rect.center().x, rect.y1));
    path.close_path();
    path
}

/// A sector node that takes the widest ring its constraints allow.
#[derive(Debug, Default)]
pub(crate) struct SectorNode;

impl RenderObject for SectorNode {
    fn protocol(&self) -> Protocol {
        Protocol::Sector
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError> {
        let c: SectorConstraints = cx.sector_constraints()?;
        cx.set_geometry(Geometry::Sector {
            delta_radius: c.max_delta_radius,
            delta_theta: c.constrain_delta_theta(FULL_TURN),
        })
    }

    fn paint(&self, cx: &mut PaintingContext<'_>, offset: Vec2) -> Result<(), RenderError> {
        let bounds: Rect = cx.tree().paint_bounds(cx.node()) + offset;
        cx.canvas().draw_rect(bounds, &Paint::fill(Color::WHITE));
        Ok(())
    }
}
