// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording render nodes into pictures and layers.
//!
//! A [`PaintingContext`] paints into one container layer. Draw calls go to
//! the current [`PictureRecorder`]; when a child that owns a layer is
//! painted, the current recording is closed (becoming a picture layer if
//! anything was drawn), the child's layer is appended, and a fresh
//! recording starts. A container's children are therefore, in order, the
//! pictures and child layers its owner produced.
//!
//! ```text
//!  container (owner A)
//!  ├── picture      A's draws before B
//!  ├── container    B's retained layer, offset by B's position
//!  │   └── picture  B's draws
//!  └── picture      A's draws after B
//! ```

use alloc::vec::Vec;
use core::mem;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Vec2};

use crate::layer::{ClipShape, LayerId, LayerKind};
use crate::picture::{Canvas, Color, ColorFilter, LayerEffect, Paint, PictureRecorder};
use crate::render::{FailurePhase, NodeId, PaintReport, RenderFailure, RenderTree};

/// How a layer-owning child ended up in its parent's layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositedLayer {
    /// The child needed paint (or had never been painted): its layer was
    /// cleared and re-recorded.
    Fresh(LayerId),
    /// The child was clean: its layer was detached and re-appended with only
    /// its offset updated.
    Retained(LayerId),
}

impl CompositedLayer {
    /// Returns the child's layer.
    #[must_use]
    pub const fn layer(self) -> LayerId {
        match self {
            Self::Fresh(layer) | Self::Retained(layer) => layer,
        }
    }
}

/// Paints render nodes into a container layer.
///
/// Handed to [`RenderObject::paint`](crate::render::RenderObject::paint).
pub struct PaintingContext<'a> {
    tree: &'a mut RenderTree,
    report: &'a mut PaintReport,
    node: NodeId,
    container: LayerId,
    bounds: Rect,
    recorder: PictureRecorder,
}

impl core::fmt::Debug for PaintingContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintingContext")
            .field("node", &self.node)
            .field("container", &self.container)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl<'a> PaintingContext<'a> {
    pub(crate) fn new(
        tree: &'a mut RenderTree,
        report: &'a mut PaintReport,
        owner: NodeId,
        container: LayerId,
        bounds: Rect,
    ) -> Self {
        Self {
            tree,
            report,
            node: owner,
            container,
            bounds,
            recorder: PictureRecorder::new(bounds),
        }
    }

    /// Returns the canvas for the current recording.
    ///
    /// Canvas state does not carry across a composited child: painting one
    /// starts a new recording.
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.recorder
    }

    /// Returns a read-only view of the tree, for reading child geometry and
    /// parent data.
    #[must_use]
    pub fn tree(&self) -> &RenderTree {
        self.tree
    }

    /// Returns the node whose paint callback is running.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the painting node's children, in paint order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.node)
    }

    /// Returns the layer this context appends to.
    #[must_use]
    pub const fn container(&self) -> LayerId {
        self.container
    }

    /// Returns the bounds of the current recording.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Paints a child with its origin at `offset`.
    ///
    /// Children without their own layer are painted inline into the current
    /// recording. Layer owners are composited: see [`CompositedLayer`].
    pub fn paint_child(&mut self, child: NodeId, offset: Vec2) {
        if self.tree.has_own_layer(child) {
            self.end_recording();
            self.composite_child(child, offset);
        } else {
            self.paint_node(child, offset);
        }
    }

    /// Paints a child clipped to `clip`, given in the child's coordinates.
    pub fn paint_child_with_clip_rect(&mut self, child: NodeId, offset: Vec2, clip: Rect) {
        self.paint_child_with_effect(child, offset, LayerKind::Clip(ClipShape::Rect(clip)));
    }

    /// Paints a child clipped to a rounded rectangle, given in the child's
    /// coordinates.
    pub fn paint_child_with_clip_rounded_rect(
        &mut self,
        child: NodeId,
        offset: Vec2,
        clip: RoundedRect,
    ) {
        self.paint_child_with_effect(child, offset, LayerKind::Clip(ClipShape::RoundedRect(clip)));
    }

    /// Paints a child clipped to a path, given in the child's coordinates.
    pub fn paint_child_with_clip_path(&mut self, child: NodeId, offset: Vec2, clip: &BezPath) {
        self.paint_child_with_effect(child, offset, LayerKind::Clip(ClipShape::Path(clip.clone())));
    }

    /// Paints a child transformed by `transform`, applied after `offset`.
    pub fn paint_child_with_transform(&mut self, child: NodeId, offset: Vec2, transform: Affine) {
        self.paint_child_with_effect(child, offset, LayerKind::Transform(transform));
    }

    /// Paints a child with group opacity (255 = opaque).
    pub fn paint_child_with_opacity(&mut self, child: NodeId, offset: Vec2, alpha: u8) {
        self.paint_child_with_effect(child, offset, LayerKind::Opacity(alpha));
    }

    /// Paints a child through a color filter.
    pub fn paint_child_with_color_filter(
        &mut self,
        child: NodeId,
        offset: Vec2,
        filter: ColorFilter,
    ) {
        self.paint_child_with_effect(child, offset, LayerKind::ColorFilter(filter));
    }

    /// Applies an effect as canvas state when the child does not need
    /// compositing, or as an effect layer the child is painted into when it
    /// does.
    ///
    /// Either way the child paints in its own coordinates, under the effect,
    /// so group and recording bounds are the child's paint bounds (narrowed
    /// by a clip).
    fn paint_child_with_effect(&mut self, child: NodeId, offset: Vec2, effect: LayerKind) {
        let mut bounds = self.tree.paint_bounds(child);
        if let LayerKind::Clip(shape) = &effect {
            bounds = bounds.intersect(shape.bounds());
        }
        if !self.tree.needs_compositing(child) {
            let canvas = &mut self.recorder;
            canvas.save();
            canvas.translate(offset);
            let group = match &effect {
                LayerKind::Clip(shape) => {
                    shape.apply(canvas);
                    false
                }
                LayerKind::Transform(transform) => {
                    canvas.concat(*transform);
                    false
                }
                LayerKind::Opacity(alpha) => {
                    canvas.save_layer(Some(bounds), LayerEffect::alpha(*alpha));
                    true
                }
                LayerKind::ColorFilter(filter) => {
                    canvas.save_layer(Some(bounds), LayerEffect::color_filter(*filter));
                    true
                }
                LayerKind::Container | LayerKind::Picture(_) => false,
            };
            self.paint_child(child, Vec2::ZERO);
            if group {
                self.recorder.restore();
            }
            self.recorder.restore();
            return;
        }

        self.end_recording();
        let layer = self.tree.layers.create_layer(effect);
        self.tree.layers.set_offset(layer, offset);
        self.tree.layers.set_bounds(layer, bounds);
        self.tree.layers.append(self.container, layer);

        let mut cx =
            PaintingContext::new(&mut *self.tree, &mut *self.report, self.node, layer, bounds);
        cx.paint_child(child, Vec2::ZERO);
        cx.end_recording();
    }

    /// Closes the current recording, appending it as a picture layer if
    /// anything was drawn.
    pub(crate) fn end_recording(&mut self) {
        if self.recorder.is_empty() {
            return;
        }
        let recorder = mem::replace(&mut self.recorder, PictureRecorder::new(self.bounds));
        let picture = recorder.finish();
        let layer = self.tree.layers.create_layer(LayerKind::Picture(picture));
        self.tree.layers.append(self.container, layer);
        self.report.pictures += 1;
    }

    /// Places a layer owner's layer into the container, repainting it first
    /// if needed.
    fn composite_child(&mut self, child: NodeId, offset: Vec2) {
        let i = child.idx as usize;
        let composited = match self.tree.layer[i] {
            Some(layer) if !self.tree.state[i].needs_paint => CompositedLayer::Retained(layer),
            _ => CompositedLayer::Fresh(self.tree.repaint(child, self.report)),
        };
        let layer = composited.layer();
        if self.tree.layers.parent(layer).is_some() {
            self.tree.layers.detach(layer);
        }
        self.tree.layers.set_offset(layer, offset);
        self.tree.layers.append(self.container, layer);
        self.report.composited.push((child, composited));
    }

    /// Runs a node's paint callback, or its error placeholder.
    pub(crate) fn paint_node(&mut self, node: NodeId, offset: Vec2) {
        let i = node.idx as usize;
        self.tree.state[i].needs_paint = false;
        if self.tree.state[i].errored {
            self.paint_error_placeholder(node, offset);
            return;
        }
        let Some(object) = self.tree.object[i].take() else {
            panic!("re-entrant paint of {} {node:?}", self.tree.name[i]);
        };
        let painter = mem::replace(&mut self.node, node);
        let result = object.paint(self, offset);
        self.node = painter;
        self.tree.object[i] = Some(object);

        if let Err(error) = result {
            let failure = RenderFailure {
                node,
                name: self.tree.name[i],
                depth: self.tree.depth[i],
                phase: FailurePhase::Paint,
                error,
            };
            failure.log();
            self.report.failures.push(failure);
            self.paint_error_placeholder(node, offset);
        }
    }

    fn paint_error_placeholder(&mut self, node: NodeId, offset: Vec2) {
        let bounds = self.tree.paint_bounds(node) + offset;
        let canvas = &mut self.recorder;
        canvas.draw_rect(bounds, &Paint::fill(Color::from_argb(0x90, 0xFF, 0x00, 0x00)));
        let stroke = Paint::stroke(Color::RED, 2.0);
        canvas.draw_line(bounds.origin(), Point::new(bounds.x1, bounds.y1), &stroke);
        canvas.draw_line(
            Point::new(bounds.x1, bounds.y0),
            Point::new(bounds.x0, bounds.y1),
            &stroke,
        );
    }
}
