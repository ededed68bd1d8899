// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small render tree for exercising the sinks and dumps.

use std::cell::Cell;

use kurbo::{Size, Vec2};
use lamina_core::painting::PaintingContext;
use lamina_core::picture::{Color, Paint};
use lamina_core::render::{
    BoxConstraints, FrameReport, LayoutCx, Protocol, RenderError, RenderObject, RenderTree,
};
use lamina_core::time::HostTime;
use lamina_core::trace::Tracer;

/// A box that fills its constraints and insets its children by 10.
#[derive(Debug, Default)]
pub(crate) struct Panel {
    pub(crate) layer: bool,
    pub(crate) fail_paint: bool,
}

impl RenderObject for Panel {
    fn protocol(&self) -> Protocol {
        Protocol::Box
    }

    fn has_own_layer(&self) -> bool {
        self.layer
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> Result<(), RenderError> {
        let biggest = cx.box_constraints()?.biggest();
        for child in cx.children() {
            cx.layout_child(child, BoxConstraints::loose(biggest), true)?;
            cx.set_child_offset(child, Vec2::new(10.0, 10.0))?;
        }
        cx.set_size(biggest)
    }

    fn paint(&self, cx: &mut PaintingContext<'_>, offset: Vec2) -> Result<(), RenderError> {
        if self.fail_paint {
            return Err(RenderError::Failed("panel paint failed".into()));
        }
        let bounds = cx.tree().paint_bounds(cx.node()) + offset;
        cx.canvas().draw_rect(bounds, &Paint::fill(Color::WHITE));
        for child in cx.children() {
            let at = cx.tree().parent_data(child).offset().unwrap_or_default();
            cx.paint_child(child, offset + at);
        }
        Ok(())
    }
}

/// A 200x100 layer-owning root panel with one inline child panel.
pub(crate) fn panel_tree() -> RenderTree {
    let mut tree = RenderTree::new();
    let root = tree.create_node(Box::new(Panel {
        layer: true,
        ..Panel::default()
    }));
    let child = tree.create_node(Box::new(Panel::default()));
    tree.adopt_child(root, child);
    tree.set_root(root, BoxConstraints::tight(Size::new(200.0, 100.0)).into());
    tree
}

/// Draws a frame with a clock that advances 1000 ticks per reading.
pub(crate) fn frame(tree: &mut RenderTree, frame_index: u64, tracer: &mut Tracer<'_>) -> FrameReport {
    let ticks = Cell::new(0_u64);
    let clock = || {
        ticks.set(ticks.get() + 1000);
        HostTime(ticks.get())
    };
    tree.draw_frame(frame_index, &clock, tracer)
}
