// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint: the needs-paint flush and layer-owner repaints.

use alloc::vec::Vec;
use core::cmp::Reverse;
use core::mem;

use kurbo::Vec2;

use super::error::RenderFailure;
use super::id::NodeId;
use super::tree::RenderTree;
use crate::layer::LayerId;
use crate::painting::{CompositedLayer, PaintingContext};

/// What a [`RenderTree::flush_paint`] call did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaintReport {
    /// Layer owners whose layer was cleared and re-recorded, in the order
    /// their repaint started.
    pub repainted: Vec<NodeId>,
    /// How each composited child was placed into its parent's layer.
    pub composited: Vec<(NodeId, CompositedLayer)>,
    /// How many picture layers were recorded.
    pub pictures: usize,
    /// Paint callbacks that returned an error.
    pub failures: Vec<RenderFailure>,
}

impl RenderTree {
    /// Repaints every dirty layer owner, deepest first.
    ///
    /// Each owner's layer is cleared and re-recorded. Descendant layer
    /// owners that are clean are re-appended as they are; dirty ones are
    /// repainted on the way, so they are skipped when their own queue entry
    /// comes up.
    pub fn flush_paint(&mut self) -> PaintReport {
        let mut report = PaintReport::default();
        let mut dirty = mem::take(&mut self.queues.needs_paint);
        dirty.retain(|id| self.is_alive(*id));
        dirty.sort_by_key(|id| Reverse(self.depth[id.idx as usize]));
        for id in dirty {
            let state = self.state[id.idx as usize];
            if state.needs_paint && state.attached {
                self.repaint(id, &mut report);
            }
        }
        report
    }

    /// Clears a layer owner's layer (creating it on first paint) and paints
    /// the node into it.
    pub(crate) fn repaint(&mut self, id: NodeId, report: &mut PaintReport) -> LayerId {
        let i = id.idx as usize;
        assert!(
            self.has_own_layer[i],
            "{} {id:?} does not own a layer",
            self.name[i]
        );
        let layer = match self.layer[i] {
            Some(layer) => {
                self.layers.remove_all_children(layer);
                layer
            }
            None => {
                let layer = self.layers.create_retained_container();
                self.layer[i] = Some(layer);
                layer
            }
        };
        let bounds = self.paint_bounds(id);
        self.layers.set_bounds(layer, bounds);
        report.repainted.push(id);

        let mut cx = PaintingContext::new(self, report, id, layer, bounds);
        cx.paint_node(id, Vec2::ZERO);
        cx.end_recording();
        layer
    }
}
