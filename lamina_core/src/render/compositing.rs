// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing-bit recomputation.

use alloc::vec::Vec;
use core::cmp::Reverse;

use super::id::NodeId;
use super::tree::RenderTree;
use crate::dirty;
use crate::layer::INVALID;

/// What a [`RenderTree::flush_compositing_bits`] call did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositingReport {
    /// How many nodes had their bit recomputed.
    pub updated: usize,
    /// Nodes whose bit changed and were marked for paint.
    pub flipped: Vec<NodeId>,
}

impl RenderTree {
    /// Recomputes `needs_compositing` for every node marked since the last
    /// flush, deepest first.
    ///
    /// A node needs compositing when it owns a layer or any child needs
    /// compositing. Nodes whose bit changes are marked for paint, since
    /// their effects switch between canvas state and effect layers. Detached
    /// nodes are skipped and keep their mark until they are attached again.
    pub fn flush_compositing_bits(&mut self) -> CompositingReport {
        let mut report = CompositingReport::default();
        let mut dirty: Vec<u32> = self
            .dirty
            .drain(dirty::COMPOSITING)
            .affected()
            .deterministic()
            .run()
            .collect();
        dirty.retain(|&idx| idx < self.len && self.live[idx as usize]);
        dirty.sort_by_key(|&idx| Reverse(self.depth[idx as usize]));

        for idx in dirty {
            let i = idx as usize;
            if !self.state[i].attached {
                continue;
            }
            let mut needs = self.has_own_layer[i];
            let mut child = self.first_child[i];
            while !needs && child != INVALID {
                needs = self.state[child as usize].needs_compositing;
                child = self.next_sibling[child as usize];
            }

            self.state[i].needs_compositing_bits_update = false;
            report.updated += 1;
            if needs != self.state[i].needs_compositing {
                self.state[i].needs_compositing = needs;
                let id = self.handle(idx);
                report.flipped.push(id);
                self.mark_needs_paint(id);
            }
        }
        report
    }
}
