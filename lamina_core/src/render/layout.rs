// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout: the needs-layout flush, per-node layout and the layout context.

use alloc::vec::Vec;
use core::mem;

use kurbo::{Size, Vec2};

use super::error::{FailurePhase, RenderError, RenderFailure};
use super::id::NodeId;
use super::object::RenderObject;
use super::protocol::{
    BoxConstraints, Constraints, Geometry, ParentData, Protocol, SectorConstraints,
};
use super::tree::RenderTree;
use crate::layer::INVALID;

/// What a [`RenderTree::flush_layout`] call did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutReport {
    /// Every node whose layout callbacks ran, in the order their layout
    /// started (parents before the children they lay out).
    pub laid_out: Vec<NodeId>,
    /// How many times the needs-layout queue was drained.
    pub passes: u32,
    /// Callbacks that returned an error.
    pub failures: Vec<RenderFailure>,
}

impl RenderTree {
    /// Lays out every dirty relayout root.
    ///
    /// The queue is drained, sorted by depth (shallowest first) and each
    /// entry that is still dirty and attached is laid out with its stored
    /// constraints. Nodes queued during the pass run in a further pass, up
    /// to [`PipelineConfig::max_layout_passes`](super::PipelineConfig::max_layout_passes).
    ///
    /// # Panics
    ///
    /// With debug assertions, panics if layout does not settle within the
    /// pass limit. Without them the error is logged and the remaining nodes
    /// stay queued for the next frame.
    pub fn flush_layout(&mut self) -> LayoutReport {
        let mut report = LayoutReport::default();
        while !self.queues.needs_layout.is_empty() {
            if report.passes == self.config.max_layout_passes {
                log::error!(
                    "layout did not settle after {} passes; {} nodes left for the next frame",
                    report.passes,
                    self.queues.needs_layout.len()
                );
                if cfg!(debug_assertions) {
                    panic!("layout did not settle after {} passes", report.passes);
                }
                break;
            }
            report.passes += 1;

            let mut dirty = mem::take(&mut self.queues.needs_layout);
            dirty.retain(|id| self.is_alive(*id));
            dirty.sort_by_key(|id| self.depth[id.idx as usize]);
            for id in dirty {
                let state = self.state[id.idx as usize];
                if state.needs_layout && state.attached {
                    self.relayout(id);
                }
            }
        }
        report.laid_out = mem::take(&mut self.laid_out);
        report.failures = mem::take(&mut self.failures);
        report
    }

    /// Re-runs layout for a queued relayout root with its stored
    /// constraints.
    fn relayout(&mut self, id: NodeId) {
        let i = id.idx as usize;
        let resize = self.sized_by_parent[i] && !self.state[i].geometry_set;
        self.run_layout(id, resize);
    }

    /// Lays out `id` under `constraints`, as asked by its parent.
    ///
    /// The node becomes its own relayout root when the parent does not use
    /// its size, when it is sized by its parent, when the constraints are
    /// tight, or when it has no parent; otherwise it shares its parent's.
    /// Layout is skipped when the node is clean and neither the constraints
    /// nor the relayout root changed.
    pub(crate) fn layout_node(
        &mut self,
        id: NodeId,
        constraints: Constraints,
        parent_uses_size: bool,
    ) -> Result<Geometry, RenderError> {
        let i = id.idx as usize;
        if constraints.protocol() != self.protocol[i] {
            return Err(RenderError::ProtocolMismatch {
                expected: self.protocol[i],
                actual: constraints.protocol(),
            });
        }

        let p = self.parent[i];
        let relayout_root = if !parent_uses_size
            || self.sized_by_parent[i]
            || constraints.is_tight()
            || p == INVALID
        {
            id.idx
        } else {
            self.relayout_root[p as usize]
        };

        let unchanged = !self.state[i].needs_layout
            && self.constraints[i] == Some(constraints)
            && self.relayout_root[i] == relayout_root;
        if !unchanged {
            self.constraints[i] = Some(constraints);
            self.relayout_root[i] = relayout_root;
            self.run_layout(id, self.sized_by_parent[i]);
        }
        Ok(self.geometry[i].unwrap_or_else(|| constraints.smallest()))
    }

    fn run_layout(&mut self, id: NodeId, resize: bool) {
        let i = id.idx as usize;
        assert!(
            !self.state[i].doing_layout,
            "re-entrant layout of {} {id:?}",
            self.name[i]
        );
        let Some(constraints) = self.constraints[i] else {
            panic!("layout of {} {id:?} without constraints", self.name[i]);
        };
        let Some(mut object) = self.object[i].take() else {
            panic!("re-entrant layout of {} {id:?}", self.name[i]);
        };

        self.laid_out.push(id);
        self.state[i].doing_layout = true;
        let result = {
            let mut cx = LayoutCx {
                tree: self,
                node: id,
                constraints,
            };
            cx.perform(&mut *object, resize)
        };
        self.state[i].doing_layout = false;
        self.object[i] = Some(object);

        match result {
            Ok(()) => self.state[i].errored = false,
            Err((phase, error)) => self.fail_layout(id, constraints, phase, error),
        }
        self.state[i].needs_layout = false;
        self.mark_needs_paint(id);
    }

    /// Records a failed layout callback and gives the node placeholder
    /// geometry.
    ///
    /// Descendants the callback never reached are left clean with no
    /// relayout root, so a later mark on one of them climbs to this node.
    fn fail_layout(
        &mut self,
        id: NodeId,
        constraints: Constraints,
        phase: FailurePhase,
        error: RenderError,
    ) {
        let i = id.idx as usize;
        let placeholder = self.config.error_placeholder_size;
        self.geometry[i] = Some(match constraints {
            Constraints::Box(c) => Geometry::Box(c.constrain(placeholder)),
            Constraints::Sector(c) => Geometry::Sector {
                delta_radius: c.constrain_delta_radius(placeholder.width),
                delta_theta: c.min_delta_theta,
            },
        });
        self.state[i].geometry_set = true;
        self.state[i].errored = true;
        self.forget_unreached_layout(id.idx);

        let failure = RenderFailure {
            node: id,
            name: self.name[i],
            depth: self.depth[i],
            phase,
            error,
        };
        failure.log();
        self.failures.push(failure);
    }

    /// Clears pending layout under a failed node, stopping at descendants
    /// that are their own relayout roots.
    fn forget_unreached_layout(&mut self, idx: u32) {
        let mut stack = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            stack.push(child);
            child = self.next_sibling[child as usize];
        }
        while let Some(n) = stack.pop() {
            let i = n as usize;
            if self.relayout_root[i] == n {
                continue;
            }
            if self.state[i].needs_layout {
                self.state[i].needs_layout = false;
                self.relayout_root[i] = INVALID;
            }
            let mut child = self.first_child[i];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
    }
}

/// Access to the tree for a node's layout callbacks.
///
/// Handed to [`RenderObject::perform_resize`](super::RenderObject::perform_resize)
/// and [`RenderObject::perform_layout`](super::RenderObject::perform_layout).
/// Children are laid out through [`layout_child`](Self::layout_child);
/// arbitrary mutation of the tree is only allowed inside
/// [`invoke_layout_callback`](Self::invoke_layout_callback).
#[derive(Debug)]
pub struct LayoutCx<'a> {
    tree: &'a mut RenderTree,
    node: NodeId,
    constraints: Constraints,
}

impl LayoutCx<'_> {
    /// Returns the node being laid out.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Returns a read-only view of the tree.
    #[must_use]
    pub fn tree(&self) -> &RenderTree {
        self.tree
    }

    /// Returns the constraints the node is being laid out under.
    #[must_use]
    pub const fn constraints(&self) -> Constraints {
        self.constraints
    }

    /// Returns the constraints as box constraints.
    pub fn box_constraints(&self) -> Result<BoxConstraints, RenderError> {
        match self.constraints {
            Constraints::Box(c) => Ok(c),
            other => Err(RenderError::ProtocolMismatch {
                expected: Protocol::Box,
                actual: other.protocol(),
            }),
        }
    }

    /// Returns the constraints as sector constraints.
    pub fn sector_constraints(&self) -> Result<SectorConstraints, RenderError> {
        match self.constraints {
            Constraints::Sector(c) => Ok(c),
            other => Err(RenderError::ProtocolMismatch {
                expected: Protocol::Sector,
                actual: other.protocol(),
            }),
        }
    }

    /// Returns the node's children, in paint order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.node)
    }

    /// Lays out a direct child and returns its geometry.
    ///
    /// Pass `parent_uses_size = false` when this node's own geometry does
    /// not depend on the result; the child then becomes a relayout root.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a direct child of the node.
    pub fn layout_child(
        &mut self,
        child: NodeId,
        constraints: impl Into<Constraints>,
        parent_uses_size: bool,
    ) -> Result<Geometry, RenderError> {
        self.assert_child(child);
        self.tree
            .layout_node(child, constraints.into(), parent_uses_size)
    }

    /// Sets the node's geometry.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<(), RenderError> {
        let i = self.node.idx as usize;
        if geometry.protocol() != self.tree.protocol[i] {
            return Err(RenderError::ProtocolMismatch {
                expected: self.tree.protocol[i],
                actual: geometry.protocol(),
            });
        }
        self.tree.geometry[i] = Some(geometry);
        self.tree.state[i].geometry_set = true;
        Ok(())
    }

    /// Sets the node's box size.
    pub fn set_size(&mut self, size: Size) -> Result<(), RenderError> {
        self.set_geometry(Geometry::Box(size))
    }

    /// Returns a child's geometry from its last layout.
    #[must_use]
    pub fn child_geometry(&self, child: NodeId) -> Option<Geometry> {
        self.tree.geometry(child)
    }

    /// Returns a child's box size from its last layout.
    #[must_use]
    pub fn child_size(&self, child: NodeId) -> Option<Size> {
        self.tree.size(child)
    }

    /// Returns the parent data on the edge to a child.
    #[must_use]
    pub fn child_parent_data(&self, child: NodeId) -> ParentData {
        self.tree.parent_data(child)
    }

    /// Replaces the parent data on the edge to a child.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a direct child of the node.
    pub fn set_child_parent_data(
        &mut self,
        child: NodeId,
        data: ParentData,
    ) -> Result<(), RenderError> {
        self.assert_child(child);
        self.tree.parent_data[child.idx as usize].merge(data)
    }

    /// Positions a child of a box node.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a direct child of the node.
    pub fn set_child_offset(&mut self, child: NodeId, offset: Vec2) -> Result<(), RenderError> {
        self.set_child_parent_data(child, ParentData::Box { offset })
    }

    /// Runs `callback` with mutable access to the tree, for building or
    /// pruning children during layout.
    ///
    /// While the callback runs, layout marks raised below this node stop at
    /// it instead of dirtying its ancestors.
    pub fn invoke_layout_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut RenderTree, NodeId),
    {
        let i = self.node.idx as usize;
        self.tree.state[i].in_layout_callback = true;
        callback(self.tree, self.node);
        self.tree.state[i].in_layout_callback = false;
    }

    fn assert_child(&self, child: NodeId) {
        self.tree.validate(child);
        assert!(
            self.tree.parent[child.idx as usize] == self.node.idx,
            "{:?} is not a child of {} {:?}",
            child,
            self.tree.name[self.node.idx as usize],
            self.node
        );
    }

    /// Runs the node's layout callbacks and checks their postconditions.
    fn perform(
        &mut self,
        object: &mut dyn RenderObject,
        resize: bool,
    ) -> Result<(), (FailurePhase, RenderError)> {
        let i = self.node.idx as usize;
        let sized_by_parent = self.tree.sized_by_parent[i];

        if resize {
            self.tree.state[i].geometry_set = false;
            object
                .perform_resize(self)
                .map_err(|e| (FailurePhase::Resize, e))?;
            if !self.tree.state[i].geometry_set {
                return Err((FailurePhase::Resize, RenderError::GeometryNotSet));
            }
        }

        if !sized_by_parent {
            self.tree.state[i].geometry_set = false;
        }
        object
            .perform_layout(self)
            .map_err(|e| (FailurePhase::Layout, e))?;
        if !self.tree.state[i].geometry_set {
            return Err((FailurePhase::Layout, RenderError::GeometryNotSet));
        }

        if let Some(child) = self
            .children()
            .into_iter()
            .find(|c| self.tree.state[c.idx as usize].needs_layout)
        {
            return Err((FailurePhase::Layout, RenderError::ChildNotLaidOut(child)));
        }
        Ok(())
    }
}
