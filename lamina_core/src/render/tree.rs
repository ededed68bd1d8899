// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays render node storage, topology and dirty marking.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use kurbo::{Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::config::PipelineConfig;
use super::error::RenderFailure;
use super::id::NodeId;
use super::object::RenderObject;
use super::protocol::{self, Constraints, Geometry, ParentData, Protocol};
use crate::dirty;
use crate::layer::{INVALID, LayerId, LayerTree};

/// Per-node lifecycle flags.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NodeState {
    pub(crate) needs_layout: bool,
    pub(crate) needs_paint: bool,
    pub(crate) needs_compositing: bool,
    pub(crate) needs_compositing_bits_update: bool,
    pub(crate) attached: bool,
    pub(crate) doing_layout: bool,
    pub(crate) in_layout_callback: bool,
    pub(crate) errored: bool,
    pub(crate) geometry_set: bool,
}

/// Nodes waiting for the next layout and paint flushes.
///
/// Queues hold relayout roots (layout) and layer owners (paint). Entries may
/// be stale or already clean by the time they are flushed; the flushes skip
/// those.
#[derive(Clone, Debug, Default)]
pub struct PipelineQueues {
    pub(crate) needs_layout: Vec<NodeId>,
    pub(crate) needs_paint: Vec<NodeId>,
}

impl PipelineQueues {
    /// Returns the relayout roots queued for the next layout flush.
    #[must_use]
    pub fn needs_layout(&self) -> &[NodeId] {
        &self.needs_layout
    }

    /// Returns the layer owners queued for the next paint flush.
    #[must_use]
    pub fn needs_paint(&self) -> &[NodeId] {
        &self.needs_paint
    }
}

/// The render object tree.
///
/// Nodes are addressed by [`NodeId`] handles into struct-of-arrays storage,
/// like layers in a [`LayerTree`]. Each node pairs a boxed [`RenderObject`]
/// with the pipeline state the tree maintains for it.
///
/// # Frame pipeline
///
/// Mutations (adopting and dropping children, `mark_needs_*`) record what
/// changed. Each frame then runs, in order:
///
/// 1. [`flush_layout`](Self::flush_layout), relayout roots shallowest first;
/// 2. [`flush_compositing_bits`](Self::flush_compositing_bits), bottom-up;
/// 3. [`flush_paint`](Self::flush_paint), layer owners deepest first.
///
/// [`draw_frame`](Self::draw_frame) runs all three with tracing. The layer
/// tree under [`root_layer`](Self::root_layer) is then ready to composite.
pub struct RenderTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) depth: Vec<u32>,

    // -- Behavior (fixed at creation) --
    pub(crate) object: Vec<Option<Box<dyn RenderObject>>>,
    pub(crate) name: Vec<&'static str>,
    pub(crate) protocol: Vec<Protocol>,
    pub(crate) sized_by_parent: Vec<bool>,
    pub(crate) has_own_layer: Vec<bool>,

    // -- Layout --
    pub(crate) constraints: Vec<Option<Constraints>>,
    pub(crate) geometry: Vec<Option<Geometry>>,
    pub(crate) parent_data: Vec<ParentData>,
    pub(crate) relayout_root: Vec<u32>,
    pub(crate) state: Vec<NodeState>,

    // -- Compositing --
    pub(crate) layer: Vec<Option<LayerId>>,
    pub(crate) layers: LayerTree,
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Scheduling --
    pub(crate) root: u32,
    pub(crate) queues: PipelineQueues,
    pub(crate) config: PipelineConfig,
    pub(crate) laid_out: Vec<NodeId>,
    pub(crate) failures: Vec<RenderFailure>,
    visual_update_requested: bool,
    on_visual_update: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTree")
            .field("len", &self.len)
            .field("live", &self.live_count())
            .field("root", &self.root())
            .field("queues", &self.queues)
            .field("config", &self.config)
            .field("layers", &self.layers.live_count())
            .finish_non_exhaustive()
    }
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    /// Creates an empty tree with the default [`PipelineConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::DEFAULT)
    }

    /// Creates an empty tree with the given configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            depth: Vec::new(),
            object: Vec::new(),
            name: Vec::new(),
            protocol: Vec::new(),
            sized_by_parent: Vec::new(),
            has_own_layer: Vec::new(),
            constraints: Vec::new(),
            geometry: Vec::new(),
            parent_data: Vec::new(),
            relayout_root: Vec::new(),
            state: Vec::new(),
            layer: Vec::new(),
            layers: LayerTree::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            queues: PipelineQueues::default(),
            config,
            laid_out: Vec::new(),
            failures: Vec::new(),
            visual_update_requested: false,
            on_visual_update: None,
        }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // -- Allocation API --

    /// Creates a detached node and returns its handle.
    ///
    /// The node starts dirty for layout and paint, with no constraints,
    /// geometry or layer.
    pub fn create_node(&mut self, object: Box<dyn RenderObject>) -> NodeId {
        let name = object.debug_name();
        let protocol = object.protocol();
        let sized_by_parent = object.sized_by_parent();
        let has_own_layer = object.has_own_layer();
        let state = NodeState {
            needs_layout: true,
            needs_paint: true,
            needs_compositing: has_own_layer,
            ..NodeState::default()
        };
        let parent_data = ParentData::default_for(protocol);

        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.depth[i] = 0;
            self.object[i] = Some(object);
            self.name[i] = name;
            self.protocol[i] = protocol;
            self.sized_by_parent[i] = sized_by_parent;
            self.has_own_layer[i] = has_own_layer;
            self.constraints[i] = None;
            self.geometry[i] = None;
            self.parent_data[i] = parent_data;
            self.relayout_root[i] = INVALID;
            self.state[i] = state;
            self.layer[i] = None;
            self.live[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.depth.push(0);
            self.object.push(Some(object));
            self.name.push(name);
            self.protocol.push(protocol);
            self.sized_by_parent.push(sized_by_parent);
            self.has_own_layer.push(has_own_layer);
            self.constraints.push(None);
            self.geometry.push(None);
            self.parent_data.push(parent_data);
            self.relayout_root.push(INVALID);
            self.state.push(state);
            self.layer.push(None);
            self.live.push(true);
            self.generation.push(0);
            idx
        };
        self.handle(idx)
    }

    /// Destroys a detached node and its whole subtree, freeing their slots
    /// and releasing their layers.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if the node still has a parent, or if
    /// it is the root.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        assert!(
            self.parent[id.idx as usize] == INVALID,
            "cannot destroy a node that still has a parent"
        );
        assert!(id.idx != self.root, "cannot destroy the root node");

        for idx in self.subtree(id.idx) {
            let i = idx as usize;
            if let Some(layer) = self.layer[i].take() {
                self.layers.release(layer);
            }
            self.dirty.remove_key(idx);
            self.object[i] = None;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.state[i] = NodeState::default();
            self.live[i] = false;
            self.generation[i] += 1;
            self.free_list.push(idx);
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.live[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    // -- Root API --

    /// Makes `id` the root of the tree and schedules its initial layout and
    /// paint.
    ///
    /// The root is attached, together with its subtree, and is always its
    /// own relayout root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if a root is already set, if the node
    /// has a parent, if it does not own a layer, or if `constraints` belong
    /// to a different protocol.
    pub fn set_root(&mut self, id: NodeId, constraints: Constraints) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(self.root == INVALID, "the tree already has a root");
        assert!(self.parent[i] == INVALID, "the root cannot have a parent");
        assert!(self.has_own_layer[i], "the root node must own a layer");
        assert!(
            constraints.protocol() == self.protocol[i],
            "root constraints must match the root's protocol"
        );

        self.root = id.idx;
        self.relayout_root[i] = id.idx;
        self.constraints[i] = Some(constraints);
        // Attaching re-issues the layout mark, which queues the root.
        self.state[i].needs_layout = true;
        self.attach_subtree(id.idx);
        if self.layer[i].is_none() {
            self.state[i].needs_paint = true;
            self.schedule_paint(id);
        }
    }

    /// Returns the root node, if set.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        (self.root != INVALID).then(|| self.handle(self.root))
    }

    /// Replaces the root constraints (for example after a window resize).
    ///
    /// # Panics
    ///
    /// Panics if no root is set or the protocol does not match.
    pub fn set_root_constraints(&mut self, constraints: Constraints) {
        assert!(self.root != INVALID, "the tree has no root");
        let i = self.root as usize;
        assert!(
            constraints.protocol() == self.protocol[i],
            "root constraints must match the root's protocol"
        );
        if self.constraints[i] == Some(constraints) {
            return;
        }
        self.constraints[i] = Some(constraints);
        if self.sized_by_parent[i] {
            self.state[i].geometry_set = false;
        }
        self.mark_needs_layout(self.handle(self.root));
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// The edge gets fresh parent data for the parent's protocol. If the
    /// parent is attached the child's subtree is attached too. The parent is
    /// marked for layout and for a compositing-bits update.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent or
    /// is the root, or if `child` is an ancestor of `parent`.
    pub fn adopt_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(c != self.root, "the root cannot be adopted");
        assert!(
            !self.ancestors(p).any(|a| a == c),
            "cannot adopt an ancestor"
        );

        self.parent_data[c as usize] = ParentData::default_for(self.protocol[p as usize]);
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = INVALID;
        let last = self.last_child[p as usize];
        self.prev_sibling[c as usize] = last;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }
        self.last_child[p as usize] = c;

        let old_base = self.depth[c as usize];
        let new_base = self.depth[p as usize] + 1;
        for idx in self.subtree(c) {
            self.depth[idx as usize] = self.depth[idx as usize] - old_base + new_base;
        }

        // A parent's compositing bit depends on its children's.
        let _ = self.dirty.add_dependency(p, c, dirty::COMPOSITING);

        if self.state[p as usize].attached {
            self.attach_subtree(c);
        }
        self.mark_needs_layout(parent);
        self.mark_needs_compositing_bits_update(parent);
    }

    /// Removes `child` from `parent`.
    ///
    /// The child's subtree is detached, its layers are released and its
    /// relayout roots are cleared. The parent is marked for layout and for a
    /// compositing-bits update.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `child` is not a child of
    /// `parent`.
    pub fn drop_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == p,
            "node is not a child of this parent"
        );

        self.clean_relayout_root(c);
        self.parent_data[c as usize].detach();
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(p, c, dirty::COMPOSITING);

        for idx in self.subtree(c) {
            let i = idx as usize;
            self.state[i].attached = false;
            if let Some(layer) = self.layer[i].take() {
                self.layers.release(layer);
            }
        }
        let base = self.depth[c as usize];
        for idx in self.subtree(c) {
            self.depth[idx as usize] -= base;
        }

        self.mark_needs_layout(parent);
        self.mark_needs_compositing_bits_update(parent);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns the direct children of a node, in paint order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        let mut children = Vec::new();
        let mut child = self.first_child[id.idx as usize];
        while child != INVALID {
            children.push(self.handle(child));
            child = self.next_sibling[child as usize];
        }
        children
    }

    // -- Query API --

    /// Returns the node's depth; the root and detached subtree roots are at
    /// depth 0.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    /// Returns the node's debug name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &'static str {
        self.validate(id);
        self.name[id.idx as usize]
    }

    /// Returns the node's layout protocol.
    #[must_use]
    pub fn protocol(&self, id: NodeId) -> Protocol {
        self.validate(id);
        self.protocol[id.idx as usize]
    }

    /// Returns whether the node's geometry depends only on its constraints.
    #[must_use]
    pub fn sized_by_parent(&self, id: NodeId) -> bool {
        self.validate(id);
        self.sized_by_parent[id.idx as usize]
    }

    /// Returns whether the node paints into its own layer.
    #[must_use]
    pub fn has_own_layer(&self, id: NodeId) -> bool {
        self.validate(id);
        self.has_own_layer[id.idx as usize]
    }

    /// Returns the constraints of the node's last layout.
    #[must_use]
    pub fn constraints(&self, id: NodeId) -> Option<Constraints> {
        self.validate(id);
        self.constraints[id.idx as usize]
    }

    /// Returns the geometry computed by the node's last layout.
    #[must_use]
    pub fn geometry(&self, id: NodeId) -> Option<Geometry> {
        self.validate(id);
        self.geometry[id.idx as usize]
    }

    /// Returns the box size computed by the node's last layout.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.geometry(id).and_then(|g| g.size())
    }

    /// Returns the parent data on the edge to the node's parent.
    #[must_use]
    pub fn parent_data(&self, id: NodeId) -> ParentData {
        self.validate(id);
        self.parent_data[id.idx as usize]
    }

    /// Returns the node's paint bounds in its own coordinate space.
    #[must_use]
    pub fn paint_bounds(&self, id: NodeId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;
        protocol::paint_bounds(self.geometry[i], self.parent_data[i])
    }

    /// Returns the node's relayout root, if it has been laid out since it
    /// was last dropped.
    #[must_use]
    pub fn relayout_root(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let r = self.relayout_root[id.idx as usize];
        (r != INVALID).then(|| self.handle(r))
    }

    /// Returns whether the node is waiting for layout.
    #[must_use]
    pub fn needs_layout(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].needs_layout
    }

    /// Returns whether the node is waiting for paint.
    #[must_use]
    pub fn needs_paint(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].needs_paint
    }

    /// Returns whether the node or any descendant paints into its own layer.
    #[must_use]
    pub fn needs_compositing(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].needs_compositing
    }

    /// Returns whether the node's compositing bit is waiting to be
    /// recomputed.
    #[must_use]
    pub fn needs_compositing_bits_update(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].needs_compositing_bits_update
    }

    /// Returns whether the node is part of the tree under the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].attached
    }

    /// Returns whether the node's last layout or paint failed.
    #[must_use]
    pub fn is_errored(&self, id: NodeId) -> bool {
        self.validate(id);
        self.state[id.idx as usize].errored
    }

    /// Returns the layer a layer owner painted into, if it has been painted.
    #[must_use]
    pub fn layer(&self, id: NodeId) -> Option<LayerId> {
        self.validate(id);
        self.layer[id.idx as usize]
    }

    /// Returns the root's layer, once the root has been painted.
    #[must_use]
    pub fn root_layer(&self) -> Option<LayerId> {
        (self.root != INVALID)
            .then(|| self.layer[self.root as usize])
            .flatten()
    }

    /// Returns the layer tree the pipeline paints into.
    #[must_use]
    pub const fn layers(&self) -> &LayerTree {
        &self.layers
    }

    /// Returns the scheduling queues.
    #[must_use]
    pub const fn queues(&self) -> &PipelineQueues {
        &self.queues
    }

    /// Returns the node's render object, if it is a `T`.
    ///
    /// Returns `None` while the node is being laid out or painted.
    #[must_use]
    pub fn object<T: RenderObject>(&self, id: NodeId) -> Option<&T> {
        self.validate(id);
        let object: &dyn Any = self.object[id.idx as usize].as_deref()?;
        object.downcast_ref::<T>()
    }

    /// Returns the node's render object mutably, if it is a `T`.
    ///
    /// Mutating an object does not dirty the node; follow up with
    /// [`mark_needs_layout`](Self::mark_needs_layout) or
    /// [`mark_needs_paint`](Self::mark_needs_paint).
    #[must_use]
    pub fn object_mut<T: RenderObject>(&mut self, id: NodeId) -> Option<&mut T> {
        self.validate(id);
        let object: &mut dyn Any = self.object[id.idx as usize].as_deref_mut()?;
        object.downcast_mut::<T>()
    }

    // -- Dirty marking --

    /// Marks the node as needing layout.
    ///
    /// Does nothing if the node is already dirty or is running a layout
    /// callback. A node that is not its own relayout root forwards the mark
    /// to its parent, unless the parent is running a layout callback; a
    /// relayout root is queued and a visual update is requested.
    pub fn mark_needs_layout(&mut self, id: NodeId) {
        self.validate(id);
        let mut idx = id.idx;
        loop {
            let state = &mut self.state[idx as usize];
            if state.needs_layout || state.in_layout_callback {
                return;
            }
            state.needs_layout = true;
            if self.relayout_root[idx as usize] == idx {
                self.schedule_layout(self.handle(idx));
                return;
            }
            let p = self.parent[idx as usize];
            if p == INVALID || self.state[p as usize].in_layout_callback {
                return;
            }
            idx = p;
        }
    }

    /// Marks the node as needing paint.
    ///
    /// Propagates up to the nearest layer owner, which is queued.
    pub fn mark_needs_paint(&mut self, id: NodeId) {
        self.validate(id);
        let mut idx = id.idx;
        loop {
            let state = &mut self.state[idx as usize];
            if state.needs_paint {
                return;
            }
            state.needs_paint = true;
            if self.has_own_layer[idx as usize] {
                self.schedule_paint(self.handle(idx));
                return;
            }
            let p = self.parent[idx as usize];
            if p == INVALID {
                return;
            }
            idx = p;
        }
    }

    /// Marks the node and its ancestors as needing their compositing bit
    /// recomputed.
    pub fn mark_needs_compositing_bits_update(&mut self, id: NodeId) {
        self.validate(id);
        if self.state[id.idx as usize].needs_compositing_bits_update {
            return;
        }
        let mut idx = id.idx;
        while idx != INVALID && !self.state[idx as usize].needs_compositing_bits_update {
            self.state[idx as usize].needs_compositing_bits_update = true;
            idx = self.parent[idx as usize];
        }
        self.dirty
            .mark_with(id.idx, dirty::COMPOSITING, &EagerPolicy);
    }

    // -- Visual updates --

    /// Installs a callback run whenever a node is queued for layout or
    /// paint, so the embedder can schedule a frame.
    pub fn set_visual_update_handler(&mut self, handler: Box<dyn FnMut()>) {
        self.on_visual_update = Some(handler);
    }

    /// Returns whether a visual update was requested since the last call, and
    /// clears the request.
    pub fn take_visual_update_request(&mut self) -> bool {
        core::mem::take(&mut self.visual_update_requested)
    }

    // -- Internal helpers --

    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn schedule_layout(&mut self, id: NodeId) {
        self.queues.needs_layout.push(id);
        self.request_visual_update();
    }

    fn schedule_paint(&mut self, id: NodeId) {
        self.queues.needs_paint.push(id);
        self.request_visual_update();
    }

    fn request_visual_update(&mut self) {
        self.visual_update_requested = true;
        if let Some(handler) = &mut self.on_visual_update {
            handler();
        }
    }

    /// Returns `idx` and its descendants in pre-order.
    pub(crate) fn subtree(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = Vec::from([idx]);
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut child = self.last_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.prev_sibling[child as usize];
            }
        }
        out
    }

    /// Walks from `idx` up to the top of its tree.
    fn ancestors(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        core::iter::successors(Some(idx), |&n| {
            let p = self.parent[n as usize];
            (p != INVALID).then_some(p)
        })
    }

    /// Attaches a subtree and re-issues the marks it accumulated while
    /// detached.
    fn attach_subtree(&mut self, idx: u32) {
        for n in self.subtree(idx) {
            let i = n as usize;
            self.state[i].attached = true;
            let id = self.handle(n);
            if self.state[i].needs_layout && self.relayout_root[i] != INVALID {
                self.state[i].needs_layout = false;
                self.mark_needs_layout(id);
            }
            if self.state[i].needs_compositing_bits_update {
                self.state[i].needs_compositing_bits_update = false;
                self.mark_needs_compositing_bits_update(id);
            }
            if self.state[i].needs_paint && self.layer[i].is_some() {
                self.state[i].needs_paint = false;
                self.mark_needs_paint(id);
            }
        }
    }

    /// Forgets the relayout roots a subtree inherited from above it.
    fn clean_relayout_root(&mut self, idx: u32) {
        let mut stack = Vec::from([idx]);
        while let Some(n) = stack.pop() {
            let i = n as usize;
            if self.relayout_root[i] == n {
                continue;
            }
            self.relayout_root[i] = INVALID;
            self.state[i].needs_layout = true;
            let mut child = self.first_child[i];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p as usize] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
