// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and ownership.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use super::id::{INVALID, LayerId};
use super::kind::LayerKind;
use crate::picture::Picture;

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Released layers are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct LayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) kind: Vec<LayerKind>,
    pub(crate) offset: Vec<Vec2>,
    pub(crate) bounds: Vec<Rect>,
    pub(crate) retained: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerTree {
    /// Creates an empty layer tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            offset: Vec::new(),
            bounds: Vec::new(),
            retained: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation API --

    /// Creates a parent-owned layer and returns its handle.
    ///
    /// The layer starts with a zero offset, empty bounds and no parent.
    /// Picture layers take their bounds from the picture's cull rect.
    pub fn create_layer(&mut self, kind: LayerKind) -> LayerId {
        self.allocate(kind, false)
    }

    /// Creates a container layer owned by a render node rather than by its
    /// parent layer.
    ///
    /// [`remove_all_children`](Self::remove_all_children) and
    /// [`release`](Self::release) on an ancestor only detach it.
    pub fn create_retained_container(&mut self) -> LayerId {
        self.allocate(LayerKind::Container, true)
    }

    /// Releases a layer and every parent-owned layer below it.
    ///
    /// Retained descendants are detached instead, and stay alive for their
    /// owners. The released layer is unlinked from its parent first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release(&mut self, id: LayerId) {
        self.validate(id);
        if self.parent[id.idx as usize] != INVALID {
            self.unlink_from_parent(id.idx);
        }
        self.release_slot(id.idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        id.idx < self.len
            && self.live[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` is a picture layer.
    pub fn append(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            self.kind[p as usize].accepts_children(),
            "picture layers cannot have children"
        );
        assert!(p != c, "a layer cannot be its own child");

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
    }

    /// Removes `child` from its parent without releasing it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn detach(&mut self, child: LayerId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "layer has no parent"
        );
        self.unlink_from_parent(child.idx);
    }

    /// Empties a layer's child list.
    ///
    /// Parent-owned children are released with their subtrees; retained
    /// containers are detached and kept alive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_all_children(&mut self, id: LayerId) {
        self.validate(id);
        self.clear_children(id.idx);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns the direct children of a layer, in compositing order.
    ///
    /// The iterator is double-ended; `.rev()` walks topmost first.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        let i = id.idx as usize;
        Children {
            tree: self,
            front: self.first_child[i],
            back: self.last_child[i],
        }
    }

    /// Returns the number of direct children of a layer.
    #[must_use]
    pub fn child_count(&self, id: LayerId) -> usize {
        self.children(id).count()
    }

    // -- Property API --

    /// Returns the layer payload.
    #[must_use]
    pub fn kind(&self, id: LayerId) -> &LayerKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the picture of a picture layer.
    #[must_use]
    pub fn picture(&self, id: LayerId) -> Option<&Rc<Picture>> {
        match self.kind(id) {
            LayerKind::Picture(picture) => Some(picture),
            _ => None,
        }
    }

    /// Returns the layer offset relative to its parent.
    #[must_use]
    pub fn offset(&self, id: LayerId) -> Vec2 {
        self.validate(id);
        self.offset[id.idx as usize]
    }

    /// Sets the layer offset relative to its parent.
    pub fn set_offset(&mut self, id: LayerId, offset: Vec2) {
        self.validate(id);
        self.offset[id.idx as usize] = offset;
    }

    /// Returns the layer's paint bounds in its own coordinate space.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Sets the layer's paint bounds.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
    }

    /// Returns whether the layer is owned by a render node.
    #[must_use]
    pub fn is_retained(&self, id: LayerId) -> bool {
        self.validate(id);
        self.retained[id.idx as usize]
    }

    // -- Internal helpers --

    fn allocate(&mut self, kind: LayerKind, retained: bool) -> LayerId {
        let bounds = match &kind {
            LayerKind::Picture(picture) => picture.cull_rect(),
            _ => Rect::ZERO,
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.offset[i] = Vec2::ZERO;
            self.bounds[i] = bounds;
            self.retained[i] = retained;
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
            self.kind.push(kind);
            self.offset.push(Vec2::ZERO);
            self.bounds.push(bounds);
            self.retained.push(retained);
            self.live.push(true);
            self.generation.push(0);
            idx
        };
        self.handle(idx)
    }

    fn handle(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees an unlinked slot and everything parent-owned below it.
    fn release_slot(&mut self, idx: u32) {
        self.clear_children(idx);
        let i = idx as usize;
        // Drop the payload now so pictures (and their cached images) go away
        // with the layer rather than when the slot is reused.
        self.kind[i] = LayerKind::Container;
        self.live[i] = false;
        self.generation[i] += 1;
        self.free_list.push(idx);
    }

    fn clear_children(&mut self, idx: u32) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.parent[child as usize] = INVALID;
            self.prev_sibling[child as usize] = INVALID;
            self.next_sibling[child as usize] = INVALID;
            if !self.retained[child as usize] {
                self.release_slot(child);
            }
            child = next;
        }
        self.first_child[idx as usize] = INVALID;
        self.last_child[idx as usize] = INVALID;
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerId) {
        assert!(
            self.is_alive(id),
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list.
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

/// Iterator over a layer's direct children, from [`LayerTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a LayerTree,
    front: u32,
    back: u32,
}

impl Children<'_> {
    /// Yields `idx`, closing both cursors once they have met.
    fn emit(&mut self, idx: u32) -> LayerId {
        if self.front == self.back {
            self.front = INVALID;
            self.back = INVALID;
        }
        self.tree.handle(idx)
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        let idx = self.front;
        if idx == INVALID {
            return None;
        }
        let id = self.emit(idx);
        if self.front != INVALID {
            self.front = self.tree.next_sibling[idx as usize];
        }
        Some(id)
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<LayerId> {
        let idx = self.back;
        if idx == INVALID {
            return None;
        }
        let id = self.emit(idx);
        if self.back != INVALID {
            self.back = self.tree.prev_sibling[idx as usize];
        }
        Some(id)
    }
}
