// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The render tree tracks compositing-bit invalidation with
//! [`understory_dirty`]. Every adopted child adds a dependency edge from its
//! parent to itself on [`COMPOSITING`], so marking a node with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) also marks every ancestor:
//! whether a node needs compositing depends on all of its descendants.
//!
//! Layout and paint invalidation do not use the tracker. They follow
//! relayout roots and layer owners, which stop propagation part-way up the
//! tree, and are queued in [`PipelineQueues`](crate::render::PipelineQueues).
//!
//! # Consumption
//!
//! [`RenderTree::flush_compositing_bits`](crate::render::RenderTree::flush_compositing_bits)
//! drains the channel once per frame and recomputes the affected nodes
//! bottom-up.

use understory_dirty::Channel;

/// A child was adopted or dropped below the node, or a descendant's
/// compositing requirement may have changed.
pub const COMPOSITING: Channel = Channel::new(0);
