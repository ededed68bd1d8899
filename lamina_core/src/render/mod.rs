// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render object tree and its frame pipeline.
//!
//! A [`RenderTree`] owns render nodes: a boxed [`RenderObject`] with layout
//! and paint callbacks, plus the per-node state the pipeline maintains
//! (dirty flags, constraints, geometry, parent data, relayout root and
//! layer). Nodes are addressed by generational [`NodeId`] handles.
//!
//! # Invalidation
//!
//! - **Layout** marks climb to the node's relayout root, which is queued.
//!   A node is its own relayout root when its parent does not use its size,
//!   when it is sized by its parent, or when its constraints are tight.
//! - **Paint** marks climb to the nearest node that owns a layer, which is
//!   queued.
//! - **Compositing bits** marks climb all the way up through
//!   [`understory_dirty`], since a node needs compositing when any
//!   descendant owns a layer.
//!
//! # Flushes
//!
//! Layout runs shallowest relayout root first, so a parent always lays out
//! before a child that its layout may have dirtied again. Compositing bits
//! and paint run deepest first. Each flush returns a report of what it did;
//! [`RenderTree::draw_frame`] runs all three and traces them.

mod compositing;
mod config;
mod error;
mod frame;
mod id;
mod layout;
mod object;
mod paint;
mod protocol;
mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use compositing::CompositingReport;
pub use config::PipelineConfig;
pub use error::{FailurePhase, RenderError, RenderFailure};
pub use frame::FrameReport;
pub use id::NodeId;
pub use layout::{LayoutCx, LayoutReport};
pub use object::RenderObject;
pub use paint::PaintReport;
pub use protocol::{
    BoxConstraints, Constraints, FULL_TURN, Geometry, ParentData, Protocol, SectorConstraints,
};
pub use tree::{PipelineQueues, RenderTree};
