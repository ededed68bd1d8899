// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing layer tree.
//!
//! A *layer* is a node in the tree handed to the compositor each frame. Each
//! layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that becomes stale when
//!   the layer is released.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   Children are composited in the order they were appended.
//! - An offset relative to its parent, paint bounds, and a [`LayerKind`]
//!   payload (container, picture, clip, transform, opacity, color filter).
//! - An ownership mode. Ordinary layers are owned by their parent layer and
//!   are released with it. *Retained* containers are owned by a render node;
//!   clearing or releasing their parent only detaches them, so the owner can
//!   re-append them in a later frame without re-recording their content.
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.

mod clip;
mod id;
mod kind;
mod store;

pub use clip::ClipShape;
pub use id::{INVALID, LayerId};
pub use kind::LayerKind;
pub use store::{Children, LayerTree};
