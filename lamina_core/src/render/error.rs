// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render callback errors and per-node failure records.

use alloc::string::String;

use super::id::NodeId;
use super::protocol::Protocol;

/// An error returned by a [`RenderObject`](super::RenderObject) callback.
///
/// Errors are isolated to the node that produced them: the pipeline records a
/// [`RenderFailure`], gives the node a placeholder and carries on with the
/// rest of the frame.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Constraints, geometry or parent data of the wrong protocol were used.
    #[error("expected {expected:?} protocol, got {actual:?}")]
    ProtocolMismatch {
        /// The protocol the receiver speaks.
        expected: Protocol,
        /// The protocol that was supplied.
        actual: Protocol,
    },
    /// A node that is not sized by its parent returned from layout without
    /// setting its geometry.
    #[error("layout finished without setting geometry")]
    GeometryNotSet,
    /// A child was still dirty when its parent finished layout.
    #[error("child {0:?} was not laid out by its parent")]
    ChildNotLaidOut(NodeId),
    /// A callback gave up.
    #[error("{0}")]
    Failed(String),
}

/// The callback a [`RenderFailure`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailurePhase {
    /// [`RenderObject::perform_resize`](super::RenderObject::perform_resize).
    Resize,
    /// [`RenderObject::perform_layout`](super::RenderObject::perform_layout).
    Layout,
    /// [`RenderObject::paint`](super::RenderObject::paint).
    Paint,
}

/// A render callback failure, with enough context to find the node.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFailure {
    /// The failing node.
    pub node: NodeId,
    /// The node's debug name.
    pub name: &'static str,
    /// The node's depth in the render tree.
    pub depth: u32,
    /// Which callback failed.
    pub phase: FailurePhase,
    /// The error the callback returned.
    pub error: RenderError,
}

impl RenderFailure {
    pub(crate) fn log(&self) {
        log::error!(
            "{:?} failed for {} {:?} at depth {}: {}",
            self.phase,
            self.name,
            self.node,
            self.depth,
            self.error
        );
    }
}
