// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer variants.

use alloc::rc::Rc;

use kurbo::Affine;

use super::clip::ClipShape;
use crate::picture::{ColorFilter, Picture};

/// What a layer contributes when composited.
///
/// Every variant except [`Picture`](Self::Picture) groups an ordered list of
/// child layers.
#[derive(Clone, Debug)]
pub enum LayerKind {
    /// Groups children without any effect.
    Container,
    /// A leaf holding an immutable recorded picture.
    Picture(Rc<Picture>),
    /// Clips its children.
    Clip(ClipShape),
    /// Transforms its children (applied after the layer offset).
    Transform(Affine),
    /// Composites its children with the given opacity (255 = opaque).
    Opacity(u8),
    /// Composites its children through a color filter.
    ColorFilter(ColorFilter),
}

impl LayerKind {
    /// Returns whether layers of this kind may have children.
    #[must_use]
    pub const fn accepts_children(&self) -> bool {
        !matches!(self, Self::Picture(_))
    }

    /// Returns a short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Picture(_) => "picture",
            Self::Clip(_) => "clip",
            Self::Transform(_) => "transform",
            Self::Opacity(_) => "opacity",
            Self::ColorFilter(_) => "color-filter",
        }
    }
}
