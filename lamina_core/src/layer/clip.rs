// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shapes carried by clip layers.

use kurbo::{BezPath, Rect, RoundedRect, Shape};

use crate::picture::Canvas;

/// A shape used to clip a layer's descendants.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// An arbitrary path.
    Path(BezPath),
}

impl ClipShape {
    /// Intersects the canvas clip with this shape.
    pub fn apply(&self, canvas: &mut dyn Canvas) {
        match self {
            Self::Rect(rect) => canvas.clip_rect(*rect),
            Self::RoundedRect(rect) => canvas.clip_rounded_rect(*rect),
            Self::Path(path) => canvas.clip_path(path),
        }
    }

    /// Returns the smallest rectangle containing the shape.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(rect) => *rect,
            Self::RoundedRect(rect) => rect.rect(),
            Self::Path(path) => path.bounding_box(),
        }
    }
}
