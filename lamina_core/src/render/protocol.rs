// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout protocols: constraints, geometry and parent data.
//!
//! A protocol fixes how a parent talks to a child during layout. The set is
//! closed: [`Protocol::Box`] passes min/max extents and gets a [`Size`] back;
//! [`Protocol::Sector`] passes radial and angular extents and gets a ring
//! sector back. A node's protocol is fixed when it is created.

use core::f64::consts::TAU;

use kurbo::{Rect, Size, Vec2};

use super::error::RenderError;

/// The layout protocol a node speaks to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Rectangular layout in Cartesian coordinates.
    Box,
    /// Ring-sector layout in polar coordinates.
    Sector,
}

/// Min/max width and height for a box child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxConstraints {
    /// Minimum width.
    pub min_width: f64,
    /// Maximum width.
    pub max_width: f64,
    /// Minimum height.
    pub min_height: f64,
    /// Maximum height.
    pub max_height: f64,
}

impl BoxConstraints {
    /// Constraints that allow exactly one size.
    #[must_use]
    pub const fn tight(size: Size) -> Self {
        Self {
            min_width: size.width,
            max_width: size.width,
            min_height: size.height,
            max_height: size.height,
        }
    }

    /// Constraints that allow any size up to `size`.
    #[must_use]
    pub const fn loose(size: Size) -> Self {
        Self {
            min_width: 0.0,
            max_width: size.width,
            min_height: 0.0,
            max_height: size.height,
        }
    }

    /// Returns whether exactly one size satisfies these constraints.
    #[must_use]
    pub fn is_tight(&self) -> bool {
        self.min_width >= self.max_width && self.min_height >= self.max_height
    }

    /// Returns the size closest to `size` that satisfies these constraints.
    #[must_use]
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            size.width.clamp(self.min_width, self.max_width.max(self.min_width)),
            size.height.clamp(self.min_height, self.max_height.max(self.min_height)),
        )
    }

    /// Returns the smallest allowed size.
    #[must_use]
    pub const fn smallest(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    /// Returns the largest allowed size.
    #[must_use]
    pub const fn biggest(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }
}

/// Min/max radial thickness and angular sweep for a sector child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorConstraints {
    /// Minimum radial thickness.
    pub min_delta_radius: f64,
    /// Maximum radial thickness.
    pub max_delta_radius: f64,
    /// Minimum angular sweep in radians.
    pub min_delta_theta: f64,
    /// Maximum angular sweep in radians.
    pub max_delta_theta: f64,
}

impl SectorConstraints {
    /// Constraints that allow up to the given thickness and sweep.
    #[must_use]
    pub const fn loose(max_delta_radius: f64, max_delta_theta: f64) -> Self {
        Self {
            min_delta_radius: 0.0,
            max_delta_radius,
            min_delta_theta: 0.0,
            max_delta_theta,
        }
    }

    /// Constraints that allow exactly one thickness and sweep.
    #[must_use]
    pub const fn tight(delta_radius: f64, delta_theta: f64) -> Self {
        Self {
            min_delta_radius: delta_radius,
            max_delta_radius: delta_radius,
            min_delta_theta: delta_theta,
            max_delta_theta: delta_theta,
        }
    }

    /// Returns whether exactly one geometry satisfies these constraints.
    #[must_use]
    pub fn is_tight(&self) -> bool {
        self.min_delta_radius >= self.max_delta_radius
            && self.min_delta_theta >= self.max_delta_theta
    }

    /// Clamps a radial thickness into range.
    #[must_use]
    pub fn constrain_delta_radius(&self, delta_radius: f64) -> f64 {
        delta_radius.clamp(
            self.min_delta_radius,
            self.max_delta_radius.max(self.min_delta_radius),
        )
    }

    /// Clamps an angular sweep into range.
    #[must_use]
    pub fn constrain_delta_theta(&self, delta_theta: f64) -> f64 {
        delta_theta.clamp(
            self.min_delta_theta,
            self.max_delta_theta.max(self.min_delta_theta),
        )
    }
}

/// Constraints passed from a parent to a child during layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constraints {
    /// Box protocol constraints.
    Box(BoxConstraints),
    /// Sector protocol constraints.
    Sector(SectorConstraints),
}

impl Constraints {
    /// Returns whether exactly one geometry satisfies these constraints.
    #[must_use]
    pub fn is_tight(&self) -> bool {
        match self {
            Self::Box(c) => c.is_tight(),
            Self::Sector(c) => c.is_tight(),
        }
    }

    /// Returns the protocol these constraints belong to.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Box(_) => Protocol::Box,
            Self::Sector(_) => Protocol::Sector,
        }
    }

    /// Returns the smallest geometry that satisfies these constraints.
    #[must_use]
    pub const fn smallest(&self) -> Geometry {
        match self {
            Self::Box(c) => Geometry::Box(c.smallest()),
            Self::Sector(c) => Geometry::Sector {
                delta_radius: c.min_delta_radius,
                delta_theta: c.min_delta_theta,
            },
        }
    }
}

impl From<BoxConstraints> for Constraints {
    fn from(c: BoxConstraints) -> Self {
        Self::Box(c)
    }
}

impl From<SectorConstraints> for Constraints {
    fn from(c: SectorConstraints) -> Self {
        Self::Sector(c)
    }
}

/// The result of laying out a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// A box of the given size, anchored at its top-left corner.
    Box(Size),
    /// A ring sector.
    Sector {
        /// Radial thickness.
        delta_radius: f64,
        /// Angular sweep in radians.
        delta_theta: f64,
    },
}

impl Geometry {
    /// Returns the protocol this geometry belongs to.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Box(_) => Protocol::Box,
            Self::Sector { .. } => Protocol::Sector,
        }
    }

    /// Returns the box size, if this is box geometry.
    #[must_use]
    pub const fn size(&self) -> Option<Size> {
        match self {
            Self::Box(size) => Some(*size),
            Self::Sector { .. } => None,
        }
    }
}

/// Data a layout parent stores on each child edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParentData {
    /// Box parents position children by offset.
    Box {
        /// Offset of the child's origin in the parent's coordinates.
        offset: Vec2,
    },
    /// Sector parents position children by polar coordinates.
    Sector {
        /// Inner radius of the child sector.
        radius: f64,
        /// Start angle of the child sector in radians.
        theta: f64,
    },
}

impl ParentData {
    /// Returns the initial parent data for a child of a `protocol` parent.
    #[must_use]
    pub const fn default_for(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Box => Self::Box { offset: Vec2::ZERO },
            Protocol::Sector => Self::Sector {
                radius: 0.0,
                theta: 0.0,
            },
        }
    }

    /// Returns the protocol of the parent that owns this edge.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Box { .. } => Protocol::Box,
            Self::Sector { .. } => Protocol::Sector,
        }
    }

    /// Copies the values from `other`, which must come from the same
    /// protocol.
    pub fn merge(&mut self, other: Self) -> Result<(), RenderError> {
        if self.protocol() != other.protocol() {
            return Err(RenderError::ProtocolMismatch {
                expected: self.protocol(),
                actual: other.protocol(),
            });
        }
        *self = other;
        Ok(())
    }

    /// Resets the edge when the child is dropped by its parent.
    pub fn detach(&mut self) {
        *self = Self::default_for(self.protocol());
    }

    /// Returns the box offset, if this is box parent data.
    #[must_use]
    pub const fn offset(&self) -> Option<Vec2> {
        match self {
            Self::Box { offset } => Some(*offset),
            Self::Sector { .. } => None,
        }
    }
}

/// Returns the paint bounds of a node with the given geometry.
///
/// Box nodes paint inside their size. Sector nodes paint around the center
/// of their sector parent, so their bounds are the square enclosing the
/// outer circle of the sector.
pub(crate) fn paint_bounds(geometry: Option<Geometry>, parent_data: ParentData) -> Rect {
    match geometry {
        Some(Geometry::Box(size)) => size.to_rect(),
        Some(Geometry::Sector { delta_radius, .. }) => {
            let inner = match parent_data {
                ParentData::Sector { radius, .. } => radius,
                ParentData::Box { .. } => 0.0,
            };
            let outer = inner + delta_radius;
            Rect::new(-outer, -outer, outer, outer)
        }
        None => Rect::ZERO,
    }
}

/// A full turn, the widest sweep a sector can take.
pub const FULL_TURN: f64 = TAU;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_constraints_tightness_and_constrain() {
        let loose = BoxConstraints::loose(Size::new(100.0, 50.0));
        assert!(!loose.is_tight());
        assert_eq!(loose.constrain(Size::new(300.0, 20.0)), Size::new(100.0, 20.0));

        let tight = BoxConstraints::tight(Size::new(10.0, 10.0));
        assert!(Constraints::Box(tight).is_tight());
        assert_eq!(tight.constrain(Size::ZERO), Size::new(10.0, 10.0));
    }

    #[test]
    fn sector_constraints_clamp() {
        let c = SectorConstraints::loose(20.0, FULL_TURN);
        assert!(!c.is_tight());
        assert_eq!(c.constrain_delta_radius(30.0), 20.0);
        assert_eq!(c.constrain_delta_theta(-1.0), 0.0);
        assert!(SectorConstraints::tight(5.0, 1.0).is_tight());
    }

    #[test]
    fn parent_data_merge_checks_protocol() {
        let mut data = ParentData::default_for(Protocol::Box);
        data.merge(ParentData::Box {
            offset: Vec2::new(3.0, 4.0),
        })
        .unwrap();
        assert_eq!(data.offset(), Some(Vec2::new(3.0, 4.0)));

        let err = data
            .merge(ParentData::Sector {
                radius: 1.0,
                theta: 0.0,
            })
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::ProtocolMismatch {
                expected: Protocol::Box,
                actual: Protocol::Sector
            }
        );

        data.detach();
        assert_eq!(data, ParentData::default_for(Protocol::Box));
    }

    #[test]
    fn sector_paint_bounds_cover_outer_ring() {
        let geometry = Geometry::Sector {
            delta_radius: 10.0,
            delta_theta: 1.0,
        };
        let data = ParentData::Sector {
            radius: 5.0,
            theta: 0.0,
        };
        assert_eq!(
            paint_bounds(Some(geometry), data),
            Rect::new(-15.0, -15.0, 15.0, 15.0)
        );
    }
}
