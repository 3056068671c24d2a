// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounds with an explicit empty state.

use kurbo::{Affine, Point, Rect};

use crate::util::transform_rect_bbox;

/// An axis-aligned rectangle in some coordinate space, or nothing at all.
///
/// Unlike a zero-sized [`Rect`], [`Bounds::EMPTY`] is the identity of
/// [`Bounds::union`]: a group with no content of its own does not drag its
/// full bounds toward its origin. A zero-sized rectangle is *not* empty; it
/// still has a position and intersects anything touching it.
///
/// ```rust
/// use kurbo::Rect;
/// use understory_scene_graph::Bounds;
///
/// let a = Bounds::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
/// assert_eq!(a.union(Bounds::EMPTY), a);
/// assert!(a.intersect(Bounds::from_rect(Rect::new(20.0, 20.0, 30.0, 30.0))).is_empty());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds(Option<Rect>);

impl Bounds {
    /// Bounds that contain nothing.
    pub const EMPTY: Self = Self(None);

    /// Bounds from an origin and a size.
    ///
    /// A negative width or height yields [`Bounds::EMPTY`].
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_rect(Rect::new(x, y, x + width, y + height))
    }

    /// Bounds covering `rect`.
    ///
    /// An inverted rectangle (`x1 < x0` or `y1 < y0`) yields [`Bounds::EMPTY`].
    /// Non-finite coordinates are kept so that setters can reject them.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        if rect.x1 < rect.x0 || rect.y1 < rect.y0 {
            Self::EMPTY
        } else {
            Self(Some(rect))
        }
    }

    /// Returns `true` for [`Bounds::EMPTY`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The covered rectangle, or `None` when empty.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.0
    }

    /// Returns `true` if every coordinate is finite. Empty bounds are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.is_none_or(|r| r.is_finite())
    }

    /// Smallest bounds containing both operands.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Self(Some(a.union(b))),
            (Some(_), None) => self,
            (None, _) => other,
        }
    }

    /// Overlap of both operands; empty when they do not touch.
    ///
    /// Touching edges produce a zero-sized, non-empty result.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) if overlaps(a, b) => Self(Some(Rect::new(
                a.x0.max(b.x0),
                a.y0.max(b.y0),
                a.x1.min(b.x1),
                a.y1.min(b.y1),
            ))),
            _ => Self::EMPTY,
        }
    }

    /// Returns `true` if both operands are non-empty and overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: Self) -> bool {
        match (self.0, other.0) {
            (Some(a), Some(b)) => overlaps(a, b),
            _ => false,
        }
    }

    /// Returns `true` if `point` lies inside or on the edge of the bounds.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.0.is_some_and(|r| {
            point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1
        })
    }

    /// Conservative axis-aligned bounds of these bounds mapped through `affine`.
    #[must_use]
    pub fn transformed(self, affine: Affine) -> Self {
        Self(self.0.map(|r| transform_rect_bbox(affine, r)))
    }

    /// Bounds grown by `amount` on every side. Empty bounds stay empty.
    #[must_use]
    pub fn inflate(self, amount: f64) -> Self {
        match self.0 {
            Some(r) => Self::from_rect(Rect::new(
                r.x0 - amount,
                r.y0 - amount,
                r.x1 + amount,
                r.y1 + amount,
            )),
            None => Self::EMPTY,
        }
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl From<Option<Rect>> for Bounds {
    fn from(rect: Option<Rect>) -> Self {
        rect.map_or(Self::EMPTY, Self::from_rect)
    }
}

#[inline]
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
