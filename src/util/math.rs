//! Math type re-exports and bounding ranges.
//!
//! This module re-exports types from `glam` and provides the double
//! precision axis-aligned [`BoundingRange`] used by bound queries.

// Re-export glam types
pub use glam::{
    // Double precision vectors
    DVec3,
    // Double precision matrices
    DMat4,
    // Quaternions (orient ops)
    DQuat,
};

use serde::Serialize;
use std::fmt;

/// Axis-aligned 3D range with double precision.
#[derive(Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRange {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingRange {
    /// Empty range (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a new range from min and max points.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create a range from a single point.
    #[inline]
    pub fn from_point(p: DVec3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest range enclosing all points. Empty for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut r = Self::EMPTY;
        for p in points {
            r.expand_by_point(p);
        }
        r
    }

    /// Check if this range is empty (has no volume and no point).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True when every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Expand this range to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this range to include another range.
    #[inline]
    pub fn expand_by_box(&mut self, other: &Self) {
        if !other.is_empty() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Grow the range by `amount` on every side.
    #[inline]
    pub fn padded(&self, amount: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: self.min - DVec3::splat(amount),
            max: self.max + DVec3::splat(amount),
        }
    }

    /// Get the center of the range.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the range.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// The 8 corners in binary order (bit 0 = x, bit 1 = y, bit 2 = z).
    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| {
            DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Aligned range of this box after an affine transform.
    ///
    /// The transformed box may be oriented; the result is the axis-aligned
    /// range of its 8 transformed corners.
    pub fn transformed(&self, m: &DMat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(self.corners().into_iter().map(|c| m.transform_point3(c)))
    }

    /// `[min, max]` as plain arrays.
    pub fn to_array(&self) -> [[f64; 3]; 2] {
        [self.min.to_array(), self.max.to_array()]
    }
}

impl Default for BoundingRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BoundingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingRange({:?} - {:?})", self.min, self.max)
    }
}
