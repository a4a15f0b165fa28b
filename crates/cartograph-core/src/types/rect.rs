//! Axis-aligned limit rectangles.

use serde::{Deserialize, Serialize};

use super::PointD;

/// An axis-aligned bounding rectangle in projected space.
///
/// A freshly created rectangle is *empty* (inverted bounds); extending it
/// with points grows it to the bounding box of everything added so far.
///
/// # Example
///
/// ```
/// use cartograph_core::types::{PointD, RectD};
///
/// let mut rect = RectD::empty();
/// rect.extend(PointD::new(1.0, 5.0));
/// rect.extend(PointD::new(-2.0, 3.0));
/// assert_eq!(rect.min_x, -2.0);
/// assert_eq!(rect.max_y, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectD {
    /// Minimum x bound.
    pub min_x: f64,
    /// Minimum y bound.
    pub min_y: f64,
    /// Maximum x bound.
    pub max_x: f64,
    /// Maximum y bound.
    pub max_y: f64,
}

impl RectD {
    /// The rectangle with zero extents at the origin.
    pub const ZERO: Self = Self { min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0 };

    /// Create an empty rectangle that any point will extend.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Create a rectangle from explicit bounds.
    #[inline]
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Returns `true` if no point has been added yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow the rectangle to include `p`.
    #[inline]
    pub fn extend(&mut self, p: PointD) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Grow the rectangle to include every point in `points`.
    #[inline]
    pub fn extend_all<'a>(&mut self, points: impl IntoIterator<Item = &'a PointD>) {
        for p in points {
            self.extend(*p);
        }
    }
}

impl Default for RectD {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_rect_is_empty() {
        assert!(RectD::empty().is_empty());
        assert!(!RectD::ZERO.is_empty());
    }

    #[test]
    fn extend_grows_bounds() {
        let mut rect = RectD::empty();
        rect.extend(PointD::new(2.0, -1.0));
        assert!(!rect.is_empty());
        assert_eq!(rect, RectD::new(2.0, -1.0, 2.0, -1.0));

        rect.extend(PointD::new(-3.0, 4.0));
        assert_eq!(rect, RectD::new(-3.0, -1.0, 2.0, 4.0));
    }

    #[test]
    fn extend_all_matches_repeated_extend() {
        let points = [PointD::new(0.0, 0.0), PointD::new(10.0, 10.0), PointD::new(5.0, -5.0)];
        let mut a = RectD::empty();
        a.extend_all(&points);
        let mut b = RectD::empty();
        for p in &points {
            b.extend(*p);
        }
        assert_eq!(a, b);
    }
}
