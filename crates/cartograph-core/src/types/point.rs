//! Point types in projected and quantized space.

use serde::{Deserialize, Serialize};

/// A point in projected map space.
///
/// Both axes live in the projection bound of
/// [`coords::PROJECTION_BOUND`](crate::coords::PROJECTION_BOUND); values
/// outside are clamped on quantization, never rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointD {
    /// Projected x coordinate.
    pub x: f64,
    /// Projected y coordinate.
    pub y: f64,
}

impl PointD {
    /// Create a new projected point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point on the quantized `2^32 × 2^32` coordinate grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointU {
    /// Grid x coordinate.
    pub x: u32,
    /// Grid y coordinate.
    pub y: u32,
}

impl PointU {
    /// The origin cell, used as the base point for self-contained encodings.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new grid point.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PointD {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}
