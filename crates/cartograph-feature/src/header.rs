//! The common header byte.
//!
//! Every serialized feature opens with a single self-describing byte:
//!
//! | bits | meaning |
//! |------|---------------------------------|
//! | 0..2 | number of types (1..=[`MAX_TYPES`], 0 is invalid) |
//! | 3    | feature has a name              |
//! | 4    | feature has a non-zero layer    |
//! | 5    | feature has a center point      |
//! | 6    | feature has line geometry       |
//! | 7    | feature has area geometry       |
//!
//! The kind bits are non-exclusive; a feature may be a point and a line at
//! once. Changing [`MAX_TYPES`] is a wire-format break: writer and reader
//! must agree on it.

use crate::error::{FeatureError, FeatureResult};

/// Maximum number of type classifiers a feature may carry.
///
/// Bounded by the three count bits in the common header.
pub const MAX_TYPES: usize = 7;

const TYPES_COUNT_MASK: u8 = 0b0000_0111;
const HAS_NAME: u8 = 1 << 3;
const HAS_LAYER: u8 = 1 << 4;
const HAS_POINT: u8 = 1 << 5;
const IS_LINE: u8 = 1 << 6;
const IS_AREA: u8 = 1 << 7;

/// The geometric kind of a feature, with area taking precedence over line
/// and line over point when several kind bits are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// A point of interest with only a center.
    Point,
    /// A polyline.
    Line,
    /// A polygon, possibly with holes.
    Area,
}

/// Decoded form of the common header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader {
    /// Number of type classifiers, `1..=MAX_TYPES`.
    pub types_count: u8,
    /// The feature carries a name.
    pub has_name: bool,
    /// The feature carries a non-zero layer.
    pub has_layer: bool,
    /// The feature carries a center point.
    pub has_point: bool,
    /// The feature carries line geometry.
    pub is_line: bool,
    /// The feature carries area geometry.
    pub is_area: bool,
}

impl CommonHeader {
    /// Pack into the wire byte.
    #[must_use]
    pub fn pack(&self) -> u8 {
        debug_assert!(
            (1..=MAX_TYPES as u8).contains(&self.types_count),
            "types count {} out of range",
            self.types_count
        );
        let mut byte = self.types_count & TYPES_COUNT_MASK;
        if self.has_name {
            byte |= HAS_NAME;
        }
        if self.has_layer {
            byte |= HAS_LAYER;
        }
        if self.has_point {
            byte |= HAS_POINT;
        }
        if self.is_line {
            byte |= IS_LINE;
        }
        if self.is_area {
            byte |= IS_AREA;
        }
        byte
    }

    /// Unpack a wire byte.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] if the types count is zero.
    pub fn unpack(byte: u8) -> FeatureResult<Self> {
        let types_count = byte & TYPES_COUNT_MASK;
        if types_count == 0 {
            return Err(FeatureError::Malformed("header with zero types".to_owned()));
        }
        Ok(Self {
            types_count,
            has_name: byte & HAS_NAME != 0,
            has_layer: byte & HAS_LAYER != 0,
            has_point: byte & HAS_POINT != 0,
            is_line: byte & IS_LINE != 0,
            is_area: byte & IS_AREA != 0,
        })
    }

    /// The feature's kind, area > line > point.
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        if self.is_area {
            FeatureKind::Area
        } else if self.is_line {
            FeatureKind::Line
        } else {
            FeatureKind::Point
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_bijection() {
        for count in 1..=MAX_TYPES as u8 {
            for bits in 0u8..32 {
                let header = CommonHeader {
                    types_count: count,
                    has_name: bits & 1 != 0,
                    has_layer: bits & 2 != 0,
                    has_point: bits & 4 != 0,
                    is_line: bits & 8 != 0,
                    is_area: bits & 16 != 0,
                };
                assert_eq!(CommonHeader::unpack(header.pack()).unwrap(), header);
            }
        }
    }

    #[test]
    fn named_poi_header_byte() {
        // One type, a name, and a center point.
        let header = CommonHeader {
            types_count: 1,
            has_name: true,
            has_layer: false,
            has_point: true,
            is_line: false,
            is_area: false,
        };
        assert_eq!(header.pack(), 0b0010_1001);
    }

    #[test]
    fn zero_types_is_malformed() {
        assert!(matches!(CommonHeader::unpack(0b0010_1000), Err(FeatureError::Malformed(_))));
    }

    #[test]
    fn kind_precedence() {
        let mut header = CommonHeader::unpack(0b0010_0001).unwrap();
        assert_eq!(header.kind(), FeatureKind::Point);
        header.is_line = true;
        assert_eq!(header.kind(), FeatureKind::Line);
        header.is_area = true;
        assert_eq!(header.kind(), FeatureKind::Area);
    }
}
