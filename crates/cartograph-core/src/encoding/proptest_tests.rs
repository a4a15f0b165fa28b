//! Property-based tests for the numeric encodings and coordinate codec.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use crate::coords;
use crate::encoding::source::SliceSource;
use crate::encoding::varint;
use crate::types::{PointD, PointU};

/// Strategy for points inside the projection square.
fn arb_point() -> impl Strategy<Value = PointD> {
    let bound = coords::PROJECTION_BOUND;
    (-bound..=bound, -bound..=bound).prop_map(|(x, y)| PointD::new(x, y))
}

fn arb_cell() -> impl Strategy<Value = PointU> {
    (any::<u32>(), any::<u32>()).prop_map(|(x, y)| PointU::new(x, y))
}

proptest! {
    #[test]
    fn var_u64_roundtrip(value in any::<u64>()) {
        let mut buf = Vec::new();
        varint::write_var_u64(&mut buf, value);
        let decoded = varint::read_var_u64(&mut SliceSource::new(&buf))
            .expect("decoding should succeed");
        prop_assert_eq!(value, decoded);
    }

    #[test]
    fn var_i64_roundtrip(value in any::<i64>()) {
        let mut buf = Vec::new();
        varint::write_var_i64(&mut buf, value);
        let decoded = varint::read_var_i64(&mut SliceSource::new(&buf))
            .expect("decoding should succeed");
        prop_assert_eq!(value, decoded);
    }

    #[test]
    fn var_u32_array_roundtrip(values in prop::collection::vec(any::<u32>(), 0..32)) {
        let mut buf = Vec::new();
        varint::write_var_u32_array(&mut buf, &values);
        let decoded = varint::read_var_u32_array(&mut SliceSource::new(&buf), values.len())
            .expect("decoding should succeed");
        prop_assert_eq!(values, decoded);
    }

    /// Corrupted or arbitrary bytes must error, never panic.
    #[test]
    fn arbitrary_bytes_dont_crash(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = varint::read_var_u64(&mut SliceSource::new(&bytes));
        let _ = varint::read_var_i32(&mut SliceSource::new(&bytes));
        let _ = varint::read_var_u32_array(&mut SliceSource::new(&bytes), 16);
    }

    #[test]
    fn morton_interleave_is_a_bijection(cell in arb_cell()) {
        prop_assert_eq!(coords::deinterleave(coords::interleave(cell)), cell);
    }

    #[test]
    fn delta_encoding_is_a_bijection(cell in arb_cell(), base in arb_cell()) {
        let delta = coords::encode_delta(cell, base);
        prop_assert_eq!(coords::decode_delta(delta, base), cell);
    }

    #[test]
    fn point_roundtrip_stays_within_one_cell(p in arb_point()) {
        let back = coords::u64_to_point(coords::point_to_u64(p));
        prop_assert!(coords::points_equal(p, back));
    }

    /// Quantization is idempotent: re-encoding a decoded point changes
    /// nothing.
    #[test]
    fn requantization_is_stable(p in arb_point()) {
        let code = coords::point_to_u64(p);
        let decoded = coords::u64_to_point(code);
        prop_assert_eq!(coords::point_to_u64(decoded), code);
    }
}
