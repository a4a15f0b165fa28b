//! Property-based tests for the Stage-1 round trip.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use cartograph_core::coords::PROJECTION_BOUND;
use cartograph_core::types::PointD;

use crate::builder::{FeatureBuilder, LAYER_BOUND};
use crate::header::MAX_TYPES;

fn arb_point() -> impl Strategy<Value = PointD> {
    let bound = PROJECTION_BOUND;
    (-bound..=bound, -bound..=bound).prop_map(|(x, y)| PointD::new(x, y))
}

/// Strategy for builders that satisfy every structural invariant.
fn arb_builder() -> impl Strategy<Value = FeatureBuilder> {
    let types = prop::collection::vec(any::<u32>(), 1..=MAX_TYPES);
    let layer = -LAYER_BOUND..=LAYER_BOUND;
    let name = prop::option::of("[a-zA-Z0-9 \u{e0}-\u{ff}]{1,40}");
    let center = prop::option::of(arb_point());
    let line = prop::option::of(prop::collection::vec(arb_point(), 2..20));
    let area = prop::option::of(prop::collection::vec(arb_point(), 3..20));

    (types, layer, name, center, line, area).prop_filter_map(
        "feature needs at least one kind",
        |(types, layer, name, center, line, area)| {
            if center.is_none() && line.is_none() && area.is_none() {
                return None;
            }
            let mut fb = FeatureBuilder::new();
            fb.add_types(types);
            fb.set_layer(layer);
            if let Some(name) = name {
                fb.set_name(name);
            }
            if let Some(center) = center {
                fb.set_center(center);
            }
            match (line, area) {
                (Some(points), _) => {
                    for p in points {
                        fb.add_point(p);
                    }
                    fb.set_linear();
                }
                (None, Some(points)) => {
                    for p in points {
                        fb.add_point(p);
                    }
                    fb.set_area();
                }
                (None, None) => {}
            }
            Some(fb)
        },
    )
}

proptest! {
    /// Stage-1 round trip preserves every builder up to the quantization
    /// epsilon.
    #[test]
    fn stage1_roundtrip(fb in arb_builder()) {
        let bytes = fb.serialize().expect("valid builder must serialize");
        let back = FeatureBuilder::deserialize(&bytes).expect("own output must deserialize");
        prop_assert!(fb.equals(&back));
    }

    /// Serializing the round-tripped builder reproduces the exact bytes.
    #[test]
    fn stage1_reserialization_is_stable(fb in arb_builder()) {
        let bytes = fb.serialize().expect("valid builder must serialize");
        let back = FeatureBuilder::deserialize(&bytes).expect("own output must deserialize");
        let bytes_again = back.serialize().expect("round-tripped builder must serialize");
        prop_assert_eq!(bytes, bytes_again);
    }

    /// Arbitrary bytes must error or decode, never panic.
    #[test]
    fn arbitrary_bytes_dont_crash(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = FeatureBuilder::deserialize(&bytes);
    }

    /// Truncating a valid encoding must error or decode, never panic.
    #[test]
    fn truncated_encoding_doesnt_crash(fb in arb_builder()) {
        let bytes = fb.serialize().expect("valid builder must serialize");
        for cut in 0..bytes.len() {
            let _ = FeatureBuilder::deserialize(&bytes[..cut]);
        }
    }
}
