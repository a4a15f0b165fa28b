//! The shared base-block codec.
//!
//! Builder and reader do not share a type; they share this module. Each
//! function writes or reads one slot of the base block, in wire order:
//!
//! ```text
//! [1 byte]  common header
//! [*     ]  types              var_uint x types_count
//! [*     ]  layer              var_int, iff HAS_LAYER
//! [* + * ]  name               var_uint(len - 1) + raw bytes, iff HAS_NAME
//! [*     ]  center             var_uint(morton delta vs base), iff HAS_POINT
//! ```
//!
//! The name length is stored minus one: an empty name is expressed by the
//! absent flag, so a stored length always means at least one byte.

use cartograph_core::coords;
use cartograph_core::encoding::source::{ByteSource, SliceSource};
use cartograph_core::encoding::varint;
use cartograph_core::types::{PointD, PointU};

use crate::error::{FeatureError, FeatureResult};

/// Write the type classifiers in insertion order.
pub fn write_types(sink: &mut Vec<u8>, types: &[u32]) {
    for &t in types {
        varint::write_var_u32(sink, t);
    }
}

/// Read `count` type classifiers.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] on truncated input.
pub fn read_types<S: ByteSource + ?Sized>(src: &mut S, count: u8) -> FeatureResult<Vec<u32>> {
    let mut types = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        types.push(varint::read_var_u32(src)?);
    }
    Ok(types)
}

/// Write a non-zero layer.
#[inline]
pub fn write_layer(sink: &mut Vec<u8>, layer: i32) {
    varint::write_var_i32(sink, layer);
}

/// Read a layer.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] on truncated input.
#[inline]
pub fn read_layer<S: ByteSource + ?Sized>(src: &mut S) -> FeatureResult<i32> {
    Ok(varint::read_var_i32(src)?)
}

/// Write a non-empty name.
pub fn write_name(sink: &mut Vec<u8>, name: &str) {
    debug_assert!(!name.is_empty(), "empty names travel as an absent flag");
    varint::write_var_u64(sink, name.len() as u64 - 1);
    sink.extend_from_slice(name.as_bytes());
}

/// Read a name.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] if the length overflows, runs past
/// the buffer, or the bytes are not UTF-8.
pub fn read_name(src: &mut SliceSource<'_>) -> FeatureResult<String> {
    let len = varint::read_var_u64(src)?;
    let len = usize::try_from(len)
        .ok()
        .and_then(|l| l.checked_add(1))
        .filter(|&l| l <= src.remaining())
        .ok_or_else(|| FeatureError::Malformed("name length past end of buffer".to_owned()))?;
    let bytes = src.take(len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|err| FeatureError::Malformed(format!("name is not UTF-8: {err}")))
}

/// Write the center point as a Morton delta against `base`.
#[inline]
pub fn write_center(sink: &mut Vec<u8>, center: PointD, base: PointU) {
    let cell = coords::point_to_cell(center);
    varint::write_var_u64(sink, coords::encode_delta(cell, base));
}

/// Read the center point delta-encoded against `base`.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] on truncated input.
pub fn read_center<S: ByteSource + ?Sized>(src: &mut S, base: PointU) -> FeatureResult<PointD> {
    let delta = varint::read_var_u64(src)?;
    Ok(coords::cell_to_point(coords::decode_delta(delta, base)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_roundtrip() {
        let types = [100u32, 2, 7_000_000];
        let mut buf = Vec::new();
        write_types(&mut buf, &types);
        let decoded = read_types(&mut SliceSource::new(&buf), 3).unwrap();
        assert_eq!(decoded, types);
    }

    #[test]
    fn name_roundtrip_stores_length_minus_one() {
        let mut buf = Vec::new();
        write_name(&mut buf, "Caf\u{e9}");
        // "Café" is five bytes in UTF-8; the stored length is four.
        assert_eq!(buf[0], 4);
        let decoded = read_name(&mut SliceSource::new(&buf)).unwrap();
        assert_eq!(decoded, "Caf\u{e9}");
    }

    #[test]
    fn name_length_past_buffer_is_malformed() {
        let buf = [10u8, b'a', b'b', b'c'];
        assert!(matches!(
            read_name(&mut SliceSource::new(&buf)),
            Err(FeatureError::Malformed(_))
        ));
    }

    #[test]
    fn name_length_overflow_is_malformed() {
        // A length varint of u64::MAX must not wrap when incremented.
        let mut buf = Vec::new();
        varint::write_var_u64(&mut buf, u64::MAX);
        buf.push(b'a');
        assert!(matches!(
            read_name(&mut SliceSource::new(&buf)),
            Err(FeatureError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_utf8_name_is_malformed() {
        let buf = [1u8, 0xff, 0xfe];
        assert!(matches!(
            read_name(&mut SliceSource::new(&buf)),
            Err(FeatureError::Malformed(_))
        ));
    }

    #[test]
    fn center_roundtrip() {
        let base = coords::point_to_cell(PointD::new(10.0, 20.0));
        let center = PointD::new(10.001, 19.999);
        let mut buf = Vec::new();
        write_center(&mut buf, center, base);
        let decoded = read_center(&mut SliceSource::new(&buf), base).unwrap();
        assert!(coords::points_equal(center, decoded));
    }
}
