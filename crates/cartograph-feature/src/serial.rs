//! Wire codecs for geometry runs.
//!
//! All geometry is written as Morton-delta varints: each point is quantized,
//! interleaved, and delta-encoded against its predecessor, with the run's
//! base point standing in as predecessor for the first point. Two framings
//! share that core:
//!
//! - the **outer** form prefixes `var_uint(count)` and is used for Stage-1
//!   geometry and the container's per-scale streams;
//! - the **inner** form carries no count (it travels in the feature's packed
//!   header) and is used for inline geometry.
//!
//! Triangle strips reuse the point-run encoding; a strip of `N` points
//! stands for `N - 2` triangles read through a sliding three-point window.
//!
//! This layout is a wire contract shared with the container build pipeline;
//! every byte here is load-bearing.

use cartograph_core::coords;
use cartograph_core::encoding::source::ByteSource;
use cartograph_core::encoding::varint;
use cartograph_core::error::EncodingError;
use cartograph_core::types::PointD;

use crate::container::SCALES_COUNT;
use crate::error::{FeatureError, FeatureResult};

/// Offset value marking a scale with no outer geometry.
pub const INVALID_OFFSET: u32 = u32::MAX;

/// Upper bound on a geometry run length accepted from the wire.
///
/// Generous for any real feature while keeping a corrupt count from driving
/// a huge allocation.
const MAX_RUN_LEN: u64 = 1 << 24;

/// Write a run of points as Morton deltas starting from `base`.
fn save_points(points: &[PointD], base: u64, sink: &mut Vec<u8>) {
    let mut prev = coords::deinterleave(base);
    for &p in points {
        let cell = coords::point_to_cell(p);
        varint::write_var_u64(sink, coords::encode_delta(cell, prev));
        prev = cell;
    }
}

/// Read a run of `count` points written by [`save_points`].
fn load_points<S: ByteSource + ?Sized>(
    src: &mut S,
    count: usize,
    base: u64,
) -> Result<Vec<PointD>, EncodingError> {
    let mut prev = coords::deinterleave(base);
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let delta = varint::read_var_u64(src)?;
        prev = coords::decode_delta(delta, prev);
        points.push(coords::cell_to_point(prev));
    }
    Ok(points)
}

/// Write a count-prefixed path.
pub fn save_outer_path(points: &[PointD], base: u64, sink: &mut Vec<u8>) {
    varint::write_var_u64(sink, points.len() as u64);
    save_points(points, base, sink);
}

/// Read a count-prefixed path.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] on a truncated or oversized run, or
/// [`FeatureError::Container`] if the source's backing stream fails.
pub fn load_outer_path<S: ByteSource + ?Sized>(
    src: &mut S,
    base: u64,
) -> FeatureResult<Vec<PointD>> {
    let count = varint::read_var_u64(src)?;
    if count > MAX_RUN_LEN {
        return Err(FeatureError::Malformed(format!("geometry run of {count} points")));
    }
    Ok(load_points(src, count as usize, base)?)
}

/// Write an inline path; the count travels in the feature header.
#[inline]
pub fn save_inner_path(points: &[PointD], base: u64, sink: &mut Vec<u8>) {
    save_points(points, base, sink);
}

/// Read an inline path of `count` points.
///
/// # Errors
///
/// Same conditions as [`load_outer_path`].
#[inline]
pub fn load_inner_path<S: ByteSource + ?Sized>(
    src: &mut S,
    count: usize,
    base: u64,
) -> FeatureResult<Vec<PointD>> {
    Ok(load_points(src, count, base)?)
}

/// Write an inline triangle strip; the triangle count travels in the
/// feature header.
#[inline]
pub fn save_inner_triangles(strip: &[PointD], base: u64, sink: &mut Vec<u8>) {
    save_points(strip, base, sink);
}

/// Read an inline triangle strip of `count` points.
///
/// # Errors
///
/// Same conditions as [`load_outer_path`].
#[inline]
pub fn load_inner_triangles<S: ByteSource + ?Sized>(
    src: &mut S,
    count: usize,
    base: u64,
) -> FeatureResult<Vec<PointD>> {
    Ok(load_points(src, count, base)?)
}

/// Read an outer triangle stream and expand the strip to a triangle list.
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] if the strip holds fewer than three
/// points, otherwise the same conditions as [`load_outer_path`].
pub fn load_outer_triangles<S: ByteSource + ?Sized>(
    src: &mut S,
    base: u64,
) -> FeatureResult<Vec<PointD>> {
    let strip = load_outer_path(src, base)?;
    if strip.len() < 3 {
        return Err(FeatureError::Malformed(format!(
            "triangle strip of {} points",
            strip.len()
        )));
    }
    Ok(strip_to_triangles(&strip))
}

/// Expand a triangle strip into a flat triangle list, three points per
/// triangle.
#[must_use]
pub fn strip_to_triangles(strip: &[PointD]) -> Vec<PointD> {
    let mut triangles = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for window in strip.windows(3) {
        triangles.extend_from_slice(window);
    }
    triangles
}

/// Write the valid outer-geometry offsets in ascending scale order.
///
/// `offsets` must already be reversed out of the simplifier's
/// highest-detail-first push order.
pub fn write_offsets(offsets: &[u32], sink: &mut Vec<u8>) {
    varint::write_var_u32_array(sink, offsets);
}

/// Read the offset array written by [`write_offsets`] and spread it over the
/// scales named by `mask`.
///
/// Bit `i` of `mask` marks scale index `i` as present; present scales take
/// the array values in ascending order, absent scales get
/// [`INVALID_OFFSET`].
///
/// # Errors
///
/// Returns [`FeatureError::Malformed`] if the array length disagrees with
/// the mask's population count.
pub fn read_offsets<S: ByteSource + ?Sized>(
    src: &mut S,
    mask: u8,
) -> FeatureResult<[u32; SCALES_COUNT]> {
    let values = varint::read_var_u32_array(src, SCALES_COUNT)?;
    if values.len() != mask.count_ones() as usize {
        return Err(FeatureError::Malformed(format!(
            "{} offsets for presence mask {mask:#06b}",
            values.len()
        )));
    }

    let mut offsets = [INVALID_OFFSET; SCALES_COUNT];
    let mut next = values.into_iter();
    for (index, slot) in offsets.iter_mut().enumerate() {
        if mask & (1 << index) != 0 {
            // Length was checked against the mask above.
            *slot = next.next().unwrap_or(INVALID_OFFSET);
        }
    }
    Ok(offsets)
}
