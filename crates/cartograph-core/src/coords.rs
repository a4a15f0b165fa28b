//! Coordinate quantization, Morton interleave, and delta encoding.
//!
//! Projected coordinates are mapped onto a `2^32 × 2^32` unsigned grid and
//! the two axes are interleaved bit-by-bit onto a single `u64` Morton code.
//! Small spatial displacements then produce small code deltas, which keeps
//! the varint encoding of delta-coded geometry compact.
//!
//! # Pipeline
//!
//! ```text
//! PointD ──quantize──▶ PointU ──interleave──▶ u64 ──delta vs base──▶ varint
//! ```
//!
//! Quantization is lossy by design: a round trip lands within one grid cell
//! ([`CELL_EPSILON`]) of the clamped input, and nothing finer than a cell is
//! observable after decoding. Out-of-bound inputs are clamped to the
//! projection square, never rejected; persisted data relies on this.
//!
//! Deltas are *zig-zag-free*: each axis is subtracted with wrapping `u32`
//! arithmetic and the wrapped differences are interleaved again, so the
//! transform is a bijection on the grid regardless of delta sign.

use crate::types::{PointD, PointU};

/// Bits per quantized axis.
pub const CELL_BITS: u32 = 32;

/// Half-extent of the projection square; both axes live in
/// `[-PROJECTION_BOUND, PROJECTION_BOUND]`.
pub const PROJECTION_BOUND: f64 = 180.0;

/// Highest cell index per axis.
const CELL_MAX: f64 = u32::MAX as f64;

/// The size of one quantization cell.
///
/// This is the absolute epsilon for coordinate equality: positions closer
/// than one cell are indistinguishable after a round trip.
pub const CELL_EPSILON: f64 = 2.0 * PROJECTION_BOUND / CELL_MAX;

/// Quantize one axis, clamping to the projection bound.
#[inline]
fn quantize_axis(v: f64) -> u32 {
    let clamped = v.clamp(-PROJECTION_BOUND, PROJECTION_BOUND);
    let scaled = (clamped + PROJECTION_BOUND) / (2.0 * PROJECTION_BOUND) * CELL_MAX;
    // The scale factor keeps the value in [0, CELL_MAX]; the cast saturates
    // on the rounding edge cases.
    scaled.round() as u32
}

/// Dequantize one axis back to projected space.
#[inline]
fn dequantize_axis(v: u32) -> f64 {
    f64::from(v) / CELL_MAX * (2.0 * PROJECTION_BOUND) - PROJECTION_BOUND
}

/// Quantize a projected point onto the grid.
#[inline]
#[must_use]
pub fn point_to_cell(p: PointD) -> PointU {
    PointU::new(quantize_axis(p.x), quantize_axis(p.y))
}

/// Map a grid point back to the center of its cell in projected space.
#[inline]
#[must_use]
pub fn cell_to_point(p: PointU) -> PointD {
    PointD::new(dequantize_axis(p.x), dequantize_axis(p.y))
}

/// Spread the bits of `v` so they occupy the even bit positions.
#[inline]
fn spread_bits(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread_bits`]: collect the even bit positions of `v`.
#[inline]
fn compact_bits(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x >> 4)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x >> 8)) & 0x0000_ffff_0000_ffff;
    x = (x | (x >> 16)) & 0x0000_0000_ffff_ffff;
    x as u32
}

/// Interleave a grid point onto the Morton curve.
///
/// Bit `i` of `x` lands at position `2i`, bit `i` of `y` at `2i + 1`.
#[inline]
#[must_use]
pub fn interleave(p: PointU) -> u64 {
    spread_bits(p.x) | (spread_bits(p.y) << 1)
}

/// Inverse of [`interleave`].
#[inline]
#[must_use]
pub fn deinterleave(code: u64) -> PointU {
    PointU::new(compact_bits(code), compact_bits(code >> 1))
}

/// Quantize and interleave a projected point in one step.
#[inline]
#[must_use]
pub fn point_to_u64(p: PointD) -> u64 {
    interleave(point_to_cell(p))
}

/// Inverse of [`point_to_u64`].
#[inline]
#[must_use]
pub fn u64_to_point(code: u64) -> PointD {
    cell_to_point(deinterleave(code))
}

/// Delta-encode a grid point against a base point.
///
/// Each axis is subtracted with wrapping arithmetic and the differences are
/// interleaved; points near the base produce small codes.
#[inline]
#[must_use]
pub fn encode_delta(p: PointU, base: PointU) -> u64 {
    interleave(PointU::new(p.x.wrapping_sub(base.x), p.y.wrapping_sub(base.y)))
}

/// Inverse of [`encode_delta`].
#[inline]
#[must_use]
pub fn decode_delta(delta: u64, base: PointU) -> PointU {
    let d = deinterleave(delta);
    PointU::new(base.x.wrapping_add(d.x), base.y.wrapping_add(d.y))
}

/// Scalar equality under the quantization epsilon.
#[inline]
#[must_use]
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < CELL_EPSILON
}

/// Point equality under the quantization epsilon.
#[inline]
#[must_use]
pub fn points_equal(a: PointD, b: PointD) -> bool {
    nearly_equal(a.x, b.x) && nearly_equal(a.y, b.y)
}
