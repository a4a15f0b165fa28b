//! Cartograph Core
//!
//! This crate provides the geometry primitives and numeric encodings shared by
//! the cartograph map store: projected points, limit rectangles, the
//! quantized coordinate codec, and the variable-length integer and bit-field
//! encodings the feature codec is built on.
//!
//! # Overview
//!
//! - **Geometry**: [`PointD`] (projected coordinates), [`PointU`] (quantized
//!   grid cells), [`RectD`] (limit rectangles), and ring containment tests
//! - **Coordinates**: the [`coords`] module maps projected points onto a
//!   `2^32 × 2^32` grid, interleaves the axes onto a Morton curve, and
//!   delta-encodes against a base point
//! - **Encodings**: the [`encoding`] module provides LEB128 varints, zig-zag
//!   signed varints, and the byte-quantized bit packer
//!
//! # Example
//!
//! ```
//! use cartograph_core::coords;
//! use cartograph_core::types::PointD;
//!
//! let p = PointD::new(27.56, 53.9);
//! let code = coords::point_to_u64(p);
//! let back = coords::u64_to_point(code);
//! assert!(coords::points_equal(p, back));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Geometry types ([`PointD`], [`PointU`], [`RectD`])
//! - [`coords`] - Quantization, Morton interleave, delta encoding
//! - [`encoding`] - Varints, bit packing, byte sources
//! - [`error`] - Error types ([`EncodingError`])

pub mod coords;
pub mod encoding;
pub mod error;
pub mod types;

pub use error::EncodingError;
pub use types::{PointD, PointU, RectD};
