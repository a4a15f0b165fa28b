//! Binary encodings for the feature codec.
//!
//! This module provides the low-level encodings every serialized feature is
//! built from:
//!
//! - [`varint`] - LEB128 unsigned varints, zig-zag signed varints, and
//!   varint-prefixed arrays
//! - [`bits`] - the byte-quantized [`BitWriter`]/[`BitReader`] pair
//! - [`source`] - the [`ByteSource`] seam that lets decoders run over an
//!   in-memory slice or a container stream alike

pub mod bits;
pub mod source;
pub mod varint;

#[cfg(test)]
mod proptest_tests;

pub use bits::{BitReader, BitWriter};
pub use source::{ByteSource, IoSource, SliceSource};
