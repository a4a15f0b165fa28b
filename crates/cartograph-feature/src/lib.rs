//! Cartograph Feature Codec
//!
//! This crate turns a geographic map feature - a point, polyline, or
//! polygon-with-holes plus typological attributes - into a compact byte
//! stream, and back.
//!
//! # Overview
//!
//! Three codec stages cooperate:
//!
//! - [`FeatureBuilder`] accumulates geometry and attributes and emits the
//!   self-contained Stage-1 layout
//! - [`IndexedFeatureBuilder`] additionally consumes a simplifier's
//!   per-scale output ([`BuildBuffers`]) and emits the multi-scale Stage-2
//!   layout, mixing inline geometry with offsets into container streams
//! - [`FeatureReader`] parses either layout lazily, stage by stage, at a
//!   caller-supplied zoom
//!
//! The container holding the outer-geometry streams stays opaque behind the
//! [`SectionStore`] trait; [`MemoryStore`] is the bundled in-memory backend.
//!
//! # Example
//!
//! ```
//! use cartograph_core::types::PointD;
//! use cartograph_feature::FeatureBuilder;
//!
//! let mut fb = FeatureBuilder::new();
//! fb.add_type(42);
//! fb.set_layer(-3);
//! fb.add_point(PointD::new(0.0, 0.0));
//! fb.add_point(PointD::new(1.0, 1.0));
//! fb.set_linear();
//!
//! let bytes = fb.serialize().unwrap();
//! let back = FeatureBuilder::deserialize(&bytes).unwrap();
//! assert_eq!(back.layer(), -3);
//! assert_eq!(back.geometry().len(), 2);
//! ```
//!
//! # Modules
//!
//! - [`builder`] - Stage-1 accumulation and serialization
//! - [`indexed`] - Stage-2 multi-scale serialization
//! - [`reader`] - lazy staged parsing
//! - [`container`] - the container seam and scale header
//! - [`header`] - the common header byte
//! - [`serial`] - shared geometry wire codecs
//! - [`error`] - error types

pub mod base;
pub mod builder;
pub mod container;
pub mod error;
pub mod header;
pub mod indexed;
pub mod reader;
pub mod serial;

#[cfg(test)]
mod proptest_tests;

pub use builder::{FeatureBuilder, LAYER_BOUND};
pub use container::{
    tag_for_index, ContainerError, MemoryStore, ScaleHeader, SectionStore, BEST_SCALE,
    GEOMETRY_TAG, SCALES_COUNT, TRIANGLES_TAG,
};
pub use error::{FeatureError, FeatureResult};
pub use header::{CommonHeader, FeatureKind, MAX_TYPES};
pub use indexed::{BuildBuffers, IndexedFeatureBuilder};
pub use reader::{FeatureReader, GeomStats};
pub use serial::INVALID_OFFSET;
