//! The geometry container seam.
//!
//! Outer geometry does not live inside a feature's own byte block: it sits
//! in per-scale streams owned by an opaque container, and the feature only
//! records byte offsets into them. The codec consumes the container through
//! [`SectionStore`] - a lookup of named, seekable byte streams - and never
//! owns or mutates it.
//!
//! Streams are named by a tag plus a scale index, e.g. `geom2` for line
//! geometry at scale index 2.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartograph_core::coords;
use cartograph_core::types::PointU;

/// Number of pre-baked detail levels.
///
/// Wired into the format: the per-scale presence masks in the feature
/// header are four bits wide.
pub const SCALES_COUNT: usize = 4;

/// Requested scale meaning "the most detailed geometry available".
pub const BEST_SCALE: i32 = -1;

/// Stream tag for outer line geometry.
pub const GEOMETRY_TAG: &str = "geom";

/// Stream tag for outer triangulation strips.
pub const TRIANGLES_TAG: &str = "trg";

/// Compose a stream name from a tag and a scale index.
#[inline]
#[must_use]
pub fn tag_for_index(tag: &str, scale_index: usize) -> String {
    format!("{tag}{scale_index}")
}

/// Errors raised by a geometry container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The container holds no section with the requested name.
    #[error("no section named `{0}`")]
    SectionNotFound(String),

    /// An I/O failure from the container's backing storage, propagated
    /// untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A provider of named, seekable byte streams.
///
/// Implementations must allow concurrent `open` calls if readers are shared
/// across threads; a returned stream itself is used by one reader at a time.
pub trait SectionStore {
    /// The stream type for this store.
    type Section<'a>: Read + Seek
    where
        Self: 'a;

    /// Open the section named `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::SectionNotFound`] if no such section
    /// exists.
    fn open(&self, tag: &str) -> Result<Self::Section<'_>, ContainerError>;
}

/// Share a store across readers.
impl<S: SectionStore> SectionStore for Arc<S> {
    type Section<'a>
        = S::Section<'a>
    where
        Self: 'a;

    fn open(&self, tag: &str) -> Result<Self::Section<'_>, ContainerError> {
        (**self).open(tag)
    }
}

/// An in-memory [`SectionStore`].
///
/// The reference backend for tests and for containers small enough to hold
/// resident.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    sections: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the section named `tag`.
    pub fn insert(&mut self, tag: impl Into<String>, bytes: Vec<u8>) {
        self.sections.insert(tag.into(), bytes);
    }
}

impl SectionStore for MemoryStore {
    type Section<'a>
        = Cursor<&'a [u8]>
    where
        Self: 'a;

    fn open(&self, tag: &str) -> Result<Self::Section<'_>, ContainerError> {
        self.sections
            .get(tag)
            .map(|bytes| Cursor::new(bytes.as_slice()))
            .ok_or_else(|| ContainerError::SectionNotFound(tag.to_owned()))
    }
}

/// The container's scale header: zoom breakpoints in ascending order plus
/// the base point all feature coordinates are delta-encoded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleHeader {
    scales: Vec<i32>,
    base: i64,
}

impl ScaleHeader {
    /// Create a scale header.
    ///
    /// # Panics
    ///
    /// Panics if `scales` is empty, holds more than [`SCALES_COUNT`]
    /// entries, or is not strictly ascending - the container is misbuilt.
    #[must_use]
    pub fn new(scales: Vec<i32>, base: i64) -> Self {
        assert!(
            (1..=SCALES_COUNT).contains(&scales.len()),
            "scale header must hold 1..={SCALES_COUNT} breakpoints"
        );
        assert!(scales.windows(2).all(|w| w[0] < w[1]), "scale breakpoints must ascend");
        Self { scales, base }
    }

    /// Number of detail levels.
    #[inline]
    #[must_use]
    pub fn scales_count(&self) -> usize {
        self.scales.len()
    }

    /// The zoom breakpoint for scale index `i`.
    #[inline]
    #[must_use]
    pub fn scale(&self, i: usize) -> i32 {
        self.scales[i]
    }

    /// The base point as stored, a Morton code in `i64` guise.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> i64 {
        self.base
    }

    /// The base point as a grid cell.
    #[inline]
    #[must_use]
    pub fn base_cell(&self) -> PointU {
        coords::deinterleave(self.base as u64)
    }
}
