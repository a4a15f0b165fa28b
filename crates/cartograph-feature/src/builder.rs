//! The Stage-1 feature builder.
//!
//! A [`FeatureBuilder`] accumulates geometry and typological attributes,
//! validates the structural invariants, and emits the self-contained Stage-1
//! byte layout:
//!
//! ```text
//! [base block]                  see crate::base
//! [outer path]                  iff line or area geometry
//! [hole count + hole paths]     iff area geometry
//! ```
//!
//! Stage-1 output delta-encodes against the origin, so a block can be
//! decoded without any container context. [`FeatureBuilder::deserialize`] is
//! the exact inverse and backs the debug-build round-trip self-check.
//!
//! # Example
//!
//! ```
//! use cartograph_feature::FeatureBuilder;
//! use cartograph_core::types::PointD;
//!
//! let mut fb = FeatureBuilder::new();
//! fb.add_type(100);
//! fb.set_name("Caf\u{e9}");
//! fb.set_center(PointD::new(10.0, 20.0));
//!
//! let bytes = fb.serialize().unwrap();
//! let back = FeatureBuilder::deserialize(&bytes).unwrap();
//! assert!(fb.equals(&back));
//! ```

use cartograph_core::coords;
use cartograph_core::encoding::source::SliceSource;
use cartograph_core::encoding::varint;
use cartograph_core::types::{ring_contains, PointD, PointU, RectD};

use crate::base;
use crate::error::{FeatureError, FeatureResult};
use crate::header::{CommonHeader, MAX_TYPES};
use crate::serial;

/// Layers are clamped to `[-LAYER_BOUND, LAYER_BOUND]` on ingest.
pub const LAYER_BOUND: i32 = 10;

/// Accumulates a feature and serializes it to the Stage-1 layout.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    types: Vec<u32>,
    layer: i32,
    name: String,
    center: Option<PointD>,
    pub(crate) is_line: bool,
    pub(crate) is_area: bool,
    geometry: Vec<PointD>,
    holes: Vec<Vec<PointD>>,
    limit_rect: RectD,
}

impl FeatureBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the center point, marking the feature as a point feature.
    pub fn set_center(&mut self, p: PointD) {
        self.center = Some(p);
        self.limit_rect.extend(p);
    }

    /// Append a vertex to the line/area geometry.
    pub fn add_point(&mut self, p: PointD) {
        self.geometry.push(p);
        self.limit_rect.extend(p);
    }

    /// Mark the feature as a polyline.
    pub fn set_linear(&mut self) {
        self.is_line = true;
    }

    /// Mark the feature as an area without holes.
    pub fn set_area(&mut self) {
        self.is_area = true;
        self.holes.clear();
    }

    /// Mark the feature as an area and ingest its hole rings.
    ///
    /// A hole is kept only if its first vertex lies inside the outer ring;
    /// rings that fail the containment test are dropped silently - upstream
    /// data routinely attaches holes to the wrong outer.
    pub fn set_area_with_holes(&mut self, holes: impl IntoIterator<Item = Vec<PointD>>) {
        self.is_area = true;
        self.holes.clear();
        for hole in holes {
            match hole.first() {
                Some(&first) if ring_contains(&self.geometry, first) => self.holes.push(hole),
                _ => {}
            }
        }
    }

    /// Append a type classifier, keeping insertion order.
    pub fn add_type(&mut self, t: u32) {
        self.types.push(t);
    }

    /// Append several type classifiers.
    pub fn add_types(&mut self, types: impl IntoIterator<Item = u32>) {
        self.types.extend(types);
    }

    /// Returns `true` if the classifier is already present.
    #[must_use]
    pub fn has_type(&self, t: u32) -> bool {
        self.types.contains(&t)
    }

    /// Drop every type present in `remove` (which must be sorted), keeping
    /// the insertion order of the survivors.
    ///
    /// Returns `true` if at least one type remains.
    pub fn diff_types(&mut self, remove: &[u32]) -> bool {
        debug_assert!(remove.windows(2).all(|w| w[0] <= w[1]), "remove list must be sorted");
        self.types.retain(|t| remove.binary_search(t).is_err());
        !self.types.is_empty()
    }

    /// Set the layer, clamped to `[-LAYER_BOUND, LAYER_BOUND]`.
    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer.clamp(-LAYER_BOUND, LAYER_BOUND);
    }

    /// Set the name. An empty string counts as "no name".
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The accumulated type classifiers.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[u32] {
        &self.types
    }

    /// The layer, zero when unset.
    #[inline]
    #[must_use]
    pub const fn layer(&self) -> i32 {
        self.layer
    }

    /// The name, if one was set.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    /// The center point, if the feature is a point feature.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Option<PointD> {
        self.center
    }

    /// The line/area vertices.
    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &[PointD] {
        &self.geometry
    }

    /// The hole rings that survived the containment filter.
    #[inline]
    #[must_use]
    pub fn holes(&self) -> &[Vec<PointD>] {
        &self.holes
    }

    /// The bounding rectangle of everything added so far.
    #[inline]
    #[must_use]
    pub const fn limit_rect(&self) -> RectD {
        self.limit_rect
    }

    /// Returns `true` if the geometry forms a closed ring.
    #[must_use]
    pub fn is_geometry_closed(&self) -> bool {
        self.geometry.len() > 2 && self.geometry.first() == self.geometry.last()
    }

    /// Structural equality up to the quantization epsilon.
    ///
    /// Exact on types, layer, name, and flags; coordinate data compares
    /// within one grid cell, which is all that survives a round trip.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        fn rects_equal(a: RectD, b: RectD) -> bool {
            coords::nearly_equal(a.min_x, b.min_x)
                && coords::nearly_equal(a.min_y, b.min_y)
                && coords::nearly_equal(a.max_x, b.max_x)
                && coords::nearly_equal(a.max_y, b.max_y)
        }
        fn paths_equal(a: &[PointD], b: &[PointD]) -> bool {
            a.len() == b.len()
                && a.iter().zip(b).all(|(&p, &q)| coords::points_equal(p, q))
        }

        if self.types != other.types
            || self.layer != other.layer
            || self.name != other.name
            || self.is_line != other.is_line
            || self.is_area != other.is_area
        {
            return false;
        }

        let centers_equal = match (self.center, other.center) {
            (None, None) => true,
            (Some(a), Some(b)) => coords::points_equal(a, b),
            _ => false,
        };
        centers_equal
            && rects_equal(self.limit_rect, other.limit_rect)
            && paths_equal(&self.geometry, &other.geometry)
            && self.holes.len() == other.holes.len()
            && self.holes.iter().zip(&other.holes).all(|(a, b)| paths_equal(a, b))
    }

    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidBuilder`] naming the first violated
    /// invariant.
    pub fn validate(&self) -> FeatureResult<()> {
        let fail = |msg: String| Err(FeatureError::InvalidBuilder(msg));

        if self.types.is_empty() || self.types.len() > MAX_TYPES {
            return fail(format!("{} types, expected 1..={MAX_TYPES}", self.types.len()));
        }
        if !(-LAYER_BOUND..=LAYER_BOUND).contains(&self.layer) {
            return fail(format!("layer {} out of range", self.layer));
        }
        if self.center.is_none() && !self.is_line && !self.is_area {
            return fail("feature has no geometric kind".to_owned());
        }
        if self.is_line && self.geometry.len() < 2 {
            return fail(format!("line with {} vertices", self.geometry.len()));
        }
        if self.is_area && self.geometry.len() < 3 {
            return fail(format!("area with {} vertices", self.geometry.len()));
        }
        if !self.holes.is_empty() && !self.is_area {
            return fail("holes on a non-area feature".to_owned());
        }
        for hole in &self.holes {
            if hole.len() < 3 {
                return fail(format!("hole ring with {} vertices", hole.len()));
            }
        }
        Ok(())
    }

    /// The common header byte for the current state.
    #[must_use]
    pub fn header(&self) -> CommonHeader {
        CommonHeader {
            types_count: self.types.len() as u8,
            has_name: !self.name.is_empty(),
            has_layer: self.layer != 0,
            has_point: self.center.is_some(),
            is_line: self.is_line,
            is_area: self.is_area,
        }
    }

    /// Append the base block, delta-encoding the center against `base`.
    pub(crate) fn serialize_base(&self, sink: &mut Vec<u8>, base: PointU) {
        sink.push(self.header().pack());
        base::write_types(sink, &self.types);
        if self.layer != 0 {
            base::write_layer(sink, self.layer);
        }
        if !self.name.is_empty() {
            base::write_name(sink, &self.name);
        }
        if let Some(center) = self.center {
            base::write_center(sink, center, base);
        }
    }

    /// Serialize to the self-contained Stage-1 layout.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidBuilder`] if [`validate`](Self::validate)
    /// fails.
    pub fn serialize(&self) -> FeatureResult<Vec<u8>> {
        self.validate()?;

        let mut buf = Vec::new();
        self.serialize_base(&mut buf, PointU::ORIGIN);

        if self.is_line || self.is_area {
            serial::save_outer_path(&self.geometry, 0, &mut buf);
        }
        if self.is_area {
            varint::write_var_u32(&mut buf, self.holes.len() as u32);
            for hole in &self.holes {
                serial::save_outer_path(hole, 0, &mut buf);
            }
        }

        #[cfg(debug_assertions)]
        {
            let back = Self::deserialize(&buf).expect("own output must deserialize");
            debug_assert!(back.equals(self), "serialization round trip diverged");
        }

        Ok(buf)
    }

    /// Decode a Stage-1 block.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] on truncated or inconsistent
    /// input.
    pub fn deserialize(data: &[u8]) -> FeatureResult<Self> {
        use cartograph_core::encoding::source::ByteSource;

        let mut src = SliceSource::new(data);
        let header = CommonHeader::unpack(src.read_byte()?)?;

        let mut fb = Self::new();
        fb.types = base::read_types(&mut src, header.types_count)?;
        if header.has_layer {
            fb.layer = base::read_layer(&mut src)?;
        }
        if header.has_name {
            fb.name = base::read_name(&mut src)?;
        }
        if header.has_point {
            fb.set_center(base::read_center(&mut src, PointU::ORIGIN)?);
        }

        fb.is_line = header.is_line;
        fb.is_area = header.is_area;
        if header.is_line || header.is_area {
            for p in serial::load_outer_path(&mut src, 0)? {
                fb.add_point(p);
            }
        }
        if header.is_area {
            let hole_count = varint::read_var_u32(&mut src)?;
            for _ in 0..hole_count {
                fb.holes.push(serial::load_outer_path(&mut src, 0)?);
            }
        }

        // Bad bytes can decode into a structurally invalid feature; that is
        // a data problem, not a caller bug.
        fb.validate().map_err(|err| FeatureError::Malformed(err.to_string()))?;
        Ok(fb)
    }
}
