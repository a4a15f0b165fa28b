//! The lazy feature reader.
//!
//! A [`FeatureReader`] wraps one feature's byte block plus shared references
//! to the container and its scale header, and parses on demand in four
//! ordered stages:
//!
//! ```text
//! Constructed -> TypesParsed -> CommonParsed -> Header2Parsed
//!                                                -> points  (per scale)
//!                                                -> triangles (per scale)
//! ```
//!
//! Each `parse_*` method runs its prerequisites first and is idempotent, so
//! callers only invoke the deepest stage they need; rendering a label needs
//! nothing past the common block, while hit-testing needs full geometry.
//! Parsing mutates interior state, so a single reader must not be shared
//! across threads - share the container and scale header instead and give
//! each thread its own reader.
//!
//! Geometry is resolved against a requested zoom: inline vertices are
//! filtered through the simplification mask, outer geometry is fetched from
//! the container stream for the resolved scale index. A scale whose
//! presence bit is absent yields *empty* geometry rather than an error;
//! [`is_empty_geometry`](FeatureReader::is_empty_geometry) is the query for
//! it.

use std::fmt::Write as _;
use std::io::{Seek, SeekFrom};

use cartograph_core::encoding::bits::BitReader;
use cartograph_core::encoding::source::{ByteSource, IoSource, SliceSource};
use cartograph_core::types::{PointD, RectD};

use crate::base;
use crate::builder::FeatureBuilder;
use crate::container::{
    tag_for_index, ContainerError, ScaleHeader, SectionStore, BEST_SCALE, GEOMETRY_TAG,
    SCALES_COUNT, TRIANGLES_TAG,
};
use crate::error::{FeatureError, FeatureResult};
use crate::header::{CommonHeader, FeatureKind};
use crate::serial::{self, INVALID_OFFSET};

/// Parse progress for the staged part of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ParseStage {
    Constructed,
    TypesParsed,
    CommonParsed,
    Header2Parsed,
}

/// Which decoder an outer container stream needs.
#[derive(Debug, Clone, Copy)]
enum OuterRun {
    Path,
    TriangleStrip,
}

/// Byte sizes of the inline blocks, kept for size statistics.
#[derive(Debug, Clone, Copy, Default)]
struct InnerStats {
    points: usize,
    strips: usize,
}

/// Size statistics for one geometry kind at one scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeomStats {
    /// Encoded size of the geometry actually decoded.
    pub bytes: usize,
    /// Decoded vertex count.
    pub elements: usize,
}

/// Parses one feature's byte block lazily.
pub struct FeatureReader<'a, S: SectionStore> {
    data: Vec<u8>,
    store: &'a S,
    scales: &'a ScaleHeader,

    stage: ParseStage,
    common: Option<CommonHeader>,
    common_offset: usize,
    header2_offset: usize,

    types: Vec<u32>,
    layer: i32,
    name: Option<String>,
    center: Option<PointD>,
    limit_rect: RectD,

    points: Vec<PointD>,
    triangles: Vec<PointD>,
    pts_simp_mask: u32,
    pts_offsets: [u32; SCALES_COUNT],
    trg_offsets: [u32; SCALES_COUNT],
    points_parsed: bool,
    triangles_parsed: bool,
    outer_pts_bytes: usize,
    outer_trg_bytes: usize,
    inner_stats: InnerStats,
}

impl<'a, S: SectionStore> FeatureReader<'a, S> {
    /// Wrap a feature block.
    ///
    /// Takes ownership of `data`; the container and scale header are only
    /// borrowed and may back any number of readers.
    pub fn new(data: Vec<u8>, store: &'a S, scales: &'a ScaleHeader) -> Self {
        Self {
            data,
            store,
            scales,
            stage: ParseStage::Constructed,
            common: None,
            common_offset: 0,
            header2_offset: 0,
            types: Vec::new(),
            layer: 0,
            name: None,
            center: None,
            limit_rect: RectD::empty(),
            points: Vec::new(),
            triangles: Vec::new(),
            pts_simp_mask: 0,
            pts_offsets: [INVALID_OFFSET; SCALES_COUNT],
            trg_offsets: [INVALID_OFFSET; SCALES_COUNT],
            points_parsed: false,
            triangles_parsed: false,
            outer_pts_bytes: 0,
            outer_trg_bytes: 0,
            inner_stats: InnerStats::default(),
        }
    }

    /// Parse the header byte and the type classifiers.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] on a truncated block or a zero
    /// types count.
    pub fn parse_types(&mut self) -> FeatureResult<()> {
        if self.stage >= ParseStage::TypesParsed {
            return Ok(());
        }

        let mut src = SliceSource::new(&self.data);
        let header = CommonHeader::unpack(src.read_byte()?)?;
        let types = base::read_types(&mut src, header.types_count)?;

        self.common = Some(header);
        self.types = types;
        self.common_offset = src.position();
        self.stage = ParseStage::TypesParsed;
        Ok(())
    }

    /// Parse layer, name, and center point.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] on truncated or invalid input.
    pub fn parse_common(&mut self) -> FeatureResult<()> {
        if self.stage >= ParseStage::CommonParsed {
            return Ok(());
        }
        self.parse_types()?;
        let header = self.header();

        let mut src = SliceSource::new(&self.data);
        src.skip(self.common_offset)?;

        let layer = if header.has_layer { base::read_layer(&mut src)? } else { 0 };
        let name = if header.has_name { Some(base::read_name(&mut src)?) } else { None };
        let center = if header.has_point {
            Some(base::read_center(&mut src, self.scales.base_cell())?)
        } else {
            None
        };

        self.layer = layer;
        self.name = name;
        if let Some(center) = center {
            self.limit_rect.extend(center);
        }
        self.center = center;
        self.header2_offset = src.position();
        self.stage = ParseStage::CommonParsed;
        Ok(())
    }

    /// Parse the packed geometry header and any inline geometry.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] on truncated or inconsistent
    /// input.
    pub fn parse_header2(&mut self) -> FeatureResult<()> {
        if self.stage >= ParseStage::Header2Parsed {
            return Ok(());
        }
        self.parse_common()?;
        let header = self.header();
        let base = self.base_code();

        let mut pts_count = 0u8;
        let mut pts_mask = 0u8;
        let mut trg_count = 0u8;
        let mut trg_mask = 0u8;
        {
            let mut bits = BitReader::new(&self.data[self.header2_offset..]);
            if header.is_line {
                pts_count = bits.read(4)?;
                if pts_count == 0 {
                    pts_mask = bits.read(4)?;
                } else if pts_count < 2 {
                    return Err(FeatureError::Malformed(
                        "inline line with a single vertex".to_owned(),
                    ));
                }
            }
            if header.is_area {
                trg_count = bits.read(4)?;
                if trg_count == 0 {
                    trg_mask = bits.read(4)?;
                }
            }
            self.header2_offset += bits.bytes_consumed();
        }

        let mut src = SliceSource::new(&self.data);
        src.skip(self.header2_offset)?;

        if header.is_line {
            if pts_count > 0 {
                if pts_count > 2 {
                    let mut mask = 0u32;
                    for i in 0..(usize::from(pts_count) - 2).div_ceil(4) {
                        mask |= u32::from(src.read_byte()?) << (i * 8);
                    }
                    self.pts_simp_mask = mask;
                }
                let start = src.position();
                self.points = serial::load_inner_path(&mut src, usize::from(pts_count), base)?;
                self.inner_stats.points = src.position() - start;
            } else {
                self.pts_offsets = serial::read_offsets(&mut src, pts_mask)?;
            }
        }

        if header.is_area {
            if trg_count > 0 {
                let strip_len = usize::from(trg_count) + 2;
                let start = src.position();
                let strip = serial::load_inner_triangles(&mut src, strip_len, base)?;
                self.inner_stats.strips = src.position() - start;
                self.triangles = serial::strip_to_triangles(&strip);
            } else {
                self.trg_offsets = serial::read_offsets(&mut src, trg_mask)?;
            }
        }

        self.stage = ParseStage::Header2Parsed;
        Ok(())
    }

    /// Parse line geometry for the requested zoom.
    ///
    /// Inline vertices are filtered through the simplification mask; outer
    /// geometry is fetched from the container. A scale with no geometry
    /// leaves the point list empty.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] on bad input bytes and
    /// [`FeatureError::Container`] if the container fails.
    pub fn parse_geometry(&mut self, scale: i32) -> FeatureResult<()> {
        if self.points_parsed {
            return Ok(());
        }
        self.parse_header2()?;

        if self.header().is_line {
            if self.points.is_empty() {
                // A scale with no valid offset leaves the points empty.
                if let Some(index) = self.resolve_scale_index(scale, &self.pts_offsets)? {
                    let offset = self.pts_offsets[index];
                    let (points, bytes) =
                        self.load_outer(GEOMETRY_TAG, index, offset, OuterRun::Path)?;
                    self.points = points;
                    self.outer_pts_bytes = bytes;
                }
            } else {
                let keep_at = self.scale_index(scale);
                let mask = self.pts_simp_mask;
                let count = self.points.len();
                let points = std::mem::take(&mut self.points);
                self.points = points
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, _)| {
                        i == 0
                            || i == count - 1
                            || u32::from((mask >> (2 * (i - 1))) & 0x3) <= keep_at as u32
                    })
                    .map(|(_, p)| p)
                    .collect();
            }
            let points = std::mem::take(&mut self.points);
            self.limit_rect.extend_all(&points);
            self.points = points;
        }

        self.points_parsed = true;
        Ok(())
    }

    /// Parse area triangles for the requested zoom.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_geometry`](Self::parse_geometry).
    pub fn parse_triangles(&mut self, scale: i32) -> FeatureResult<()> {
        if self.triangles_parsed {
            return Ok(());
        }
        self.parse_header2()?;

        if self.header().is_area {
            if self.triangles.is_empty() {
                if let Some(index) = self.resolve_scale_index(scale, &self.trg_offsets)? {
                    let offset = self.trg_offsets[index];
                    let (triangles, bytes) =
                        self.load_outer(TRIANGLES_TAG, index, offset, OuterRun::TriangleStrip)?;
                    self.triangles = triangles;
                    self.outer_trg_bytes = bytes;
                }
            }
            let triangles = std::mem::take(&mut self.triangles);
            self.limit_rect.extend_all(&triangles);
            self.triangles = triangles;
        }

        self.triangles_parsed = true;
        Ok(())
    }

    /// Force every stage at the requested zoom.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_geometry`](Self::parse_geometry).
    pub fn parse_all(&mut self, scale: i32) -> FeatureResult<()> {
        self.parse_geometry(scale)?;
        self.parse_triangles(scale)
    }

    /// The common header.
    ///
    /// # Panics
    ///
    /// Panics if types have not been parsed yet.
    #[must_use]
    pub fn header(&self) -> CommonHeader {
        self.common.expect("types not parsed")
    }

    /// The feature's kind, area > line > point.
    ///
    /// # Panics
    ///
    /// Panics if types have not been parsed yet.
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.header().kind()
    }

    /// The type classifiers.
    ///
    /// # Panics
    ///
    /// Panics if types have not been parsed yet.
    #[must_use]
    pub fn types(&self) -> &[u32] {
        assert!(self.stage >= ParseStage::TypesParsed, "types not parsed");
        &self.types
    }

    /// The layer, zero when absent.
    ///
    /// # Panics
    ///
    /// Panics if the common block has not been parsed yet.
    #[must_use]
    pub fn layer(&self) -> i32 {
        assert!(self.stage >= ParseStage::CommonParsed, "common block not parsed");
        self.layer
    }

    /// The name, if present.
    ///
    /// # Panics
    ///
    /// Panics if the common block has not been parsed yet.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        assert!(self.stage >= ParseStage::CommonParsed, "common block not parsed");
        self.name.as_deref()
    }

    /// The center point, if present.
    ///
    /// # Panics
    ///
    /// Panics if the common block has not been parsed yet.
    #[must_use]
    pub fn center(&self) -> Option<PointD> {
        assert!(self.stage >= ParseStage::CommonParsed, "common block not parsed");
        self.center
    }

    /// The line vertices decoded for the parsed scale.
    ///
    /// # Panics
    ///
    /// Panics if geometry has not been parsed yet.
    #[must_use]
    pub fn points(&self) -> &[PointD] {
        assert!(self.points_parsed, "geometry not parsed");
        &self.points
    }

    /// The triangle list decoded for the parsed scale, three points per
    /// triangle.
    ///
    /// # Panics
    ///
    /// Panics if triangles have not been parsed yet.
    #[must_use]
    pub fn triangles(&self) -> &[PointD] {
        assert!(self.triangles_parsed, "triangles not parsed");
        &self.triangles
    }

    /// Returns `true` if the feature has no geometry at the given zoom.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_all`](Self::parse_all).
    pub fn is_empty_geometry(&mut self, scale: i32) -> FeatureResult<bool> {
        self.parse_all(scale)?;
        Ok(match self.kind() {
            FeatureKind::Area => self.triangles.is_empty(),
            FeatureKind::Line => self.points.is_empty(),
            FeatureKind::Point => false,
        })
    }

    /// The feature's bounding rectangle at the given zoom.
    ///
    /// A feature with no geometry and no center at this scale reports a
    /// zero rectangle, so visibility checks treat it as dimensionless.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_all`](Self::parse_all).
    pub fn limit_rect(&mut self, scale: i32) -> FeatureResult<RectD> {
        self.parse_all(scale)?;
        if self.triangles.is_empty() && self.points.is_empty() && self.center.is_none() {
            self.limit_rect = RectD::ZERO;
        }
        Ok(self.limit_rect)
    }

    /// Size statistics for line geometry at the given zoom.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_geometry`](Self::parse_geometry).
    pub fn geometry_size(&mut self, scale: i32) -> FeatureResult<GeomStats> {
        self.parse_geometry(scale)?;
        let bytes = if self.outer_pts_bytes > 0 {
            self.outer_pts_bytes
        } else if self.points.is_empty() {
            0
        } else {
            self.inner_stats.points
        };
        Ok(GeomStats { bytes, elements: self.points.len() })
    }

    /// Size statistics for triangles at the given zoom.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_triangles`](Self::parse_triangles).
    pub fn triangles_size(&mut self, scale: i32) -> FeatureResult<GeomStats> {
        self.parse_triangles(scale)?;
        let bytes = if self.outer_trg_bytes > 0 {
            self.outer_trg_bytes
        } else if self.triangles.is_empty() {
            0
        } else {
            self.inner_stats.strips
        };
        Ok(GeomStats { bytes, elements: self.triangles.len() })
    }

    /// Populate a Stage-1 builder from the parsed base block.
    ///
    /// Geometry is not carried over; only types, layer, name, center, and
    /// the kind flags.
    ///
    /// # Panics
    ///
    /// Panics if the common block has not been parsed yet.
    #[must_use]
    pub fn to_builder(&self) -> FeatureBuilder {
        assert!(self.stage >= ParseStage::CommonParsed, "common block not parsed");
        let header = self.header();

        let mut fb = FeatureBuilder::new();
        fb.add_types(self.types.iter().copied());
        fb.set_layer(self.layer);
        if let Some(name) = &self.name {
            fb.set_name(name.clone());
        }
        if let Some(center) = self.center {
            fb.set_center(center);
        }
        if header.is_line {
            fb.set_linear();
        }
        if header.is_area {
            fb.set_area();
        }
        fb
    }

    /// Render a human-readable summary, forcing a full parse.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_all`](Self::parse_all).
    pub fn debug_string(&mut self, scale: i32) -> FeatureResult<String> {
        self.parse_all(scale)?;

        let mut out = String::from("FEATURE:");
        if let Some(name) = &self.name {
            let _ = write!(out, " '{name}'");
        }
        for t in &self.types {
            let _ = write!(out, " type:{t}");
        }
        let _ = write!(out, " layer:{}", self.layer);
        if let Some(center) = self.center {
            let _ = write!(out, " center:({:.6}, {:.6})", center.x, center.y);
        }
        let _ = write!(
            out,
            " points:{} triangles:{}",
            self.points.len(),
            self.triangles.len() / 3
        );
        Ok(out)
    }

    /// The scale index serving a requested zoom, from the scale header
    /// alone. `BEST_SCALE` maps to the most detailed index.
    ///
    /// # Panics
    ///
    /// Panics on a zoom beyond every breakpoint - the caller asked for a
    /// detail level the container does not hold.
    #[must_use]
    fn scale_index(&self, scale: i32) -> usize {
        let count = self.scales.scales_count();
        if scale == BEST_SCALE {
            return count - 1;
        }
        for i in 0..count {
            if scale <= self.scales.scale(i) {
                return i;
            }
        }
        panic!("requested zoom {scale} beyond every scale breakpoint");
    }

    /// The scale index serving a requested zoom among the scales that have
    /// outer geometry: the smallest index whose breakpoint covers the zoom
    /// *and* whose offset is valid, so an absent intermediate scale falls
    /// through to the next finer one.
    ///
    /// `Ok(None)` means the feature simply has no geometry at that zoom.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Malformed`] if `BEST_SCALE` finds no valid
    /// offset at all - outer features must carry geometry somewhere.
    fn resolve_scale_index(
        &self,
        scale: i32,
        offsets: &[u32; SCALES_COUNT],
    ) -> FeatureResult<Option<usize>> {
        let valid = &offsets[..self.scales.scales_count()];
        if scale == BEST_SCALE {
            return valid
                .iter()
                .rposition(|&o| o != INVALID_OFFSET)
                .map(Some)
                .ok_or_else(|| {
                    FeatureError::Malformed("outer feature with no geometry at any scale".to_owned())
                });
        }

        Ok((0..valid.len())
            .find(|&i| scale <= self.scales.scale(i) && valid[i] != INVALID_OFFSET))
    }

    /// Open the container stream for `tag` at `index`, skip to `offset`,
    /// and decode one geometry run.
    ///
    /// The stream lives only for this call.
    fn load_outer(
        &self,
        tag: &str,
        index: usize,
        offset: u32,
        run: OuterRun,
    ) -> FeatureResult<(Vec<PointD>, usize)> {
        let mut section = self.store.open(&tag_for_index(tag, index))?;
        section.seek(SeekFrom::Start(u64::from(offset))).map_err(ContainerError::from)?;

        let mut src = IoSource::new(section);
        let decoded = match run {
            OuterRun::Path => serial::load_outer_path(&mut src, self.base_code())?,
            OuterRun::TriangleStrip => serial::load_outer_triangles(&mut src, self.base_code())?,
        };
        Ok((decoded, src.bytes_read() as usize))
    }

    /// The container's base point as a Morton code.
    #[inline]
    fn base_code(&self) -> u64 {
        self.scales.base() as u64
    }
}
