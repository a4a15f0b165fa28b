//! The Stage-2 indexed builder.
//!
//! Stage-2 consumes the per-scale output of an external simplifier and
//! emits the multi-scale layout: short geometry inline in the feature block,
//! long geometry as offsets into the container's per-scale streams. After
//! the base block:
//!
//! ```text
//! [bit fields]  pts_count:4 [pts_mask:4 iff 0] trg_count:4 [trg_mask:4 iff 0]
//! [*         ]  simplification mask bytes   iff line, inline, > 2 vertices
//! [*         ]  inline path                 iff line, inline
//! [*         ]  offset array                iff line, outer
//! [*         ]  inline triangle strip       iff area, inline
//! [*         ]  offset array                iff area, outer
//! ```
//!
//! Bit fields follow the byte-quantized packer rules; only the fields for
//! kinds the feature actually has are present. The stored triangle count is
//! the strip length minus two (a strip of N points is N - 2 triangles).

use cartograph_core::coords;
use cartograph_core::encoding::bits::BitWriter;
use cartograph_core::types::PointD;

use crate::builder::FeatureBuilder;
use crate::container::SCALES_COUNT;
use crate::error::{FeatureError, FeatureResult};
use crate::serial;

/// Inline vertex counts travel in a four-bit field.
const MAX_INNER_POINTS: usize = 15;

/// Inline strips store `len - 2` in a four-bit field.
const MAX_INNER_STRIP: usize = 17;

/// Per-scale buffers handed over by the simplifier.
///
/// Offset vectors are push lists in the simplifier's working order, from the
/// highest-detail scale down; the serializer reverses them into ascending
/// scale order. Mask bit `i` marks scale index `i` as having outer data, so
/// each mask's population count must equal its offset list's length.
#[derive(Debug, Clone, Default)]
pub struct BuildBuffers {
    /// Vertices kept inline, empty when the geometry went to outer streams.
    pub inner_pts: Vec<PointD>,
    /// Per-scale presence mask for outer line geometry.
    pub pts_mask: u8,
    /// Two bits per intermediate vertex of `inner_pts`: the smallest scale
    /// index at which the vertex is visible.
    pub pts_simp_mask: u32,
    /// Outer line geometry offsets, highest detail first.
    pub pts_offsets: Vec<u32>,
    /// Triangle strip kept inline, empty when triangles went to outer
    /// streams.
    pub inner_trg: Vec<PointD>,
    /// Per-scale presence mask for outer triangles.
    pub trg_mask: u8,
    /// Outer triangle offsets, highest detail first.
    pub trg_offsets: Vec<u32>,
}

/// Serializes a feature into the Stage-2 multi-scale layout.
#[derive(Debug, Clone)]
pub struct IndexedFeatureBuilder {
    base: FeatureBuilder,
}

impl IndexedFeatureBuilder {
    /// Wrap a Stage-1 builder.
    #[must_use]
    pub const fn new(base: FeatureBuilder) -> Self {
        Self { base }
    }

    /// The wrapped Stage-1 builder.
    #[inline]
    #[must_use]
    pub const fn builder(&self) -> &FeatureBuilder {
        &self.base
    }

    /// Reconcile the kind flags with what the simplifier kept.
    ///
    /// A kind whose inline block and presence mask are both empty is
    /// dropped; a line feature simplified away at every scale degrades to
    /// point-only. Returns `false` if no kind remains and the feature
    /// should be discarded.
    pub fn pre_serialize(&mut self, buffers: &BuildBuffers) -> bool {
        if buffers.pts_mask == 0 && buffers.inner_pts.is_empty() {
            self.base.is_line = false;
        }
        if buffers.trg_mask == 0 && buffers.inner_trg.is_empty() {
            self.base.is_area = false;
        }
        self.base.center().is_some() || self.base.is_line || self.base.is_area
    }

    /// Serialize against the container's base point.
    ///
    /// [`pre_serialize`](Self::pre_serialize) must have been called with the
    /// same buffers and returned `true`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidBuilder`] if the feature or the
    /// simplifier buffers violate an invariant.
    pub fn serialize(&self, buffers: BuildBuffers, base: i64) -> FeatureResult<Vec<u8>> {
        self.base.validate()?;
        let BuildBuffers {
            inner_pts,
            pts_mask,
            pts_simp_mask,
            mut pts_offsets,
            inner_trg,
            trg_mask,
            mut trg_offsets,
        } = buffers;

        let fail = |msg: String| Err(FeatureError::InvalidBuilder(msg));
        let pts_count = inner_pts.len();
        let strip_len = inner_trg.len();
        if self.base.is_line {
            match pts_count {
                0 => check_outer("line", pts_mask, &pts_offsets)?,
                1 => return fail("inline line with a single vertex".to_owned()),
                n if n > MAX_INNER_POINTS => return fail(format!("inline line of {n} vertices")),
                _ => {}
            }
        }
        if self.base.is_area {
            match strip_len {
                0 => check_outer("strip", trg_mask, &trg_offsets)?,
                1 | 2 => return fail(format!("inline strip with {strip_len} vertices")),
                n if n > MAX_INNER_STRIP => return fail(format!("inline strip of {n} vertices")),
                _ => {}
            }
        }

        let mut buf = Vec::new();
        self.base.serialize_base(&mut buf, coords::deinterleave(base as u64));

        let trg_count = strip_len.saturating_sub(2);
        let mut bits = BitWriter::new(&mut buf);
        if self.base.is_line {
            bits.write(pts_count as u8, 4);
            if pts_count == 0 {
                bits.write(pts_mask, 4);
            }
        }
        if self.base.is_area {
            bits.write(trg_count as u8, 4);
            if trg_count == 0 {
                bits.write(trg_mask, 4);
            }
        }
        bits.finish();

        if self.base.is_line {
            if pts_count > 0 {
                if pts_count > 2 {
                    // Two bits per intermediate vertex, little-endian.
                    let mut mask = pts_simp_mask;
                    for _ in 0..(pts_count - 2).div_ceil(4) {
                        buf.push(mask as u8);
                        mask >>= 8;
                    }
                }
                serial::save_inner_path(&inner_pts, base as u64, &mut buf);
            } else {
                pts_offsets.reverse();
                serial::write_offsets(&pts_offsets, &mut buf);
            }
        }

        if self.base.is_area {
            if trg_count > 0 {
                serial::save_inner_triangles(&inner_trg, base as u64, &mut buf);
            } else {
                trg_offsets.reverse();
                serial::write_offsets(&trg_offsets, &mut buf);
            }
        }

        Ok(buf)
    }
}

impl From<FeatureBuilder> for IndexedFeatureBuilder {
    fn from(base: FeatureBuilder) -> Self {
        Self::new(base)
    }
}

/// Validate one kind's outer-geometry buffers: a four-bit presence mask
/// whose population count matches the offset list.
fn check_outer(what: &str, mask: u8, offsets: &[u32]) -> FeatureResult<()> {
    let fail = |msg: String| Err(FeatureError::InvalidBuilder(msg));

    if mask == 0 {
        return fail(format!("{what} with neither inline data nor a presence mask"));
    }
    if mask > 0b1111 {
        return fail(format!("{what} presence mask {mask:#x} wider than {SCALES_COUNT} scales"));
    }
    if offsets.len() != mask.count_ones() as usize {
        return fail(format!("{} {what} offsets for presence mask {mask:#06b}", offsets.len()));
    }
    if offsets.contains(&serial::INVALID_OFFSET) {
        return fail(format!("{what} offset list holds an invalid marker"));
    }
    Ok(())
}
