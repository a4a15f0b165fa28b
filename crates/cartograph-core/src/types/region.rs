//! Point-in-ring containment.

use super::PointD;

/// Test whether `p` lies inside the polygon ring `ring`.
///
/// Uses the even-odd (ray casting) rule with a ray cast toward positive x.
/// The ring may be given open or explicitly closed (first vertex repeated at
/// the end); both forms yield the same answer. Rings with fewer than three
/// vertices contain nothing.
///
/// Points exactly on an edge may land on either side; the feature codec only
/// uses this test to filter hole rings, where boundary cases are already
/// degenerate input.
#[must_use]
pub fn ring_contains(ring: &[PointD], p: PointD) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
