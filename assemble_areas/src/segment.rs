use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use osm_model::{Location, NodeRef};

use crate::RingId;

/// An undirected edge between two node references, stored in canonical
/// orientation: `first` is the endpoint with the smaller (x, y) location.
///
/// Segments also carry the assembler's working state: which proto-ring
/// currently claims the segment, the winding assigned to it, and the index of
/// the segment found immediately to its left during the winding sweep. None
/// of that state takes part in equality.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NodeRefSegment {
    first: NodeRef,
    second: NodeRef,
    ring: Option<RingId>,
    cw: bool,
    left_segment: Option<usize>,
}

impl NodeRefSegment {
    pub fn new(a: NodeRef, b: NodeRef) -> NodeRefSegment {
        let (first, second) = if b.location() < a.location() {
            (b, a)
        } else {
            (a, b)
        };
        NodeRefSegment {
            first,
            second,
            ring: None,
            cw: false,
            left_segment: None,
        }
    }

    pub fn first(&self) -> NodeRef {
        self.first
    }

    pub fn second(&self) -> NodeRef {
        self.second
    }

    pub fn ring(&self) -> Option<RingId> {
        self.ring
    }

    pub(crate) fn set_ring(&mut self, ring: RingId) {
        self.ring = Some(ring);
    }

    pub fn cw(&self) -> bool {
        self.cw
    }

    pub(crate) fn set_cw(&mut self, cw: bool) {
        self.cw = cw;
    }

    pub fn left_segment(&self) -> Option<usize> {
        self.left_segment
    }

    pub(crate) fn set_left_segment(&mut self, idx: usize) {
        self.left_segment = Some(idx);
    }

    /// Sort key: (first.x, first.y, second.x, second.y). Equality compares
    /// node ids instead, so this is a standalone comparator rather than Ord.
    pub fn cmp_locations(&self, other: &NodeRefSegment) -> Ordering {
        (self.first.location(), self.second.location())
            .cmp(&(other.first.location(), other.second.location()))
    }
}

impl PartialEq for NodeRefSegment {
    fn eq(&self, other: &NodeRefSegment) -> bool {
        self.first == other.first && self.second == other.second
    }
}

impl Eq for NodeRefSegment {}

impl fmt::Display for NodeRefSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}--{}", self.first, self.second)
    }
}

/// True if `s2` lies entirely right of `s1` on the x axis. Segments are
/// visited in sorted order, so once this holds for one s2 it holds for every
/// later one and the scan can stop.
pub(crate) fn outside_x_range(s2: &NodeRefSegment, s1: &NodeRefSegment) -> bool {
    s2.first().location().x() > s1.second().location().x()
}

pub(crate) fn y_range_overlap(s1: &NodeRefSegment, s2: &NodeRefSegment) -> bool {
    let (min1, max1) = y_range(s1);
    let (min2, max2) = y_range(s2);
    min1 <= max2 && min2 <= max1
}

fn y_range(s: &NodeRefSegment) -> (i32, i32) {
    let y1 = s.first().location().y();
    let y2 = s.second().location().y();
    (y1.min(y2), y1.max(y2))
}

/// Where two segments properly cross, if they do. Sharing an endpoint
/// location, touching without crossing, and collinear overlap all don't
/// count; only a crossing strictly inside both segments does. The crossing
/// point is rounded back to fixed-point.
pub(crate) fn calculate_intersection(
    s1: &NodeRefSegment,
    s2: &NodeRefSegment,
) -> Option<Location> {
    let a = s1.first().location();
    let b = s1.second().location();
    let c = s2.first().location();
    let d = s2.second().location();
    if a == c || a == d || b == c || b == d {
        return None;
    }

    let d1 = orient(a, b, c);
    let d2 = orient(a, b, d);
    if d1 == 0 || d2 == 0 || (d1 > 0) == (d2 > 0) {
        return None;
    }
    let d3 = orient(c, d, a);
    let d4 = orient(c, d, b);
    if d3 == 0 || d4 == 0 || (d3 > 0) == (d4 > 0) {
        return None;
    }

    // c and d sit on opposite sides of ab, at signed distances proportional
    // to d1 and d2. Interpolate along cd to where that distance is zero.
    let t = d1 as f64 / (d1 - d2) as f64;
    let x = f64::from(c.x()) + t * (f64::from(d.x()) - f64::from(c.x()));
    let y = f64::from(c.y()) + t * (f64::from(d.y()) - f64::from(c.y()));
    Some(Location::new(x.round() as i32, y.round() as i32))
}

/// True if `loc` is on or below the supporting line of `seg`.
pub(crate) fn is_below(loc: Location, seg: &NodeRefSegment) -> bool {
    orient(seg.first().location(), seg.second().location(), loc) <= 0
}

fn orient(a: Location, b: Location, c: Location) -> i128 {
    let abx = i128::from(b.x()) - i128::from(a.x());
    let aby = i128::from(b.y()) - i128::from(a.y());
    let acx = i128::from(c.x()) - i128::from(a.x());
    let acy = i128::from(c.y()) - i128::from(a.y());
    abx * acy - aby * acx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RingArena;
    use osm_model::NodeID;

    fn nr(id: i64, x: i32, y: i32) -> NodeRef {
        NodeRef::with_location(NodeID(id), Location::new(x, y))
    }

    fn seg(x1: i32, y1: i32, x2: i32, y2: i32) -> NodeRefSegment {
        NodeRefSegment::new(nr(1, x1, y1), nr(2, x2, y2))
    }

    #[test]
    fn canonical_orientation() {
        let s = NodeRefSegment::new(nr(1, 10, 0), nr(2, 0, 0));
        assert_eq!(s.first().location(), Location::new(0, 0));
        assert_eq!(s.second().location(), Location::new(10, 0));

        // Same x: y breaks the tie.
        let s = NodeRefSegment::new(nr(1, 5, 9), nr(2, 5, 1));
        assert_eq!(s.first().location(), Location::new(5, 1));
    }

    #[test]
    fn equality_ignores_working_state() {
        use crate::ProtoRing;

        let mut a = seg(0, 0, 10, 0);
        let b = seg(0, 0, 10, 0);
        let mut arena = RingArena::new();
        let id = arena.insert(ProtoRing::from_segment(&b));
        a.set_cw(true);
        a.set_ring(id);
        a.set_left_segment(3);
        assert_eq!(a, b);
    }

    #[test]
    fn location_ordering() {
        let mut segments = vec![seg(5, 0, 6, 0), seg(0, 0, 10, 0), seg(0, 0, 0, 10)];
        segments.sort_by(|x, y| x.cmp_locations(y));
        assert_eq!(segments[0].second().location(), Location::new(0, 10));
        assert_eq!(segments[1].second().location(), Location::new(10, 0));
        assert_eq!(segments[2].first().location(), Location::new(5, 0));
    }

    #[test]
    fn x_range_early_exit() {
        assert!(outside_x_range(&seg(11, 0, 12, 0), &seg(0, 0, 10, 0)));
        assert!(!outside_x_range(&seg(10, 0, 12, 0), &seg(0, 0, 10, 0)));
    }

    #[test]
    fn y_ranges() {
        assert!(y_range_overlap(&seg(0, 0, 10, 10), &seg(0, 5, 10, 20)));
        assert!(!y_range_overlap(&seg(0, 0, 10, 1), &seg(0, 5, 10, 20)));
        // Touching counts as overlap; the intersection test sorts it out.
        assert!(y_range_overlap(&seg(0, 0, 10, 5), &seg(0, 5, 10, 20)));
    }

    #[test]
    fn proper_crossing() {
        let hit = calculate_intersection(&seg(0, 0, 10, 10), &seg(0, 10, 10, 0));
        assert_eq!(hit, Some(Location::new(5, 5)));
    }

    #[test]
    fn shared_endpoints_do_not_cross() {
        assert_eq!(
            calculate_intersection(&seg(0, 0, 10, 10), &seg(10, 10, 20, 0)),
            None
        );
    }

    #[test]
    fn touching_does_not_cross() {
        // s2 ends on the interior of s1.
        assert_eq!(
            calculate_intersection(&seg(0, 0, 10, 0), &seg(5, 0, 5, 10)),
            None
        );
    }

    #[test]
    fn collinear_overlap_does_not_cross() {
        assert_eq!(
            calculate_intersection(&seg(0, 0, 10, 0), &seg(2, 0, 12, 0)),
            None
        );
    }

    #[test]
    fn parallel_does_not_cross() {
        assert_eq!(
            calculate_intersection(&seg(0, 0, 10, 0), &seg(0, 1, 10, 1)),
            None
        );
    }

    #[test]
    fn below_the_line() {
        let s = seg(0, 0, 10, 0);
        assert!(is_below(Location::new(5, -1), &s));
        assert!(is_below(Location::new(5, 0), &s));
        assert!(!is_below(Location::new(5, 1), &s));
    }
}
