//! Whole-pipeline tests: feed relations through the assembler and check the
//! areas that come out of the buffer.

use assemble_areas::{Assembler, ProblemKind};
use osm_model::{
    Area, AreaBuffer, Location, NodeID, NodeRef, Relation, RelationID, Way, WayBuffer, WayID,
};

fn nr(id: i64, x: i32, y: i32) -> NodeRef {
    NodeRef::with_location(NodeID(id), Location::new(x, y))
}

fn way(id: i64, node_refs: Vec<NodeRef>) -> Way {
    let mut way = Way::new(WayID(id));
    way.node_refs = node_refs;
    way
}

fn assemble(ways: Vec<Way>) -> (AreaBuffer, Assembler) {
    let mut in_buffer = WayBuffer::new();
    let members: Vec<u64> = ways.into_iter().map(|w| in_buffer.add_way(w)).collect();

    let mut relation = Relation::new(RelationID(123));
    relation.version = 2;
    relation.user = "mapper".to_string();
    relation.tags.insert("type", "multipolygon");
    relation.tags.insert("natural", "water");

    let mut out_buffer = AreaBuffer::new();
    let mut assembler = Assembler::new();
    assembler.remember_problems(true);
    assembler
        .assemble(&relation, &members, &in_buffer, &mut out_buffer)
        .unwrap();
    (out_buffer, assembler)
}

fn committed_area(buffer: &AreaBuffer) -> &Area {
    assert_eq!(buffer.committed().len(), 1);
    &buffer.committed()[0]
}

/// A ring as locations, ignoring rotation and direction: drop the closing
/// node, rotate the smallest location to the front, and take the smaller of
/// the two traversal directions.
fn normalize(ring: &[NodeRef]) -> Vec<(i32, i32)> {
    let mut pts: Vec<(i32, i32)> = ring
        .iter()
        .map(|n| (n.location().x(), n.location().y()))
        .collect();
    assert!(pts.len() >= 4);
    assert_eq!(pts.first(), pts.last());
    pts.pop();

    fn rotate_to_min(pts: &[(i32, i32)]) -> Vec<(i32, i32)> {
        let start = pts
            .iter()
            .enumerate()
            .min_by_key(|(_, pt)| **pt)
            .unwrap()
            .0;
        pts.iter()
            .cycle()
            .skip(start)
            .take(pts.len())
            .copied()
            .collect()
    }

    let fwd = rotate_to_min(&pts);
    pts.reverse();
    let rev = rotate_to_min(&pts);
    fwd.min(rev)
}

fn outer_rings(area: &Area) -> Vec<Vec<(i32, i32)>> {
    let mut rings: Vec<Vec<(i32, i32)>> = area
        .outers
        .iter()
        .map(|outer| normalize(&outer.node_refs))
        .collect();
    rings.sort();
    rings
}

fn square() -> Way {
    way(
        1,
        vec![
            nr(1, 0, 0),
            nr(2, 10, 0),
            nr(3, 10, 10),
            nr(4, 0, 10),
            nr(1, 0, 0),
        ],
    )
}

const SQUARE: [(i32, i32); 4] = [(0, 0), (0, 10), (10, 10), (10, 0)];

#[test]
fn single_square() {
    let (out, assembler) = assemble(vec![square()]);
    let area = committed_area(&out);

    assert_eq!(area.id, 247);
    assert_eq!(area.version, 2);
    assert_eq!(area.user, "mapper");
    assert!(area.tags.is("natural", "water"));

    assert_eq!(outer_rings(area), vec![SQUARE.to_vec()]);
    assert!(area.outers[0].inners.is_empty());
    assert!(assembler.problems().is_empty());
}

#[test]
fn square_with_square_hole() {
    let hole = way(
        2,
        vec![
            nr(5, 2, 2),
            nr(6, 2, 8),
            nr(7, 8, 8),
            nr(8, 8, 2),
            nr(5, 2, 2),
        ],
    );
    let (out, assembler) = assemble(vec![square(), hole]);
    let area = committed_area(&out);

    assert_eq!(outer_rings(area), vec![SQUARE.to_vec()]);
    assert_eq!(area.outers[0].inners.len(), 1);
    assert_eq!(
        normalize(&area.outers[0].inners[0]),
        vec![(2, 2), (2, 8), (8, 8), (8, 2)]
    );
    assert!(assembler.problems().is_empty());
}

#[test]
fn split_outer_glues_back_together() {
    let half1 = way(1, vec![nr(1, 0, 0), nr(2, 10, 0), nr(3, 10, 10)]);
    let half2 = way(2, vec![nr(3, 10, 10), nr(4, 0, 10), nr(1, 0, 0)]);

    let (out, assembler) = assemble(vec![half1, half2]);
    let area = committed_area(&out);
    assert_eq!(outer_rings(area), vec![SQUARE.to_vec()]);
    assert!(assembler.problems().is_empty());
}

#[test]
fn shared_edge_cancels() {
    // Two squares side by side; the edge they share vanishes and one outline
    // of the union remains.
    let left = square();
    let right = way(
        2,
        vec![
            nr(2, 10, 0),
            nr(5, 20, 0),
            nr(6, 20, 10),
            nr(3, 10, 10),
            nr(2, 10, 0),
        ],
    );

    let (out, assembler) = assemble(vec![left, right]);
    let area = committed_area(&out);
    assert_eq!(
        outer_rings(area),
        vec![vec![
            (0, 0),
            (0, 10),
            (10, 10),
            (20, 10),
            (20, 0),
            (10, 0),
        ]]
    );
    assert!(assembler.problems().is_empty());
}

#[test]
fn self_touching_way_splits_into_two_rings() {
    // One way tracing two triangles that share node 9: the chain revisits
    // that location partway through, which pinches the first loop off as its
    // own closed ring. Both loops come out as separate outer rings.
    let pinched = way(
        1,
        vec![
            nr(9, 2, 2),
            nr(1, 0, 0),
            nr(2, 4, 0),
            nr(9, 2, 2),
            nr(3, 0, 4),
            nr(4, 4, 4),
            nr(9, 2, 2),
        ],
    );

    let (out, assembler) = assemble(vec![pinched]);
    let area = committed_area(&out);
    assert!(area.is_valid());
    assert_eq!(
        outer_rings(area),
        vec![
            vec![(0, 0), (2, 2), (4, 0)],
            vec![(0, 4), (2, 2), (4, 4)],
        ]
    );
    for outer in &area.outers {
        assert!(outer.inners.is_empty());
    }
    assert!(assembler.problems().is_empty());
}

#[test]
fn hole_without_identifiable_enclosure_aborts() {
    // A pinched (self-touching) hole splits into two inner rings. The ring
    // keeping the later half of the chain has no recorded left neighbor to
    // walk, so no enclosing outer can be identified and assembly gives up
    // with the header-only area already committed. Unlike the intersection
    // and open-ring cases, nothing is recorded as a problem.
    let outer = way(
        1,
        vec![
            nr(1, 0, 0),
            nr(2, 20, 0),
            nr(3, 20, 20),
            nr(4, 0, 20),
            nr(1, 0, 0),
        ],
    );
    let hole = way(
        2,
        vec![
            nr(9, 6, 6),
            nr(5, 4, 4),
            nr(6, 8, 4),
            nr(9, 6, 6),
            nr(7, 4, 8),
            nr(8, 8, 8),
            nr(9, 6, 6),
        ],
    );

    let (out, assembler) = assemble(vec![outer, hole]);
    let area = committed_area(&out);
    assert!(!area.is_valid());
    assert!(area.outers.is_empty());
    assert!(assembler.problems().is_empty());
}

#[test]
fn bowtie_is_invalid() {
    let bowtie = way(
        1,
        vec![
            nr(1, 0, 0),
            nr(2, 10, 10),
            nr(3, 10, 0),
            nr(4, 0, 10),
            nr(1, 0, 0),
        ],
    );

    let (out, assembler) = assemble(vec![bowtie]);
    let area = committed_area(&out);
    assert!(!area.is_valid());
    assert!(area.outers.is_empty());

    assert_eq!(assembler.problems().len(), 1);
    let problem = &assembler.problems()[0];
    assert_eq!(problem.kind, ProblemKind::Intersection);
    assert_eq!(problem.node_ref.id(), NodeID(0));
    assert_eq!(problem.node_ref.location(), Location::new(5, 5));
    assert!(problem.segments.is_some());
}

#[test]
fn unclosed_ring_is_invalid() {
    let open = way(1, vec![nr(1, 0, 0), nr(2, 10, 0), nr(3, 10, 10)]);

    let (out, assembler) = assemble(vec![open]);
    let area = committed_area(&out);
    assert!(!area.is_valid());

    assert_eq!(assembler.problems().len(), 2);
    for problem in assembler.problems() {
        assert_eq!(problem.kind, ProblemKind::RingNotClosed);
    }
    let mut endpoints: Vec<Location> = assembler
        .problems()
        .iter()
        .map(|problem| problem.node_ref.location())
        .collect();
    endpoints.sort();
    assert_eq!(endpoints, vec![Location::new(0, 0), Location::new(10, 10)]);
}

#[test]
fn reversing_a_way_changes_nothing() {
    let hole = vec![
        nr(5, 2, 2),
        nr(6, 2, 8),
        nr(7, 8, 8),
        nr(8, 8, 2),
        nr(5, 2, 2),
    ];
    let mut reversed = hole.clone();
    reversed.reverse();

    let (out1, _) = assemble(vec![square(), way(2, hole)]);
    let (out2, _) = assemble(vec![square(), way(2, reversed)]);

    let area1 = committed_area(&out1);
    let area2 = committed_area(&out2);
    assert_eq!(outer_rings(area1), outer_rings(area2));
    assert_eq!(
        normalize(&area1.outers[0].inners[0]),
        normalize(&area2.outers[0].inners[0])
    );
}

#[test]
fn member_order_changes_nothing() {
    let half1 = way(1, vec![nr(1, 0, 0), nr(2, 10, 0), nr(3, 10, 10)]);
    let half2 = way(2, vec![nr(3, 10, 10), nr(4, 0, 10), nr(1, 0, 0)]);

    let (out1, _) = assemble(vec![half1.clone(), half2.clone()]);
    let (out2, _) = assemble(vec![half2, half1]);
    assert_eq!(
        outer_rings(committed_area(&out1)),
        outer_rings(committed_area(&out2))
    );
}

#[test]
fn even_copies_cancel_odd_copies_survive() {
    let (out, assembler) = assemble(vec![square(), square()]);
    let area = committed_area(&out);
    assert!(area.outers.is_empty());
    assert!(assembler.problems().is_empty());

    let (out, _) = assemble(vec![square(), square(), square()]);
    assert_eq!(outer_rings(committed_area(&out)), vec![SQUARE.to_vec()]);
}

#[test]
fn emission_is_idempotent() {
    let (out, _) = assemble(vec![square()]);
    let emitted = committed_area(&out).outers[0].node_refs.clone();

    let (again, _) = assemble(vec![way(1, emitted)]);
    assert_eq!(outer_rings(committed_area(&again)), vec![SQUARE.to_vec()]);
}

#[test]
fn problems_accumulate_until_cleared() {
    let open = || way(1, vec![nr(1, 0, 0), nr(2, 10, 0), nr(3, 10, 10)]);

    let mut in_buffer = WayBuffer::new();
    let members = vec![in_buffer.add_way(open())];
    let relation = Relation::new(RelationID(9));
    let mut out_buffer = AreaBuffer::new();

    let mut assembler = Assembler::new();
    assembler.remember_problems(true);
    assembler
        .assemble(&relation, &members, &in_buffer, &mut out_buffer)
        .unwrap();
    assembler
        .assemble(&relation, &members, &in_buffer, &mut out_buffer)
        .unwrap();
    assert_eq!(assembler.problems().len(), 4);

    assembler.clear_problems();
    assert!(assembler.problems().is_empty());
    assert_eq!(out_buffer.committed().len(), 2);
}

#[test]
fn bad_member_offset_is_an_error() {
    let in_buffer = WayBuffer::new();
    let relation = Relation::new(RelationID(1));
    let mut out_buffer = AreaBuffer::new();
    let mut assembler = Assembler::new();
    assert!(assembler
        .assemble(&relation, &[42], &in_buffer, &mut out_buffer)
        .is_err());
}
