use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use osm_model::NodeRef;

use crate::NodeRefSegment;

/// Stable handle to a ring in a `RingArena`. Handles stay valid while other
/// rings are merged away; a removed ring's slot is never reused within an
/// invocation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RingId(usize);

/// A possibly-open ring under construction: an ordered chain of node
/// references, the winding assigned when the ring was created, and the inner
/// rings attached during nesting.
///
/// The chain grows at both ends, so it lives in a `VecDeque`. A ring never
/// owns its segments; segments point back at the ring claiming them, and the
/// assembler keeps those links fresh across merges and splits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtoRing {
    nodes: VecDeque<NodeRef>,
    cw: bool,
    inner: Vec<RingId>,
}

impl ProtoRing {
    /// Seeds a ring from a single segment. The segment's winding flag must
    /// already be assigned.
    pub fn from_segment(segment: &NodeRefSegment) -> ProtoRing {
        ProtoRing {
            nodes: VecDeque::from([segment.first(), segment.second()]),
            cw: segment.cw(),
            inner: Vec::new(),
        }
    }

    pub fn first(&self) -> NodeRef {
        self.nodes[0]
    }

    pub fn last(&self) -> NodeRef {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &VecDeque<NodeRef> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cw(&self) -> bool {
        self.cw
    }

    /// Outer rings wrap their content clockwise; holes run the other way.
    pub fn is_outer(&self) -> bool {
        self.cw
    }

    pub fn inner_rings(&self) -> &[RingId] {
        &self.inner
    }

    pub(crate) fn add_inner_ring(&mut self, id: RingId) {
        self.inner.push(id);
    }

    /// Closed: the endpoints share a location and there are at least three
    /// distinct points in between.
    pub fn closed(&self) -> bool {
        self.nodes.len() > 3 && self.first().location() == self.last().location()
    }

    pub(crate) fn add_location_end(&mut self, node_ref: NodeRef) {
        self.nodes.push_back(node_ref);
    }

    pub(crate) fn add_location_start(&mut self, node_ref: NodeRef) {
        self.nodes.push_front(node_ref);
    }

    pub(crate) fn reverse(&mut self) {
        self.nodes.make_contiguous().reverse();
    }

    /// Appends `other` to the end of this ring. The two rings share the join
    /// node; it is kept once.
    pub(crate) fn merge_ring(&mut self, other: ProtoRing) {
        self.nodes.extend(other.nodes.into_iter().skip(1));
    }

    /// Prepends `other`: swap chains, then append what used to be ours.
    pub(crate) fn merge_ring_start(&mut self, mut other: ProtoRing) {
        std::mem::swap(&mut self.nodes, &mut other.nodes);
        self.merge_ring(other);
    }

    /// The node just appended at the end landed on the interior location at
    /// index `at`: pinch the tail [at..] off as its own closed ring and keep
    /// the chain up to and including `at`.
    pub(crate) fn split_end(&mut self, at: usize) -> ProtoRing {
        let tail: VecDeque<NodeRef> = self.nodes.iter().skip(at).copied().collect();
        self.nodes.truncate(at + 1);
        ProtoRing {
            nodes: tail,
            cw: self.cw,
            inner: Vec::new(),
        }
    }

    /// Mirror image of `split_end` for a node just prepended at the start:
    /// the head [..=at] comes off as a closed ring, the chain keeps [at..].
    pub(crate) fn split_start(&mut self, at: usize) -> ProtoRing {
        let head: VecDeque<NodeRef> = self.nodes.iter().take(at + 1).copied().collect();
        self.nodes.drain(..at);
        ProtoRing {
            nodes: head,
            cw: self.cw,
            inner: Vec::new(),
        }
    }

    /// Does this chain contain the segment as a consecutive pair of nodes, in
    /// either direction, by location?
    pub(crate) fn contains_segment(&self, segment: &NodeRefSegment) -> bool {
        let a = segment.first().location();
        let b = segment.second().location();
        self.nodes
            .iter()
            .zip(self.nodes.iter().skip(1))
            .any(|(m, n)| {
                let (p, q) = (m.location(), n.location());
                (p == a && q == b) || (p == b && q == a)
            })
    }
}

impl fmt::Display for ProtoRing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ring[")?;
        for (idx, node_ref) in self.nodes.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", node_ref)?;
        }
        write!(f, "]")
    }
}

/// Ring storage with stable ids: a slot vector with tombstones, iterated in
/// creation order. Merging rings removes one of them mid-iteration-order
/// without disturbing anyone else's handle.
#[derive(Clone, Debug, Default)]
pub struct RingArena {
    slots: Vec<Option<ProtoRing>>,
}

impl RingArena {
    pub fn new() -> RingArena {
        RingArena { slots: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn insert(&mut self, ring: ProtoRing) -> RingId {
        self.slots.push(Some(ring));
        RingId(self.slots.len() - 1)
    }

    pub fn remove(&mut self, id: RingId) -> ProtoRing {
        self.slots[id.0].take().unwrap()
    }

    pub fn get(&self, id: RingId) -> &ProtoRing {
        self.slots[id.0].as_ref().unwrap()
    }

    pub fn get_mut(&mut self, id: RingId) -> &mut ProtoRing {
        self.slots[id.0].as_mut().unwrap()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RingId, &ProtoRing)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|ring| (RingId(idx), ring)))
    }

    /// Live rings only.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
