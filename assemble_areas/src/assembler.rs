use anyhow::Result;

use osm_model::{
    AreaBuffer, AreaBuilder, InnerRingBuilder, NodeID, NodeRef, OuterRingBuilder, Relation,
    TagListBuilder, WayBuffer,
};

use crate::proto_ring::RingArena;
use crate::segment::{calculate_intersection, is_below, outside_x_range, y_range_overlap};
use crate::{NodeRefSegment, Problem, ProblemKind, ProtoRing, RingId};

/// Assembles area objects from multipolygon relations and their member ways.
/// The caller collects the members into a `WayBuffer` and calls `assemble`
/// once per relation; results land in the `AreaBuffer`.
///
/// One instance holds the working vectors for a single invocation at a time.
/// Use one instance per thread.
pub struct Assembler {
    /// Problems found in the input, accumulated across invocations until
    /// cleared.
    problems: Vec<Problem>,
    remember_problems: bool,
    debug: bool,
    /// The way segments of the current invocation, sorted by location.
    segments: Vec<NodeRefSegment>,
    /// The rings being grown from those segments.
    rings: RingArena,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler {
            problems: Vec::new(),
            remember_problems: false,
            debug: false,
            segments: Vec::new(),
            rings: RingArena::new(),
        }
    }

    /// Enable or disable diagnostic trace, routed through the `log` crate.
    /// Trace never affects results.
    pub fn enable_debug_output(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Enable or disable collection of problems found in the input. Off by
    /// default; when on, the list grows without bound until cleared, so
    /// callers chewing through planet-sized input should drain it regularly.
    pub fn remember_problems(&mut self, remember: bool) {
        self.remember_problems = remember;
    }

    pub fn clear_problems(&mut self) {
        self.problems.clear();
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Assembles one area from `relation` and the member ways at `members`
    /// offsets in `in_buffer`. The area always lands in `out_buffer`, but
    /// without rings if the geometry turns out broken; such problems are
    /// recorded, not raised. `Err` only reports collaborator failures, like a
    /// member offset pointing outside the buffer.
    pub fn assemble(
        &mut self,
        relation: &Relation,
        members: &[u64],
        in_buffer: &WayBuffer,
        out_buffer: &mut AreaBuffer,
    ) -> Result<()> {
        self.segments.clear();
        self.rings.clear();

        self.extract_segments_from_ways(members, in_buffer)?;

        if self.debug {
            debug!(
                "assemble {}: {} members, {} segments",
                relation.id,
                members.len(),
                self.segments.len()
            );
        }

        self.segments.sort_by(|s1, s2| s1.cmp_locations(s2));
        self.find_and_erase_duplicate_segments();

        let mut builder = AreaBuilder::new(out_buffer);
        self.initialize_area_from_relation(&mut builder, relation);
        // An area without rings is defined to be invalid. Committing here
        // means consumers see the invalid area even if a later step gives up.
        builder.commit();

        if self.find_intersections() {
            return Ok(());
        }

        self.build_rings();

        if self.check_for_open_rings() {
            if self.debug {
                debug!("  not all rings are closed");
            }
            return Ok(());
        }

        let Some(outer_rings) = self.resolve_nesting() else {
            return Ok(());
        };

        self.add_rings_to_area(&mut builder, &outer_rings);
        Ok(())
    }

    /// Flattens the member ways into undirected segments, canonically
    /// oriented. Pairs that can't form a real edge are dropped here: missing
    /// locations, a node repeated back-to-back, or two distinct nodes sitting
    /// on the same spot.
    fn extract_segments_from_ways(&mut self, members: &[u64], in_buffer: &WayBuffer) -> Result<()> {
        for offset in members {
            let way = in_buffer.get(*offset)?;
            let mut last: Option<NodeRef> = None;
            for node_ref in &way.node_refs {
                if let Some(last_nr) = last {
                    if last_nr.location().is_valid()
                        && node_ref.location().is_valid()
                        && last_nr.id() != node_ref.id()
                        && last_nr.location() != node_ref.location()
                    {
                        self.segments.push(NodeRefSegment::new(last_nr, *node_ref));
                    }
                }
                last = Some(*node_ref);
            }
        }
        Ok(())
    }

    /// Coincident segments cancel in pairs: two ways running along the same
    /// edge bound no area between them. An odd count leaves one copy behind.
    fn find_and_erase_duplicate_segments(&mut self) {
        loop {
            match self.segments.windows(2).position(|pair| pair[0] == pair[1]) {
                Some(idx) => {
                    if self.debug {
                        debug!("  erase duplicate segment {}", self.segments[idx]);
                    }
                    self.segments.drain(idx..idx + 2);
                }
                None => break,
            }
        }
    }

    fn initialize_area_from_relation(&self, builder: &mut AreaBuilder, relation: &Relation) {
        let area = builder.object();
        area.id = relation.id.to_area_id();
        area.version = relation.version;
        area.changeset = relation.changeset;
        area.timestamp = relation.timestamp;
        area.visible = relation.visible;
        area.uid = relation.uid;
        builder.add_user(&relation.user);

        let mut tl_builder = TagListBuilder::new(builder);
        for (key, value) in relation.tags.iter() {
            tl_builder.add_tag(key, value);
        }
    }

    /// Any pair of properly crossing segments makes the multipolygon invalid.
    /// Crossings are recorded as problems; the caller abandons ring
    /// construction if any were found.
    fn find_intersections(&mut self) -> bool {
        let mut found = false;
        for i in 0..self.segments.len() {
            for j in i + 1..self.segments.len() {
                let s1 = self.segments[i];
                let s2 = self.segments[j];
                if s1 == s2 {
                    // Duplicates were erased in pairs, so an equal pair here
                    // is an odd-count leftover lying on top of itself. Worth
                    // a note, but it doesn't cross anything.
                    if self.debug {
                        debug!("  found overlap on segment {}", s1);
                    }
                    continue;
                }
                if outside_x_range(&s2, &s1) {
                    break;
                }
                if !y_range_overlap(&s1, &s2) {
                    continue;
                }
                if let Some(intersection) = calculate_intersection(&s1, &s2) {
                    found = true;
                    if self.debug {
                        debug!("  segments {} and {} intersect at {}", s1, s2, intersection);
                    }
                    if self.remember_problems {
                        let node_ref = NodeRef::with_location(NodeID(0), intersection);
                        self.problems.push(Problem::with_segments(
                            ProblemKind::Intersection,
                            node_ref,
                            s1,
                            s2,
                        ));
                    }
                }
            }
        }
        found
    }

    /// Grows rings by attaching each segment, in sorted order, to an open
    /// ring whose endpoint shares a location with one of the segment's
    /// endpoints. A segment that matches nothing seeds a new ring, classified
    /// by the winding sweep.
    fn build_rings(&mut self) {
        for idx in 0..self.segments.len() {
            if self.debug {
                debug!("  check segment {}", self.segments[idx]);
            }

            match self.find_open_ring(&self.segments[idx]) {
                Some((ring_id, node_ref, at_end)) => {
                    self.combine_rings(idx, node_ref, ring_id, at_end);
                }
                None => {
                    let (cw, left) = self.classify_winding(idx);
                    if self.debug {
                        debug!(
                            "    new {} ring for segment {}",
                            if cw { "cw" } else { "ccw" },
                            self.segments[idx]
                        );
                    }
                    self.segments[idx].set_cw(cw);
                    if let Some(left_idx) = left {
                        self.segments[idx].set_left_segment(left_idx);
                    }
                    let ring_id = self.rings.insert(ProtoRing::from_segment(&self.segments[idx]));
                    self.segments[idx].set_ring(ring_id);
                }
            }
        }
    }

    /// The four attachment cases, tested in order against each open ring;
    /// the first match wins. Returns the ring, the node the ring grows by,
    /// and whether it grows at the end.
    fn find_open_ring(&self, segment: &NodeRefSegment) -> Option<(RingId, NodeRef, bool)> {
        let first = segment.first();
        let second = segment.second();
        for (id, ring) in self.rings.iter() {
            if ring.closed() {
                continue;
            }
            if ring.last().location() == first.location() {
                return Some((id, second, true));
            }
            if ring.last().location() == second.location() {
                return Some((id, first, true));
            }
            if ring.first().location() == first.location() {
                return Some((id, second, false));
            }
            if ring.first().location() == second.location() {
                return Some((id, first, false));
            }
        }
        None
    }

    /// Attaches a segment to a ring: extend the chain, pinch off a closed
    /// subring if the new node landed on the chain's own interior, then try
    /// to merge another open ring continuing from the extended endpoint.
    fn combine_rings(&mut self, idx: usize, node_ref: NodeRef, ring_id: RingId, at_end: bool) {
        if self.debug {
            debug!("    attach {} to {}", self.segments[idx], self.rings.get(ring_id));
        }
        let cw = self.rings.get(ring_id).cw();
        self.segments[idx].set_ring(ring_id);
        self.segments[idx].set_cw(cw);

        if at_end {
            self.rings.get_mut(ring_id).add_location_end(node_ref);
            self.split_closed_subring_end(ring_id, node_ref);
            if let Some(old) = self.combine_open_rings_end(ring_id) {
                self.update_ring_links(old, ring_id);
            }
        } else {
            self.rings.get_mut(ring_id).add_location_start(node_ref);
            self.split_closed_subring_start(ring_id, node_ref);
            if let Some(old) = self.combine_open_rings_start(ring_id) {
                self.update_ring_links(old, ring_id);
            }
        }
    }

    /// After extending a ring at the end: closing the ring is closure, and a
    /// node landing on an interior location splits the tail off as its own
    /// closed ring. Returns whether either happened.
    fn split_closed_subring_end(&mut self, ring_id: RingId, node_ref: NodeRef) -> bool {
        let loc = node_ref.location();
        let ring = self.rings.get(ring_id);
        if loc == ring.first().location() {
            if self.debug {
                debug!("    ring now closed: {}", ring);
            }
            return true;
        }
        let interior = ring.len() - 1;
        let found = ring
            .nodes()
            .iter()
            .take(interior)
            .position(|nr| nr.location() == loc);
        let Some(at) = found else {
            return false;
        };
        let sub = self.rings.get_mut(ring_id).split_end(at);
        if self.debug {
            debug!("    split subring {} off {}", sub, self.rings.get(ring_id));
        }
        let sub_id = self.rings.insert(sub);
        self.relink_split_segments(ring_id, sub_id);
        true
    }

    /// Mirror image of `split_closed_subring_end` for the start of the ring.
    fn split_closed_subring_start(&mut self, ring_id: RingId, node_ref: NodeRef) -> bool {
        let loc = node_ref.location();
        let ring = self.rings.get(ring_id);
        if loc == ring.last().location() {
            if self.debug {
                debug!("    ring now closed: {}", ring);
            }
            return true;
        }
        let found = ring
            .nodes()
            .iter()
            .skip(1)
            .position(|nr| nr.location() == loc);
        let Some(at) = found else {
            return false;
        };
        let sub = self.rings.get_mut(ring_id).split_start(at + 1);
        if self.debug {
            debug!("    split subring {} off {}", sub, self.rings.get(ring_id));
        }
        let sub_id = self.rings.insert(sub);
        self.relink_split_segments(ring_id, sub_id);
        true
    }

    /// After a split both chains came out of `parent`; each segment moves to
    /// whichever ring actually contains its endpoints now.
    fn relink_split_segments(&mut self, parent: RingId, sub: RingId) {
        for idx in 0..self.segments.len() {
            if self.segments[idx].ring() != Some(parent) {
                continue;
            }
            let segment = self.segments[idx];
            if self.rings.get(sub).contains_segment(&segment) {
                self.segments[idx].set_ring(sub);
            }
        }
    }

    /// Merges an open ring that continues from this ring's end, reversing it
    /// if it presents the wrong endpoint (segments are undirected). Returns
    /// the consumed ring's id so segment links can be updated.
    fn combine_open_rings_end(&mut self, ring_id: RingId) -> Option<RingId> {
        let location = self.rings.get(ring_id).last().location();
        let mut found = None;
        for (id, other) in self.rings.iter() {
            if id == ring_id || other.closed() {
                continue;
            }
            if other.first().location() == location {
                found = Some((id, false));
                break;
            }
            if other.last().location() == location {
                found = Some((id, true));
                break;
            }
        }
        let (other_id, needs_reverse) = found?;
        let mut other = self.rings.remove(other_id);
        if needs_reverse {
            other.reverse();
        }
        self.rings.get_mut(ring_id).merge_ring(other);
        if self.debug {
            debug!("    merged into {}", self.rings.get(ring_id));
        }
        Some(other_id)
    }

    /// Mirror image of `combine_open_rings_end` for the start of the ring.
    fn combine_open_rings_start(&mut self, ring_id: RingId) -> Option<RingId> {
        let location = self.rings.get(ring_id).first().location();
        let mut found = None;
        for (id, other) in self.rings.iter() {
            if id == ring_id || other.closed() {
                continue;
            }
            if other.last().location() == location {
                found = Some((id, false));
                break;
            }
            if other.first().location() == location {
                found = Some((id, true));
                break;
            }
        }
        let (other_id, needs_reverse) = found?;
        let mut other = self.rings.remove(other_id);
        if needs_reverse {
            other.reverse();
        }
        self.rings.get_mut(ring_id).merge_ring_start(other);
        if self.debug {
            debug!("    merged into {}", self.rings.get(ring_id));
        }
        Some(other_id)
    }

    /// Rings were merged or split; every segment pointing at the dead ring
    /// now belongs to the survivor.
    fn update_ring_links(&mut self, old_ring: RingId, new_ring: RingId) {
        for segment in &mut self.segments {
            if segment.ring() == Some(old_ring) {
                segment.set_ring(new_ring);
            }
        }
    }

    /// Decides the winding of a ring seeded at `idx` by sweeping backwards
    /// (leftwards) through already-processed segments: the nearest segment to
    /// the left of the seed's smaller endpoint carries the opposite winding.
    /// With nothing to the left this is an outermost ring, clockwise. Also
    /// returns the left neighbor, which nesting follows later.
    fn classify_winding(&self, idx: usize) -> (bool, Option<usize>) {
        let p = self.segments[idx].first().location();
        for j in (0..idx).rev() {
            let candidate = &self.segments[j];
            let y1 = candidate.first().location().y();
            let y2 = candidate.second().location().y();
            if y1.min(y2) > p.y() || y1.max(y2) < p.y() {
                continue;
            }
            if candidate.first().location().x() < p.x() && candidate.second().location().x() < p.x()
            {
                return (!candidate.cw(), Some(j));
            }
            if is_below(p, candidate) {
                return (!candidate.cw(), Some(j));
            }
        }
        (true, None)
    }

    /// Both loose endpoints of every open chain become problems; any open
    /// chain means the multipolygon can't be assembled.
    fn check_for_open_rings(&mut self) -> bool {
        let mut open_rings = false;
        for (_, ring) in self.rings.iter() {
            if ring.closed() {
                continue;
            }
            open_rings = true;
            if self.remember_problems {
                self.problems
                    .push(Problem::new(ProblemKind::RingNotClosed, ring.first()));
                self.problems
                    .push(Problem::new(ProblemKind::RingNotClosed, ring.last()));
            }
        }
        open_rings
    }

    /// Partitions rings by winding and hangs each inner ring off the outer
    /// ring its left-segment chain leads to. Returns the outer rings, or
    /// None when some hole has no identifiable enclosure.
    fn resolve_nesting(&mut self) -> Option<Vec<RingId>> {
        let mut outer_rings = Vec::new();
        let mut inner_rings = Vec::new();
        for (id, ring) in self.rings.iter() {
            if ring.is_outer() {
                if self.debug {
                    debug!("  outer: {}", ring);
                }
                outer_rings.push(id);
            } else {
                if self.debug {
                    debug!("  inner: {}", ring);
                }
                inner_rings.push(id);
            }
        }
        for inner in inner_rings {
            let Some(outer) = self.find_outer(inner) else {
                if self.debug {
                    debug!("  no enclosing outer ring for {}", self.rings.get(inner));
                }
                return None;
            };
            self.rings.get_mut(outer).add_inner_ring(inner);
        }
        Some(outer_rings)
    }

    /// The enclosing outer ring of an inner ring: start from the ring's
    /// lowest-sorted segment and follow recorded left neighbors until one
    /// belongs to an outer ring.
    fn find_outer(&self, inner: RingId) -> Option<RingId> {
        let seed = self
            .segments
            .iter()
            .position(|segment| segment.ring() == Some(inner))?;
        let mut left = self.segments[seed].left_segment();
        while let Some(j) = left {
            let ring_id = self.segments[j].ring()?;
            if self.rings.get(ring_id).is_outer() {
                return Some(ring_id);
            }
            left = self.segments[j].left_segment();
        }
        None
    }

    fn add_rings_to_area(&self, builder: &mut AreaBuilder, outer_rings: &[RingId]) {
        for id in outer_rings {
            let ring = self.rings.get(*id);
            {
                let mut ring_builder = OuterRingBuilder::new(builder);
                for node_ref in ring.nodes() {
                    ring_builder.add_node_ref(*node_ref);
                }
            }
            for inner_id in ring.inner_rings() {
                let inner = self.rings.get(*inner_id);
                let mut ring_builder = InnerRingBuilder::new(builder);
                for node_ref in inner.nodes() {
                    ring_builder.add_node_ref(*node_ref);
                }
            }
            builder.commit();
        }
    }
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler::new()
    }
}
