use serde::{Deserialize, Serialize};

use crate::{NodeRef, Tags};

/// An assembled area. Ids follow the shared convention: odd for areas built
/// from relations, even for areas built from closed ways.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Area {
    pub id: i64,
    pub version: u32,
    pub changeset: u64,
    pub timestamp: i64,
    pub visible: bool,
    pub uid: i64,
    pub user: String,
    pub tags: Tags,
    pub outers: Vec<OuterRing>,
}

impl Area {
    fn blank() -> Area {
        Area {
            id: 0,
            version: 0,
            changeset: 0,
            timestamp: 0,
            visible: true,
            uid: 0,
            user: String::new(),
            tags: Tags::empty(),
            outers: Vec::new(),
        }
    }

    /// An area without rings is defined to be invalid. One shows up whenever
    /// assembly gave up partway: the header was committed, the rings never
    /// arrived.
    pub fn is_valid(&self) -> bool {
        !self.outers.is_empty()
    }
}

/// One outer ring of an area, with the holes punched in it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OuterRing {
    pub node_refs: Vec<NodeRef>,
    pub inners: Vec<Vec<NodeRef>>,
}

/// Append-only output buffer for areas. Records become visible to consumers
/// at commit; anything written after the last commit is still in flight.
#[derive(Clone, Debug, Default)]
pub struct AreaBuffer {
    areas: Vec<Area>,
    committed: usize,
}

impl AreaBuffer {
    pub fn new() -> AreaBuffer {
        AreaBuffer {
            areas: Vec::new(),
            committed: 0,
        }
    }

    pub fn commit(&mut self) {
        self.committed = self.areas.len();
    }

    /// The committed records, in append order.
    pub fn committed(&self) -> &[Area] {
        &self.areas[..self.committed]
    }
}

/// Builds one area record in an `AreaBuffer`. The record starts blank and
/// invisible; `commit` exposes it in whatever state it is in. Committing the
/// bare header first and the rings later is deliberate: if assembly fails in
/// between, consumers still see the (invalid) area.
pub struct AreaBuilder<'a> {
    buffer: &'a mut AreaBuffer,
    idx: usize,
}

impl<'a> AreaBuilder<'a> {
    pub fn new(buffer: &'a mut AreaBuffer) -> AreaBuilder<'a> {
        buffer.areas.push(Area::blank());
        let idx = buffer.areas.len() - 1;
        AreaBuilder { buffer, idx }
    }

    /// The area record under construction.
    pub fn object(&mut self) -> &mut Area {
        &mut self.buffer.areas[self.idx]
    }

    pub fn add_user(&mut self, user: &str) {
        self.object().user = user.to_string();
    }

    pub fn commit(&mut self) {
        self.buffer.commit();
    }
}

pub struct TagListBuilder<'a, 'b> {
    builder: &'b mut AreaBuilder<'a>,
}

impl<'a, 'b> TagListBuilder<'a, 'b> {
    pub fn new(builder: &'b mut AreaBuilder<'a>) -> TagListBuilder<'a, 'b> {
        TagListBuilder { builder }
    }

    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.builder.object().tags.insert(key, value);
    }
}

/// Opens a new outer ring on the area under construction and appends node
/// references to it.
pub struct OuterRingBuilder<'a, 'b> {
    builder: &'b mut AreaBuilder<'a>,
    ring: usize,
}

impl<'a, 'b> OuterRingBuilder<'a, 'b> {
    pub fn new(builder: &'b mut AreaBuilder<'a>) -> OuterRingBuilder<'a, 'b> {
        let outers = &mut builder.object().outers;
        outers.push(OuterRing {
            node_refs: Vec::new(),
            inners: Vec::new(),
        });
        let ring = outers.len() - 1;
        OuterRingBuilder { builder, ring }
    }

    pub fn add_node_ref(&mut self, node_ref: NodeRef) {
        let ring = self.ring;
        self.builder.object().outers[ring].node_refs.push(node_ref);
    }
}

/// Opens a new inner ring on the most recently opened outer ring. Panics if
/// no outer ring has been opened yet; inner rings always follow their outer.
pub struct InnerRingBuilder<'a, 'b> {
    builder: &'b mut AreaBuilder<'a>,
    outer: usize,
    ring: usize,
}

impl<'a, 'b> InnerRingBuilder<'a, 'b> {
    pub fn new(builder: &'b mut AreaBuilder<'a>) -> InnerRingBuilder<'a, 'b> {
        let outers = &mut builder.object().outers;
        assert!(!outers.is_empty(), "inner ring without an outer ring");
        let outer = outers.len() - 1;
        outers[outer].inners.push(Vec::new());
        let ring = outers[outer].inners.len() - 1;
        InnerRingBuilder {
            builder,
            outer,
            ring,
        }
    }

    pub fn add_node_ref(&mut self, node_ref: NodeRef) {
        let (outer, ring) = (self.outer, self.ring);
        self.builder.object().outers[outer].inners[ring].push(node_ref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Location, NodeID};

    fn nr(id: i64, x: i32, y: i32) -> NodeRef {
        NodeRef::with_location(NodeID(id), Location::new(x, y))
    }

    #[test]
    fn commit_watermark() {
        let mut buffer = AreaBuffer::new();
        {
            let mut builder = AreaBuilder::new(&mut buffer);
            builder.object().id = 7;
            assert!(builder.buffer.committed().is_empty());
            builder.commit();
        }
        assert_eq!(buffer.committed().len(), 1);
        assert_eq!(buffer.committed()[0].id, 7);
        assert!(!buffer.committed()[0].is_valid());
    }

    #[test]
    fn rings_nest_under_the_last_outer() {
        let mut buffer = AreaBuffer::new();
        let mut builder = AreaBuilder::new(&mut buffer);
        {
            let mut outer = OuterRingBuilder::new(&mut builder);
            outer.add_node_ref(nr(1, 0, 0));
            outer.add_node_ref(nr(2, 1, 0));
        }
        {
            let mut inner = InnerRingBuilder::new(&mut builder);
            inner.add_node_ref(nr(3, 2, 2));
        }
        builder.commit();

        let area = &buffer.committed()[0];
        assert!(area.is_valid());
        assert_eq!(area.outers.len(), 1);
        assert_eq!(area.outers[0].node_refs.len(), 2);
        assert_eq!(area.outers[0].inners, vec![vec![nr(3, 2, 2)]]);
    }

    #[test]
    fn tag_list_builder_writes_through() {
        let mut buffer = AreaBuffer::new();
        let mut builder = AreaBuilder::new(&mut buffer);
        {
            let mut tags = TagListBuilder::new(&mut builder);
            tags.add_tag("natural", "water");
        }
        builder.commit();
        assert!(buffer.committed()[0].tags.is("natural", "water"));
    }
}
