use serde::{Deserialize, Serialize};

use crate::{NodeRef, RelationID, Tags, WayID};

/// An OSM way: an ordered list of node references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Way {
    pub id: WayID,
    pub node_refs: Vec<NodeRef>,
    pub tags: Tags,
}

impl Way {
    pub fn new(id: WayID) -> Way {
        Way {
            id,
            node_refs: Vec::new(),
            tags: Tags::empty(),
        }
    }
}

/// An OSM relation, as far as area assembly cares: the attributes and tags
/// that get copied onto the assembled area. The member ways are handed to the
/// assembler separately, as offsets into a `WayBuffer`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationID,
    pub version: u32,
    pub changeset: u64,
    pub timestamp: i64,
    pub visible: bool,
    pub uid: i64,
    pub user: String,
    pub tags: Tags,
}

impl Relation {
    pub fn new(id: RelationID) -> Relation {
        Relation {
            id,
            version: 0,
            changeset: 0,
            timestamp: 0,
            visible: true,
            uid: 0,
            user: String::new(),
            tags: Tags::empty(),
        }
    }
}
