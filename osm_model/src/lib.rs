//! Primitives shared by the OSM area-building pipeline: typed ids, fixed-point
//! locations, tags, ways and relations, plus the input buffer the assembler
//! reads member ways from and the output buffer it writes areas to.

#[macro_use]
extern crate anyhow;

mod buffer;
mod builder;
mod ids;
mod location;
mod objects;
mod tags;

pub use crate::buffer::WayBuffer;
pub use crate::builder::{
    Area, AreaBuffer, AreaBuilder, InnerRingBuilder, OuterRing, OuterRingBuilder, TagListBuilder,
};
pub use crate::ids::{NodeID, RelationID, WayID};
pub use crate::location::{Location, NodeRef};
pub use crate::objects::{Relation, Way};
pub use crate::tags::Tags;
