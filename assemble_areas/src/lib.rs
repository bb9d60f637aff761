//! Assembles area objects from OSM multipolygon relations and their member
//! ways. Real-world relations are messy -- ways arrive split, reversed,
//! duplicated, or sharing endpoints arbitrarily -- so the assembler works on
//! undirected segments, glues them into rings by endpoint location, and
//! classifies each ring's winding to sort outer boundaries from holes.
//! Invalid geometry (crossing segments, chains that never close) is recorded
//! as a `Problem` and the area is emitted without rings.

#[macro_use]
extern crate log;

mod assembler;
mod problem;
mod proto_ring;
mod segment;

pub use crate::assembler::Assembler;
pub use crate::problem::{Problem, ProblemKind};
pub use crate::proto_ring::{ProtoRing, RingArena, RingId};
pub use crate::segment::NodeRefSegment;
