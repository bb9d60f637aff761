use std::fmt;

use serde::{Deserialize, Serialize};

use osm_model::NodeRef;

use crate::NodeRefSegment;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProblemKind {
    /// Two member segments properly cross each other.
    Intersection,
    /// A chain was still open when ring construction finished.
    RingNotClosed,
}

/// An anomaly found in the input while assembling an area. Problems are not
/// errors: they are collected (when enabled) and the affected area is emitted
/// without rings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    pub kind: ProblemKind,
    /// Where it happened. Synthesized locations (like a crossing point that
    /// is no real node) carry id 0.
    pub node_ref: NodeRef,
    /// The segments involved, if the problem concerns specific segments.
    pub segments: Option<(NodeRefSegment, NodeRefSegment)>,
}

impl Problem {
    pub(crate) fn new(kind: ProblemKind, node_ref: NodeRef) -> Problem {
        Problem {
            kind,
            node_ref,
            segments: None,
        }
    }

    pub(crate) fn with_segments(
        kind: ProblemKind,
        node_ref: NodeRef,
        s1: NodeRefSegment,
        s2: NodeRefSegment,
    ) -> Problem {
        Problem {
            kind,
            node_ref,
            segments: Some((s1, s2)),
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProblemKind::Intersection => write!(f, "intersection"),
            ProblemKind::RingNotClosed => write!(f, "ring not closed"),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.node_ref)?;
        if let Some((s1, s2)) = &self.segments {
            write!(f, " between {} and {}", s1, s2)?;
        }
        Ok(())
    }
}
