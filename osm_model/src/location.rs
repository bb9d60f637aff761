use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeID;

// Matches the OSM database resolution of ~1cm.
const COORDINATE_PRECISION: f64 = 10_000_000.0;

const UNDEFINED_COORDINATE: i32 = i32::MAX;

/// A fixed-point geographic coordinate: x is longitude and y latitude, both
/// scaled by 10^7. The derived ordering is lexicographic on (x, y), which is
/// what segment sorting and canonical orientation rely on.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Location {
        Location { x, y }
    }

    /// The "location unset" sentinel. Nodes referenced by a way but never
    /// resolved against a node store carry this.
    pub fn undefined() -> Location {
        Location {
            x: UNDEFINED_COORDINATE,
            y: UNDEFINED_COORDINATE,
        }
    }

    pub fn from_lon_lat(lon: f64, lat: f64) -> Location {
        Location {
            x: (lon * COORDINATE_PRECISION).round() as i32,
            y: (lat * COORDINATE_PRECISION).round() as i32,
        }
    }

    pub fn is_valid(self) -> bool {
        self.x != UNDEFINED_COORDINATE
    }

    pub fn x(self) -> i32 {
        self.x
    }

    pub fn y(self) -> i32 {
        self.y
    }

    pub fn lon(self) -> f64 {
        f64::from(self.x) / COORDINATE_PRECISION
    }

    pub fn lat(self) -> f64 {
        f64::from(self.y) / COORDINATE_PRECISION
    }
}

impl Default for Location {
    fn default() -> Location {
        Location::undefined()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "(undefined)")
        }
    }
}

/// A reference to an OSM node: the node's id plus the location it resolved
/// to, if any. Equality is by id alone; everything positional goes through
/// `location()`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NodeRef {
    id: NodeID,
    location: Location,
}

impl NodeRef {
    pub fn new(id: NodeID) -> NodeRef {
        NodeRef {
            id,
            location: Location::undefined(),
        }
    }

    pub fn with_location(id: NodeID, location: Location) -> NodeRef {
        NodeRef { id, location }
    }

    pub fn id(self) -> NodeID {
        self.id
    }

    pub fn location(self) -> Location {
        self.location
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &NodeRef) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeRef {}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.id.0, self.location)
    }
}
