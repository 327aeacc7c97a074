// Door - the crossing point between two adjacent areas

use glam::Vec3;

use super::{ConnectionSlots, NodeId};
use crate::direction::Direction;

/// Unordered pair of area ids identifying a door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DoorKey {
    pub low: u32,
    pub high: u32,
}

impl DoorKey {
    pub fn new(a: u32, b: u32) -> Self {
        DoorKey {
            low: a.min(b),
            high: a.max(b),
        }
    }
}

/// Where an agent may cross a door
///
/// Narrow doors keep only their middle point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorPoints {
    pub left: Option<Vec3>,
    pub middle: Vec3,
    pub right: Option<Vec3>,
}

impl DoorPoints {
    pub fn single(middle: Vec3) -> Self {
        DoorPoints {
            left: None,
            middle,
            right: None,
        }
    }

    pub fn is_single(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn points(&self) -> impl Iterator<Item = Vec3> {
        [self.left, Some(self.middle), self.right].into_iter().flatten()
    }
}

#[derive(Debug, Clone)]
pub struct Door {
    pub key: DoorKey,
    /// Area on the `key.low` side
    pub low_area: NodeId,
    /// Area on the `key.high` side
    pub high_area: NodeId,
    /// Side of the low area the door sits on
    pub side: Direction,
    /// Area whose edge the points lie on
    pub owner: u32,
    pub points: DoorPoints,
    /// Height difference across the door exceeds a step
    pub needs_jump: bool,
    pub connections: ConnectionSlots,
}

impl Door {
    /// Both areas can be entered from this door
    pub fn is_two_way(&self) -> bool {
        let mut low = false;
        let mut high = false;
        for conn in self.connections.iter().flatten() {
            low |= conn.target == self.low_area;
            high |= conn.target == self.high_area;
        }
        low && high
    }

    /// The area across from `area`, if `area` is one of this door's sides
    pub fn other_area(&self, area: NodeId) -> Option<NodeId> {
        if area == self.low_area {
            Some(self.high_area)
        } else if area == self.high_area {
            Some(self.low_area)
        } else {
            None
        }
    }

    /// Side of `area` this door sits on
    pub fn side_of(&self, area: NodeId) -> Option<Direction> {
        if area == self.low_area {
            Some(self.side)
        } else if area == self.high_area {
            Some(self.side.opposite())
        } else {
            None
        }
    }
}
