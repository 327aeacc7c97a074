// Cardinal directions used by area connection slots
//
// North is -Y, East is +X, South is +Y, West is -X. The numeric values are
// the slot order in the mesh file.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

/// Which horizontal axis a boundary runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Unit vector pointing out of an area through this side
    pub fn offset(self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, -1.0),
            Direction::East => Vec2::new(1.0, 0.0),
            Direction::South => Vec2::new(0.0, 1.0),
            Direction::West => Vec2::new(-1.0, 0.0),
        }
    }

    /// Axis the edge on this side runs along (the shared axis of a door)
    pub fn edge_axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::X,
            Direction::East | Direction::West => Axis::Y,
        }
    }

    /// Side of an area that faces `delta`, choosing the dominant component
    pub fn from_delta(delta: Vec2) -> Self {
        if delta.x.abs() >= delta.y.abs() {
            if delta.x >= 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if delta.y >= 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

impl Axis {
    pub fn of(self, p: Vec2) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    pub fn cross(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.offset() + dir.opposite().offset(), Vec2::ZERO);
            assert_eq!(Direction::from_index(dir.index()), Some(dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_from_delta() {
        assert_eq!(Direction::from_delta(Vec2::new(5.0, 1.0)), Direction::East);
        assert_eq!(Direction::from_delta(Vec2::new(-5.0, 1.0)), Direction::West);
        assert_eq!(Direction::from_delta(Vec2::new(0.0, 3.0)), Direction::South);
        assert_eq!(Direction::from_delta(Vec2::new(1.0, -3.0)), Direction::North);
    }
}
