// Area - a walkable quadrilateral in graph form

use glam::{Vec2, Vec3};

use super::ConnectionSlots;
use crate::direction::{Axis, Direction};
use crate::mesh::{RawArea, RawConnection};

/// Axis-aligned horizontal footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Rect {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment, grown by `margin` on every side
    pub fn contains(&self, p: Vec2, margin: f32) -> bool {
        p.x >= self.min.x - margin
            && p.x <= self.max.x + margin
            && p.y >= self.min.y - margin
            && p.y <= self.max.y + margin
    }

    /// Distance from `p` to the rectangle, zero inside
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        clamped.distance(p)
    }

    /// Where a ray from `origin` (inside) first leaves the rectangle
    ///
    /// Returns the ray parameter and the side crossed, or `None` for a zero
    /// direction.
    pub fn ray_exit(&self, origin: Vec2, dir: Vec2) -> Option<(f32, Direction)> {
        let mut best: Option<(f32, Direction)> = None;
        let mut consider = |t: f32, side: Direction| {
            let t = t.max(0.0);
            if best.is_none_or(|(bt, _)| t < bt) {
                best = Some((t, side));
            }
        };
        if dir.x > 0.0 {
            consider((self.max.x - origin.x) / dir.x, Direction::East);
        } else if dir.x < 0.0 {
            consider((self.min.x - origin.x) / dir.x, Direction::West);
        }
        if dir.y > 0.0 {
            consider((self.max.y - origin.y) / dir.y, Direction::South);
        } else if dir.y < 0.0 {
            consider((self.min.y - origin.y) / dir.y, Direction::North);
        }
        best
    }
}

/// Corners of an area, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest = 0,
    NorthEast = 1,
    SouthEast = 2,
    SouthWest = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The two sides meeting at this corner, north/south first
    pub fn sides(self) -> (Direction, Direction) {
        match self {
            Corner::NorthWest => (Direction::North, Direction::West),
            Corner::NorthEast => (Direction::North, Direction::East),
            Corner::SouthEast => (Direction::South, Direction::East),
            Corner::SouthWest => (Direction::South, Direction::West),
        }
    }

    /// Unit signs pointing away from the area through this corner
    pub fn outward(self) -> Vec2 {
        let (ns, ew) = self.sides();
        ns.offset() + ew.offset()
    }
}

#[derive(Debug, Clone)]
pub struct Area {
    pub id: u32,
    pub flags: u32,
    corners: [Vec3; 4],
    bounds: Rect,
    pub connections: ConnectionSlots,
    /// Connections as read from input, consumed by normalization
    pub(crate) pending: [Vec<RawConnection>; 4],
    wall_corners: [bool; 4],
}

impl Area {
    pub fn from_raw(raw: &RawArea) -> Self {
        let corners = raw.corners();
        Area {
            id: raw.id,
            flags: raw.flags,
            corners,
            bounds: bounds_of(&corners),
            connections: Default::default(),
            pending: raw.connections.clone(),
            wall_corners: [false; 4],
        }
    }

    /// Recompute the footprint from the corners
    pub(crate) fn refresh_bounds(&mut self) {
        self.bounds = bounds_of(&self.corners);
    }

    pub fn corners(&self) -> &[Vec3; 4] {
        &self.corners
    }

    pub fn corner(&self, corner: Corner) -> Vec3 {
        self.corners[corner.index()]
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn center(&self) -> Vec3 {
        let c = self.bounds.center();
        c.extend(self.height_at(c))
    }

    pub fn min_side(&self) -> f32 {
        self.bounds.width().min(self.bounds.height())
    }

    pub fn is_degenerate(&self) -> bool {
        self.min_side() <= f32::EPSILON
    }

    /// Floor height under `p`, bilinear across the four corners
    ///
    /// Points outside the footprint are clamped onto it.
    pub fn height_at(&self, p: Vec2) -> f32 {
        let [nw, ne, se, sw] = self.corners;
        let u = fraction(p.x, self.bounds.min.x, self.bounds.max.x);
        let v = fraction(p.y, self.bounds.min.y, self.bounds.max.y);
        let north = nw.z + (ne.z - nw.z) * u;
        let south = sw.z + (se.z - sw.z) * u;
        north + (south - north) * v
    }

    /// Footprint test plus a height window below and above the floor
    pub fn contains(&self, point: Vec3, below: f32, above: f32) -> bool {
        if !self.bounds.contains(point.truncate(), 0.0) {
            return false;
        }
        let dz = point.z - self.height_at(point.truncate());
        dz >= -below && dz <= above
    }

    /// Endpoints of the edge on `side`, ordered along the edge axis
    pub fn edge(&self, side: Direction) -> (Vec3, Vec3) {
        let [nw, ne, se, sw] = self.corners;
        match side {
            Direction::North => (nw, ne),
            Direction::East => (ne, se),
            Direction::South => (sw, se),
            Direction::West => (nw, sw),
        }
    }

    /// Fixed cross-axis coordinate of the edge on `side`
    pub fn edge_line(&self, side: Direction) -> f32 {
        match side {
            Direction::North => self.bounds.min.y,
            Direction::East => self.bounds.max.x,
            Direction::South => self.bounds.max.y,
            Direction::West => self.bounds.min.x,
        }
    }

    /// Point on the edge on `side` at coordinate `t` along its axis
    pub fn point_on_edge(&self, side: Direction, t: f32) -> Vec3 {
        let (a, b) = self.edge(side);
        let axis = side.edge_axis();
        let s = fraction(t, axis.of(a.truncate()), axis.of(b.truncate()));
        let z = a.z + (b.z - a.z) * s;
        let line = self.edge_line(side);
        match axis {
            Axis::X => Vec3::new(t, line, z),
            Axis::Y => Vec3::new(line, t, z),
        }
    }

    /// Highest point of the edge on `side`
    pub fn edge_top(&self, side: Direction) -> f32 {
        let (a, b) = self.edge(side);
        a.z.max(b.z)
    }

    pub fn connections(&self, dir: Direction) -> &[super::Connection] {
        &self.connections[dir.index()]
    }

    pub fn is_wall_corner(&self, corner: Corner) -> bool {
        self.wall_corners[corner.index()]
    }

    pub(crate) fn set_wall_corners(&mut self, flags: [bool; 4]) {
        self.wall_corners = flags;
    }

    pub fn wall_corner_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        Corner::ALL
            .into_iter()
            .filter(|c| self.is_wall_corner(*c))
            .map(|c| self.corner(c))
    }
}

fn bounds_of(corners: &[Vec3; 4]) -> Rect {
    let mut min = corners[0].truncate();
    let mut max = min;
    for c in &corners[1..] {
        min = min.min(c.truncate());
        max = max.max(c.truncate());
    }
    Rect { min, max }
}

// Position of `x` within `lo..hi`, clamped to 0..1
fn fraction(x: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    ((x - lo) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sloped() -> Area {
        // z rises from 0 on the west edge to 10 on the east edge
        Area::from_raw(&RawArea::new(
            1,
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 50.0, 10.0),
            10.0,
            0.0,
        ))
    }

    #[test]
    fn test_height_interpolation() {
        let area = sloped();
        assert_eq!(area.height_at(Vec2::new(0.0, 25.0)), 0.0);
        assert_eq!(area.height_at(Vec2::new(50.0, 10.0)), 5.0);
        assert_eq!(area.height_at(Vec2::new(100.0, 50.0)), 10.0);
        // clamped outside
        assert_eq!(area.height_at(Vec2::new(500.0, 25.0)), 10.0);
        assert_eq!(area.center(), Vec3::new(50.0, 25.0, 5.0));
    }

    #[test]
    fn test_contains_height_window() {
        let area = sloped();
        assert!(area.contains(Vec3::new(50.0, 25.0, 5.0), 18.0, 72.0));
        assert!(area.contains(Vec3::new(50.0, 25.0, 70.0), 18.0, 72.0));
        assert!(!area.contains(Vec3::new(50.0, 25.0, 90.0), 18.0, 72.0));
        assert!(!area.contains(Vec3::new(50.0, 25.0, -20.0), 18.0, 72.0));
        assert!(!area.contains(Vec3::new(150.0, 25.0, 5.0), 18.0, 72.0));
    }

    #[test]
    fn test_edges() {
        let area = sloped();
        let (a, b) = area.edge(Direction::East);
        assert_eq!(a, Vec3::new(100.0, 0.0, 10.0));
        assert_eq!(b, Vec3::new(100.0, 50.0, 10.0));
        assert_eq!(area.edge_line(Direction::North), 0.0);
        assert_eq!(area.edge_line(Direction::South), 50.0);
        assert_eq!(area.point_on_edge(Direction::North, 25.0), Vec3::new(25.0, 0.0, 2.5));
        assert_eq!(area.edge_top(Direction::West), 0.0);
    }

    #[test]
    fn test_ray_exit() {
        let rect = Rect::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let (t, side) = rect.ray_exit(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!((t, side), (5.0, Direction::East));
        let (t, side) = rect.ray_exit(Vec2::new(5.0, 2.0), Vec2::new(0.0, -1.0)).unwrap();
        assert_eq!((t, side), (2.0, Direction::North));
        assert!(rect.ray_exit(Vec2::new(5.0, 5.0), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_rect_distance() {
        let rect = Rect::new(Vec2::new(10.0, 10.0), Vec2::ZERO);
        assert_eq!(rect.min, Vec2::ZERO);
        assert_eq!(rect.distance_to(Vec2::new(5.0, 5.0)), 0.0);
        assert_eq!(rect.distance_to(Vec2::new(13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_corner_outward() {
        assert_eq!(Corner::NorthWest.outward(), Vec2::new(-1.0, -1.0));
        assert_eq!(Corner::SouthEast.outward(), Vec2::new(1.0, 1.0));
    }
}
