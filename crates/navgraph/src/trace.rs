// Hull traces
//
// The traversal checks only need one primitive from the world: sweep an
// axis-aligned hull from one point to another and report where it stopped.
// `BoxWorld` provides that primitive against a list of solid boxes.

use glam::Vec3;

use crate::graph::NavGraph;
use crate::settings::NavSettings;

/// Distance a blocked trace is pulled back from the surface it hit
pub const DIST_EPSILON: f32 = 0.03125;

/// Agent bounding box relative to its origin (the feet)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hull {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Hull {
    pub fn new(half_width: f32, height: f32) -> Self {
        Hull {
            mins: Vec3::new(-half_width, -half_width, 0.0),
            maxs: Vec3::new(half_width, half_width, height),
        }
    }

    pub fn from_settings(settings: &NavSettings) -> Self {
        Self::new(settings.hull_half_width, settings.hull_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// Portion of the sweep completed, 1 when nothing was hit
    pub fraction: f32,
    pub end_pos: Vec3,
    /// Surface normal at the hit, zero when nothing was hit
    pub normal: Vec3,
    /// The hull started inside something
    pub start_solid: bool,
}

impl TraceResult {
    pub fn clear(end: Vec3) -> Self {
        TraceResult {
            fraction: 1.0,
            end_pos: end,
            normal: Vec3::ZERO,
            start_solid: false,
        }
    }

    pub fn hit(&self) -> bool {
        self.fraction < 1.0
    }
}

/// World collision, supplied by the host
pub trait HullTracer {
    fn trace_hull(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult;
}

impl<T: HullTracer + ?Sized> HullTracer for &T {
    fn trace_hull(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult {
        (**self).trace_hull(start, end, hull)
    }
}

/// An axis-aligned solid box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl SolidBox {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        SolidBox {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

// Where a sweep first enters an expanded box
struct Entry {
    t: f32,
    normal: Vec3,
}

/// Collision world made of solid boxes
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    boxes: Vec<SolidBox>,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_box(&mut self, min: Vec3, max: Vec3) {
        self.boxes.push(SolidBox::new(min, max));
    }

    pub fn with_box(mut self, min: Vec3, max: Vec3) -> Self {
        self.add_box(min, max);
        self
    }

    pub fn boxes(&self) -> &[SolidBox] {
        &self.boxes
    }

    /// One slab per area, `thickness` deep, topped at the area's highest corner
    pub fn from_area_floors(graph: &NavGraph, thickness: f32) -> Self {
        let mut world = BoxWorld::new();
        for (_, area) in graph.areas() {
            let (low, high) = area
                .corners()
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), c| (lo.min(c.z), hi.max(c.z)));
            let bounds = area.bounds();
            world.add_box(bounds.min.extend(low - thickness), bounds.max.extend(high));
        }
        world
    }

    // Slab test of the hull origin against `solid` grown by the hull
    fn sweep(solid: &SolidBox, start: Vec3, delta: Vec3, hull: &Hull) -> Option<Entry> {
        let min = solid.min - hull.maxs;
        let max = solid.max - hull.mins;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;
        for axis in 0..3 {
            let s = start[axis];
            let d = delta[axis];
            if d.abs() <= f32::EPSILON {
                // Touching a face does not count as inside
                if s <= min[axis] || s >= max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (min[axis] - s) / d;
            let t2 = (max[axis] - s) / d;
            let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if near > t_enter {
                t_enter = near;
                normal = Vec3::ZERO;
                normal[axis] = -d.signum();
            }
            t_exit = t_exit.min(far);
        }

        if t_enter < t_exit && t_exit > 0.0 && t_enter >= 0.0 && t_enter < 1.0 {
            Some(Entry { t: t_enter, normal })
        } else {
            None
        }
    }

    fn inside(solid: &SolidBox, p: Vec3, hull: &Hull) -> bool {
        let min = solid.min - hull.maxs;
        let max = solid.max - hull.mins;
        (0..3).all(|axis| p[axis] > min[axis] && p[axis] < max[axis])
    }
}

impl HullTracer for BoxWorld {
    fn trace_hull(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult {
        if self.boxes.iter().any(|b| Self::inside(b, start, hull)) {
            return TraceResult {
                fraction: 0.0,
                end_pos: start,
                normal: Vec3::ZERO,
                start_solid: true,
            };
        }

        let delta = end - start;
        let length = delta.length();
        if length <= f32::EPSILON {
            return TraceResult::clear(end);
        }

        let first = self
            .boxes
            .iter()
            .filter_map(|b| Self::sweep(b, start, delta, hull))
            .min_by(|a, b| a.t.total_cmp(&b.t));

        match first {
            Some(entry) => {
                let fraction = (entry.t - DIST_EPSILON / length).max(0.0);
                TraceResult {
                    fraction,
                    end_pos: start + delta * fraction,
                    normal: entry.normal,
                    start_solid: false,
                }
            }
            None => TraceResult::clear(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Hull {
        Hull::new(0.0, 0.0)
    }

    fn wall() -> BoxWorld {
        BoxWorld::new().with_box(Vec3::new(100.0, -50.0, 0.0), Vec3::new(110.0, 50.0, 100.0))
    }

    #[test]
    fn test_clear_trace() {
        let tr = wall().trace_hull(Vec3::new(0.0, 0.0, 200.0), Vec3::new(300.0, 0.0, 200.0), &point());
        assert!(!tr.hit());
        assert_eq!(tr.end_pos, Vec3::new(300.0, 0.0, 200.0));
    }

    #[test]
    fn test_hit_backs_off() {
        let tr = wall().trace_hull(Vec3::new(0.0, 0.0, 10.0), Vec3::new(200.0, 0.0, 10.0), &point());
        assert!(tr.hit());
        assert!(tr.end_pos.x < 100.0 && tr.end_pos.x > 99.9);
        assert_eq!(tr.normal, Vec3::new(-1.0, 0.0, 0.0));
        assert!(!tr.start_solid);
    }

    #[test]
    fn test_hull_is_expanded() {
        let hull = Hull::new(10.0, 20.0);
        let tr = wall().trace_hull(Vec3::new(0.0, 0.0, 10.0), Vec3::new(200.0, 0.0, 10.0), &hull);
        assert!(tr.end_pos.x < 90.0 && tr.end_pos.x > 89.9);
        // hull top clears nothing, hull bottom passes over the wall
        let tr = wall().trace_hull(Vec3::new(0.0, 0.0, 100.0), Vec3::new(200.0, 0.0, 100.0), &hull);
        assert!(!tr.hit());
    }

    #[test]
    fn test_start_solid() {
        let tr = wall().trace_hull(Vec3::new(105.0, 0.0, 10.0), Vec3::new(200.0, 0.0, 10.0), &point());
        assert!(tr.start_solid);
        assert_eq!(tr.fraction, 0.0);
    }

    #[test]
    fn test_resting_on_floor() {
        let floor = BoxWorld::new().with_box(Vec3::new(-100.0, -100.0, -10.0), Vec3::new(100.0, 100.0, 0.0));
        let hull = Hull::new(16.0, 72.0);
        // sliding along the top is free
        let tr = floor.trace_hull(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0), &hull);
        assert!(!tr.hit());
        // going down from the surface hits immediately
        let tr = floor.trace_hull(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -20.0), &hull);
        assert!(tr.hit());
        assert!(tr.end_pos.z > 0.0 && tr.end_pos.z < 0.1);
        assert_eq!(tr.normal, Vec3::Z);
    }
}
