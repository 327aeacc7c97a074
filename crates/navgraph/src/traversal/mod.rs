// Straight-line traversability
//
// Walks a hull from start to goal with alternating traces: forward at step
// height, a jump probe when that is blocked, then back down to the ground.
// Every landing point is recorded. The walk fails closed: running out of
// iterations, starting inside geometry or falling too far all report false.

mod skip;

pub use skip::{skippable_vertices, try_advance_along_graph};

use glam::{Vec2, Vec3};
use tracing::trace;

use crate::settings::NavSettings;
use crate::trace::{Hull, HullTracer, TraceResult};

/// Extra length on each ground probe so a floor on a segment boundary is found
const GROUND_SKIN: f32 = 0.5;
/// Horizontal progress below this counts as stuck
const MIN_PROGRESS: f32 = 1e-3;

/// Outcome of a straight-line walk
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalReport {
    pub traversable: bool,
    /// Ground positions visited, starting with the start point
    pub trail: Vec<Vec3>,
    /// Obstacles cleared by jumping
    pub jumps: usize,
}

impl TraversalReport {
    fn finish(mut self, traversable: bool) -> Self {
        self.traversable = traversable;
        self
    }
}

/// How an obstacle in the walking direction was dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Obstacle {
    /// Nothing in the way at step height
    Stepped,
    Jumped,
    Blocked,
}

/// Runs straight-line walks against a tracer
pub struct StraightLine<'a, T: HullTracer + ?Sized> {
    tracer: &'a T,
    settings: &'a NavSettings,
    hull: Hull,
}

impl<'a, T: HullTracer + ?Sized> StraightLine<'a, T> {
    pub fn new(tracer: &'a T, settings: &'a NavSettings) -> Self {
        StraightLine {
            tracer,
            settings,
            hull: Hull::from_settings(settings),
        }
    }

    fn trace(&self, start: Vec3, end: Vec3) -> TraceResult {
        self.tracer.trace_hull(start, end, &self.hull)
    }

    fn at_goal(&self, pos: Vec3, goal: Vec3) -> bool {
        pos.truncate().distance(goal.truncate()) <= self.settings.goal_tolerance_xy
            && (pos.z - goal.z).abs() <= self.settings.goal_tolerance_z
    }

    pub fn check(&self, start: Vec3, goal: Vec3) -> TraversalReport {
        let report = TraversalReport {
            traversable: false,
            trail: vec![start],
            jumps: 0,
        };
        self.walk(start, goal, report)
    }

    fn walk(&self, start: Vec3, goal: Vec3, mut report: TraversalReport) -> TraversalReport {
        let mut pos = start;
        let min_normal_z = self.settings.min_walkable_normal_z();
        let mut ground_normal = self
            .find_ground(start, self.settings.step_height)
            .map(|ground| ground.normal)
            .filter(|normal| normal.z >= min_normal_z)
            .unwrap_or(Vec3::Z);

        for iteration in 0..self.settings.max_trace_iterations {
            if self.at_goal(pos, goal) {
                return report.finish(true);
            }
            let flat = (goal - pos).truncate();
            let distance = flat.length();
            if distance <= self.settings.goal_tolerance_xy {
                trace!("Reached goal column at {} but height is off by {}", pos, goal.z - pos.z);
                return report.finish(false);
            }

            let heading = flat / distance;
            let step = self.movement(heading, distance, ground_normal, min_normal_z);

            let (obstacle, advanced) = self.advance(pos, step);
            if obstacle == Obstacle::Blocked {
                trace!("Blocked at {} after {} iterations", pos, iteration);
                return report.finish(false);
            }
            if obstacle == Obstacle::Jumped {
                report.jumps += 1;
            }

            let drop_limit = (advanced.z - pos.z) + self.settings.max_fall_distance;
            let Some(ground) = self.find_ground(advanced, drop_limit) else {
                trace!("No ground within {} below {}", drop_limit, advanced);
                return report.finish(false);
            };

            pos = ground.end_pos;
            if ground.normal.z >= min_normal_z {
                ground_normal = ground.normal;
            }
            report.trail.push(pos);
        }

        trace!("Gave up after {} trace iterations", self.settings.max_trace_iterations);
        report.finish(false)
    }

    // Travel vector for one iteration, following the ground plane when walkable
    fn movement(&self, heading: Vec2, distance: f32, normal: Vec3, min_normal_z: f32) -> Vec3 {
        let length = distance.min(self.settings.trace_step_length);
        let flat = heading.extend(0.0);
        if normal.z < min_normal_z || normal.z >= 1.0 - f32::EPSILON {
            return flat * length;
        }
        let along = flat - normal * flat.dot(normal);
        let horizontal = along.truncate().length();
        if horizontal <= f32::EPSILON {
            return flat * length;
        }
        along * (length / horizontal)
    }

    // Forward trace at step height, with a jump attempt if that is blocked
    fn advance(&self, pos: Vec3, step: Vec3) -> (Obstacle, Vec3) {
        let lift = Vec3::new(0.0, 0.0, self.settings.step_height);
        let forward = self.trace(pos + lift, pos + lift + step);
        if forward.start_solid {
            return (Obstacle::Blocked, pos);
        }
        if !forward.hit() {
            return (Obstacle::Stepped, forward.end_pos);
        }
        if !self.settings.allow_jump {
            return (Obstacle::Blocked, pos);
        }

        let ceiling = self.trace(pos, pos + Vec3::new(0.0, 0.0, self.settings.jump_height));
        if ceiling.start_solid || ceiling.end_pos.z - pos.z <= self.settings.step_height {
            return (Obstacle::Blocked, pos);
        }
        let top = ceiling.end_pos;
        let over = self.trace(top, top + step);
        if over.start_solid {
            return (Obstacle::Blocked, pos);
        }
        // Stopping at or before the wall that blocked the step clears nothing
        let blocked_at = (forward.end_pos - (pos + lift)).truncate().length();
        let jumped_to = (over.end_pos - top).truncate().length();
        if jumped_to <= MIN_PROGRESS || (over.hit() && jumped_to <= blocked_at + MIN_PROGRESS) {
            return (Obstacle::Blocked, pos);
        }
        (Obstacle::Jumped, over.end_pos)
    }

    // Descend in short segments until something solid is under the hull
    fn find_ground(&self, from: Vec3, limit: f32) -> Option<TraceResult> {
        let mut cursor = from;
        let mut remaining = limit;
        while remaining > 0.0 {
            let segment = remaining.min(self.settings.ground_trace_step);
            let down = self.trace(cursor, cursor - Vec3::new(0.0, 0.0, segment + GROUND_SKIN));
            if down.start_solid {
                return None;
            }
            if down.hit() {
                return Some(down);
            }
            cursor.z -= segment;
            remaining -= segment;
        }
        None
    }
}

/// Walk from `start` to `goal`, recording the trail
pub fn check_straight_line<T: HullTracer + ?Sized>(
    tracer: &T,
    settings: &NavSettings,
    start: Vec3,
    goal: Vec3,
) -> TraversalReport {
    StraightLine::new(tracer, settings).check(start, goal)
}

pub fn is_straight_line_traversable<T: HullTracer + ?Sized>(
    tracer: &T,
    settings: &NavSettings,
    start: Vec3,
    goal: Vec3,
) -> bool {
    check_straight_line(tracer, settings, start, goal).traversable
}
