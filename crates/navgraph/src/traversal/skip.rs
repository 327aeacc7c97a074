// Graph-aware shortcut check
//
// Before asking the tracer anything, march the straight 2D line from the
// agent to a later path vertex through the area graph. Each time the line
// leaves an area it must enter a connected neighbor at a climbable height.
// Only if the march reaches the target's area are the legs between the
// recorded waypoints confirmed with straight-line hull walks.

use glam::{Vec2, Vec3};
use tracing::trace;

use super::StraightLine;
use crate::direction::{Axis, Direction};
use crate::graph::{NavGraph, NodeId, Rect};
use crate::settings::NavSettings;
use crate::trace::HullTracer;

/// Slack along the shared edge when matching an exit point to a neighbor
const EDGE_EPSILON: f32 = 0.01;

/// Can the agent in `area` at `current` head straight for `goal`?
pub fn try_advance_along_graph<T: HullTracer + ?Sized>(
    graph: &NavGraph,
    tracer: &T,
    settings: &NavSettings,
    current: Vec3,
    goal: Vec3,
    area: NodeId,
) -> bool {
    let Some(waypoints) = march(graph, settings, current, goal, area) else {
        return false;
    };
    let walker = StraightLine::new(tracer, settings);
    waypoints.windows(2).all(|leg| walker.check(leg[0], leg[1]).traversable)
}

/// How many of the `upcoming` vertices can be bypassed, farthest first
///
/// `upcoming[0]` is the vertex currently being walked to. Returning `k`
/// means the agent can head for `upcoming[k]` directly.
pub fn skippable_vertices<T: HullTracer + ?Sized>(
    graph: &NavGraph,
    tracer: &T,
    settings: &NavSettings,
    upcoming: &[Vec3],
    current: Vec3,
    area: NodeId,
    lookahead: usize,
) -> usize {
    let furthest = lookahead.min(upcoming.len().saturating_sub(1));
    (1..=furthest)
        .rev()
        .find(|&k| try_advance_along_graph(graph, tracer, settings, current, upcoming[k], area))
        .unwrap_or(0)
}

// Waypoints from `current` to `goal` along the graph, or None if the line
// leaves walkable space
fn march(
    graph: &NavGraph,
    settings: &NavSettings,
    current: Vec3,
    goal: Vec3,
    area: NodeId,
) -> Option<Vec<Vec3>> {
    let origin = current.truncate();
    let target = goal.truncate();
    let ray = target - origin;
    let max_up = settings.max_climb(settings.step_policy());

    let mut waypoints = vec![current];
    let mut last_z = current.z;
    let mut here = area;
    let mut t = 0.0;

    for _ in 0..settings.max_graph_steps {
        let rect = graph.area(here)?.bounds();
        if rect.contains(target, EDGE_EPSILON) {
            waypoints.push(goal);
            return Some(waypoints);
        }

        let (t_exit, side) = rect.ray_exit(origin, ray)?;
        if t_exit >= 1.0 {
            trace!("Line to {} ends outside area {:?}", goal, here);
            return None;
        }
        let exit = origin + ray * t_exit;
        let Some(next) = neighbor_at(graph, settings, here, side, exit) else {
            trace!("No neighbor of {:?} on its {:?} side at {}", here, side, exit);
            return None;
        };

        let current_area = graph.area(here)?;
        let next_area = graph.area(next)?;
        let z_out = current_area.height_at(exit);
        let z_in = next_area.height_at(exit);
        let dz = z_in - z_out;
        if dz > max_up || dz < -settings.max_fall_distance {
            trace!("Crossing {:?} -> {:?} changes height by {}", here, next, dz);
            return None;
        }

        if (z_out - last_z).abs() > settings.hill_threshold {
            let mid = origin + ray * ((t + t_exit) * 0.5);
            waypoints.push(mid.extend(current_area.height_at(mid)));
        }
        let crossing = exit.extend(z_out.max(z_in));
        waypoints.push(crossing);
        last_z = crossing.z;

        here = next;
        t = t_exit;
    }

    trace!("Graph march gave up after {} steps", settings.max_graph_steps);
    None
}

// Neighbor of `area` across `side` whose footprint holds `exit`. The
// neighbor may sit up to `cross_axis_tolerance` away from the edge.
fn neighbor_at(
    graph: &NavGraph,
    settings: &NavSettings,
    area: NodeId,
    side: Direction,
    exit: Vec2,
) -> Option<NodeId> {
    let band = settings.cross_axis_tolerance;
    let along = side.edge_axis();
    let accepts = |rect: Rect| {
        within(rect, exit, along, EDGE_EPSILON) && within(rect, exit, along.cross(), band)
    };

    for conn in graph.connections(area, side) {
        if let Some(neighbor) = graph.area(conn.target) {
            if accepts(neighbor.bounds()) {
                return Some(conn.target);
            }
            continue;
        }
        // Through a door on this side that leads on to the far area
        let Some(door) = graph.door(conn.target) else {
            continue;
        };
        if door.side_of(area) != Some(side) {
            continue;
        }
        let Some(onward) = door.other_area(area) else {
            continue;
        };
        if !door.connections.iter().flatten().any(|c| c.target == onward) {
            continue;
        }
        if graph.area(onward).is_some_and(|neighbor| accepts(neighbor.bounds())) {
            return Some(onward);
        }
    }
    None
}

fn within(rect: Rect, p: Vec2, axis: Axis, margin: f32) -> bool {
    let v = axis.of(p);
    v >= axis.of(rect.min) - margin && v <= axis.of(rect.max) + margin
}
