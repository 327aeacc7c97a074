// A* pathfinding over the area and door graph
//
// Open set is a `BinaryHeap` turned into a min-heap by reversed ordering.
// Scores and parents live in `Vec`s indexed by `NodeId`, so the search is
// deterministic for a given graph. Edge weight is the Euclidean distance
// between node positions scaled by the connection cost (never below 1), which
// keeps the straight-line heuristic admissible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use tracing::debug;

use crate::graph::{NavGraph, NodeId};
use crate::settings::NavSettings;

/// The result of a successful search
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    /// Vertices from start to goal, inclusive
    pub nodes: Vec<NodeId>,
    /// Weighted cost of the searched route, before simplification
    pub total_cost: f32,
}

impl PathResult {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World positions of the vertices
    pub fn points(&self, graph: &NavGraph) -> Vec<Vec3> {
        self.nodes.iter().map(|id| graph.position(*id)).collect()
    }
}

struct OpenEntry {
    node: NodeId,
    f_score: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score.total_cmp(&other.f_score) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Search and, if enabled, simplify
pub fn find_path(
    graph: &NavGraph,
    start: NodeId,
    goal: NodeId,
    settings: &NavSettings,
) -> Option<PathResult> {
    let path = astar(graph, start, goal, settings.max_search_iterations)?;
    if settings.simplify_paths {
        Some(simplify_path(graph, &path, settings.simplify_ratio))
    } else {
        Some(path)
    }
}

/// Shortest path from `start` to `goal`, expanding at most `max_iterations` nodes
pub fn astar(
    graph: &NavGraph,
    start: NodeId,
    goal: NodeId,
    max_iterations: usize,
) -> Option<PathResult> {
    let n = graph.node_count();
    if start.index() >= n || goal.index() >= n {
        debug!("Path search {:?} -> {:?}: node out of range", start, goal);
        return None;
    }
    if start == goal {
        return Some(PathResult {
            nodes: vec![start],
            total_cost: 0.0,
        });
    }

    let goal_pos = graph.position(goal);
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<NodeId>> = vec![None; n];
    let mut closed = vec![false; n];
    g_score[start.index()] = 0.0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        f_score: graph.position(start).distance(goal_pos),
    });

    let mut iterations = 0;
    while let Some(current) = open.pop() {
        let ci = current.node.index();
        if current.node == goal {
            debug!("Path search {:?} -> {:?}: found after {} iterations", start, goal, iterations);
            return Some(reconstruct_path(&came_from, start, goal, g_score[ci]));
        }
        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        iterations += 1;
        if iterations > max_iterations {
            debug!(
                "Path search {:?} -> {:?}: iteration cap {} reached",
                start, goal, max_iterations
            );
            return None;
        }

        let current_pos = graph.position(current.node);
        let current_g = g_score[ci];
        for (_, conn) in graph.neighbors(current.node) {
            let ni = conn.target.index();
            if closed[ni] {
                continue;
            }
            let neighbor_pos = graph.position(conn.target);
            let tentative_g = current_g + conn.cost.max(1.0) * current_pos.distance(neighbor_pos);
            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                came_from[ni] = Some(current.node);
                open.push(OpenEntry {
                    node: conn.target,
                    f_score: tentative_g + neighbor_pos.distance(goal_pos),
                });
            }
        }
    }

    debug!("Path search {:?} -> {:?}: goal unreachable", start, goal);
    None
}

fn reconstruct_path(
    came_from: &[Option<NodeId>],
    start: NodeId,
    goal: NodeId,
    total_cost: f32,
) -> PathResult {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from[current.index()] {
            Some(prev) => {
                nodes.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    PathResult { nodes, total_cost }
}

/// Collapse runs of vertices that a straight hop shortens enough
///
/// From each kept vertex, the farthest later vertex is taken whose direct
/// distance is below `ratio` times the walked distance, as long as no door
/// lies in between.
pub fn simplify_path(graph: &NavGraph, path: &PathResult, ratio: f32) -> PathResult {
    let nodes = &path.nodes;
    if nodes.len() <= 2 {
        return path.clone();
    }

    let mut out = vec![nodes[0]];
    let mut i = 0;
    while i + 1 < nodes.len() {
        let origin = graph.position(nodes[i]);
        let mut next = i + 1;
        let mut walked = origin.distance(graph.position(nodes[i + 1]));
        for j in (i + 2)..nodes.len() {
            if graph.is_door(nodes[j - 1]) {
                break;
            }
            walked += graph.position(nodes[j - 1]).distance(graph.position(nodes[j]));
            if origin.distance(graph.position(nodes[j])) < ratio * walked {
                next = j;
            }
        }
        out.push(nodes[next]);
        i = next;
    }

    PathResult {
        nodes: out,
        total_cost: path.total_cost,
    }
}
