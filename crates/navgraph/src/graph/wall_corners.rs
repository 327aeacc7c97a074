// Wall corner detection
//
// A corner is a wall corner when walking around it is blocked: fewer than two
// neighbors touch it, or one of the three quadrants around it that do not
// belong to the area is not covered by any nearby area. Doors keep their
// distance from these corners.

use glam::Vec2;
use tracing::trace;

use super::adjacency::{push_unique, Adjacency};
use super::{Area, Corner, NavGraph, NodeId};
use crate::settings::NavSettings;

/// Flag the wall corners of every area, returning how many were found
pub(crate) fn detect_wall_corners(
    graph: &mut NavGraph,
    adjacency: &Adjacency,
    settings: &NavSettings,
) -> usize {
    let flags: Vec<(NodeId, [bool; 4])> = graph
        .areas()
        .map(|(id, area)| {
            let mut flags = [false; 4];
            for corner in Corner::ALL {
                flags[corner.index()] =
                    is_wall_corner(graph, adjacency, id, area, corner, settings);
            }
            (id, flags)
        })
        .collect();

    let mut total = 0;
    for (id, corner_flags) in flags {
        total += corner_flags.iter().filter(|f| **f).count();
        if let Some(area) = graph.area_mut(id) {
            area.set_wall_corners(corner_flags);
        }
    }
    total
}

fn is_wall_corner(
    graph: &NavGraph,
    adjacency: &Adjacency,
    id: NodeId,
    area: &Area,
    corner: Corner,
    settings: &NavSettings,
) -> bool {
    let point = area.corner(corner).truncate();
    let tolerance = settings.corner_tolerance;

    let (ns, ew) = corner.sides();
    let mut candidates = Vec::new();
    for &n in adjacency.side(id, ns).iter().chain(adjacency.side(id, ew)) {
        push_unique(&mut candidates, n);
    }

    let touching = candidates
        .iter()
        .filter_map(|n| graph.area(*n))
        .filter(|n| n.bounds().distance_to(point) <= tolerance)
        .count();
    if touching < 2 {
        trace!("Area {} corner {:?}: {} touching neighbors", area.id, corner, touching);
        return true;
    }

    // Probe the foreign quadrants just beyond the corner
    let reach = tolerance.max(f32::EPSILON).min(area.min_side() * 0.5);
    let mut nearby = candidates.clone();
    for &n in &candidates {
        for m in adjacency.all(n) {
            if m != id {
                push_unique(&mut nearby, m);
            }
        }
    }

    let out = corner.outward();
    let quadrants = [out, Vec2::new(out.x, -out.y), Vec2::new(-out.x, out.y)];
    quadrants.iter().any(|q| {
        let probe = point + *q * reach;
        !nearby
            .iter()
            .filter_map(|n| graph.area(*n))
            .any(|n| n.bounds().contains(probe, 0.0))
    })
}
