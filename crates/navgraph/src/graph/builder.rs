// GraphBuilder - turns decoded areas into a routable graph
//
// Passes, in order:
//   1. normalize: resolve raw connections to node ids, drop dangling ones
//   2. wall corners: flag corners a door must keep clear of
//   3. doors: one door per adjacent pair, area edges rerouted through it,
//      door-to-door links across shared areas
//
// Normalization and door synthesis are both idempotent.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::adjacency::Adjacency;
use super::wall_corners::detect_wall_corners;
use super::{Area, Connection, Door, DoorKey, DoorPoints, NavGraph, NodeId};
use crate::direction::Direction;
use crate::error::{FormatError, GeometryError};
use crate::mesh::{MeshFile, RawArea};
use crate::settings::NavSettings;

/// Counters collected while building a graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub areas: usize,
    pub connections: usize,
    pub dropped_connections: usize,
    pub degenerate_areas: usize,
    pub wall_corners: usize,
    pub doors: usize,
    pub skipped_doors: usize,
    pub door_links: usize,
}

// Adjacent pair of areas, oriented from the lower file id
struct AreaPair {
    low: NodeId,
    high: NodeId,
    /// Side of `low` facing `high`
    side: Direction,
    forward: bool,
    backward: bool,
}

pub struct GraphBuilder<'a> {
    settings: &'a NavSettings,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(settings: &'a NavSettings) -> Self {
        GraphBuilder { settings }
    }

    pub fn build(&self, mesh: &MeshFile) -> Result<(NavGraph, BuildReport), FormatError> {
        self.build_from_areas(mesh.areas.values())
    }

    /// Build from areas supplied in any order
    pub fn build_from_areas<'r>(
        &self,
        areas: impl IntoIterator<Item = &'r RawArea>,
    ) -> Result<(NavGraph, BuildReport), FormatError> {
        let mut areas: Vec<&RawArea> = areas.into_iter().collect();
        if areas.is_empty() {
            return Err(FormatError::NoAreas);
        }
        areas.sort_by_key(|a| a.id);
        if let Some(pair) = areas.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(FormatError::DuplicateArea(pair[0].id));
        }

        let mut graph = NavGraph::new();
        for raw in areas {
            graph.add_area(Area::from_raw(raw));
        }

        let mut report = BuildReport {
            areas: graph.area_count(),
            ..BuildReport::default()
        };
        self.normalize(&mut graph, &mut report);

        let adjacency = Adjacency::build(&graph);
        report.wall_corners = detect_wall_corners(&mut graph, &adjacency, self.settings);

        if self.settings.synthesize_doors {
            self.synthesize_doors(&mut graph, &mut report);
        }
        report.connections = graph.connection_count();

        info!(
            "Built navigation graph: {} areas, {} doors, {} connections ({} dropped, {} doors skipped)",
            report.areas,
            report.doors,
            report.connections,
            report.dropped_connections,
            report.skipped_doors
        );
        Ok((graph, report))
    }

    /// Resolve pending raw connections into graph connections
    pub fn normalize(&self, graph: &mut NavGraph, report: &mut BuildReport) {
        let ids: Vec<NodeId> = graph.area_ids().collect();
        for id in ids {
            let Some(area) = graph.area_mut(id) else {
                continue;
            };
            area.refresh_bounds();
            if area.is_degenerate() {
                warn!("{}", GeometryError::DegenerateArea(area.id));
                report.degenerate_areas += 1;
            }
            let area_id = area.id;
            let pending = std::mem::take(&mut area.pending);

            for (dir, slot) in Direction::ALL.into_iter().zip(pending) {
                for raw in slot {
                    let target = match graph.node_of_area(raw.target_id()) {
                        Some(target) if target != id => target,
                        Some(_) => {
                            debug!("Area {} connects to itself, dropping", area_id);
                            report.dropped_connections += 1;
                            continue;
                        }
                        None => {
                            warn!(
                                "Area {} references missing area {}, dropping connection",
                                area_id,
                                raw.target_id()
                            );
                            report.dropped_connections += 1;
                            continue;
                        }
                    };
                    let cost = sanitize_cost(raw.cost());
                    if let Some(area) = graph.area_mut(id) {
                        let slot = &mut area.connections[dir.index()];
                        if !slot.iter().any(|c| c.target == target) {
                            slot.push(Connection::with_cost(target, cost));
                        }
                    }
                }
            }
        }
    }

    /// Place doors between adjacent areas and route area edges through them
    pub fn synthesize_doors(&self, graph: &mut NavGraph, report: &mut BuildReport) {
        let pairs = collect_pairs(graph);
        for (key, pair) in &pairs {
            if graph.door_between(key.low, key.high).is_some() {
                continue;
            }
            match self.place_door(graph, *key, pair) {
                Ok(mut door) => {
                    if pair.forward {
                        door.connections[pair.side.index()].push(Connection::new(pair.high));
                    }
                    if pair.backward {
                        let back = pair.side.opposite().index();
                        door.connections[back].push(Connection::new(pair.low));
                    }
                    graph.add_door(door);
                    report.doors += 1;
                }
                Err(e) => {
                    warn!("Skipping door: {}", e);
                    report.skipped_doors += 1;
                }
            }
        }

        route_through_doors(graph);
        report.door_links += link_doors(graph);
        debug!(
            "Door synthesis: {} doors, {} skipped, {} door links",
            report.doors, report.skipped_doors, report.door_links
        );
    }

    fn place_door(
        &self,
        graph: &NavGraph,
        key: DoorKey,
        pair: &AreaPair,
    ) -> Result<Door, GeometryError> {
        let no_edge = GeometryError::NoFacingEdge {
            a: key.low,
            b: key.high,
        };
        let (Some(low), Some(high)) = (graph.area(pair.low), graph.area(pair.high)) else {
            return Err(no_edge);
        };
        if low.is_degenerate() || high.is_degenerate() {
            return Err(no_edge);
        }

        let side = pair.side;
        let opposite = side.opposite();
        let axis = side.edge_axis();
        let (l0, l1) = low.edge(side);
        let (h0, h1) = high.edge(opposite);
        let lo = axis.of(l0.truncate()).max(axis.of(h0.truncate()));
        let hi = axis.of(l1.truncate()).min(axis.of(h1.truncate()));
        let width = hi - lo;
        if width <= f32::EPSILON {
            return Err(GeometryError::ZeroOverlap {
                a: key.low,
                b: key.high,
                width,
            });
        }

        // Points go on the higher edge; ties go to the larger id, which is `high`
        let (owner, owner_side) = if low.edge_top(side) > high.edge_top(opposite) {
            (low, side)
        } else {
            (high, opposite)
        };

        let clearance = self.settings.door_clearance;
        let near_wall = |t: f32| {
            let p = owner.point_on_edge(owner_side, t).truncate();
            low.wall_corner_points()
                .chain(high.wall_corner_points())
                .any(|w| w.truncate().distance(p) <= clearance)
        };
        let mut left = lo;
        let mut right = hi;
        if near_wall(lo) {
            left += clearance;
        }
        if near_wall(hi) {
            right -= clearance;
        }
        if left > right {
            let mid = (lo + hi) * 0.5;
            left = mid;
            right = mid;
        }

        let mid = (left + right) * 0.5;
        let middle = owner.point_on_edge(owner_side, mid);
        let points = if right - left >= self.settings.min_door_width {
            DoorPoints {
                left: Some(owner.point_on_edge(owner_side, left)),
                middle,
                right: Some(owner.point_on_edge(owner_side, right)),
            }
        } else {
            DoorPoints::single(middle)
        };

        let dz = (low.point_on_edge(side, mid).z - high.point_on_edge(opposite, mid).z).abs();
        Ok(Door {
            key,
            low_area: pair.low,
            high_area: pair.high,
            side,
            owner: owner.id,
            points,
            needs_jump: dz > self.settings.step_height,
            connections: Default::default(),
        })
    }
}

fn sanitize_cost(cost: f32) -> f32 {
    if cost.is_finite() { cost.max(0.0) } else { 1.0 }
}

fn collect_pairs(graph: &NavGraph) -> BTreeMap<DoorKey, AreaPair> {
    let mut pairs: BTreeMap<DoorKey, AreaPair> = BTreeMap::new();
    for (id, area) in graph.areas() {
        for (dir, conn) in graph.neighbors(id) {
            let Some(other) = graph.area(conn.target) else {
                continue;
            };
            let key = DoorKey::new(area.id, other.id);
            let from_low = area.id == key.low;
            let entry = pairs.entry(key).or_insert_with(|| {
                let (low, high, side) = if from_low {
                    (id, conn.target, dir)
                } else {
                    (conn.target, id, dir.opposite())
                };
                AreaPair {
                    low,
                    high,
                    side,
                    forward: false,
                    backward: false,
                }
            });
            if from_low {
                entry.forward = true;
                entry.side = dir;
            } else {
                entry.backward = true;
            }
        }
    }
    pairs
}

// Point every area-to-area edge that has a door at that door instead
fn route_through_doors(graph: &mut NavGraph) {
    let ids: Vec<NodeId> = graph.area_ids().collect();
    for id in ids {
        let Some(area) = graph.area(id) else {
            continue;
        };
        let mut rewrites = Vec::new();
        for (dir, slot) in Direction::ALL.into_iter().zip(area.connections.iter()) {
            for (i, conn) in slot.iter().enumerate() {
                let Some(target) = graph.area(conn.target) else {
                    continue;
                };
                if let Some(door_id) = graph.door_between(area.id, target.id) {
                    rewrites.push((dir, i, door_id));
                }
            }
        }

        for (dir, i, door_id) in rewrites {
            let Some(points) = graph.door(door_id).map(|d| d.points) else {
                continue;
            };
            if let Some(area) = graph.area_mut(id) {
                let conn = &mut area.connections[dir.index()][i];
                conn.target = door_id;
                conn.door = Some(points);
            }
        }
    }
}

// Link two-way doors on different sides of the same area
fn link_doors(graph: &mut NavGraph) -> usize {
    let mut links = Vec::new();
    for (id, _) in graph.areas() {
        let doors: Vec<(NodeId, Direction)> = graph
            .neighbors(id)
            .filter(|(_, c)| graph.door(c.target).is_some_and(Door::is_two_way))
            .map(|(dir, c)| (c.target, dir))
            .collect();
        for (i, &(a, side_a)) in doors.iter().enumerate() {
            for &(b, side_b) in &doors[i + 1..] {
                if side_a != side_b && a != b {
                    links.push((a, b));
                    links.push((b, a));
                }
            }
        }
    }

    let mut added = 0;
    for (from, to) in links {
        let dir = Direction::from_delta((graph.position(to) - graph.position(from)).truncate());
        if let Some(door) = graph.door_mut(from) {
            let exists = door.connections.iter().flatten().any(|c| c.target == to);
            if !exists {
                door.connections[dir.index()].push(Connection::new(to));
                added += 1;
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Corner;
    use crate::mesh::{grid_mesh, RawConnection};
    use glam::Vec3;

    fn no_doors() -> NavSettings {
        NavSettings {
            synthesize_doors: false,
            ..NavSettings::default()
        }
    }

    fn pair(a: RawArea, b: RawArea) -> (NavGraph, BuildReport) {
        GraphBuilder::new(&NavSettings::default())
            .build_from_areas([&a, &b])
            .unwrap()
    }

    fn linked(mut a: RawArea, mut b: RawArea, side: Direction) -> (RawArea, RawArea) {
        a.connect(side, b.id);
        b.connect(side.opposite(), a.id);
        (a, b)
    }

    #[test]
    fn test_normalization_closure() {
        let mut mesh = grid_mesh(3, 3, 10.0, 0.0);
        mesh.areas.get_mut(&1).unwrap().connect(Direction::North, 99);
        mesh.areas.get_mut(&2).unwrap().connect(Direction::North, 2);
        mesh.areas
            .get_mut(&3)
            .unwrap()
            .connect(Direction::South, RawConnection::Enriched { id: 6, cost: 2.5 });

        let (graph, report) = GraphBuilder::new(&no_doors()).build(&mesh).unwrap();
        assert_eq!(report.dropped_connections, 2);
        // the enriched duplicate of 3 -> 6 collapses into the existing edge
        assert_eq!(report.connections, 24);
        for (id, _) in graph.areas() {
            for (_, conn) in graph.neighbors(id) {
                assert!(conn.target.index() < graph.node_count());
                assert_ne!(conn.target, id);
            }
        }
    }

    #[test]
    fn test_enriched_cost_is_kept() {
        let mut a = RawArea::flat(1, 0.0, 0.0, 10.0, 10.0, 0.0);
        let b = RawArea::flat(2, 10.0, 0.0, 20.0, 10.0, 0.0);
        a.connect(Direction::East, RawConnection::Enriched { id: 2, cost: 3.0 });
        let (graph, _) = GraphBuilder::new(&no_doors()).build_from_areas([&a, &b]).unwrap();
        assert_eq!(graph.connections(NodeId(0), Direction::East)[0].cost, 3.0);
    }

    #[test]
    fn test_bad_enriched_costs_are_sanitized() {
        let mut a = RawArea::flat(1, 0.0, 0.0, 10.0, 10.0, 0.0);
        let b = RawArea::flat(2, 10.0, 0.0, 20.0, 10.0, 0.0);
        let c = RawArea::flat(3, 0.0, 10.0, 10.0, 20.0, 0.0);
        let d = RawArea::flat(4, 0.0, -10.0, 10.0, 0.0, 0.0);
        a.connect(Direction::East, RawConnection::Enriched { id: 2, cost: -2.0 });
        a.connect(Direction::South, RawConnection::Enriched { id: 3, cost: f32::NAN });
        a.connect(Direction::North, RawConnection::Enriched { id: 4, cost: f32::INFINITY });
        let (graph, report) = GraphBuilder::new(&no_doors())
            .build_from_areas([&a, &b, &c, &d])
            .unwrap();
        assert_eq!(report.dropped_connections, 0);
        assert_eq!(graph.connections(NodeId(0), Direction::East)[0].cost, 0.0);
        assert_eq!(graph.connections(NodeId(0), Direction::South)[0].cost, 1.0);
        assert_eq!(graph.connections(NodeId(0), Direction::North)[0].cost, 1.0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let settings = NavSettings::default();
        let builder = GraphBuilder::new(&settings);
        let (mut graph, mut report) = builder.build(&grid_mesh(3, 3, 100.0, 0.0)).unwrap();
        let connections = graph.connection_count();
        let doors = graph.door_count();

        builder.normalize(&mut graph, &mut report);
        builder.synthesize_doors(&mut graph, &mut report);
        assert_eq!(graph.connection_count(), connections);
        assert_eq!(graph.door_count(), doors);
    }

    #[test]
    fn test_input_errors() {
        let builder_settings = NavSettings::default();
        let builder = GraphBuilder::new(&builder_settings);
        assert!(matches!(
            builder.build_from_areas(std::iter::empty()),
            Err(FormatError::NoAreas)
        ));
        let a = RawArea::flat(4, 0.0, 0.0, 1.0, 1.0, 0.0);
        let b = RawArea::flat(4, 1.0, 0.0, 2.0, 1.0, 0.0);
        assert!(matches!(
            builder.build_from_areas([&a, &b]),
            Err(FormatError::DuplicateArea(4))
        ));
    }

    #[test]
    fn test_grid_doors() {
        let (graph, report) = GraphBuilder::new(&NavSettings::default())
            .build(&grid_mesh(3, 3, 100.0, 0.0))
            .unwrap();
        assert_eq!(report.doors, 12);
        assert_eq!(graph.door_count(), 12);
        // corners link 1 pair, edges 3 pairs, the center 6 pairs; both ways
        assert_eq!(report.door_links, 2 * (4 + 4 * 3 + 6));

        let center = graph.node_of_area(5).unwrap();
        for (_, conn) in graph.neighbors(center) {
            let door = graph.door(conn.target).expect("area edges lead to doors");
            assert!(door.is_two_way());
            assert!(conn.door.is_some());
        }
        assert!(graph.area_by_id(1).unwrap().is_wall_corner(Corner::NorthWest));
    }

    #[test]
    fn test_door_clamped_away_from_walls() {
        let (a, b) = linked(
            RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0),
            RawArea::flat(2, 100.0, 0.0, 200.0, 100.0, 0.0),
            Direction::East,
        );
        let (graph, _) = pair(a, b);
        let door = graph.door(graph.door_between(1, 2).unwrap()).unwrap();
        assert_eq!(door.owner, 2);
        assert_eq!(door.points.left, Some(Vec3::new(100.0, 24.0, 0.0)));
        assert_eq!(door.points.middle, Vec3::new(100.0, 50.0, 0.0));
        assert_eq!(door.points.right, Some(Vec3::new(100.0, 76.0, 0.0)));
        assert!(!door.needs_jump);
    }

    #[test]
    fn test_narrow_door_keeps_middle() {
        let (a, b) = linked(
            RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0),
            RawArea::flat(2, 100.0, 0.0, 140.0, 30.0, 0.0),
            Direction::East,
        );
        let (graph, _) = pair(a, b);
        let door = graph.door(graph.door_between(1, 2).unwrap()).unwrap();
        assert!(door.points.is_single());
        assert_eq!(door.points.middle, Vec3::new(100.0, 15.0, 0.0));
    }

    #[test]
    fn test_owner_is_higher_edge() {
        let (a, b) = linked(
            RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 30.0),
            RawArea::flat(2, 100.0, 0.0, 200.0, 100.0, 0.0),
            Direction::East,
        );
        let (graph, _) = pair(a, b);
        let door = graph.door(graph.door_between(1, 2).unwrap()).unwrap();
        assert_eq!(door.owner, 1);
        assert_eq!(door.points.middle.z, 30.0);
        assert!(door.needs_jump);

        // Same geometry with the ids swapped picks the same edge
        let (a, b) = linked(
            RawArea::flat(2, 0.0, 0.0, 100.0, 100.0, 30.0),
            RawArea::flat(1, 100.0, 0.0, 200.0, 100.0, 0.0),
            Direction::East,
        );
        let (graph, _) = pair(a, b);
        let door = graph.door(graph.door_between(1, 2).unwrap()).unwrap();
        assert_eq!(door.owner, 2);
        assert_eq!(door.points.middle, Vec3::new(100.0, 50.0, 30.0));
    }

    #[test]
    fn test_one_way_door() {
        let mut a = RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0);
        let b = RawArea::flat(2, 100.0, 0.0, 200.0, 100.0, 0.0);
        a.connect(Direction::East, 2);
        let (graph, _) = pair(a, b);
        let door_id = graph.door_between(1, 2).unwrap();
        let door = graph.door(door_id).unwrap();
        assert!(!door.is_two_way());
        assert!(graph.has_connection(NodeId(0), door_id));
        assert!(graph.has_connection(door_id, NodeId(1)));
        assert!(!graph.has_connection(door_id, NodeId(0)));
        assert_eq!(graph.neighbors(NodeId(1)).count(), 0);
    }

    #[test]
    fn test_corner_touch_skips_door() {
        let (a, b) = linked(
            RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0),
            RawArea::flat(2, 100.0, 100.0, 200.0, 200.0, 0.0),
            Direction::East,
        );
        let (graph, report) = pair(a, b);
        assert_eq!(report.skipped_doors, 1);
        assert_eq!(graph.door_count(), 0);
        // the connection survives as a direct area edge
        assert!(graph.has_connection(NodeId(0), NodeId(1)));
    }
}
