// Area-to-area adjacency seen from both ends of each connection
//
// Connections are directional and may be one-way, so a neighbor along a side
// is anything this area connects to on that side plus anything connecting
// into this area from the opposite side. Doors are looked through to the
// area behind them.

use super::{NavGraph, NodeId};
use crate::direction::Direction;

pub(crate) struct Adjacency {
    sides: Vec<[Vec<NodeId>; 4]>,
}

impl Adjacency {
    pub(crate) fn build(graph: &NavGraph) -> Self {
        let mut sides: Vec<[Vec<NodeId>; 4]> = vec![Default::default(); graph.area_count()];
        for (id, _) in graph.areas() {
            for (dir, conn) in graph.neighbors(id) {
                let Some(target) = area_behind(graph, id, conn.target) else {
                    continue;
                };
                if target == id {
                    continue;
                }
                push_unique(&mut sides[id.index()][dir.index()], target);
                push_unique(&mut sides[target.index()][dir.opposite().index()], id);
            }
        }
        Adjacency { sides }
    }

    /// Neighbors of `area` along `side`
    pub(crate) fn side(&self, area: NodeId, side: Direction) -> &[NodeId] {
        self.sides
            .get(area.index())
            .map(|s| s[side.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Neighbors of `area` on every side, deduplicated
    pub(crate) fn all(&self, area: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for dir in Direction::ALL {
            for &n in self.side(area, dir) {
                push_unique(&mut out, n);
            }
        }
        out
    }
}

// Area reached through `target`, which is either an area or a door next to `from`
fn area_behind(graph: &NavGraph, from: NodeId, target: NodeId) -> Option<NodeId> {
    match graph.door(target) {
        Some(door) => door.other_area(from),
        None => Some(target),
    }
}

pub(crate) fn push_unique(list: &mut Vec<NodeId>, id: NodeId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Area, Connection};
    use crate::mesh::RawArea;

    #[test]
    fn test_one_way_seen_from_both_ends() {
        let mut graph = NavGraph::new();
        let mut a = Area::from_raw(&RawArea::flat(1, 0.0, 0.0, 10.0, 10.0, 0.0));
        a.connections[Direction::East.index()].push(Connection::new(NodeId(1)));
        graph.add_area(a);
        graph.add_area(Area::from_raw(&RawArea::flat(2, 10.0, 0.0, 20.0, 10.0, 0.0)));

        let adjacency = Adjacency::build(&graph);
        assert_eq!(adjacency.side(NodeId(0), Direction::East), &[NodeId(1)]);
        assert_eq!(adjacency.side(NodeId(1), Direction::West), &[NodeId(0)]);
        assert!(adjacency.side(NodeId(1), Direction::East).is_empty());
        assert_eq!(adjacency.all(NodeId(1)), vec![NodeId(0)]);
    }
}
