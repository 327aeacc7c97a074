// Navigation graph: areas and doors in one dense arena
//
// Areas occupy node ids `0..area_count` in ascending file-id order; doors are
// appended after them by the builder. Every reference into the graph is a
// `NodeId`, so dropping the graph invalidates everything at once.

mod adjacency;
mod area;
mod builder;
mod door;
mod wall_corners;

pub use area::{Area, Corner, Rect};
pub use builder::{BuildReport, GraphBuilder};
pub use door::{Door, DoorKey, DoorPoints};

use std::collections::HashMap;

use glam::Vec3;

use crate::direction::Direction;

/// Dense index of a vertex in a `NavGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed, weighted edge
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub target: NodeId,
    /// Cost multiplier, 1 unless penalized
    pub cost: f32,
    /// Door geometry cached on area-to-door edges
    pub door: Option<DoorPoints>,
}

impl Connection {
    pub fn new(target: NodeId) -> Self {
        Connection {
            target,
            cost: 1.0,
            door: None,
        }
    }

    pub fn with_cost(target: NodeId, cost: f32) -> Self {
        Connection {
            target,
            cost,
            door: None,
        }
    }
}

/// Outgoing connections indexed by `Direction`
pub type ConnectionSlots = [Vec<Connection>; 4];

#[derive(Debug, Clone)]
pub enum NavNode {
    Area(Area),
    Door(Door),
}

impl NavNode {
    pub fn position(&self) -> Vec3 {
        match self {
            NavNode::Area(area) => area.center(),
            NavNode::Door(door) => door.points.middle,
        }
    }

    pub fn connections(&self) -> &ConnectionSlots {
        match self {
            NavNode::Area(area) => &area.connections,
            NavNode::Door(door) => &door.connections,
        }
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionSlots {
        match self {
            NavNode::Area(area) => &mut area.connections,
            NavNode::Door(door) => &mut door.connections,
        }
    }

    pub fn as_area(&self) -> Option<&Area> {
        match self {
            NavNode::Area(area) => Some(area),
            NavNode::Door(_) => None,
        }
    }

    pub fn as_door(&self) -> Option<&Door> {
        match self {
            NavNode::Door(door) => Some(door),
            NavNode::Area(_) => None,
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self, NavNode::Door(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
    area_count: usize,
    area_index: HashMap<u32, NodeId>,
    door_index: HashMap<DoorKey, NodeId>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an area. Areas must all be added before the first door.
    pub fn add_area(&mut self, area: Area) -> NodeId {
        debug_assert_eq!(self.nodes.len(), self.area_count, "areas added after doors");
        let id = NodeId(self.nodes.len() as u32);
        self.area_index.insert(area.id, id);
        self.nodes.push(NavNode::Area(area));
        self.area_count += 1;
        id
    }

    pub(crate) fn add_door(&mut self, door: Door) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.door_index.insert(door.key, id);
        self.nodes.push(NavNode::Door(door));
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn area_count(&self) -> usize {
        self.area_count
    }

    pub fn door_count(&self) -> usize {
        self.nodes.len() - self.area_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &NavNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut NavNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn position(&self, id: NodeId) -> Vec3 {
        self.node(id).position()
    }

    pub fn area(&self, id: NodeId) -> Option<&Area> {
        self.nodes.get(id.index()).and_then(NavNode::as_area)
    }

    pub(crate) fn area_mut(&mut self, id: NodeId) -> Option<&mut Area> {
        match self.nodes.get_mut(id.index()) {
            Some(NavNode::Area(area)) => Some(area),
            _ => None,
        }
    }

    pub fn door(&self, id: NodeId) -> Option<&Door> {
        self.nodes.get(id.index()).and_then(NavNode::as_door)
    }

    pub(crate) fn door_mut(&mut self, id: NodeId) -> Option<&mut Door> {
        match self.nodes.get_mut(id.index()) {
            Some(NavNode::Door(door)) => Some(door),
            _ => None,
        }
    }

    pub fn is_door(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(NavNode::is_door)
    }

    /// Node holding the area with file id `area_id`
    pub fn node_of_area(&self, area_id: u32) -> Option<NodeId> {
        self.area_index.get(&area_id).copied()
    }

    pub fn area_by_id(&self, area_id: u32) -> Option<&Area> {
        self.node_of_area(area_id).and_then(|id| self.area(id))
    }

    /// Door generated between two areas, in either order
    pub fn door_between(&self, a: u32, b: u32) -> Option<NodeId> {
        self.door_index.get(&DoorKey::new(a, b)).copied()
    }

    pub fn areas(&self) -> impl Iterator<Item = (NodeId, &Area)> {
        self.nodes[..self.area_count]
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_area().map(|area| (NodeId(i as u32), area)))
    }

    pub fn doors(&self) -> impl Iterator<Item = (NodeId, &Door)> {
        self.nodes[self.area_count..]
            .iter()
            .enumerate()
            .filter_map(move |(i, node)| {
                node.as_door()
                    .map(|door| (NodeId((self.area_count + i) as u32), door))
            })
    }

    pub fn area_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.area_count as u32).map(NodeId)
    }

    pub fn connections(&self, id: NodeId, dir: Direction) -> &[Connection] {
        &self.node(id).connections()[dir.index()]
    }

    /// All outgoing connections with the slot they live in
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (Direction, &Connection)> {
        self.node(id)
            .connections()
            .iter()
            .zip(Direction::ALL)
            .flat_map(|(slot, dir)| slot.iter().map(move |c| (dir, c)))
    }

    pub fn has_connection(&self, from: NodeId, to: NodeId) -> bool {
        self.neighbors(from).any(|(_, c)| c.target == to)
    }

    pub fn connection_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.connections().iter().map(Vec::len).sum::<usize>())
            .sum()
    }

    /// Multiply the cost of every `from -> to` edge by `factor`
    ///
    /// Returns false when no such edge exists.
    pub fn penalize_connection(&mut self, from: NodeId, to: NodeId, factor: f32) -> bool {
        let Some(node) = self.node_mut(from) else {
            return false;
        };
        let mut found = false;
        for slot in node.connections_mut() {
            for conn in slot.iter_mut().filter(|c| c.target == to) {
                conn.cost = (conn.cost * factor).max(0.0);
                found = true;
            }
        }
        found
    }

    /// Restore every connection cost to 1
    pub fn reset_connection_costs(&mut self) {
        for node in &mut self.nodes {
            for slot in node.connections_mut() {
                for conn in slot.iter_mut() {
                    conn.cost = 1.0;
                }
            }
        }
    }
}
