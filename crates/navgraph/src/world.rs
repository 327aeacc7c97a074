// NavigationWorld - owns everything built for one map
//
// Graph, spatial index and build report are replaced together on load and
// rebuild, and dropped together on clear. Node ids handed out by one build
// are meaningless after the next.

use std::path::Path;

use glam::Vec3;
use navgraph_shared::digest::ContentDigest;
use tracing::{debug, info};

use crate::error::{FormatError, NavError};
use crate::graph::{Area, BuildReport, GraphBuilder, NavGraph, NodeId};
use crate::mesh::{MeshFile, MeshParser, SharedMesh};
use crate::pathfinding::{self, PathResult};
use crate::settings::NavSettings;
use crate::spatial::KdTree;
use crate::trace::HullTracer;
use crate::traversal::{self, TraversalReport};

/// Default number of upcoming path vertices considered for skipping
pub const DEFAULT_LOOKAHEAD: usize = 2;

#[derive(Debug, Default)]
pub struct NavigationWorld {
    settings: NavSettings,
    parser: MeshParser,
    mesh: Option<SharedMesh>,
    digest: Option<ContentDigest>,
    graph: NavGraph,
    index: KdTree,
    report: BuildReport,
}

impl NavigationWorld {
    pub fn new(settings: NavSettings) -> Self {
        NavigationWorld {
            settings,
            ..Default::default()
        }
    }

    /// Parse and build in one step
    pub fn from_bytes(bytes: &[u8], settings: NavSettings) -> Result<Self, NavError> {
        let mut world = Self::new(settings);
        world.load(bytes)?;
        Ok(world)
    }

    /// Replace the current map with the one encoded in `bytes`
    pub fn load(&mut self, bytes: &[u8]) -> Result<&BuildReport, NavError> {
        let mesh = self.parser.parse(bytes)?;
        self.digest = Some(ContentDigest::of(bytes));
        self.install(mesh)?;
        Ok(&self.report)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&BuildReport, NavError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(NavError::Io)?;
        info!("Loading navigation mesh {}", path.display());
        self.load(&bytes)
    }

    /// Replace the current map with an already decoded mesh
    pub fn load_mesh(&mut self, mesh: MeshFile) -> Result<&BuildReport, NavError> {
        self.digest = None;
        self.install(SharedMesh::new(mesh))?;
        Ok(&self.report)
    }

    /// Build again from the last loaded mesh, e.g. after changing settings
    pub fn rebuild(&mut self) -> Result<&BuildReport, NavError> {
        let mesh = self.mesh.clone().ok_or(FormatError::NoAreas)?;
        self.install(mesh)?;
        Ok(&self.report)
    }

    /// Drop the graph, index and cached mesh
    pub fn clear(&mut self) {
        debug!("Clearing navigation world");
        self.mesh = None;
        self.digest = None;
        self.graph = NavGraph::new();
        self.index = KdTree::default();
        self.report = BuildReport::default();
        self.parser.clear_cache();
    }

    fn install(&mut self, mesh: SharedMesh) -> Result<(), NavError> {
        let (graph, report) = GraphBuilder::new(&self.settings).build(&mesh)?;
        self.index = KdTree::from_graph(&graph);
        self.graph = graph;
        self.report = report;
        self.mesh = Some(mesh);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        !self.graph.is_empty()
    }

    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    /// New settings take effect on the next `rebuild` or `load`
    pub fn set_settings(&mut self, settings: NavSettings) {
        self.settings = settings;
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn mesh(&self) -> Option<&MeshFile> {
        self.mesh.as_deref()
    }

    pub fn digest(&self) -> Option<ContentDigest> {
        self.digest
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn nearest_area_node(&self, point: Vec3) -> Option<NodeId> {
        self.index.nearest(point).map(|(id, _)| id)
    }

    pub fn find_nearest_area(&self, point: Vec3) -> Option<&Area> {
        self.nearest_area_node(point).and_then(|id| self.graph.area(id))
    }

    pub fn containing_area_node(&self, point: Vec3) -> Option<NodeId> {
        self.index.find_containing(
            &self.graph,
            point,
            self.settings.containment_candidates,
            self.settings.step_height,
            self.settings.jump_height,
        )
    }

    pub fn find_area_containing(&self, point: Vec3) -> Option<&Area> {
        self.containing_area_node(point).and_then(|id| self.graph.area(id))
    }

    /// Path between the areas holding `start` and `goal`
    pub fn find_path(&self, start: Vec3, goal: Vec3) -> Option<PathResult> {
        let from = self.containing_area_node(start)?;
        let to = self.containing_area_node(goal)?;
        self.find_path_between(from, to)
    }

    pub fn find_path_between(&self, start: NodeId, goal: NodeId) -> Option<PathResult> {
        pathfinding::find_path(&self.graph, start, goal, &self.settings)
    }

    pub fn check_straight_line<T: HullTracer + ?Sized>(
        &self,
        tracer: &T,
        start: Vec3,
        goal: Vec3,
    ) -> TraversalReport {
        traversal::check_straight_line(tracer, &self.settings, start, goal)
    }

    pub fn is_straight_line_traversable<T: HullTracer + ?Sized>(
        &self,
        tracer: &T,
        start: Vec3,
        goal: Vec3,
    ) -> bool {
        self.check_straight_line(tracer, start, goal).traversable
    }

    pub fn try_advance_along_graph<T: HullTracer + ?Sized>(
        &self,
        tracer: &T,
        current: Vec3,
        goal: Vec3,
        area: NodeId,
    ) -> bool {
        traversal::try_advance_along_graph(&self.graph, tracer, &self.settings, current, goal, area)
    }

    /// How many upcoming path vertices can be skipped from `current`
    pub fn skippable_vertices<T: HullTracer + ?Sized>(
        &self,
        tracer: &T,
        upcoming: &[Vec3],
        current: Vec3,
        area: NodeId,
    ) -> usize {
        traversal::skippable_vertices(
            &self.graph,
            tracer,
            &self.settings,
            upcoming,
            current,
            area,
            DEFAULT_LOOKAHEAD,
        )
    }

    /// Inflate the cost of a connection that turned out to be unusable
    pub fn penalize_connection(&mut self, from: NodeId, to: NodeId, factor: f32) -> bool {
        self.graph.penalize_connection(from, to, factor)
    }

    pub fn reset_connection_costs(&mut self) {
        self.graph.reset_connection_costs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{grid_mesh, MeshWriter};
    use crate::trace::BoxWorld;

    fn grid_bytes(cols: u32, rows: u32, size: f32) -> Vec<u8> {
        MeshWriter::new().write(&grid_mesh(cols, rows, size, 0.0))
    }

    #[test]
    fn test_load_and_query() {
        let world = NavigationWorld::from_bytes(&grid_bytes(3, 3, 100.0), NavSettings::default()).unwrap();
        assert!(world.is_loaded());
        assert_eq!(world.graph().area_count(), 9);
        assert_eq!(world.report().doors, 12);
        assert!(world.digest().is_some());

        let area = world.find_area_containing(Vec3::new(150.0, 150.0, 5.0)).unwrap();
        assert_eq!(area.id, 5);
        let nearest = world.find_nearest_area(Vec3::new(290.0, 10.0, 0.0)).unwrap();
        assert_eq!(nearest.id, 3);
    }

    #[test]
    fn test_find_path_through_doors() {
        let world = NavigationWorld::from_bytes(&grid_bytes(3, 3, 100.0), NavSettings::default()).unwrap();
        let path = world.find_path(Vec3::new(50.0, 50.0, 0.0), Vec3::new(250.0, 250.0, 0.0)).unwrap();
        let graph = world.graph();
        assert_eq!(graph.area(path.nodes[0]).unwrap().id, 1);
        assert_eq!(graph.area(*path.nodes.last().unwrap()).unwrap().id, 9);
        assert!(path.nodes.iter().any(|n| graph.is_door(*n)));
    }

    #[test]
    fn test_rebuild_with_new_settings() {
        let mut world = NavigationWorld::from_bytes(&grid_bytes(2, 2, 100.0), NavSettings::default()).unwrap();
        assert_eq!(world.graph().door_count(), 4);

        world.set_settings(NavSettings {
            synthesize_doors: false,
            ..NavSettings::default()
        });
        world.rebuild().unwrap();
        assert_eq!(world.graph().door_count(), 0);
        assert_eq!(world.graph().area_count(), 4);
    }

    #[test]
    fn test_clear() {
        let mut world = NavigationWorld::from_bytes(&grid_bytes(2, 2, 100.0), NavSettings::default()).unwrap();
        world.clear();
        assert!(!world.is_loaded());
        assert!(world.find_nearest_area(Vec3::ZERO).is_none());
        assert!(world.find_path(Vec3::ZERO, Vec3::ONE).is_none());
        assert!(world.rebuild().is_err());
    }

    #[test]
    fn test_bad_bytes_leave_world_untouched() {
        let mut world = NavigationWorld::from_bytes(&grid_bytes(2, 2, 100.0), NavSettings::default()).unwrap();
        assert!(world.load(&[0u8; 8]).is_err());
        assert_eq!(world.graph().area_count(), 4);
    }

    #[test]
    fn test_traversal_through_world() {
        let world = NavigationWorld::from_bytes(&grid_bytes(3, 3, 100.0), NavSettings::default()).unwrap();
        let floors = BoxWorld::from_area_floors(world.graph(), 20.0);
        assert!(world.is_straight_line_traversable(&floors, Vec3::new(10.0, 10.0, 0.0), Vec3::new(290.0, 290.0, 0.0)));

        let start = world.containing_area_node(Vec3::new(50.0, 50.0, 0.0)).unwrap();
        assert!(world.try_advance_along_graph(&floors, Vec3::new(50.0, 50.0, 0.0), Vec3::new(250.0, 50.0, 0.0), start));
        let upcoming = [Vec3::new(150.0, 50.0, 0.0), Vec3::new(250.0, 50.0, 0.0)];
        assert_eq!(world.skippable_vertices(&floors, &upcoming, Vec3::new(50.0, 50.0, 0.0), start), 1);
    }

    #[test]
    fn test_penalty_passthrough() {
        let mut world = NavigationWorld::from_bytes(&grid_bytes(2, 1, 100.0), NavSettings::default()).unwrap();
        let from = world.graph().node_of_area(1).unwrap();
        let door = world.graph().door_between(1, 2).unwrap();
        assert!(world.penalize_connection(from, door, 5.0));
        world.reset_connection_costs();
        assert!(world.graph().neighbors(from).all(|(_, c)| c.cost == 1.0));
    }

    #[test]
    fn test_penalty_after_clear() {
        let mut world = NavigationWorld::from_bytes(&grid_bytes(2, 1, 100.0), NavSettings::default()).unwrap();
        world.clear();
        assert!(!world.penalize_connection(NodeId(0), NodeId(1), 2.0));
        assert!(!world.graph().is_door(NodeId(0)));
    }

    #[test]
    fn test_nearest_area_matches_brute_force() {
        use crate::mesh::{MeshFile, RawArea};
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xa5ea);
        let mut mesh = MeshFile::new();
        for id in 1..=60 {
            let x: f32 = rng.gen_range(0.0..2000.0);
            let y: f32 = rng.gen_range(0.0..2000.0);
            let w: f32 = rng.gen_range(10.0..80.0);
            let h: f32 = rng.gen_range(10.0..80.0);
            let z: f32 = rng.gen_range(-100.0..100.0);
            mesh.insert_area(RawArea::flat(id, x, y, x + w, y + h, z));
        }
        let bytes = MeshWriter::new().write(&mesh);
        let world = NavigationWorld::from_bytes(&bytes, NavSettings::default()).unwrap();
        assert_eq!(world.graph().area_count(), 60);

        for _ in 0..100 {
            let query = Vec3::new(
                rng.gen_range(-200.0..2200.0),
                rng.gen_range(-200.0..2200.0),
                rng.gen_range(-150.0..150.0),
            );
            let best = world
                .graph()
                .areas()
                .map(|(_, area)| area.center().distance(query))
                .fold(f32::INFINITY, f32::min);
            let found = world.find_nearest_area(query).unwrap();
            assert_eq!(found.center().distance(query), best);
        }
    }
}
