// navgraph - walkable-area meshes turned into a routable graph
//
// Pipeline: `mesh` decodes the binary area file, `graph` normalizes the
// connections and synthesizes doors between neighboring areas, `spatial`
// indexes area centers, `pathfinding` runs A* over areas and doors and
// `traversal` validates or shortcuts a route with hull traces supplied by the
// host through `trace::HullTracer`. `NavigationWorld` ties it together for a
// single map.

pub mod direction;
pub mod error;
pub mod graph;
pub mod mesh;
pub mod pathfinding;
pub mod settings;
pub mod spatial;
pub mod trace;
pub mod traversal;
pub mod world;

pub use direction::Direction;
pub use error::{FormatError, GeometryError, NavError};
pub use graph::{Area, BuildReport, Connection, Door, GraphBuilder, NavGraph, NodeId};
pub use mesh::{parse_mesh, MeshFile, MeshParser, MeshWriter};
pub use pathfinding::PathResult;
pub use settings::{NavSettings, StepPolicy};
pub use spatial::KdTree;
pub use trace::{BoxWorld, Hull, HullTracer, TraceResult};
pub use traversal::TraversalReport;
pub use world::NavigationWorld;

/// Parse `bytes` and build its graph
pub fn build_graph(bytes: &[u8], settings: &NavSettings) -> Result<NavGraph, NavError> {
    let mesh = parse_mesh(bytes)?;
    let (graph, _) = GraphBuilder::new(settings).build(&mesh)?;
    Ok(graph)
}
