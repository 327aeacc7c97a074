// Subcommand implementations

use anyhow::{anyhow, Context};
use glam::Vec3;
use serde::Serialize;

use navgraph::graph::NavNode;
use navgraph::mesh::grid_mesh;
use navgraph::{BoxWorld, MeshWriter, NavSettings, NavigationWorld, PathResult};

fn open_world(file: &str, settings: NavSettings) -> anyhow::Result<NavigationWorld> {
    let mut world = NavigationWorld::new(settings);
    world
        .load_file(file)
        .with_context(|| format!("Failed to load {}", file))?;
    Ok(world)
}

pub fn run_info(file: &str, settings: NavSettings) -> anyhow::Result<()> {
    let world = open_world(file, settings)?;
    let report = world.report();

    if let Some(mesh) = world.mesh() {
        println!("version:             {}.{}", mesh.version, mesh.sub_version);
        println!("analyzed:            {}", mesh.is_analyzed);
        println!("places:              {}", mesh.places.len());
        println!("ladders:             {}", mesh.ladders.len());
    }
    if let Some(digest) = world.digest() {
        println!("sha1:                {}", digest);
    }
    println!("areas:               {}", report.areas);
    println!("connections:         {}", report.connections);
    println!("dropped connections: {}", report.dropped_connections);
    println!("degenerate areas:    {}", report.degenerate_areas);
    println!("wall corners:        {}", report.wall_corners);
    println!("doors:               {}", report.doors);
    println!("skipped doors:       {}", report.skipped_doors);
    println!("door links:          {}", report.door_links);
    Ok(())
}

pub fn run_nearest(file: &str, point: Vec3, settings: NavSettings) -> anyhow::Result<()> {
    let world = open_world(file, settings)?;
    let area = world
        .find_nearest_area(point)
        .ok_or_else(|| anyhow!("Mesh has no areas"))?;
    println!("area {} center {}", area.id, area.center());
    Ok(())
}

pub fn run_contains(file: &str, point: Vec3, settings: NavSettings) -> anyhow::Result<()> {
    let world = open_world(file, settings)?;
    let area = world
        .find_area_containing(point)
        .ok_or_else(|| anyhow!("Mesh has no areas"))?;
    let inside = area.contains(point, world.settings().step_height, world.settings().jump_height);
    println!(
        "area {} ({})",
        area.id,
        if inside { "contains point" } else { "nearest center" }
    );
    Ok(())
}

#[derive(Serialize)]
struct PathVertex {
    node: u32,
    kind: &'static str,
    /// File id for areas, owner area id for doors
    area: u32,
    /// Crossing this door takes a jump
    jump: bool,
    position: [f32; 3],
}

#[derive(Serialize)]
struct PathOutput {
    total_cost: f32,
    vertices: Vec<PathVertex>,
}

fn describe(world: &NavigationWorld, path: &PathResult) -> PathOutput {
    let graph = world.graph();
    let vertices = path
        .nodes
        .iter()
        .map(|id| {
            let (kind, area, jump) = match graph.node(*id) {
                NavNode::Area(area) => ("area", area.id, false),
                NavNode::Door(door) => ("door", door.owner, door.needs_jump),
            };
            PathVertex {
                node: id.0,
                kind,
                area,
                jump,
                position: graph.position(*id).to_array(),
            }
        })
        .collect();
    PathOutput {
        total_cost: path.total_cost,
        vertices,
    }
}

pub fn run_path(
    file: &str,
    from: Vec3,
    to: Vec3,
    json: bool,
    settings: NavSettings,
) -> anyhow::Result<()> {
    let world = open_world(file, settings)?;
    let path = world
        .find_path(from, to)
        .ok_or_else(|| anyhow!("No path from {} to {}", from, to))?;
    let output = describe(&world, &path);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    println!("{} vertices, cost {:.1}", output.vertices.len(), output.total_cost);
    for v in &output.vertices {
        println!(
            "  {:<4} {:>6}  ({:.1}, {:.1}, {:.1}){}",
            v.kind,
            v.area,
            v.position[0],
            v.position[1],
            v.position[2],
            if v.jump { "  jump" } else { "" }
        );
    }
    Ok(())
}

pub fn run_check(
    file: &str,
    from: Vec3,
    to: Vec3,
    thickness: f32,
    settings: NavSettings,
) -> anyhow::Result<()> {
    let world = open_world(file, settings)?;
    let floors = BoxWorld::from_area_floors(world.graph(), thickness);
    let report = world.check_straight_line(&floors, from, to);
    println!(
        "{} after {} steps ({} jumps)",
        if report.traversable { "traversable" } else { "blocked" },
        report.trail.len(),
        report.jumps
    );
    for p in &report.trail {
        tracing::debug!("trail {}", p);
    }
    Ok(())
}

pub fn run_synth(output: &str, cols: u32, rows: u32, size: f32, height: f32) -> anyhow::Result<()> {
    if cols == 0 || rows == 0 {
        return Err(anyhow!("Grid needs at least one row and one column"));
    }
    let mesh = grid_mesh(cols, rows, size, height);
    let bytes = MeshWriter::new().write(&mesh);
    std::fs::write(output, &bytes).with_context(|| format!("Failed to write {}", output))?;
    tracing::info!("Wrote {}x{} grid ({} bytes) to {}", cols, rows, bytes.len(), output);
    Ok(())
}
