// End-to-end checks: encode a mesh, load it through the parser and query it

use glam::Vec3;
use navgraph::direction::Direction;
use navgraph::mesh::{grid_mesh, MeshFile, RawArea};
use navgraph::{BoxWorld, MeshParser, MeshWriter, NavSettings, NavigationWorld};

fn area_only() -> NavSettings {
    NavSettings {
        synthesize_doors: false,
        simplify_paths: false,
        ..NavSettings::default()
    }
}

fn load(mesh: &MeshFile, settings: NavSettings) -> NavigationWorld {
    let bytes = MeshWriter::new().write(mesh);
    NavigationWorld::from_bytes(&bytes, settings).expect("mesh loads")
}

#[test]
fn unit_grid_corner_to_corner() {
    let world = load(&grid_mesh(3, 3, 1.0, 0.0), area_only());
    let path = world
        .find_path(Vec3::new(0.5, 0.5, 0.0), Vec3::new(2.5, 2.5, 0.0))
        .expect("path exists");
    assert_eq!(path.len(), 5);

    // A hull and stride sized to the grid, so the walk really crosses cells
    let small = NavSettings {
        hull_half_width: 0.2,
        hull_height: 1.0,
        goal_tolerance_xy: 0.1,
        trace_step_length: 0.5,
        ..area_only()
    };
    let floors = BoxWorld::from_area_floors(world.graph(), 10.0);
    let goal = Vec3::new(2.0, 2.0, 0.0);
    let report = navgraph::traversal::check_straight_line(&floors, &small, Vec3::ZERO, goal);
    assert!(report.traversable);
    assert!(report.trail.len() > 5);
    let last = report.trail[report.trail.len() - 1];
    assert!(last.truncate().distance(glam::Vec2::new(2.0, 2.0)) <= 0.1);
}

#[test]
fn every_center_is_contained() {
    let world = load(&grid_mesh(8, 8, 40.0, 12.0), NavSettings::default());
    for (_, area) in world.graph().areas() {
        let found = world.find_area_containing(area.center()).expect("area found");
        assert_eq!(found.id, area.id);
    }
}

#[test]
fn disconnected_islands_have_no_path() {
    let mut mesh = MeshFile::new();
    let mut a = RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0);
    let mut b = RawArea::flat(2, 100.0, 0.0, 200.0, 100.0, 0.0);
    a.connect(Direction::East, 2);
    b.connect(Direction::West, 1);
    mesh.insert_area(a);
    mesh.insert_area(b);
    mesh.insert_area(RawArea::flat(3, 500.0, 0.0, 600.0, 100.0, 0.0));

    let world = load(&mesh, NavSettings::default());
    assert!(world.find_path(Vec3::new(50.0, 50.0, 0.0), Vec3::new(150.0, 50.0, 0.0)).is_some());
    assert!(world.find_path(Vec3::new(50.0, 50.0, 0.0), Vec3::new(550.0, 50.0, 0.0)).is_none());
}

#[test]
fn one_way_drop_is_respected() {
    // A ledge you can drop off but not climb back up
    let mut mesh = MeshFile::new();
    let mut top = RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 200.0);
    let bottom = RawArea::flat(2, 100.0, 0.0, 200.0, 100.0, 0.0);
    top.connect(Direction::East, 2);
    mesh.insert_area(top);
    mesh.insert_area(bottom);

    let world = load(&mesh, NavSettings::default());
    let down = world.find_path(Vec3::new(50.0, 50.0, 200.0), Vec3::new(150.0, 50.0, 0.0));
    assert!(down.is_some());
    let up = world.find_path(Vec3::new(150.0, 50.0, 0.0), Vec3::new(50.0, 50.0, 200.0));
    assert!(up.is_none());
}

#[test]
fn parse_cache_returns_equal_meshes() {
    let bytes = MeshWriter::new().write(&grid_mesh(4, 2, 32.0, 0.0));
    let parser = MeshParser::new();
    let first = parser.parse(&bytes).unwrap();
    let second = parser.parse(&bytes).unwrap();
    assert_eq!(*first, *second);
    assert_eq!(parser.cached(), 1);
}

#[test]
fn obstacle_height_flips_traversability() {
    let world = load(&grid_mesh(10, 1, 100.0, 0.0), NavSettings::default());
    let start = Vec3::new(50.0, 50.0, 0.0);
    let goal = Vec3::new(950.0, 50.0, 0.0);

    let open = BoxWorld::from_area_floors(world.graph(), 20.0);
    assert!(world.is_straight_line_traversable(&open, start, start));
    assert!(world.is_straight_line_traversable(&open, start, goal));

    let low = open
        .clone()
        .with_box(Vec3::new(480.0, -50.0, 0.0), Vec3::new(520.0, 150.0, 40.0));
    assert!(world.is_straight_line_traversable(&low, start, goal));

    let high = open.with_box(Vec3::new(480.0, -50.0, 0.0), Vec3::new(520.0, 150.0, 100.0));
    assert!(!world.is_straight_line_traversable(&high, start, goal));
}

#[test]
fn path_follower_skips_ahead() {
    let world = load(&grid_mesh(5, 1, 100.0, 0.0), NavSettings::default());
    let floors = BoxWorld::from_area_floors(world.graph(), 20.0);
    let current = Vec3::new(50.0, 50.0, 0.0);
    let area = world.containing_area_node(current).unwrap();

    let path = world
        .find_path(current, Vec3::new(450.0, 50.0, 0.0))
        .expect("corridor path");
    let upcoming: Vec<Vec3> = path.points(world.graph()).into_iter().skip(1).collect();
    assert!(upcoming.len() >= 2);
    assert_eq!(world.skippable_vertices(&floors, &upcoming, current, area), 2);
}
