// Navigation mesh file model
//
// The walkable-area file is a little-endian stream: header, place-name
// table, area records and a trailing ladder table. `MeshParser` decodes it
// into a `MeshFile`; `MeshWriter` encodes one back. Only the area corners
// and connection lists feed the graph, the remaining fields are kept for
// tooling.

mod parser;
mod writer;

pub use parser::{parse_mesh, MeshParser};
pub use writer::MeshWriter;

use crate::direction::Direction;
use glam::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;

/// File magic, stored little endian as CE FA ED FE
pub const NAV_MAGIC: u32 = 0xFEED_FACE;
/// Oldest major version the parser accepts
pub const MIN_VERSION: u32 = 11;
/// Newest major version, also the version the writer emits
pub const CURRENT_VERSION: u32 = 16;
pub const CURRENT_SUB_VERSION: u32 = 2;

// Sanity limits, well above anything a real map produces
pub(crate) const MAX_AREAS: usize = 1 << 20;
pub(crate) const MAX_LIST_LEN: usize = 1 << 16;

/// One outgoing connection as it arrives from input
///
/// The file only carries bare target ids; programmatic callers may hand in
/// connections that already carry a cost. The graph builder turns both into
/// the same `Connection`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawConnection {
    Id(u32),
    Enriched { id: u32, cost: f32 },
}

impl RawConnection {
    pub fn target_id(&self) -> u32 {
        match *self {
            RawConnection::Id(id) => id,
            RawConnection::Enriched { id, .. } => id,
        }
    }

    pub fn cost(&self) -> f32 {
        match *self {
            RawConnection::Id(_) => 1.0,
            RawConnection::Enriched { cost, .. } => cost,
        }
    }
}

impl From<u32> for RawConnection {
    fn from(id: u32) -> Self {
        RawConnection::Id(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HidingSpot {
    pub id: u32,
    pub position: Vec3,
    pub flags: u8,
}

/// Stop along an encounter path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterSpot {
    pub area_id: u32,
    /// Distance along the path, scaled to 0..=255
    pub t: u8,
}

/// Precomputed line of sight route through an area
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterPath {
    pub from_area: u32,
    pub from_dir: u8,
    pub to_area: u32,
    pub to_dir: u8,
    pub spots: Vec<EncounterSpot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleArea {
    pub id: u32,
    pub attributes: u8,
}

/// A walkable quadrilateral as stored in the file
#[derive(Debug, Clone, PartialEq)]
pub struct RawArea {
    pub id: u32,
    pub flags: u32,
    /// Corner with the smallest x and y
    pub nw: Vec3,
    /// Corner with the largest x and y
    pub se: Vec3,
    pub ne_z: f32,
    pub sw_z: f32,
    /// Outgoing connections, indexed by `Direction`
    pub connections: [Vec<RawConnection>; 4],
    pub hiding_spots: Vec<HidingSpot>,
    pub encounter_paths: Vec<EncounterPath>,
    pub place_id: u16,
    pub ladders_up: Vec<u32>,
    pub ladders_down: Vec<u32>,
    pub earliest_occupy: [f32; 2],
    pub light_intensity: [f32; 4],
    pub visible_areas: Vec<VisibleArea>,
    pub inherit_visibility_from: u32,
    pub custom_data: u32,
}

impl RawArea {
    /// Area spanning `nw`..`se` with the remaining corners at the given heights
    pub fn new(id: u32, nw: Vec3, se: Vec3, ne_z: f32, sw_z: f32) -> Self {
        RawArea {
            id,
            flags: 0,
            nw,
            se,
            ne_z,
            sw_z,
            connections: Default::default(),
            hiding_spots: Vec::new(),
            encounter_paths: Vec::new(),
            place_id: 0,
            ladders_up: Vec::new(),
            ladders_down: Vec::new(),
            earliest_occupy: [0.0; 2],
            light_intensity: [1.0; 4],
            visible_areas: Vec::new(),
            inherit_visibility_from: 0,
            custom_data: 0,
        }
    }

    /// Flat area at height `z`
    pub fn flat(id: u32, min_x: f32, min_y: f32, max_x: f32, max_y: f32, z: f32) -> Self {
        Self::new(id, Vec3::new(min_x, min_y, z), Vec3::new(max_x, max_y, z), z, z)
    }

    /// Corners in NW, NE, SE, SW order
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.nw,
            Vec3::new(self.se.x, self.nw.y, self.ne_z),
            self.se,
            Vec3::new(self.nw.x, self.se.y, self.sw_z),
        ]
    }

    pub fn connect(&mut self, dir: Direction, target: impl Into<RawConnection>) {
        self.connections[dir.index()].push(target.into());
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    pub id: u32,
    pub width: f32,
    pub top: Vec3,
    pub bottom: Vec3,
    pub length: f32,
    pub direction: u32,
    pub top_forward_area: u32,
    pub top_left_area: u32,
    pub top_right_area: u32,
    pub top_behind_area: u32,
    pub bottom_area: u32,
}

/// A decoded mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFile {
    pub version: u32,
    pub sub_version: u32,
    pub bsp_size: u32,
    pub is_analyzed: bool,
    pub places: Vec<String>,
    pub has_unnamed_areas: bool,
    /// Areas keyed by id
    pub areas: BTreeMap<u32, RawArea>,
    pub ladders: Vec<Ladder>,
}

impl MeshFile {
    /// An empty file at the current version
    pub fn new() -> Self {
        MeshFile {
            version: CURRENT_VERSION,
            sub_version: CURRENT_SUB_VERSION,
            bsp_size: 0,
            is_analyzed: false,
            places: Vec::new(),
            has_unnamed_areas: false,
            areas: BTreeMap::new(),
            ladders: Vec::new(),
        }
    }

    pub fn insert_area(&mut self, area: RawArea) {
        self.areas.insert(area.id, area);
    }

    /// Place name of an area; place ids are 1-based, 0 means unnamed
    pub fn place_name(&self, area: &RawArea) -> Option<&str> {
        let index = (area.place_id as usize).checked_sub(1)?;
        self.places.get(index).map(String::as_str)
    }

    pub fn connection_count(&self) -> usize {
        self.areas.values().map(RawArea::connection_count).sum()
    }
}

impl Default for MeshFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed files are shared between cache hits
pub type SharedMesh = Arc<MeshFile>;

/// Square grid of flat areas connected to their axis neighbors
///
/// Area ids are `1 + row * cols + col`; row 0 is the north edge.
pub fn grid_mesh(cols: u32, rows: u32, cell_size: f32, z: f32) -> MeshFile {
    let mut mesh = MeshFile::new();
    let id_of = |col: u32, row: u32| 1 + row * cols + col;
    for row in 0..rows {
        for col in 0..cols {
            let min_x = col as f32 * cell_size;
            let min_y = row as f32 * cell_size;
            let mut area = RawArea::flat(
                id_of(col, row),
                min_x,
                min_y,
                min_x + cell_size,
                min_y + cell_size,
                z,
            );
            if row > 0 {
                area.connect(Direction::North, id_of(col, row - 1));
            }
            if col + 1 < cols {
                area.connect(Direction::East, id_of(col + 1, row));
            }
            if row + 1 < rows {
                area.connect(Direction::South, id_of(col, row + 1));
            }
            if col > 0 {
                area.connect(Direction::West, id_of(col - 1, row));
            }
            mesh.insert_area(area);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_order() {
        let area = RawArea::new(7, Vec3::new(0.0, 0.0, 1.0), Vec3::new(10.0, 20.0, 3.0), 2.0, 4.0);
        let [nw, ne, se, sw] = area.corners();
        assert_eq!(nw, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ne, Vec3::new(10.0, 0.0, 2.0));
        assert_eq!(se, Vec3::new(10.0, 20.0, 3.0));
        assert_eq!(sw, Vec3::new(0.0, 20.0, 4.0));
    }

    #[test]
    fn test_grid_mesh_connections() {
        let mesh = grid_mesh(3, 3, 1.0, 0.0);
        assert_eq!(mesh.areas.len(), 9);
        // 12 undirected adjacencies, stored in both directions
        assert_eq!(mesh.connection_count(), 24);
        let center = &mesh.areas[&5];
        for dir in Direction::ALL {
            assert_eq!(center.connections[dir.index()].len(), 1);
        }
        assert_eq!(center.connections[Direction::North.index()][0].target_id(), 2);
    }

    #[test]
    fn test_raw_connection_shapes() {
        let bare = RawConnection::from(4);
        let rich = RawConnection::Enriched { id: 4, cost: 3.0 };
        assert_eq!(bare.target_id(), rich.target_id());
        assert_eq!(bare.cost(), 1.0);
        assert_eq!(rich.cost(), 3.0);
    }

    #[test]
    fn test_place_name_is_one_based() {
        let mut mesh = MeshFile::new();
        mesh.places.push("RedSpawn".to_string());
        let mut area = RawArea::flat(1, 0.0, 0.0, 1.0, 1.0, 0.0);
        assert_eq!(mesh.place_name(&area), None);
        area.place_id = 1;
        assert_eq!(mesh.place_name(&area), Some("RedSpawn"));
    }
}
