// MeshParser - decodes walkable-area files
//
// Parsing is a pure function of the input bytes, so results are cached by
// content digest: handing the same file over twice (map reload, several
// worlds on one map) costs one SHA1 pass instead of a full decode.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use navgraph_shared::digest::ContentDigest;
use navgraph_shared::util::ByteBuffer;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use super::{
    EncounterPath, EncounterSpot, HidingSpot, Ladder, MeshFile, RawArea, RawConnection, SharedMesh,
    VisibleArea, CURRENT_VERSION, MAX_AREAS, MAX_LIST_LEN, MIN_VERSION, NAV_MAGIC,
};
use crate::error::FormatError;

/// Process-wide parser used by `parse_mesh`
static DEFAULT_PARSER: Lazy<MeshParser> = Lazy::new(MeshParser::new);

/// Parse through the shared process-wide cache
pub fn parse_mesh(bytes: &[u8]) -> Result<SharedMesh, FormatError> {
    DEFAULT_PARSER.parse(bytes)
}

/// Mesh decoder with a content-addressed result cache
#[derive(Debug, Default)]
pub struct MeshParser {
    cache: Mutex<HashMap<ContentDigest, SharedMesh>>,
}

impl MeshParser {
    pub fn new() -> Self {
        MeshParser {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Decode `bytes`, reusing an earlier result for identical content
    pub fn parse(&self, bytes: &[u8]) -> Result<SharedMesh, FormatError> {
        let digest = ContentDigest::of(bytes);
        if let Some(mesh) = self.cache.lock().get(&digest) {
            debug!("Mesh cache hit for {}", digest);
            return Ok(Arc::clone(mesh));
        }

        let mesh = Arc::new(decode(bytes)?);
        debug!(
            "Parsed mesh {}: version {}.{}, {} areas, {} connections, {} ladders",
            digest,
            mesh.version,
            mesh.sub_version,
            mesh.areas.len(),
            mesh.connection_count(),
            mesh.ladders.len()
        );
        self.cache.lock().insert(digest, Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Number of distinct files held in the cache
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

fn read_vec3(buf: &mut ByteBuffer) -> Result<Vec3, FormatError> {
    Ok(Vec3::from_array(buf.read_f32_array::<3>()?))
}

fn read_count(
    buf: &mut ByteBuffer,
    what: &'static str,
    limit: usize,
) -> Result<usize, FormatError> {
    let count = buf.read_u32()? as usize;
    check_count(count, what, limit)
}

fn check_count(count: usize, what: &'static str, limit: usize) -> Result<usize, FormatError> {
    if count > limit {
        return Err(FormatError::Oversized { what, count, limit });
    }
    Ok(count)
}

fn read_id_list(buf: &mut ByteBuffer, what: &'static str) -> Result<Vec<u32>, FormatError> {
    let count = read_count(buf, what, MAX_LIST_LEN)?;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(buf.read_u32()?);
    }
    Ok(ids)
}

fn decode(bytes: &[u8]) -> Result<MeshFile, FormatError> {
    let mut buf = ByteBuffer::from_bytes(bytes);

    let magic = buf.read_u32()?;
    if magic != NAV_MAGIC {
        return Err(FormatError::BadMagic {
            found: magic,
            expected: NAV_MAGIC,
        });
    }

    let version = buf.read_u32()?;
    if !(MIN_VERSION..=CURRENT_VERSION).contains(&version) {
        return Err(FormatError::UnsupportedVersion {
            version,
            min: MIN_VERSION,
            max: CURRENT_VERSION,
        });
    }

    let sub_version = buf.read_u32()?;
    let bsp_size = buf.read_u32()?;
    let is_analyzed = if version >= 14 { buf.read_u8()? != 0 } else { false };

    let place_count = buf.read_u16()? as usize;
    let mut places = Vec::with_capacity(place_count);
    for _ in 0..place_count {
        places.push(buf.read_prefixed_string()?);
    }
    let has_unnamed_areas = if version > 11 { buf.read_u8()? != 0 } else { false };

    let area_count = read_count(&mut buf, "area", MAX_AREAS)?;
    if area_count == 0 {
        return Err(FormatError::NoAreas);
    }

    let mut mesh = MeshFile {
        version,
        sub_version,
        bsp_size,
        is_analyzed,
        places,
        has_unnamed_areas,
        areas: Default::default(),
        ladders: Vec::new(),
    };

    for _ in 0..area_count {
        let area = read_area(&mut buf, version, sub_version)?;
        let id = area.id;
        if mesh.areas.insert(id, area).is_some() {
            return Err(FormatError::DuplicateArea(id));
        }
    }

    let ladder_count = read_count(&mut buf, "ladder", MAX_LIST_LEN)?;
    for _ in 0..ladder_count {
        mesh.ladders.push(read_ladder(&mut buf)?);
    }

    Ok(mesh)
}

fn read_area(buf: &mut ByteBuffer, version: u32, sub_version: u32) -> Result<RawArea, FormatError> {
    let id = buf.read_u32()?;
    let flags = if version <= 12 {
        buf.read_u16()? as u32
    } else {
        buf.read_u32()?
    };
    let nw = read_vec3(buf)?;
    let se = read_vec3(buf)?;
    let ne_z = buf.read_f32()?;
    let sw_z = buf.read_f32()?;

    let mut area = RawArea::new(id, nw, se, ne_z, sw_z);
    area.flags = flags;

    for slot in area.connections.iter_mut() {
        *slot = read_id_list(buf, "connection")?
            .into_iter()
            .map(RawConnection::Id)
            .collect();
    }

    let hiding_count = buf.read_u8()? as usize;
    for _ in 0..hiding_count {
        let id = buf.read_u32()?;
        let position = read_vec3(buf)?;
        let flags = buf.read_u8()?;
        area.hiding_spots.push(HidingSpot { id, position, flags });
    }

    if version < 15 {
        // Approach spots: here, prev, prev->here, next, here->next
        let approach_count = buf.read_u8()? as usize;
        buf.read_skip(approach_count * 14)?;
    }

    let paths = read_count(buf, "encounter path", MAX_LIST_LEN)?;
    area.encounter_paths.reserve(paths);
    for _ in 0..paths {
        let from_area = buf.read_u32()?;
        let from_dir = buf.read_u8()?;
        let to_area = buf.read_u32()?;
        let to_dir = buf.read_u8()?;
        let spot_count = buf.read_u8()?;
        let mut spots = Vec::with_capacity(spot_count as usize);
        for _ in 0..spot_count {
            spots.push(EncounterSpot {
                area_id: buf.read_u32()?,
                t: buf.read_u8()?,
            });
        }
        area.encounter_paths.push(EncounterPath {
            from_area,
            from_dir,
            to_area,
            to_dir,
            spots,
        });
    }

    area.place_id = buf.read_u16()?;
    area.ladders_up = read_id_list(buf, "ladder connection")?;
    area.ladders_down = read_id_list(buf, "ladder connection")?;
    area.earliest_occupy = buf.read_f32_array::<2>()?;
    area.light_intensity = buf.read_f32_array::<4>()?;

    if version >= 16 {
        let visible = read_count(buf, "visible area", MAX_AREAS)?;
        area.visible_areas.reserve(visible);
        for _ in 0..visible {
            area.visible_areas.push(VisibleArea {
                id: buf.read_u32()?,
                attributes: buf.read_u8()?,
            });
        }
        area.inherit_visibility_from = buf.read_u32()?;
    }

    if sub_version >= 1 {
        area.custom_data = buf.read_u32()?;
    }

    Ok(area)
}

fn read_ladder(buf: &mut ByteBuffer) -> Result<Ladder, FormatError> {
    Ok(Ladder {
        id: buf.read_u32()?,
        width: buf.read_f32()?,
        top: read_vec3(buf)?,
        bottom: read_vec3(buf)?,
        length: buf.read_f32()?,
        direction: buf.read_u32()?,
        top_forward_area: buf.read_u32()?,
        top_left_area: buf.read_u32()?,
        top_right_area: buf.read_u32()?,
        top_behind_area: buf.read_u32()?,
        bottom_area: buf.read_u32()?,
    })
}
