// MeshWriter - encodes a MeshFile at the current format version

use navgraph_shared::util::ByteBuffer;
use glam::Vec3;

use super::{Ladder, MeshFile, RawArea, CURRENT_SUB_VERSION, CURRENT_VERSION, NAV_MAGIC};

/// Encoder for walkable-area files
///
/// Always writes `CURRENT_VERSION`; the `version` fields of the input are
/// ignored. Connection costs are not part of the format and are dropped.
#[derive(Debug, Default)]
pub struct MeshWriter {
    buf: ByteBuffer,
}

impl MeshWriter {
    pub fn new() -> Self {
        MeshWriter {
            buf: ByteBuffer::with_capacity(4096),
        }
    }

    pub fn write(mut self, mesh: &MeshFile) -> Vec<u8> {
        self.buf.write_u32(NAV_MAGIC);
        self.buf.write_u32(CURRENT_VERSION);
        self.buf.write_u32(CURRENT_SUB_VERSION);
        self.buf.write_u32(mesh.bsp_size);
        self.buf.write_u8(mesh.is_analyzed as u8);

        self.buf.write_u16(mesh.places.len().min(u16::MAX as usize) as u16);
        for place in mesh.places.iter().take(u16::MAX as usize) {
            self.buf.write_prefixed_string(place);
        }
        self.buf.write_u8(mesh.has_unnamed_areas as u8);

        self.buf.write_u32(mesh.areas.len() as u32);
        for area in mesh.areas.values() {
            self.write_area(area);
        }

        self.buf.write_u32(mesh.ladders.len() as u32);
        for ladder in &mesh.ladders {
            self.write_ladder(ladder);
        }

        self.buf.into_inner()
    }

    fn write_vec3(&mut self, v: Vec3) {
        self.buf.write_f32_slice(&v.to_array());
    }

    fn write_ids(&mut self, ids: impl ExactSizeIterator<Item = u32>) {
        self.buf.write_u32(ids.len() as u32);
        for id in ids {
            self.buf.write_u32(id);
        }
    }

    fn write_area(&mut self, area: &RawArea) {
        self.buf.write_u32(area.id);
        self.buf.write_u32(area.flags);
        self.write_vec3(area.nw);
        self.write_vec3(area.se);
        self.buf.write_f32(area.ne_z);
        self.buf.write_f32(area.sw_z);

        for slot in &area.connections {
            self.write_ids(slot.iter().map(|c| c.target_id()));
        }

        let spots = &area.hiding_spots[..area.hiding_spots.len().min(u8::MAX as usize)];
        self.buf.write_u8(spots.len() as u8);
        for spot in spots {
            self.buf.write_u32(spot.id);
            self.write_vec3(spot.position);
            self.buf.write_u8(spot.flags);
        }

        self.buf.write_u32(area.encounter_paths.len() as u32);
        for path in &area.encounter_paths {
            self.buf.write_u32(path.from_area);
            self.buf.write_u8(path.from_dir);
            self.buf.write_u32(path.to_area);
            self.buf.write_u8(path.to_dir);
            let spots = &path.spots[..path.spots.len().min(u8::MAX as usize)];
            self.buf.write_u8(spots.len() as u8);
            for spot in spots {
                self.buf.write_u32(spot.area_id);
                self.buf.write_u8(spot.t);
            }
        }

        self.buf.write_u16(area.place_id);
        self.write_ids(area.ladders_up.iter().copied());
        self.write_ids(area.ladders_down.iter().copied());
        self.buf.write_f32_slice(&area.earliest_occupy);
        self.buf.write_f32_slice(&area.light_intensity);

        self.buf.write_u32(area.visible_areas.len() as u32);
        for visible in &area.visible_areas {
            self.buf.write_u32(visible.id);
            self.buf.write_u8(visible.attributes);
        }
        self.buf.write_u32(area.inherit_visibility_from);
        self.buf.write_u32(area.custom_data);
    }

    fn write_ladder(&mut self, ladder: &Ladder) {
        self.buf.write_u32(ladder.id);
        self.buf.write_f32(ladder.width);
        self.write_vec3(ladder.top);
        self.write_vec3(ladder.bottom);
        self.buf.write_f32(ladder.length);
        self.buf.write_u32(ladder.direction);
        self.buf.write_u32(ladder.top_forward_area);
        self.buf.write_u32(ladder.top_left_area);
        self.buf.write_u32(ladder.top_right_area);
        self.buf.write_u32(ladder.top_behind_area);
        self.buf.write_u32(ladder.bottom_area);
    }
}
