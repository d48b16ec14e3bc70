//! Floor and ceiling polygons, traced from the lines bounding each sector.

use glam::Vec2;
use log::warn;
use pic::TextureKind;

use crate::MapView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Floor,
    Ceiling,
}

/// One horizontal surface of a sector. `loops` holds closed vertex rings:
/// the outer boundary plus one ring per hole. Rings are not triangulated;
/// that belongs to the mesh-building consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub sector: usize,
    pub plane: Plane,
    pub height: f32,
    pub texture: Option<String>,
    pub texture_kind: TextureKind,
    pub loops: Vec<Vec<Vec2>>,
    pub tint: Option<[u8; 3]>,
}

pub(crate) fn build_polygons(view: &MapView) -> Vec<Polygon> {
    let mut polygons = Vec::with_capacity(view.sectors.len() * 2);
    for (index, sector) in view.sectors.iter().enumerate() {
        let loops = sector_loops(view, index);
        if loops.is_empty() {
            continue;
        }
        let level = sector.light_level.min(255) as u8;
        let tint = Some([level, level, level]);
        let texture = |name: &str| {
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        };
        polygons.push(Polygon {
            sector: index,
            plane: Plane::Floor,
            height: sector.floor_height as f32,
            texture: texture(&sector.floor_tex),
            texture_kind: TextureKind::Flat,
            loops: loops.clone(),
            tint,
        });
        polygons.push(Polygon {
            sector: index,
            plane: Plane::Ceiling,
            height: sector.ceiling_height as f32,
            texture: texture(&sector.ceiling_tex),
            texture_kind: TextureKind::Flat,
            loops,
            tint,
        });
    }
    polygons
}

/// Chain the sector's boundary edges into closed rings. Edges are oriented
/// with the sector on the right: a line's own direction where the sector is
/// in front, reversed where it is behind. Chains that fail to close come
/// from broken maps and are dropped with a warning.
fn sector_loops(view: &MapView, sector: usize) -> Vec<Vec<Vec2>> {
    let mut edges: Vec<(u16, u16)> = Vec::new();
    for line in &view.lines {
        let side_sector = |sidedef: Option<u16>| {
            sidedef
                .and_then(|s| view.sides.get(s as usize))
                .map(|side| side.sector as usize)
        };
        if side_sector(line.front_sidedef) == Some(sector) {
            edges.push((line.start_vertex, line.end_vertex));
        }
        if side_sector(line.back_sidedef) == Some(sector) {
            edges.push((line.end_vertex, line.start_vertex));
        }
    }

    let mut loops = Vec::new();
    while let Some((first, mut tail)) = edges.pop() {
        let mut ring = vec![first, tail];
        let closed = loop {
            if tail == first {
                ring.pop(); // the closing vertex repeats the first
                break true;
            }
            match edges.iter().position(|&(a, _)| a == tail) {
                Some(at) => {
                    let (_, b) = edges.swap_remove(at);
                    ring.push(b);
                    tail = b;
                }
                None => break false,
            }
        };
        if !closed {
            warn!("sector {sector}: open boundary chain dropped");
            continue;
        }
        let ring: Vec<Vec2> = ring
            .into_iter()
            .filter_map(|v| {
                view.vertexes
                    .get(v as usize)
                    .map(|vx| Vec2::new(vx.x as f32, vx.y as f32))
            })
            .collect();
        if ring.len() >= 3 {
            loops.push(ring);
        }
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use pic::TextureLibrary;
    use wad::{buffer, Lump, MapLumps, WadFile, WadKind, WadStack};

    fn sector_bytes(floor: i16, ceiling: i16, floor_tex: &str, ceil_tex: &str) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_i16(&mut out, floor);
        buffer::write_i16(&mut out, ceiling);
        buffer::write_name8(&mut out, floor_tex);
        buffer::write_name8(&mut out, ceil_tex);
        buffer::write_u16(&mut out, 144);
        buffer::write_u16(&mut out, 0);
        buffer::write_u16(&mut out, 0);
        out
    }

    fn side_bytes(sector: u16) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_i16(&mut out, 0);
        buffer::write_i16(&mut out, 0);
        buffer::write_name8(&mut out, "-");
        buffer::write_name8(&mut out, "-");
        buffer::write_name8(&mut out, "WALL");
        buffer::write_u16(&mut out, sector);
        out
    }

    fn line_bytes(start: u16, end: u16, front: u16, back: u16) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_u16(&mut out, start);
        buffer::write_u16(&mut out, end);
        buffer::write_u16(&mut out, if back == 0xFFFF { 1 } else { 4 });
        buffer::write_u16(&mut out, 0);
        buffer::write_u16(&mut out, 0);
        buffer::write_u16(&mut out, front);
        buffer::write_u16(&mut out, back);
        out
    }

    fn vertex_bytes(coords: &[(i16, i16)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (x, y) in coords {
            buffer::write_i16(&mut out, *x);
            buffer::write_i16(&mut out, *y);
        }
        out
    }

    fn geometry_for(stack: &WadStack) -> crate::MapGeometry {
        let library = TextureLibrary::new(stack).unwrap();
        let map = MapLumps::find(stack, "MAP01").unwrap();
        crate::build(&map, &library)
    }

    /// A single square room.
    fn square_stack() -> WadStack {
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::marker("MAP01"));
        wad.push(Lump::new("THINGS", vec![]));
        wad.push(Lump::new(
            "LINEDEFS",
            [
                line_bytes(0, 1, 0, 0xFFFF),
                line_bytes(1, 2, 0, 0xFFFF),
                line_bytes(2, 3, 0, 0xFFFF),
                line_bytes(3, 0, 0, 0xFFFF),
            ]
            .concat(),
        ));
        wad.push(Lump::new("SIDEDEFS", side_bytes(0)));
        wad.push(Lump::new(
            "VERTEXES",
            vertex_bytes(&[(0, 0), (128, 0), (128, 128), (0, 128)]),
        ));
        wad.push(Lump::new(
            "SECTORS",
            sector_bytes(8, 120, "FLOOR4_8", "CEIL3_5"),
        ));
        let mut stack = WadStack::new();
        stack.push(wad);
        stack
    }

    #[test]
    fn square_sector_yields_floor_and_ceiling() {
        let geometry = geometry_for(&square_stack());
        assert_eq!(geometry.polygons.len(), 2);

        let floor = &geometry.polygons[0];
        assert_eq!(floor.plane, Plane::Floor);
        assert_eq!(floor.height, 8.0);
        assert_eq!(floor.texture.as_deref(), Some("FLOOR4_8"));
        assert_eq!(floor.texture_kind, TextureKind::Flat);
        assert_eq!(floor.loops.len(), 1);
        assert_eq!(floor.loops[0].len(), 4);

        let ceiling = &geometry.polygons[1];
        assert_eq!(ceiling.plane, Plane::Ceiling);
        assert_eq!(ceiling.height, 120.0);
        assert_eq!(ceiling.texture.as_deref(), Some("CEIL3_5"));
    }

    #[test]
    fn hole_produces_second_ring() {
        // Outer square belongs to sector 0; an inner square is sector 1,
        // its lines facing inward with sector 0 on their back side.
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::marker("MAP01"));
        wad.push(Lump::new("THINGS", vec![]));
        wad.push(Lump::new(
            "LINEDEFS",
            [
                line_bytes(0, 1, 0, 0xFFFF),
                line_bytes(1, 2, 0, 0xFFFF),
                line_bytes(2, 3, 0, 0xFFFF),
                line_bytes(3, 0, 0, 0xFFFF),
                line_bytes(4, 5, 1, 2),
                line_bytes(5, 6, 1, 2),
                line_bytes(6, 7, 1, 2),
                line_bytes(7, 4, 1, 2),
            ]
            .concat(),
        ));
        wad.push(Lump::new(
            "SIDEDEFS",
            [side_bytes(0), side_bytes(1), side_bytes(0)].concat(),
        ));
        wad.push(Lump::new(
            "VERTEXES",
            vertex_bytes(&[
                (0, 0),
                (256, 0),
                (256, 256),
                (0, 256),
                (64, 64),
                (192, 64),
                (192, 192),
                (64, 192),
            ]),
        ));
        wad.push(Lump::new(
            "SECTORS",
            [
                sector_bytes(0, 128, "FLOOR4_8", "CEIL3_5"),
                sector_bytes(32, 128, "FLAT14", "CEIL3_5"),
            ]
            .concat(),
        ));
        let mut stack = WadStack::new();
        stack.push(wad);

        let geometry = geometry_for(&stack);
        let floor0 = geometry
            .polygons
            .iter()
            .find(|p| p.sector == 0 && p.plane == Plane::Floor)
            .unwrap();
        assert_eq!(floor0.loops.len(), 2);

        let floor1 = geometry
            .polygons
            .iter()
            .find(|p| p.sector == 1 && p.plane == Plane::Floor)
            .unwrap();
        assert_eq!(floor1.loops.len(), 1);
        assert_eq!(floor1.height, 32.0);
    }

    #[test]
    fn open_chains_are_dropped() {
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::marker("MAP01"));
        wad.push(Lump::new("THINGS", vec![]));
        // Two lines that never close a ring.
        wad.push(Lump::new(
            "LINEDEFS",
            [line_bytes(0, 1, 0, 0xFFFF), line_bytes(1, 2, 0, 0xFFFF)].concat(),
        ));
        wad.push(Lump::new("SIDEDEFS", side_bytes(0)));
        wad.push(Lump::new(
            "VERTEXES",
            vertex_bytes(&[(0, 0), (64, 0), (64, 64)]),
        ));
        wad.push(Lump::new(
            "SECTORS",
            sector_bytes(0, 128, "FLOOR4_8", "CEIL3_5"),
        ));
        let mut stack = WadStack::new();
        stack.push(wad);

        let geometry = geometry_for(&stack);
        assert!(geometry.polygons.is_empty());
    }
}
