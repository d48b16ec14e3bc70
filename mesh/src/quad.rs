//! Wall quads: one per visible wall part, with the pegging and UV rules
//! the original renderer applied.

use glam::Vec2;
use log::warn;
use pic::{TextureKind, TextureLibrary};
use wad::types::{WadLineDef, WadSector, WadSideDef};

use crate::MapView;

/// Which vertical anchor the texture uses on this quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Texture top pinned to the quad top.
    Normal,
    /// Texture bottom pinned to the quad bottom ("lower unpegged").
    LowerUnpegged,
    /// Upper wall part drawn from the top down ("upper unpegged").
    UpperUnpegged,
    /// Mid textures: placement is already baked into the quad heights, no
    /// anchor correction applies.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallPart {
    /// The whole wall of a one-sided line.
    Full,
    /// Between the two ceilings of a two-sided line.
    Upper,
    /// The floating mid texture of a two-sided line.
    Middle,
    /// Between the two floors of a two-sided line.
    Lower,
}

/// Which side of the line the quad faces away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

/// One textured wall rectangle in world space. `start`/`end` run along the
/// line as seen from the quad's own side; `top`/`bottom` are absolute
/// heights.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    /// Index of the line this quad came from; the only ordering contract
    /// on output is that quads of one line stay together.
    pub line: usize,
    pub part: WallPart,
    pub facing: Facing,
    pub width: f32,
    pub height: f32,
    pub texture: Option<String>,
    pub texture_kind: TextureKind,
    pub x_offset: f32,
    pub y_offset: f32,
    pub alignment: Alignment,
    /// Offsets in world units instead of texels, from the texture record.
    pub world_panning: bool,
    pub x_scale: f32,
    pub y_scale: f32,
    pub top: f32,
    pub bottom: f32,
    pub start: Vec2,
    pub end: Vec2,
    /// Flat tint from the sector light level, grey per channel.
    pub tint: Option<[u8; 3]>,
}

impl Quad {
    /// Texture coordinate for one corner. `right_side` picks the `end`
    /// vertex edge, `bottom` the lower edge. Lower-unpegged alignment
    /// subtracts one texture height before the Y offset is applied, which
    /// pins the texture's bottom row to the quad's bottom edge.
    pub fn uv(&self, right_side: bool, bottom: bool, tex_width: f32, tex_height: f32) -> Vec2 {
        let u =
            (if right_side { self.width } else { 0.0 }) * self.x_scale / tex_width
                + self.x_offset / tex_width;
        let mut v = (if bottom { self.height } else { 0.0 }) * self.y_scale;
        if self.alignment == Alignment::LowerUnpegged {
            v -= tex_height;
        }
        Vec2::new(u, (v + self.y_offset) / tex_height)
    }
}

struct SideView<'a> {
    side: &'a WadSideDef,
    sector: &'a WadSector,
    start: Vec2,
    end: Vec2,
}

fn light_tint(sector: &WadSector) -> Option<[u8; 3]> {
    let level = sector.light_level.min(255) as u8;
    Some([level, level, level])
}

pub(crate) fn build_quads(view: &MapView, library: &TextureLibrary) -> Vec<Quad> {
    let mut quads = Vec::new();
    for (index, line) in view.lines.iter().enumerate() {
        build_line(view, library, index, line, &mut quads);
    }
    quads
}

fn side_view<'a>(
    view: &'a MapView,
    line: &WadLineDef,
    sidedef: u16,
    facing: Facing,
) -> Option<SideView<'a>> {
    let side = view.sides.get(sidedef as usize)?;
    let sector = view.sectors.get(side.sector as usize)?;
    let v1 = view.vertexes.get(line.start_vertex as usize)?;
    let v2 = view.vertexes.get(line.end_vertex as usize)?;
    let (start, end) = match facing {
        Facing::Front => (v1, v2),
        Facing::Back => (v2, v1),
    };
    Some(SideView {
        side,
        sector,
        start: Vec2::new(start.x as f32, start.y as f32),
        end: Vec2::new(end.x as f32, end.y as f32),
    })
}

fn build_line(
    view: &MapView,
    library: &TextureLibrary,
    index: usize,
    line: &WadLineDef,
    quads: &mut Vec<Quad>,
) {
    let Some(front_ref) = line.front_sidedef else {
        warn!("line {index} has no front side, skipped");
        return;
    };
    let Some(front) = side_view(view, line, front_ref, Facing::Front) else {
        warn!("line {index} references records outside the map tables, skipped");
        return;
    };

    let back = line
        .back_sidedef
        .and_then(|s| side_view(view, line, s, Facing::Back));

    match back {
        None => {
            // One-sided: a single full-height wall with the middle texture.
            let top = front.sector.ceiling_height as f32;
            let bottom = front.sector.floor_height as f32;
            if top > bottom {
                quads.push(make_quad(
                    library,
                    index,
                    WallPart::Full,
                    Facing::Front,
                    &front,
                    front.side.middle_tex.clone(),
                    top,
                    bottom,
                    part_alignment(line, WallPart::Full),
                ));
            }
        }
        Some(back) => {
            let fc = front.sector.ceiling_height as f32;
            let ff = front.sector.floor_height as f32;
            let bc = back.sector.ceiling_height as f32;
            let bf = back.sector.floor_height as f32;
            let middle_top = fc.min(bc);
            let middle_bottom = ff.max(bf);

            // Upper parts close the gap between the two ceilings, one per
            // side that is taller than the opening.
            if fc > middle_top {
                quads.push(make_quad(
                    library,
                    index,
                    WallPart::Upper,
                    Facing::Front,
                    &front,
                    front.side.upper_tex.clone(),
                    fc,
                    middle_top,
                    part_alignment(line, WallPart::Upper),
                ));
            }
            if bc > middle_top {
                quads.push(make_quad(
                    library,
                    index,
                    WallPart::Upper,
                    Facing::Back,
                    &back,
                    back.side.upper_tex.clone(),
                    bc,
                    middle_top,
                    part_alignment(line, WallPart::Upper),
                ));
            }

            // Lower parts close the gap between the two floors.
            if middle_bottom > ff {
                quads.push(make_quad(
                    library,
                    index,
                    WallPart::Lower,
                    Facing::Front,
                    &front,
                    front.side.lower_tex.clone(),
                    middle_bottom,
                    ff,
                    part_alignment(line, WallPart::Lower),
                ));
            }
            if middle_bottom > bf {
                quads.push(make_quad(
                    library,
                    index,
                    WallPart::Lower,
                    Facing::Back,
                    &back,
                    back.side.lower_tex.clone(),
                    middle_bottom,
                    bf,
                    part_alignment(line, WallPart::Lower),
                ));
            }

            // Mid textures float in the opening, only where a side names
            // one.
            if middle_top > middle_bottom {
                if let Some(name) = front.side.middle_tex.clone() {
                    push_mid_quad(
                        library,
                        index,
                        Facing::Front,
                        &front,
                        name,
                        line,
                        middle_top,
                        middle_bottom,
                        quads,
                    );
                }
                if let Some(name) = back.side.middle_tex.clone() {
                    push_mid_quad(
                        library,
                        index,
                        Facing::Back,
                        &back,
                        name,
                        line,
                        middle_top,
                        middle_bottom,
                        quads,
                    );
                }
            }
        }
    }
}

/// Alignment for the fixed wall parts. Mid textures use `Alignment::None`;
/// their placement is computed, not anchor-corrected.
fn part_alignment(line: &WadLineDef, part: WallPart) -> Alignment {
    if part == WallPart::Upper && line.is_upper_unpegged() {
        Alignment::UpperUnpegged
    } else if line.is_lower_unpegged() {
        Alignment::LowerUnpegged
    } else {
        Alignment::Normal
    }
}

#[allow(clippy::too_many_arguments)]
fn make_quad(
    library: &TextureLibrary,
    line: usize,
    part: WallPart,
    facing: Facing,
    sv: &SideView,
    texture: Option<String>,
    top: f32,
    bottom: f32,
    alignment: Alignment,
) -> Quad {
    let world_panning = texture
        .as_deref()
        .and_then(|name| library.resolve(name, TextureKind::Wall))
        .map(|image| image.world_panning)
        .unwrap_or(false);
    Quad {
        line,
        part,
        facing,
        width: sv.start.distance(sv.end),
        height: top - bottom,
        texture,
        texture_kind: TextureKind::Wall,
        x_offset: sv.side.x_offset as f32,
        y_offset: sv.side.y_offset as f32,
        alignment,
        world_panning,
        x_scale: 1.0,
        y_scale: 1.0,
        top,
        bottom,
        start: sv.start,
        end: sv.end,
        tint: light_tint(sv.sector),
    }
}

/// A mid texture hangs in the opening at its own height: pegged placement
/// hangs it from the opening top, lower-unpegged placement stands it on the
/// opening bottom, both shifted by the side's Y offset and then clamped to
/// the opening. The Y offset is consumed by the placement, so the emitted
/// quad carries none.
#[allow(clippy::too_many_arguments)]
fn push_mid_quad(
    library: &TextureLibrary,
    line_index: usize,
    facing: Facing,
    sv: &SideView,
    name: String,
    line: &WadLineDef,
    middle_top: f32,
    middle_bottom: f32,
    quads: &mut Vec<Quad>,
) {
    let span = middle_top - middle_bottom;
    // An unresolvable mid texture still gets a quad: fall back to filling
    // the opening so the caller sees where the wall is.
    let tex_height = library
        .dimensions(&name, TextureKind::Wall)
        .map(|(_, h)| h as f32)
        .unwrap_or(span);

    let (top, bottom) = if line.is_lower_unpegged() {
        let bottom = middle_bottom + sv.side.y_offset as f32;
        (bottom + tex_height, bottom)
    } else {
        let top = middle_top + sv.side.y_offset as f32;
        (top, top - tex_height)
    };
    let top = top.min(middle_top);
    let bottom = bottom.max(middle_bottom);
    if top <= bottom {
        return;
    }

    let mut quad = make_quad(
        library,
        line_index,
        WallPart::Middle,
        facing,
        sv,
        Some(name),
        top,
        bottom,
        Alignment::None,
    );
    quad.y_offset = 0.0;
    quads.push(quad);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pic::TextureLibrary;
    use wad::{buffer, Lump, MapLumps, WadFile, WadKind, WadStack};

    fn sector_bytes(floor: i16, ceiling: i16, light: u16) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_i16(&mut out, floor);
        buffer::write_i16(&mut out, ceiling);
        buffer::write_name8(&mut out, "FLOOR0_1");
        buffer::write_name8(&mut out, "CEIL1_1");
        buffer::write_u16(&mut out, light);
        buffer::write_u16(&mut out, 0);
        buffer::write_u16(&mut out, 0);
        out
    }

    fn side_bytes(upper: &str, lower: &str, middle: &str, sector: u16, y_off: i16) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_i16(&mut out, 0);
        buffer::write_i16(&mut out, y_off);
        buffer::write_name8(&mut out, upper);
        buffer::write_name8(&mut out, lower);
        buffer::write_name8(&mut out, middle);
        buffer::write_u16(&mut out, sector);
        out
    }

    fn line_bytes(start: u16, end: u16, flags: u16, front: u16, back: u16) -> Vec<u8> {
        let mut out = Vec::new();
        buffer::write_u16(&mut out, start);
        buffer::write_u16(&mut out, end);
        buffer::write_u16(&mut out, flags);
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

    /// Two sectors joined by one two-sided line, as in the classic "window"
    /// arrangement. Front sector ceiling 128, back ceiling 64, floors level.
    fn window_stack(line_flags: u16, front_mid: &str, back_mid: &str) -> WadStack {
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::marker("MAP01"));
        wad.push(Lump::new("THINGS", vec![]));
        wad.push(Lump::new(
            "LINEDEFS",
            line_bytes(0, 1, line_flags | 0x0004, 0, 1),
        ));
        wad.push(Lump::new(
            "SIDEDEFS",
            [
                side_bytes("BRICK", "-", front_mid, 0, 0),
                side_bytes("-", "-", back_mid, 1, 0),
            ]
            .concat(),
        ));
        wad.push(Lump::new("VERTEXES", vertex_bytes(&[(0, 0), (64, 0)])));
        wad.push(Lump::new(
            "SECTORS",
            [sector_bytes(0, 128, 160), sector_bytes(0, 64, 200)].concat(),
        ));
        let mut stack = WadStack::new();
        stack.push(wad);
        stack
    }

    fn quads_for(stack: &WadStack) -> Vec<Quad> {
        let library = TextureLibrary::new(stack).unwrap();
        let map = MapLumps::find(stack, "MAP01").unwrap();
        crate::build(&map, &library).quads
    }

    #[test]
    fn window_line_yields_exactly_one_upper_quad() {
        let stack = window_stack(0, "-", "-");
        let quads = quads_for(&stack);

        assert_eq!(quads.len(), 1);
        let quad = &quads[0];
        assert_eq!(quad.part, WallPart::Upper);
        assert_eq!(quad.facing, Facing::Front);
        assert_eq!(quad.texture.as_deref(), Some("BRICK"));
        assert_eq!(quad.top, 128.0);
        assert_eq!(quad.bottom, 64.0);
        assert_eq!(quad.width, 64.0);
        assert_eq!(quad.alignment, Alignment::Normal);
        assert_eq!(quad.tint, Some([160, 160, 160]));
    }

    #[test]
    fn one_sided_line_yields_full_quad() {
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::marker("MAP01"));
        wad.push(Lump::new("THINGS", vec![]));
        wad.push(Lump::new("LINEDEFS", line_bytes(0, 1, 0x0001, 0, 0xFFFF)));
        wad.push(Lump::new(
            "SIDEDEFS",
            side_bytes("-", "-", "STARTAN3", 0, 0),
        ));
        wad.push(Lump::new("VERTEXES", vertex_bytes(&[(0, 0), (0, 96)])));
        wad.push(Lump::new("SECTORS", sector_bytes(-16, 112, 255)));
        let mut stack = WadStack::new();
        stack.push(wad);

        let quads = quads_for(&stack);
        assert_eq!(quads.len(), 1);
        let quad = &quads[0];
        assert_eq!(quad.part, WallPart::Full);
        assert_eq!(quad.texture.as_deref(), Some("STARTAN3"));
        assert_eq!((quad.top, quad.bottom), (112.0, -16.0));
        assert_eq!(quad.height, 128.0);
        assert_eq!(quad.width, 96.0);
    }

    #[test]
    fn lower_unpegged_flag_sets_alignment() {
        let stack = window_stack(0x0010, "-", "-");
        let quads = quads_for(&stack);
        assert_eq!(quads[0].alignment, Alignment::LowerUnpegged);
    }

    #[test]
    fn upper_unpegged_governs_upper_parts() {
        let stack = window_stack(0x0008, "-", "-");
        let quads = quads_for(&stack);
        assert_eq!(quads[0].alignment, Alignment::UpperUnpegged);
    }

    #[test]
    fn mid_texture_fills_opening_when_unresolved() {
        let stack = window_stack(0, "MIDGRATE", "-");
        let quads = quads_for(&stack);

        assert_eq!(quads.len(), 2);
        let mid = quads.iter().find(|q| q.part == WallPart::Middle).unwrap();
        assert_eq!(mid.texture.as_deref(), Some("MIDGRATE"));
        assert_eq!(mid.alignment, Alignment::None);
        // Unresolvable texture: the quad fills the opening.
        assert_eq!((mid.top, mid.bottom), (64.0, 0.0));
        assert_eq!(mid.y_offset, 0.0);
    }

    #[test]
    fn both_sides_can_carry_mid_quads() {
        let stack = window_stack(0, "MIDA", "MIDB");
        let quads = quads_for(&stack);
        let mids: Vec<&Quad> = quads.iter().filter(|q| q.part == WallPart::Middle).collect();
        assert_eq!(mids.len(), 2);
        assert_eq!(mids[0].facing, Facing::Front);
        assert_eq!(mids[1].facing, Facing::Back);
        // The back-side quad runs the line the other way.
        assert_eq!(mids[1].start, Vec2::new(64.0, 0.0));
        assert_eq!(mids[1].end, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn equal_floors_make_no_lower_quads() {
        let stack = window_stack(0, "-", "-");
        let quads = quads_for(&stack);
        assert!(quads.iter().all(|q| q.part != WallPart::Lower));
    }

    #[test]
    fn uv_formula() {
        let stack = window_stack(0, "-", "-");
        let mut quad = quads_for(&stack).remove(0);
        quad.x_offset = 16.0;
        quad.y_offset = 8.0;

        // 64 wide, 64 tall quad against a 128x128 texture.
        let uv = quad.uv(false, false, 128.0, 128.0);
        assert_eq!(uv, Vec2::new(16.0 / 128.0, 8.0 / 128.0));
        let uv = quad.uv(true, true, 128.0, 128.0);
        assert_eq!(uv, Vec2::new(80.0 / 128.0, 72.0 / 128.0));

        // Lower-unpegged pins the texture's bottom row to the quad bottom.
        quad.alignment = Alignment::LowerUnpegged;
        let uv = quad.uv(false, true, 128.0, 128.0);
        assert_eq!(uv, Vec2::new(16.0 / 128.0, (64.0 - 128.0 + 8.0) / 128.0));
    }
}
