//! Renderer-agnostic level geometry derived from map records.
//!
//! For every line this produces the textured wall quads the original
//! renderer would have drawn: a full wall for one-sided lines, upper /
//! middle / lower parts across two-sided lines, and for every sector a
//! floor and ceiling polygon. Output carries texture *names* plus offsets
//! and alignment; uploading pixels and building GPU meshes is the consuming
//! renderer's problem.
//!
//! Quads come out grouped by line, but no other meaning attaches to their
//! order.

mod poly;
mod quad;

pub use poly::{Plane, Polygon};
pub use quad::{Alignment, Facing, Quad, WallPart};

use pic::TextureLibrary;
use wad::types::{WadLineDef, WadSector, WadSideDef, WadVertex};
use wad::MapLumps;

/// The record tables of one map pulled into memory for random access while
/// building.
pub(crate) struct MapView {
    pub vertexes: Vec<WadVertex>,
    pub lines: Vec<WadLineDef>,
    pub sides: Vec<WadSideDef>,
    pub sectors: Vec<WadSector>,
}

impl MapView {
    fn decode(map: &MapLumps) -> Self {
        MapView {
            vertexes: map.vertexes().iter().collect(),
            lines: map.linedefs().iter().collect(),
            sides: map.sidedefs().iter().collect(),
            sectors: map.sectors().iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MapGeometry {
    pub quads: Vec<Quad>,
    pub polygons: Vec<Polygon>,
}

/// Build the full geometry set for a map. The library supplies texture
/// dimensions where placement needs them (mid textures); names that fail to
/// resolve degrade the placement, never the build.
pub fn build(map: &MapLumps, library: &TextureLibrary) -> MapGeometry {
    let view = MapView::decode(map);
    MapGeometry {
        quads: quad::build_quads(&view, library),
        polygons: poly::build_polygons(&view),
    }
}
