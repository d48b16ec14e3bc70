//! Locating a map inside a stack and decoding its record tables.
//!
//! A map is a zero-length marker lump (`E1M1`, `MAP01`, anything) followed
//! by a run of well-known companion lumps. Which companions are present
//! decides the binary dialect of the line and thing records; the records
//! themselves carry no version field.

use log::warn;

use crate::stack::WadStack;
use crate::types::{WadLineDef, WadSector, WadSideDef, WadThing, WadVertex};
use crate::wad::Lump;
use crate::RangeError;

/// The lump names that may follow a map marker. Anything else ends the map.
const MAP_COMPANIONS: &[&str] = &[
    "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS", "REJECT",
    "BLOCKMAP", "BEHAVIOR", "SCRIPTS", "LIGHTS", "MACROS", "LEAFS", "TEXTMAP", "ZNODES",
    "DIALOGUE", "ENDMAP",
];

fn is_companion(name: &str) -> bool {
    MAP_COMPANIONS.iter().any(|c| name.eq_ignore_ascii_case(c))
}

/// The four historical layouts for map records. Inferred once per map from
/// the companion lumps; every record table of that map is then decoded with
/// the same dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    /// The classic binary layout.
    Doom,
    /// Extended layout: a `BEHAVIOR` script-bytecode lump accompanies the
    /// map and lines/things carry byte args.
    Hexen,
    /// Console-port layout: `LIGHTS`/`MACROS` tables accompany the map.
    Doom64,
    /// Plain-text map description (`TEXTMAP`). Recognised so a caller can
    /// report it, never decoded here.
    Udmf,
}

/// One map's marker name, inferred format, and the record lumps found
/// between the marker and the next unrelated lump. All lumps come from the
/// same file as the override-winning marker, so a patch WAD replaces a map
/// wholesale rather than field by field.
#[derive(Debug, Clone)]
pub struct MapLumps<'w> {
    pub name: String,
    pub format: MapFormat,
    pub things: Option<&'w Lump>,
    pub linedefs: Option<&'w Lump>,
    pub sidedefs: Option<&'w Lump>,
    pub vertexes: Option<&'w Lump>,
    pub sectors: Option<&'w Lump>,
}

impl<'w> MapLumps<'w> {
    /// Locate `name` in the stack and gather its companion lumps. Returns
    /// `None` when the name is missing or is not followed by map data.
    pub fn find(stack: &'w WadStack, name: &str) -> Option<MapLumps<'w>> {
        let loc = stack.index().get(name)?;
        let lumps = stack.files()[loc.file].lumps();

        let mut things = None;
        let mut linedefs = None;
        let mut sidedefs = None;
        let mut vertexes = None;
        let mut sectors = None;
        let mut has_behavior = false;
        let mut has_console_tables = false;
        let mut has_textmap = false;
        let mut any = false;

        for lump in lumps.iter().skip(loc.lump + 1) {
            if !is_companion(&lump.name) {
                break;
            }
            any = true;
            match lump.name.to_ascii_uppercase().as_str() {
                "THINGS" => things = Some(lump),
                "LINEDEFS" => linedefs = Some(lump),
                "SIDEDEFS" => sidedefs = Some(lump),
                "VERTEXES" => vertexes = Some(lump),
                "SECTORS" => sectors = Some(lump),
                "BEHAVIOR" => has_behavior = true,
                "LIGHTS" | "MACROS" => has_console_tables = true,
                "TEXTMAP" => has_textmap = true,
                _ => {}
            }
        }
        if !any {
            return None;
        }

        let format = if has_textmap {
            warn!("{name}: text-format map, recognised but not decoded");
            MapFormat::Udmf
        } else if has_behavior {
            MapFormat::Hexen
        } else if has_console_tables {
            MapFormat::Doom64
        } else {
            MapFormat::Doom
        };

        Some(MapLumps {
            name: lumps[loc.lump].name.clone(),
            format,
            things,
            linedefs,
            sidedefs,
            vertexes,
            sectors,
        })
    }

    pub fn vertexes(&self) -> RecordTable<'w, WadVertex> {
        RecordTable::new(self.vertexes, self.format, WadVertex::SIZE, |_, d| {
            WadVertex::from_bytes(d)
        })
    }

    pub fn sidedefs(&self) -> RecordTable<'w, WadSideDef> {
        RecordTable::new(self.sidedefs, self.format, WadSideDef::SIZE, |_, d| {
            WadSideDef::from_bytes(d)
        })
    }

    pub fn sectors(&self) -> RecordTable<'w, WadSector> {
        RecordTable::new(self.sectors, self.format, WadSector::SIZE, |_, d| {
            WadSector::from_bytes(d)
        })
    }

    pub fn linedefs(&self) -> RecordTable<'w, WadLineDef> {
        RecordTable::new(
            self.linedefs,
            self.format,
            WadLineDef::size(self.format),
            WadLineDef::from_bytes,
        )
    }

    pub fn things(&self) -> RecordTable<'w, WadThing> {
        RecordTable::new(
            self.things,
            self.format,
            WadThing::size(self.format),
            WadThing::from_bytes,
        )
    }
}

/// A fixed-stride view over one record lump. Records decode on access;
/// nothing is cached, so two reads of the same index always agree with the
/// underlying bytes.
#[derive(Clone, Copy)]
pub struct RecordTable<'a, T> {
    data: &'a [u8],
    format: MapFormat,
    item_size: usize,
    decode: fn(MapFormat, &[u8]) -> T,
}

impl<'a, T> RecordTable<'a, T> {
    fn new(
        lump: Option<&'a Lump>,
        format: MapFormat,
        item_size: usize,
        decode: fn(MapFormat, &[u8]) -> T,
    ) -> Self {
        RecordTable {
            data: lump.map(|l| l.bytes()).unwrap_or(&[]),
            format,
            item_size,
            decode,
        }
    }

    /// Whole records only; trailing partial bytes are ignored.
    pub fn len(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.data.len() / self.item_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<T, RangeError> {
        if index >= self.len() {
            return Err(RangeError {
                index,
                len: self.len(),
            });
        }
        let offset = index * self.item_size;
        Ok((self.decode)(
            self.format,
            &self.data[offset..offset + self.item_size],
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + use<'a, T> {
        let data = self.data;
        let item_size = self.item_size;
        let format = self.format;
        let decode = self.decode;
        (0..self.len()).map(move |i| decode(format, &data[i * item_size..(i + 1) * item_size]))
    }
}

/// Every map marker in the stack, in load order, later files overriding.
/// A marker is any lump directly followed by `THINGS`, `LINEDEFS`, or
/// `TEXTMAP` and not itself a companion.
pub fn list_maps(stack: &WadStack) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for file in stack.files() {
        let lumps = file.lumps();
        for i in 0..lumps.len() {
            if is_companion(&lumps[i].name) {
                continue;
            }
            let next = match lumps.get(i + 1) {
                Some(l) => l.name.to_ascii_uppercase(),
                None => continue,
            };
            if matches!(next.as_str(), "THINGS" | "LINEDEFS" | "TEXTMAP") {
                let name = lumps[i].name.to_ascii_uppercase();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}
