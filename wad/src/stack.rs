//! An ordered collection of WAD files with patch-override lookup.
//!
//! Later-loaded files win: a PWAD loaded after the game WAD replaces any
//! same-named lump for `get`, while `get_all` keeps the full load order for
//! callers that need to walk every candidate (texture lists do).

use std::collections::HashMap;

use log::warn;

use crate::wad::{Lump, WadFile};

/// Identifies one lump inside one file of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LumpLocation {
    pub file: usize,
    pub lump: usize,
}

/// Name lookup across every file of a stack. Names are folded to upper case;
/// the on-disk convention is case-insensitive and editors disagree on what
/// they write.
#[derive(Debug, Default, Clone)]
pub struct LumpIndex {
    by_name: HashMap<String, Vec<LumpLocation>>,
}

impl LumpIndex {
    pub fn build(files: &[WadFile]) -> Self {
        let mut by_name: HashMap<String, Vec<LumpLocation>> = HashMap::new();
        for (file, wad) in files.iter().enumerate() {
            for (lump, l) in wad.lumps().iter().enumerate() {
                by_name
                    .entry(l.name.to_ascii_uppercase())
                    .or_default()
                    .push(LumpLocation { file, lump });
            }
        }
        LumpIndex { by_name }
    }

    /// The override winner: last match in load order, then directory order.
    pub fn get(&self, name: &str) -> Option<LumpLocation> {
        self.by_name
            .get(&name.to_ascii_uppercase())
            .and_then(|v| v.last().copied())
    }

    /// Every match in load order, earliest first.
    pub fn get_all(&self, name: &str) -> &[LumpLocation] {
        self.by_name
            .get(&name.to_ascii_uppercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Files in load order plus the derived name index and the built-in default
/// colour datasets. The defaults are plain owned values constructed here;
/// nothing in the crate caches them globally.
#[derive(Debug)]
pub struct WadStack {
    files: Vec<WadFile>,
    index: LumpIndex,
    default_palette: Vec<u8>,
    default_colourmap: Vec<u8>,
}

/// Number of remap tables in the default colourmap. Matches the table count
/// the original game shipped: 32 light levels, one inverted, one unused.
const DEFAULT_COLOURMAP_TABLES: usize = 34;

impl Default for WadStack {
    fn default() -> Self {
        Self::new()
    }
}

impl WadStack {
    pub fn new() -> Self {
        WadStack {
            files: Vec::new(),
            index: LumpIndex::default(),
            default_palette: default_palette_bytes(),
            default_colourmap: default_colourmap_bytes(),
        }
    }

    pub fn push(&mut self, file: WadFile) {
        self.files.push(file);
        self.index = LumpIndex::build(&self.files);
    }

    pub fn files(&self) -> &[WadFile] {
        &self.files
    }

    pub fn index(&self) -> &LumpIndex {
        &self.index
    }

    pub fn lump_at(&self, loc: LumpLocation) -> &Lump {
        &self.files[loc.file].lumps()[loc.lump]
    }

    /// The override-winning lump for `name`.
    pub fn lump(&self, name: &str) -> Option<&Lump> {
        self.index.get(name).map(|loc| self.lump_at(loc))
    }

    pub fn lump_exists(&self, name: &str) -> bool {
        self.index.get(name).is_some()
    }

    /// Every lump named `name`, in load order.
    pub fn lumps_all(&self, name: &str) -> Vec<&Lump> {
        self.index
            .get_all(name)
            .iter()
            .map(|&loc| self.lump_at(loc))
            .collect()
    }

    /// Raw palette dataset: the override-winning `PLAYPAL` payload, or the
    /// built-in grey ramp when no file carries one. Lookups never fail just
    /// because nothing provided a palette.
    pub fn palette_data(&self) -> &[u8] {
        match self.lump("PLAYPAL") {
            Some(lump) if !lump.is_empty() => lump.bytes(),
            Some(_) => {
                warn!("PLAYPAL exists but is empty, using built-in palette");
                &self.default_palette
            }
            None => &self.default_palette,
        }
    }

    /// Raw colourmap dataset: `COLORMAP` payload or the built-in identity
    /// tables.
    pub fn colourmap_data(&self) -> &[u8] {
        match self.lump("COLORMAP") {
            Some(lump) if !lump.is_empty() => lump.bytes(),
            Some(_) => {
                warn!("COLORMAP exists but is empty, using built-in colourmap");
                &self.default_colourmap
            }
            None => &self.default_colourmap,
        }
    }

    /// Lumps inside the flat namespaces, in load order. Both the base-game
    /// `F_START`/`F_END` pair and the community `FF_START`/`FF_END` pair
    /// open the namespace; zero-length markers inside it (the nested
    /// `F1_START` style dividers) are skipped.
    pub fn flats_iter(&self) -> impl Iterator<Item = &Lump> {
        self.namespace_iter(&["F_START", "FF_START"], &["F_END", "FF_END"])
    }

    /// Lumps inside the sprite namespaces, `S_START`/`S_END` and
    /// `SS_START`/`SS_END`.
    pub fn sprites_iter(&self) -> impl Iterator<Item = &Lump> {
        self.namespace_iter(&["S_START", "SS_START"], &["S_END", "SS_END"])
    }

    fn namespace_iter<'a>(
        &'a self,
        starts: &'a [&'a str],
        ends: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Lump> {
        self.files.iter().flat_map(move |file| {
            let mut inside = false;
            file.lumps().iter().filter(move |lump| {
                let name = lump.name.as_str();
                if starts.iter().any(|s| name.eq_ignore_ascii_case(s)) {
                    inside = true;
                    return false;
                }
                if ends.iter().any(|e| name.eq_ignore_ascii_case(e)) {
                    inside = false;
                    return false;
                }
                inside && !lump.is_marker()
            })
        })
    }
}

/// 256 grey RGB triples. A neutral stand-in so a stack with no game data
/// still resolves every colour index.
fn default_palette_bytes() -> Vec<u8> {
    let mut out = Vec::with_capacity(256 * 3);
    for i in 0..=255u8 {
        out.extend_from_slice(&[i, i, i]);
    }
    out
}

/// Identity remap tables: every map sends index `i` to `i`.
fn default_colourmap_bytes() -> Vec<u8> {
    let mut out = Vec::with_capacity(DEFAULT_COLOURMAP_TABLES * 256);
    for _ in 0..DEFAULT_COLOURMAP_TABLES {
        for i in 0..=255u8 {
            out.push(i);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::{Lump, WadFile, WadKind};

    fn file_with(names: &[(&str, &[u8])]) -> WadFile {
        let mut wad = WadFile::new(WadKind::Pwad);
        for (name, data) in names {
            if data.is_empty() {
                wad.push(Lump::marker(*name));
            } else {
                wad.push(Lump::new(*name, data.to_vec()));
            }
        }
        wad
    }

    #[test]
    fn later_file_overrides_earlier() {
        let mut stack = WadStack::new();
        stack.push(file_with(&[("X", &[1])]));
        stack.push(file_with(&[("X", &[2])]));

        assert_eq!(stack.lump("X").unwrap().bytes(), &[2]);
        let all = stack.lumps_all("X");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].bytes(), &[1]);
        assert_eq!(all[1].bytes(), &[2]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut stack = WadStack::new();
        stack.push(file_with(&[("PLAYPAL", &[0, 0, 0])]));
        assert!(stack.lump("playpal").is_some());
        assert!(stack.lump("PlayPal").is_some());
    }

    #[test]
    fn flat_namespace_skips_markers() {
        let mut stack = WadStack::new();
        stack.push(file_with(&[
            ("BEFORE", &[1]),
            ("F_START", &[]),
            ("F1_START", &[]),
            ("FLOOR1", &[1, 2, 3]),
            ("F1_END", &[]),
            ("FLOOR2", &[4]),
            ("F_END", &[]),
            ("AFTER", &[9]),
        ]));

        let names: Vec<&str> = stack.flats_iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["FLOOR1", "FLOOR2"]);
    }

    #[test]
    fn namespaces_span_files_in_load_order() {
        let mut stack = WadStack::new();
        stack.push(file_with(&[("F_START", &[]), ("A", &[1]), ("F_END", &[])]));
        stack.push(file_with(&[("FF_START", &[]), ("B", &[2]), ("FF_END", &[])]));

        let names: Vec<&str> = stack.flats_iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn default_datasets_when_lumps_missing() {
        let stack = WadStack::new();
        assert_eq!(stack.palette_data().len(), 768);
        assert_eq!(stack.colourmap_data().len(), 34 * 256);
        // Identity remap, grey ramp.
        assert_eq!(stack.colourmap_data()[5], 5);
        assert_eq!(&stack.palette_data()[3 * 7..3 * 7 + 3], &[7, 7, 7]);
    }

    #[test]
    fn palette_lump_wins_over_default() {
        let mut stack = WadStack::new();
        let pal: Vec<u8> = vec![1; 768];
        stack.push(file_with(&[("PLAYPAL", &pal)]));
        assert_eq!(stack.palette_data()[0], 1);
    }
}
