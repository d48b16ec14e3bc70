//! Palettes, colourmaps, and the combined index → RGBA lookup.

use wad::{FormatError, RangeError, WadStack};

pub type Rgb = [u8; 3];
pub type Rgba = [u8; 4];

/// The colourmap reserved by convention for full-bright rendering (the
/// invulnerability effect). Nothing structural enforces it.
pub const FULL_BRIGHT_MAP: usize = 32;

const PALETTE_SIZE: usize = 256 * 3;
const COLOURMAP_SIZE: usize = 256;

/// One or more 256-entry RGB palettes, stored back to back the way the
/// `PLAYPAL` lump stores them. The game selected among them for pain and
/// pickup flashes; index 0 is the everyday palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    data: Vec<u8>,
}

impl Palette {
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.is_empty() || data.len() % PALETTE_SIZE != 0 {
            return Err(FormatError::malformed(
                "palette",
                format!("length {} is not a positive multiple of 768", data.len()),
            ));
        }
        Ok(Palette {
            data: data.to_vec(),
        })
    }

    /// Decode the stack's override-winning `PLAYPAL`, or its built-in
    /// default when none exists.
    pub fn resolve(stack: &WadStack) -> Result<Self, FormatError> {
        Self::decode(stack.palette_data())
    }

    /// How many 256-colour palettes the data holds.
    pub fn count(&self) -> usize {
        self.data.len() / PALETTE_SIZE
    }

    fn check(&self, palette: usize, index: usize) -> Result<usize, RangeError> {
        if palette >= self.count() {
            return Err(RangeError {
                index: palette,
                len: self.count(),
            });
        }
        if index >= 256 {
            return Err(RangeError { index, len: 256 });
        }
        Ok(palette * PALETTE_SIZE + index * 3)
    }

    pub fn colour_at(&self, palette: usize, index: usize) -> Result<Rgb, RangeError> {
        let at = self.check(palette, index)?;
        Ok([self.data[at], self.data[at + 1], self.data[at + 2]])
    }

    pub fn set_colour(
        &mut self,
        palette: usize,
        index: usize,
        colour: Rgb,
    ) -> Result<(), RangeError> {
        let at = self.check(palette, index)?;
        self.data[at..at + 3].copy_from_slice(&colour);
        Ok(())
    }

    /// The raw bytes, laid out ready for a `PLAYPAL` lump payload.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// One or more 256-entry palette-index remap tables, the `COLORMAP` layout.
/// Map 0 is identity-bright; higher maps darken toward black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colourmap {
    data: Vec<u8>,
}

impl Colourmap {
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.is_empty() || data.len() % COLOURMAP_SIZE != 0 {
            return Err(FormatError::malformed(
                "colourmap",
                format!("length {} is not a positive multiple of 256", data.len()),
            ));
        }
        Ok(Colourmap {
            data: data.to_vec(),
        })
    }

    pub fn resolve(stack: &WadStack) -> Result<Self, FormatError> {
        Self::decode(stack.colourmap_data())
    }

    /// How many remap tables the data holds.
    pub fn count(&self) -> usize {
        self.data.len() / COLOURMAP_SIZE
    }

    fn check(&self, map: usize, index: usize) -> Result<usize, RangeError> {
        if map >= self.count() {
            return Err(RangeError {
                index: map,
                len: self.count(),
            });
        }
        if index >= 256 {
            return Err(RangeError { index, len: 256 });
        }
        Ok(map * COLOURMAP_SIZE + index)
    }

    /// Remap a palette index through table `map`.
    pub fn remap(&self, map: usize, index: usize) -> Result<u8, RangeError> {
        Ok(self.data[self.check(map, index)?])
    }

    pub fn set_remap(&mut self, map: usize, index: usize, to: u8) -> Result<(), RangeError> {
        let at = self.check(map, index)?;
        self.data[at] = to;
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// A palette and colourmap pair with a current selection of each, answering
/// the only question renderers ask: what RGBA is colour index `i` right now.
/// Alpha is always opaque; transparency lives in picture structure, not in
/// colour data.
#[derive(Debug, Clone)]
pub struct ColourLookup {
    palette: Palette,
    colourmap: Colourmap,
    use_palette: usize,
    use_map: usize,
}

impl ColourLookup {
    pub fn new(palette: Palette, colourmap: Colourmap) -> Self {
        ColourLookup {
            palette,
            colourmap,
            use_palette: 0,
            use_map: 0,
        }
    }

    pub fn resolve(stack: &WadStack) -> Result<Self, FormatError> {
        Ok(Self::new(
            Palette::resolve(stack)?,
            Colourmap::resolve(stack)?,
        ))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn colourmap(&self) -> &Colourmap {
        &self.colourmap
    }

    pub fn select_palette(&mut self, palette: usize) -> Result<(), RangeError> {
        if palette >= self.palette.count() {
            return Err(RangeError {
                index: palette,
                len: self.palette.count(),
            });
        }
        self.use_palette = palette;
        Ok(())
    }

    pub fn select_map(&mut self, map: usize) -> Result<(), RangeError> {
        if map >= self.colourmap.count() {
            return Err(RangeError {
                index: map,
                len: self.colourmap.count(),
            });
        }
        self.use_map = map;
        Ok(())
    }

    /// Remap `index` through the selected colourmap, then through the
    /// selected palette, always fully opaque.
    pub fn rgba(&self, index: usize) -> Result<Rgba, RangeError> {
        let remapped = self.colourmap.remap(self.use_map, index)?;
        let [r, g, b] = self.palette.colour_at(self.use_palette, remapped as usize)?;
        Ok([r, g, b, 0xFF])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_palettes() -> Palette {
        let mut data = vec![0u8; 768 * 2];
        // palette 1, colour 5 = (50, 60, 70)
        data[768 + 15] = 50;
        data[768 + 16] = 60;
        data[768 + 17] = 70;
        Palette::decode(&data).unwrap()
    }

    #[test]
    fn palette_length_must_be_multiple_of_768() {
        assert!(Palette::decode(&[0; 768]).is_ok());
        assert!(Palette::decode(&[0; 769]).is_err());
        assert!(Palette::decode(&[]).is_err());
    }

    #[test]
    fn colourmap_length_must_be_multiple_of_256() {
        assert!(Colourmap::decode(&[0; 256 * 34]).is_ok());
        assert!(Colourmap::decode(&[0; 100]).is_err());
        assert!(Colourmap::decode(&[]).is_err());
    }

    #[test]
    fn colour_bounds() {
        let pal = two_palettes();
        assert_eq!(pal.count(), 2);
        assert_eq!(pal.colour_at(1, 5).unwrap(), [50, 60, 70]);
        assert_eq!(
            pal.colour_at(2, 0),
            Err(RangeError { index: 2, len: 2 })
        );
        assert_eq!(
            pal.colour_at(0, 256),
            Err(RangeError {
                index: 256,
                len: 256
            })
        );
    }

    #[test]
    fn set_get_round_trip() {
        let mut pal = two_palettes();
        pal.set_colour(0, 17, [1, 2, 3]).unwrap();
        assert_eq!(pal.colour_at(0, 17).unwrap(), [1, 2, 3]);
        assert!(pal.set_colour(5, 0, [0, 0, 0]).is_err());

        let mut map = Colourmap::decode(&[0; 512]).unwrap();
        map.set_remap(1, 9, 42).unwrap();
        assert_eq!(map.remap(1, 9).unwrap(), 42);
        assert_eq!(map.remap(1, 10).unwrap(), 0);
    }

    #[test]
    fn lookup_composes_remap_then_palette() {
        let pal = two_palettes();
        let mut map_data = vec![0u8; 256];
        map_data[9] = 5; // colour 9 remaps to palette entry 5
        let map = Colourmap::decode(&map_data).unwrap();

        let mut lookup = ColourLookup::new(pal, map);
        lookup.select_palette(1).unwrap();
        assert_eq!(lookup.rgba(9).unwrap(), [50, 60, 70, 0xFF]);
        assert_eq!(lookup.rgba(0).unwrap(), [0, 0, 0, 0xFF]);
        assert!(lookup.rgba(300).is_err());
        assert!(lookup.select_palette(2).is_err());
        assert!(lookup.select_map(1).is_err());
    }

    #[test]
    fn stack_defaults_always_resolve() {
        let stack = WadStack::new();
        let lookup = ColourLookup::resolve(&stack).unwrap();
        // Grey ramp through identity maps.
        assert_eq!(lookup.rgba(128).unwrap(), [128, 128, 128, 0xFF]);
    }
}
