//! The decoded image type shared by pictures, composite textures, and flats.

use log::warn;

use crate::palette::{ColourLookup, Rgba};

/// The side length of a flat. Flats are raw row-major index grids with no
/// header; the size is fixed by convention.
pub const FLAT_SIZE: usize = 64;

/// An indexed-colour image where a pixel is either a palette index or
/// absent. Absence *is* the transparency model; there is no alpha channel
/// until RGBA conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Option<u8>>,
}

impl Image {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Image {
            width,
            height,
            pixels: vec![None; width as usize * height as usize],
        }
    }

    /// A flat lump: 64x64 raw indices, every pixel opaque. Oversized data is
    /// truncated and undersized data leaves the remainder transparent, with
    /// a warning either way; some editors wrote odd sizes.
    pub fn from_flat(data: &[u8]) -> Self {
        if data.len() != FLAT_SIZE * FLAT_SIZE {
            warn!(
                "flat is {} bytes, expected {}",
                data.len(),
                FLAT_SIZE * FLAT_SIZE
            );
        }
        let mut image = Image::new(FLAT_SIZE as u32, FLAT_SIZE as u32);
        for (i, &index) in data.iter().take(FLAT_SIZE * FLAT_SIZE).enumerate() {
            image.pixels[i] = Some(index);
        }
        image
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Palette index at `(x, y)`, `None` when uncovered or out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: Option<u8>) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = value;
        }
    }

    pub fn has_transparency(&self) -> bool {
        self.pixels.iter().any(|p| p.is_none())
    }

    /// Expand to RGBA through the lookup's selected palette and map.
    /// Uncovered pixels become fully transparent black.
    pub fn to_rgba(&self, lookup: &ColourLookup) -> Vec<u8> {
        const CLEAR: Rgba = [0, 0, 0, 0];
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            let rgba = match pixel {
                // A u8 index is always within a 256-entry table.
                Some(index) => lookup.rgba(*index as usize).unwrap_or(CLEAR),
                None => CLEAR,
            };
            out.extend_from_slice(&rgba);
        }
        out
    }
}
