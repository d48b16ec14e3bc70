//! All data and functions related to pictures in the WAD format:
//! - Palettes, colourmaps, and the combined colour lookup
//! - The column/post run-length picture codec
//! - Composite wall textures built from positioned patches
//! - Flat (raw 64x64) images
//! - A lazily caching name → image library over a [`wad::WadStack`]
//!
//! Everything decodes from in-memory lump bytes. Transparency only exists as
//! the *absence* of a pixel: the indexed-colour level has no partial alpha.

mod image;
mod library;
mod palette;
mod picture;
mod texture;

pub use image::{Image, FLAT_SIZE};
pub use library::{LibraryImage, TextureKind, TextureLibrary};
pub use palette::{ColourLookup, Colourmap, Palette, Rgb, Rgba, FULL_BRIGHT_MAP};
pub use picture::{Picture, Post};
pub use texture::{compose, decode_texture_list, PatchNames, TexturePatch, WadTexture};
