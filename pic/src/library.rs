//! Lazy name → decoded-image resolution over a [`WadStack`].
//!
//! Wall textures resolve through the texture list lumps and `PNAMES`;
//! flats resolve through the flat namespace markers. Every result, hit or
//! miss, is cached for the life of the library, and the expensive
//! derivations (transparency scan, RGBA expansion) are memoized per entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use log::warn;
use wad::{FormatError, WadStack};

use crate::image::Image;
use crate::palette::ColourLookup;
use crate::picture::Picture;
use crate::texture::{compose, decode_texture_list, PatchNames};

/// The texture list lumps scanned for wall textures, in priority order.
/// The base game shipped `TEXTURE1`/`TEXTURE2`; the rest of the numeric
/// range is accepted from add-ons.
const TEXTURE_LISTS: &[&str] = &[
    "TEXTURE1", "TEXTURE2", "TEXTURE3", "TEXTURE4", "TEXTURE5", "TEXTURE6", "TEXTURE7", "TEXTURE8",
    "TEXTURE9",
];

/// What namespace a name resolves in. Wall textures and flats have separate
/// naming worlds; the same name can exist in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Wall,
    Flat,
}

/// A resolved image plus its lazily computed derivations.
#[derive(Debug)]
pub struct LibraryImage {
    pub name: String,
    pub kind: TextureKind,
    pub world_panning: bool,
    image: Image,
    transparent: OnceLock<bool>,
    rgba: OnceLock<Vec<u8>>,
}

impl LibraryImage {
    fn new(name: String, kind: TextureKind, world_panning: bool, image: Image) -> Self {
        LibraryImage {
            name,
            kind,
            world_panning,
            image,
            transparent: OnceLock::new(),
            rgba: OnceLock::new(),
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether any pixel is uncovered. Computed once, then remembered.
    pub fn is_transparent(&self) -> bool {
        *self
            .transparent
            .get_or_init(|| self.image.has_transparency())
    }

    /// The RGBA expansion through `lookup`. Computed once with the lookup
    /// of the first call, then remembered; the library always passes its
    /// own lookup so the memo is coherent.
    pub fn rgba(&self, lookup: &ColourLookup) -> &[u8] {
        self.rgba.get_or_init(|| self.image.to_rgba(lookup))
    }
}

type CacheKey = (String, TextureKind);

/// The one piece of shared mutable state in the crate: a single-writer
/// memo of every resolution ever asked for. Holding the lock across the
/// decode is what guarantees at most one decode per key.
pub struct TextureLibrary<'w> {
    stack: &'w WadStack,
    lookup: ColourLookup,
    patch_names: PatchNames,
    cache: Mutex<HashMap<CacheKey, Option<Arc<LibraryImage>>>>,
}

impl<'w> TextureLibrary<'w> {
    /// Build over a stack, resolving its palette, colourmap, and patch
    /// name table up front. Fails only if a present palette or colourmap
    /// lump is malformed; absence falls back to the stack's defaults.
    pub fn new(stack: &'w WadStack) -> Result<Self, FormatError> {
        let lookup = ColourLookup::resolve(stack)?;
        let patch_names = match stack.lump("PNAMES") {
            Some(lump) => match PatchNames::decode(lump.bytes()) {
                Ok(names) => names,
                Err(e) => {
                    warn!("PNAMES unusable ({e}), wall textures will not resolve");
                    PatchNames::default()
                }
            },
            None => PatchNames::default(),
        };
        Ok(TextureLibrary {
            stack,
            lookup,
            patch_names,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn lookup(&self) -> &ColourLookup {
        &self.lookup
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, Option<Arc<LibraryImage>>>> {
        // A panic mid-decode leaves no partial entry worth protecting, so a
        // poisoned lock keeps serving.
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Resolve `name` in `kind`'s namespace. `None` means the name is
    /// genuinely absent; that outcome is cached too, so repeated misses
    /// cost one scan total.
    pub fn resolve(&self, name: &str, kind: TextureKind) -> Option<Arc<LibraryImage>> {
        let key = (name.to_ascii_uppercase(), kind);
        let mut cache = self.cache();
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }
        let resolved = match kind {
            TextureKind::Wall => self.resolve_wall(&key.0),
            TextureKind::Flat => self.resolve_flat(&key.0),
        }
        .map(Arc::new);
        cache.insert(key, resolved.clone());
        resolved
    }

    /// Pixel dimensions without touching the RGBA path.
    pub fn dimensions(&self, name: &str, kind: TextureKind) -> Option<(u32, u32)> {
        self.resolve(name, kind)
            .map(|image| (image.width(), image.height()))
    }

    fn resolve_wall(&self, name: &str) -> Option<LibraryImage> {
        for list in TEXTURE_LISTS {
            for lump in self.stack.lumps_all(list) {
                let textures = match decode_texture_list(lump.bytes()) {
                    Ok(textures) => textures,
                    Err(e) => {
                        warn!("{list}: {e}");
                        continue;
                    }
                };
                if let Some(texture) = textures
                    .into_iter()
                    .find(|t| t.name.eq_ignore_ascii_case(name))
                {
                    let resolve = |patch: &str| self.resolve_patch(patch);
                    let image = compose(&texture, &self.patch_names, &resolve);
                    return Some(LibraryImage::new(
                        texture.name,
                        TextureKind::Wall,
                        texture.world_panning,
                        image,
                    ));
                }
            }
        }
        None
    }

    /// A patch lump that exists but does not sniff as a picture contributes
    /// nothing; composing continues without it.
    fn resolve_patch(&self, name: &str) -> Option<Picture> {
        let lump = self.stack.lump(name)?;
        if !Picture::is_structurally_valid(lump.bytes()) {
            warn!("patch {name} is not picture-shaped, skipped");
            return None;
        }
        match Picture::decode(lump.bytes()) {
            Ok(picture) => Some(picture),
            Err(e) => {
                warn!("patch {name}: {e}");
                None
            }
        }
    }

    fn resolve_flat(&self, name: &str) -> Option<LibraryImage> {
        let lump = self
            .stack
            .flats_iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))?;
        Some(LibraryImage::new(
            lump.name.to_ascii_uppercase(),
            TextureKind::Flat,
            false,
            Image::from_flat(lump.bytes()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wad::{buffer, Lump, WadFile, WadKind};

    fn checker_patch(size: u16, a: u8, b: u8) -> Vec<u8> {
        let pixels: Vec<Option<u8>> = (0..size as u32 * size as u32)
            .map(|i| {
                let (x, y) = (i % size as u32, i / size as u32);
                Some(if (x + y) % 2 == 0 { a } else { b })
            })
            .collect();
        Picture::from_pixels(size, size, 0, 0, &pixels)
            .encode()
            .unwrap()
    }

    fn pnames_lump(names: &[&str]) -> Vec<u8> {
        let mut data = Vec::new();
        buffer::write_u32(&mut data, names.len() as u32);
        for name in names {
            buffer::write_name8(&mut data, name);
        }
        data
    }

    fn texture1_lump(name: &str, size: u16, patch_index: u16) -> Vec<u8> {
        let mut data = Vec::new();
        buffer::write_u32(&mut data, 1);
        buffer::write_u32(&mut data, 8); // the single record follows the table
        buffer::write_name8(&mut data, name);
        buffer::write_u32(&mut data, 0);
        buffer::write_u16(&mut data, size);
        buffer::write_u16(&mut data, size);
        buffer::write_u32(&mut data, 0);
        buffer::write_u16(&mut data, 1);
        buffer::write_i16(&mut data, 0);
        buffer::write_i16(&mut data, 0);
        buffer::write_u16(&mut data, patch_index);
        buffer::write_u16(&mut data, 0);
        buffer::write_u16(&mut data, 0);
        data
    }

    fn fixture() -> WadStack {
        let mut wad = WadFile::new(WadKind::Iwad);
        wad.push(Lump::new("PNAMES", pnames_lump(&["WALLPAT"])));
        wad.push(Lump::new("TEXTURE1", texture1_lump("BRICK", 8, 0)));
        wad.push(Lump::new("WALLPAT", checker_patch(8, 3, 4)));
        wad.push(Lump::marker("F_START"));
        wad.push(Lump::new("MUD", vec![11; 4096]));
        wad.push(Lump::marker("F_END"));
        let mut stack = WadStack::new();
        stack.push(wad);
        stack
    }

    #[test]
    fn wall_resolution_composes_patches() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        let brick = library.resolve("BRICK", TextureKind::Wall).unwrap();
        assert_eq!(brick.width(), 8);
        assert_eq!(brick.image().pixel(0, 0), Some(3));
        assert_eq!(brick.image().pixel(1, 0), Some(4));
        assert!(!brick.is_transparent());
    }

    #[test]
    fn flat_resolution_uses_namespace() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        let mud = library.resolve("mud", TextureKind::Flat).unwrap();
        assert_eq!((mud.width(), mud.height()), (64, 64));
        assert_eq!(mud.image().pixel(10, 10), Some(11));

        // The same name is absent from the wall namespace.
        assert!(library.resolve("MUD", TextureKind::Wall).is_none());
    }

    #[test]
    fn misses_are_cached_and_stable() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        assert!(library.resolve("NOPE", TextureKind::Wall).is_none());
        assert!(library.resolve("NOPE", TextureKind::Wall).is_none());
    }

    #[test]
    fn repeated_resolution_shares_one_entry() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        let a = library.resolve("BRICK", TextureKind::Wall).unwrap();
        let b = library.resolve("BRICK", TextureKind::Wall).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn rgba_is_memoized() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        let brick = library.resolve("BRICK", TextureKind::Wall).unwrap();
        let first = brick.rgba(library.lookup()).as_ptr();
        let second = brick.rgba(library.lookup()).as_ptr();
        assert_eq!(first, second);
        // Grey default palette: index 3 expands to (3, 3, 3, 255).
        assert_eq!(&brick.rgba(library.lookup())[0..4], &[3, 3, 3, 0xFF]);
    }

    #[test]
    fn dimensions_shortcut() {
        let stack = fixture();
        let library = TextureLibrary::new(&stack).unwrap();
        assert_eq!(library.dimensions("BRICK", TextureKind::Wall), Some((8, 8)));
        assert_eq!(library.dimensions("MUD", TextureKind::Flat), Some((64, 64)));
        assert_eq!(library.dimensions("NOPE", TextureKind::Flat), None);
    }
}
