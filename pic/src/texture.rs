//! Composite wall textures: named canvases assembled from positioned
//! picture patches, resolved through the `PNAMES` patch name table.

use log::warn;
use wad::{buffer, FormatError};

use crate::image::Image;
use crate::picture::Picture;

/// The `PNAMES` lump: a count followed by 8-byte patch names. Texture
/// records reference patches by index into this table.
///
/// | Field Size | Data Type | Content          |
/// |------------|-----------|------------------|
/// |  0x00-0x03 |    u32    | Number of names  |
/// |  8 × N     | 8 ASCII   | Patch lump names |
#[derive(Debug, Clone, Default)]
pub struct PatchNames {
    names: Vec<String>,
}

impl PatchNames {
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < 4 {
            return Err(FormatError::malformed("patch names", "missing count"));
        }
        let count = buffer::read_u32(data, 0) as usize;
        if 4 + count * 8 > data.len() {
            return Err(FormatError::malformed(
                "patch names",
                format!("{count} names do not fit in {} bytes", data.len()),
            ));
        }
        let names = (0..count)
            .map(|i| buffer::read_name8(data, 4 + i * 8))
            .collect();
        Ok(PatchNames { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}

/// One patch placement inside a texture: where the patch's top-left corner
/// lands, in texture space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePatch {
    pub origin_x: i32,
    pub origin_y: i32,
    /// Index into [`PatchNames`].
    pub patch_index: usize,
}

/// A named composite texture record from a `TEXTURE1`-style list lump.
/// Later patches draw over earlier ones where they overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WadTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Offsets applied in world units rather than texels when set; stored
    /// in the high bit of the record's flag word.
    pub world_panning: bool,
    pub patches: Vec<TexturePatch>,
}

const WORLD_PANNING_BIT: u32 = 0x8000;

/// Decode a whole texture list lump.
///
/// | Field Size | Data Type | Content                              |
/// |------------|-----------|--------------------------------------|
/// |  0x00-0x03 |    u32    | Number of textures                   |
/// |  u32 × N   |    u32    | Offsets to each record, lump-relative|
///
/// Each record:
///
/// | Field Size | Data Type | Content                        |
/// |------------|-----------|--------------------------------|
/// |  0x00-0x07 | 8 ASCII   | Texture name                   |
/// |  0x08-0x0B |    u32    | Flag word (world panning bit)  |
/// |  0x0C-0x0D |    u16    | Width                          |
/// |  0x0E-0x0F |    u16    | Height                         |
/// |  0x10-0x13 |    u32    | Obsolete column directory      |
/// |  0x14-0x15 |    u16    | Patch count                    |
///
/// followed by 10 bytes per patch: origin X, origin Y, patch table index,
/// and two obsolete fields.
pub fn decode_texture_list(data: &[u8]) -> Result<Vec<WadTexture>, FormatError> {
    if data.len() < 4 {
        return Err(FormatError::malformed("texture list", "missing count"));
    }
    let count = buffer::read_u32(data, 0) as usize;
    if 4 + count * 4 > data.len() {
        return Err(FormatError::malformed(
            "texture list",
            format!("{count} offsets do not fit in {} bytes", data.len()),
        ));
    }

    let mut textures = Vec::with_capacity(count);
    for i in 0..count {
        let at = buffer::read_u32(data, 4 + i * 4) as usize;
        if at + 22 > data.len() {
            return Err(FormatError::malformed(
                "texture list",
                format!("record {i} at {at} runs past end of data"),
            ));
        }
        let name = buffer::read_name8(data, at);
        let flags = buffer::read_u32(data, at + 8);
        let width = buffer::read_u16(data, at + 12) as u32;
        let height = buffer::read_u16(data, at + 14) as u32;
        let patch_count = buffer::read_u16(data, at + 20) as usize;
        if at + 22 + patch_count * 10 > data.len() {
            return Err(FormatError::malformed(
                "texture list",
                format!("record {name} declares {patch_count} patches past end of data"),
            ));
        }

        let patches = (0..patch_count)
            .map(|p| {
                let pat = at + 22 + p * 10;
                TexturePatch {
                    origin_x: buffer::read_i16(data, pat) as i32,
                    origin_y: buffer::read_i16(data, pat + 2) as i32,
                    patch_index: buffer::read_u16(data, pat + 4) as usize,
                }
            })
            .collect();

        textures.push(WadTexture {
            name,
            width,
            height,
            world_panning: flags & WORLD_PANNING_BIT != 0,
            patches,
        });
    }
    Ok(textures)
}

/// Compose a texture into an indexed image. For every output pixel the
/// patches are consulted topmost-first (last in the list wins) and the
/// first opaque pixel found is taken; pixels no patch covers stay
/// transparent.
///
/// `resolve` maps a patch name to its decoded picture. A name that fails to
/// resolve, or whose lump is not structurally a picture, contributes
/// nothing; the texture still composes from whatever is left.
pub fn compose(
    texture: &WadTexture,
    names: &PatchNames,
    resolve: &dyn Fn(&str) -> Option<Picture>,
) -> Image {
    let pictures: Vec<Option<Picture>> = texture
        .patches
        .iter()
        .map(|placement| {
            let name = match names.get(placement.patch_index) {
                Some(name) => name,
                None => {
                    warn!(
                        "texture {}: patch index {} outside the name table",
                        texture.name, placement.patch_index
                    );
                    return None;
                }
            };
            let picture = resolve(name);
            if picture.is_none() {
                warn!("texture {}: missing patch {name}", texture.name);
            }
            picture
        })
        .collect();

    let mut image = Image::new(texture.width, texture.height);
    for y in 0..texture.height {
        for x in 0..texture.width {
            // Topmost patch wins: walk placements in reverse.
            for (placement, picture) in texture.patches.iter().zip(&pictures).rev() {
                let Some(picture) = picture else { continue };
                let px = x as i64 - placement.origin_x as i64;
                let py = y as i64 - placement.origin_y as i64;
                if px < 0 || py < 0 {
                    continue;
                }
                if let Some(index) = picture.pixel(px as u32, py as u32) {
                    image.set_pixel(x, y, Some(index));
                    break;
                }
            }
        }
    }
    image
}
