//! The column-indexed, run-length picture format used for sprites, patches,
//! and UI graphics.
//!
//! A picture is stored as columns of "posts": vertical runs of opaque
//! pixels. Rows no post covers are transparent. The on-disk layout:
//!
//! | Field Size | Data Type | Content                                 |
//! |------------|-----------|-----------------------------------------|
//! |  0x00-0x01 |    u16    | Width (1..=4096)                        |
//! |  0x02-0x03 |    u16    | Height (1..=4096)                       |
//! |  0x04-0x05 |    i16    | Left offset (X origin)                  |
//! |  0x06-0x07 |    i16    | Top offset (Y origin)                   |
//! |  0x08-...  | u32 × w   | Per-column byte offsets from lump start |
//!
//! Each column is a chain of posts terminated by a `0xFF` byte:
//!
//! | Field Size | Content                                    |
//! |------------|--------------------------------------------|
//! |  1 byte    | Top delta (row the run starts at)          |
//! |  1 byte    | Run length                                 |
//! |  1 byte    | Unused pad, duplicates the first pixel     |
//! |  N bytes   | Palette indices                            |
//! |  1 byte    | Unused pad, duplicates the last pixel      |
//!
//! Editors extending the format past 254 rows reused the top-delta byte:
//! when a post's raw top delta is not greater than the previous post's, the
//! effective row is the *sum* of the two raw bytes.

use wad::{buffer, FormatError};

use crate::image::Image;

const HEADER_SIZE: usize = 8;
const MAX_DIMENSION: u16 = 4096;
const COLUMN_END: u8 = 0xFF;

/// One opaque run within a column. `top` is the effective row, with the
/// tall-picture sum rule already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub top: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub width: u16,
    pub height: u16,
    /// Signed draw-origin offsets; sprites use these to hang off their
    /// map position.
    pub left_offset: i16,
    pub top_offset: i16,
    columns: Vec<Vec<Post>>,
}

impl Picture {
    /// Decode a picture lump. Reading is deliberately tolerant at the tail:
    /// a column that runs out of buffer before its `0xFF` terminator keeps
    /// the posts read so far. Structural problems in the header or a post
    /// that overruns the image height are hard errors.
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < HEADER_SIZE {
            return Err(FormatError::malformed(
                "picture",
                format!("{} bytes is too short for a header", data.len()),
            ));
        }
        let width = buffer::read_u16(data, 0);
        let height = buffer::read_u16(data, 2);
        if width == 0 || width > MAX_DIMENSION || height == 0 || height > MAX_DIMENSION {
            return Err(FormatError::malformed(
                "picture",
                format!("implausible dimensions {width}x{height}"),
            ));
        }
        let table_end = HEADER_SIZE + width as usize * 4;
        if table_end > data.len() {
            return Err(FormatError::malformed(
                "picture",
                "column offset table runs past end of data",
            ));
        }

        let mut columns = Vec::with_capacity(width as usize);
        for x in 0..width as usize {
            let offset = buffer::read_u32(data, HEADER_SIZE + x * 4) as usize;
            if offset > data.len() {
                return Err(FormatError::malformed(
                    "picture",
                    format!("column {x} offset {offset} outside data"),
                ));
            }
            columns.push(Self::decode_column(data, offset, height)?);
        }

        Ok(Picture {
            width,
            height,
            left_offset: buffer::read_i16(data, 4),
            top_offset: buffer::read_i16(data, 6),
            columns,
        })
    }

    fn decode_column(data: &[u8], offset: usize, height: u16) -> Result<Vec<Post>, FormatError> {
        let mut posts = Vec::new();
        let mut cursor = offset;
        let mut last_raw: Option<u8> = None;

        loop {
            if cursor >= data.len() {
                break; // ran off the end without a terminator: tolerated
            }
            let raw = data[cursor];
            if raw == COLUMN_END {
                break;
            }
            if cursor + 2 > data.len() {
                break;
            }
            let length = data[cursor + 1] as usize;

            let top = match last_raw {
                Some(prev) if raw <= prev => prev as u32 + raw as u32,
                _ => raw as u32,
            };
            last_raw = Some(raw);

            if top as usize + length > height as usize {
                return Err(FormatError::malformed(
                    "picture",
                    format!("post at row {top} length {length} exceeds height {height}"),
                ));
            }

            let px_start = cursor + 3; // skip top delta, length, leading pad
            let available = data.len().saturating_sub(px_start).min(length);
            let pixels = if available == 0 {
                Vec::new()
            } else {
                data[px_start..px_start + available].to_vec()
            };
            posts.push(Post { top, pixels });
            cursor = px_start + length + 1; // step over pixels and trailing pad
        }
        Ok(posts)
    }

    /// Whether `data` has the shape of a picture lump: plausible
    /// dimensions, the column table inside the buffer, and every post chain
    /// terminated inside the buffer. The sniffing test run before choosing
    /// a decoder for ambiguous lump data. Never panics, never allocates.
    pub fn is_structurally_valid(data: &[u8]) -> bool {
        if data.len() < HEADER_SIZE {
            return false;
        }
        let width = buffer::read_u16(data, 0);
        let height = buffer::read_u16(data, 2);
        if width == 0 || width > MAX_DIMENSION || height == 0 || height > MAX_DIMENSION {
            return false;
        }
        let table_end = HEADER_SIZE + width as usize * 4;
        if table_end > data.len() {
            return false;
        }

        for x in 0..width as usize {
            let mut cursor = buffer::read_u32(data, HEADER_SIZE + x * 4) as usize;
            loop {
                if cursor >= data.len() {
                    return false;
                }
                if data[cursor] == COLUMN_END {
                    break;
                }
                if cursor + 1 >= data.len() {
                    return false;
                }
                // top delta + length + two pads + pixels
                cursor += 4 + data[cursor + 1] as usize;
            }
        }
        true
    }

    /// Build a picture from a row-major grid of optional palette indices.
    pub fn from_pixels(
        width: u16,
        height: u16,
        left_offset: i16,
        top_offset: i16,
        pixels: &[Option<u8>],
    ) -> Self {
        let mut columns = Vec::with_capacity(width as usize);
        for x in 0..width as usize {
            let mut posts: Vec<Post> = Vec::new();
            let mut run: Option<Post> = None;
            for y in 0..height as usize {
                match pixels[y * width as usize + x] {
                    Some(index) => match run.as_mut() {
                        Some(post) => post.pixels.push(index),
                        None => {
                            run = Some(Post {
                                top: y as u32,
                                pixels: vec![index],
                            })
                        }
                    },
                    None => {
                        if let Some(post) = run.take() {
                            posts.push(post);
                        }
                    }
                }
            }
            if let Some(post) = run.take() {
                posts.push(post);
            }
            columns.push(posts);
        }
        Picture {
            width,
            height,
            left_offset,
            top_offset,
            columns,
        }
    }

    /// Palette index at `(x, y)`; `None` when no post covers that row.
    /// Out-of-bounds coordinates are also uncovered, not an error.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        let column = self.columns.get(x as usize)?;
        for post in column {
            if y >= post.top && (y - post.top) < post.pixels.len() as u32 {
                return Some(post.pixels[(y - post.top) as usize]);
            }
        }
        None
    }

    pub fn columns(&self) -> &[Vec<Post>] {
        &self.columns
    }

    /// Flatten to an [`Image`].
    pub fn to_image(&self) -> Image {
        let mut image = Image::new(self.width as u32, self.height as u32);
        for (x, column) in self.columns.iter().enumerate() {
            for post in column {
                for (i, &index) in post.pixels.iter().enumerate() {
                    image.set_pixel(x as u32, post.top + i as u32, Some(index));
                }
            }
        }
        image
    }

    /// Encode back to the on-disk layout. Runs longer than 255 pixels are
    /// split, and rows past 254 are reached by the sum rule, inserting an
    /// empty relay post where the raw byte cannot express the row directly.
    /// The pairwise sum tops out at 508, which bounds what this layout can
    /// address no matter the nominal height.
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::new();
        buffer::write_u16(&mut out, self.width);
        buffer::write_u16(&mut out, self.height);
        buffer::write_i16(&mut out, self.left_offset);
        buffer::write_i16(&mut out, self.top_offset);
        // Column offset table, back-filled as columns are written.
        let table_at = out.len();
        out.resize(table_at + self.columns.len() * 4, 0);

        for (x, column) in self.columns.iter().enumerate() {
            let column_at = out.len() as u32;
            buffer::patch_u32(&mut out, table_at + x * 4, column_at);
            let mut prev: Option<u8> = None;
            for post in column {
                let mut top = post.top;
                let mut rest = post.pixels.as_slice();
                loop {
                    let chunk = rest.len().min(255);
                    Self::encode_post(&mut out, &mut prev, top, &rest[..chunk])?;
                    rest = &rest[chunk..];
                    top += chunk as u32;
                    if rest.is_empty() {
                        break;
                    }
                }
            }
            out.push(COLUMN_END);
        }
        Ok(out)
    }

    fn encode_post(
        out: &mut Vec<u8>,
        prev: &mut Option<u8>,
        top: u32,
        pixels: &[u8],
    ) -> Result<(), FormatError> {
        let raw = loop {
            match *prev {
                None if top <= 254 => break top as u8,
                Some(p) if top <= 254 && top > p as u32 => break top as u8,
                Some(p) if top >= p as u32 && top - p as u32 <= p as u32 => {
                    break (top - p as u32) as u8;
                }
                Some(p) if p == 254 => {
                    return Err(FormatError::malformed(
                        "picture",
                        format!("row {top} is beyond what post offsets can express"),
                    ));
                }
                // Ratchet the previous raw up with an empty relay post so
                // the sum rule can reach the target row.
                _ => {
                    out.extend_from_slice(&[254, 0, 0, 0]);
                    *prev = Some(254);
                }
            }
        };
        out.push(raw);
        out.push(pixels.len() as u8);
        out.push(pixels.first().copied().unwrap_or(0));
        out.extend_from_slice(pixels);
        out.push(pixels.last().copied().unwrap_or(0));
        *prev = Some(raw);
        Ok(())
    }
}
