//! The WAD container: header, directory, lump payloads, and the writer that
//! reproduces the historical on-disk layout byte for byte.

use crate::buffer;
use crate::FormatError;

/// Header which tells us the WAD type and where the directory is
///
/// The header structure in the WAD is as follows:
///
/// | Field Size | Data Type    | Content                                             |
/// |------------|--------------|-----------------------------------------------------|
/// | 0x00-0x03  | 4 ASCII char | *Must* be an ASCII string (either "IWAD" or "PWAD") |
/// | 0x04-0x07  | unsigned int | The number of entries in the directory              |
/// | 0x08-0x0b  | unsigned int | Offset in bytes to the directory in the WAD file    |
///
/// Each 16-byte directory entry then reads:
///
/// | Field Size | Data Type    | Content                                        |
/// |------------|--------------|------------------------------------------------|
/// | 0x00-0x03  | unsigned int | Offset to the start of the lump data           |
/// | 0x04-0x07  | unsigned int | The size of the lump in bytes                  |
/// | 0x08-0x0f  | 8 ASCII char | Zero-padded ASCII name of the lump             |
///
/// An entry with offset 0 and size 0 is a marker lump: it owns no bytes and
/// exists only to delimit a namespace. Offset 0 with a nonzero size is never
/// valid.
pub const HEADER_SIZE: usize = 12;
pub const DIR_ENTRY_SIZE: usize = 16;

/// Will be either `IWAD` for a game file, or `PWAD` for a patch file whose
/// lumps override same-named lumps loaded before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    Iwad,
    Pwad,
}

impl WadKind {
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match &magic {
            b"IWAD" => Some(WadKind::Iwad),
            b"PWAD" => Some(WadKind::Pwad),
            _ => None,
        }
    }

    pub fn magic(self) -> [u8; 4] {
        match self {
            WadKind::Iwad => *b"IWAD",
            WadKind::Pwad => *b"PWAD",
        }
    }
}

/// A named block of bytes from the container. `payload` is `None` only for
/// marker lumps, which declare neither offset nor length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lump {
    pub name: String,
    pub payload: Option<Vec<u8>>,
    /// Offset and length exactly as the parsed directory declared them.
    /// Freshly built lumps carry 0/len until a serialize assigns real ones.
    declared_offset: u32,
    declared_length: u32,
}

impl Lump {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let length = payload.len() as u32;
        Lump {
            name: name.into(),
            payload: Some(payload),
            declared_offset: 0,
            declared_length: length,
        }
    }

    /// A zero-length namespace delimiter.
    pub fn marker(name: impl Into<String>) -> Self {
        Lump {
            name: name.into(),
            payload: None,
            declared_offset: 0,
            declared_length: 0,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.payload.is_none()
    }

    /// The lump bytes; empty for markers.
    pub fn bytes(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Offset this lump's data was parsed from, 0 for markers and for lumps
    /// never yet written out.
    pub fn declared_offset(&self) -> u32 {
        self.declared_offset
    }

    /// Length as the parsed directory declared it.
    pub fn declared_length(&self) -> u32 {
        self.declared_length
    }

    pub fn read_u16(&self, offset: usize) -> u16 {
        buffer::read_u16(self.bytes(), offset)
    }

    pub fn read_i16(&self, offset: usize) -> i16 {
        buffer::read_i16(self.bytes(), offset)
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        buffer::read_u32(self.bytes(), offset)
    }

    pub fn read_i32(&self, offset: usize) -> i32 {
        buffer::read_i32(self.bytes(), offset)
    }
}

/// One parsed WAD: the type tag plus the lump list in directory order.
/// Order is the on-disk order and is preserved on write, because namespace
/// markers and map groupings are positional.
#[derive(Debug, Clone)]
pub struct WadFile {
    pub kind: WadKind,
    lumps: Vec<Lump>,
    /// The original writers aligned lump data to 4 bytes. A single unaligned
    /// lump offset in the source file turns the behaviour off for the whole
    /// file so a rewrite reproduces the original layout.
    aligned: bool,
}

impl WadFile {
    pub fn new(kind: WadKind) -> Self {
        WadFile {
            kind,
            lumps: Vec::new(),
            aligned: true,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < HEADER_SIZE {
            return Err(FormatError::TooShort(data.len()));
        }
        let magic = [data[0], data[1], data[2], data[3]];
        let kind = WadKind::from_magic(magic).ok_or(FormatError::BadMagic(magic))?;
        let count = buffer::read_u32(data, 4);
        let dir_offset = buffer::read_u32(data, 8);

        let dir_end = dir_offset as u64 + count as u64 * DIR_ENTRY_SIZE as u64;
        if dir_end > data.len() as u64 {
            return Err(FormatError::DirectoryOutOfBounds {
                offset: dir_offset,
                count,
                len: data.len(),
            });
        }

        let mut lumps = Vec::with_capacity(count as usize);
        let mut aligned = true;
        for i in 0..count as usize {
            let entry = dir_offset as usize + i * DIR_ENTRY_SIZE;
            let offset = buffer::read_u32(data, entry);
            let length = buffer::read_u32(data, entry + 4);
            let name = buffer::read_name8(data, entry + 8);

            let payload = if offset == 0 && length == 0 {
                None
            } else if offset == 0 {
                return Err(FormatError::ZeroOffset { name, length });
            } else {
                let end = offset as u64 + length as u64;
                if end > data.len() as u64 {
                    return Err(FormatError::LumpOutOfBounds {
                        name,
                        offset,
                        end,
                        len: data.len(),
                    });
                }
                if offset % 4 != 0 {
                    aligned = false;
                }
                Some(data[offset as usize..end as usize].to_vec())
            };

            lumps.push(Lump {
                name,
                payload,
                declared_offset: offset,
                declared_length: length,
            });
        }

        Ok(WadFile {
            kind,
            lumps,
            aligned,
        })
    }

    pub fn lumps(&self) -> &[Lump] {
        &self.lumps
    }

    pub fn push(&mut self, lump: Lump) {
        self.lumps.push(lump);
    }

    /// First lump matching `name`, compared case-insensitively. Directory
    /// order within one file never overrides; that is a job for the stack.
    pub fn lump(&self, name: &str) -> Option<&Lump> {
        self.lumps
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn lump_index(&self, name: &str) -> Option<usize> {
        self.lumps
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Whether writes of this file pad lump data to 4-byte boundaries.
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Write the container back out. A parse-then-serialize with no mutation
    /// is byte-identical, which means reproducing the historical padding:
    /// when alignment is on, each lump's data is followed by 0–3 bytes whose
    /// value is the *first byte of that lump's own data* (never a zero fill)
    /// and padding goes only between lumps, not after the last.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.kind.magic());
        buffer::write_u32(&mut out, self.lumps.len() as u32);
        buffer::write_u32(&mut out, 0); // directory offset, patched below

        let mut directory: Vec<(u32, u32)> = Vec::with_capacity(self.lumps.len());
        let last_with_data = self
            .lumps
            .iter()
            .rposition(|l| !l.is_marker())
            .unwrap_or(0);

        for (i, lump) in self.lumps.iter().enumerate() {
            match &lump.payload {
                None => directory.push((0, 0)),
                Some(data) => {
                    directory.push((out.len() as u32, data.len() as u32));
                    out.extend_from_slice(data);
                    if self.aligned && i < last_with_data {
                        let pad = data.first().copied().unwrap_or(0);
                        while out.len() % 4 != 0 {
                            out.push(pad);
                        }
                    }
                }
            }
        }

        let dir_offset = out.len() as u32;
        for ((offset, length), lump) in directory.iter().zip(&self.lumps) {
            buffer::write_u32(&mut out, *offset);
            buffer::write_u32(&mut out, *length);
            buffer::write_name8(&mut out, &lump.name);
        }
        buffer::patch_u32(&mut out, 8, dir_offset);
        out
    }
}
