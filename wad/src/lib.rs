//! This crate contains the structures and tools for reading and writing
//! WAD files: the container itself, lump lookup with patch-WAD override
//! order, and the raw map records in their three binary dialects.
//!
//! The structure of a WAD is this:
//!
//! ```text,ignore
//!                        <───── 32 bits ──────>
//!                        ┌────────────────────┐
//!             ┌──── 0x00 |  ASCII WAD Type    | 0x03
//!             |          | ────────────────── |
//!     Header ─┤     0x04 | # of directories   | 0x07
//!             |          | ────────────────── |
//!             └──── 0x08 | offset to listing ───0x0B ──┐
//!             ┌───────── | ────────────────── |        |
//!             |     0x0C | ┌────────────────┐ |        |
//!             |          | |   Lump Bytes   |<─────┐   |
//!     Lumps ──┤          | |       .        | |    |   |
//!             |          | └────────────────┘ |    |   |
//!             |          |         .          |    |   |
//!             └───────── |         .          |    |   |
//!             ┌───────── | ┌────────────────┐<─────────┘
//!             |          | |   Lump Offset  |──────┘
//!             |          | |----------------| |
//!  Directory ─┤          | |   Lump Size    | |
//!     List    |          | |----------------| |
//!             |          | |   Lump Name    | |
//!             |          | └────────────────┘ |
//!             |          |         .          |
//!             |          |         .          |
//!             |          |         .          |
//!             └───────── └────────────────────┘
//! ```
//!
//! Nothing in here touches the filesystem: callers hand in byte buffers and
//! get structured data back. Decoding is deterministic, so there is no retry
//! path anywhere; a parse either succeeds or reports why the bytes are bad.

use thiserror::Error;

pub mod buffer;
pub mod info;
pub mod map;
pub mod stack;
pub mod types;
pub mod wad;

pub use crate::map::{list_maps, MapFormat, MapLumps, RecordTable};
pub use crate::stack::{LumpIndex, WadStack};
pub use crate::wad::{Lump, WadFile, WadKind};

/// A structural failure in the container or in a typed lump. Fatal to the
/// parse that raised it; other lumps in the same file remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("data is {0} bytes, too short for a WAD header")]
    TooShort(usize),
    #[error("unrecognised WAD magic {0:?}")]
    BadMagic([u8; 4]),
    #[error("directory of {count} entries at {offset:#x} runs past end of data ({len} bytes)")]
    DirectoryOutOfBounds { offset: u32, count: u32, len: usize },
    #[error("lump {name} spans {offset:#x}..{end:#x}, past end of data ({len} bytes)")]
    LumpOutOfBounds {
        name: String,
        offset: u32,
        end: u64,
        len: usize,
    },
    #[error("lump {name} declares offset 0 with length {length}")]
    ZeroOffset { name: String, length: u32 },
    #[error("{subject}: {detail}")]
    Malformed {
        subject: &'static str,
        detail: String,
    },
}

impl FormatError {
    pub fn malformed(subject: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            subject,
            detail: detail.into(),
        }
    }
}

/// Index out of bounds on a decoded record table, palette, or colourmap.
/// Fatal only to the accessor call that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} out of range for table of {len}")]
pub struct RangeError {
    pub index: usize,
    pub len: usize,
}
