//! Offset-addressed byte readers and writers shared by every lump codec.
//!
//! The read side follows the layout conventions of the on-disk format:
//! everything in the container proper is little-endian, while the console
//! port stored a few of its tables big-endian, so both widths get both
//! orders. Callers validate the span they are about to read; these helpers
//! index directly.

/// Read a `u16` stored little-endian at `offset`.
#[inline]
pub fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read an `i16` stored little-endian at `offset`.
#[inline]
pub fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a `u32` stored little-endian at `offset`.
#[inline]
pub fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read an `i32` stored little-endian at `offset`.
#[inline]
pub fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read a `u16` stored big-endian at `offset`.
#[inline]
pub fn read_u16_be(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Read an `i16` stored big-endian at `offset`.
#[inline]
pub fn read_i16_be(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Read a `u32` stored big-endian at `offset`.
#[inline]
pub fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read an `i32` stored big-endian at `offset`.
#[inline]
pub fn read_i32_be(data: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Patch a little-endian `u32` in place, used to back-fill the directory
/// offset in an already written header.
#[inline]
pub fn patch_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Decode a zero-padded fixed-width ASCII name field. Trailing NULs are
/// stripped, and anything after the first NUL is ignored; some editors left
/// garbage there.
pub fn read_name(data: &[u8], offset: usize, width: usize) -> String {
    let field = &data[offset..offset + width];
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    field[..end].iter().map(|&b| b as char).collect()
}

/// The 8-byte directory-entry name field.
#[inline]
pub fn read_name8(data: &[u8], offset: usize) -> String {
    read_name(data, offset, 8)
}

/// Encode a name into a zero-padded fixed-width ASCII field. Longer names
/// are truncated to `width`.
pub fn write_name(out: &mut Vec<u8>, name: &str, width: usize) {
    let bytes = name.as_bytes();
    for i in 0..width {
        out.push(if i < bytes.len() { bytes[i] } else { 0 });
    }
}

#[inline]
pub fn write_name8(out: &mut Vec<u8>, name: &str) {
    write_name(out, name, 8);
}
