//! Endian-parametrized binary primitives (§4.1).
//!
//! A single module exposes readers for every width used by the format; the
//! endianness and integer width are per-file, threaded in as parameters
//! rather than baked in as a singleton.

use crate::error::{Error, Result, Section};
use crate::metadata::Endianness;

fn bounded<'a>(bytes: &'a [u8], offset: usize, len: usize, section: Section) -> Result<&'a [u8]> {
    bytes
        .get(offset..offset + len)
        .ok_or(Error::Truncation { section })
}

#[inline]
#[must_use]
pub fn read_u16(endian: Endianness, bytes: &[u8]) -> u16 {
    match endian {
        Endianness::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
        Endianness::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
    }
}

#[inline]
#[must_use]
pub fn read_u32(endian: Endianness, bytes: &[u8]) -> u32 {
    let arr: [u8; 4] = bytes[0..4].try_into().expect("4-byte window");
    match endian {
        Endianness::Little => u32::from_le_bytes(arr),
        Endianness::Big => u32::from_be_bytes(arr),
    }
}

#[inline]
#[must_use]
pub fn read_u64(endian: Endianness, bytes: &[u8]) -> u64 {
    let arr: [u8; 8] = bytes[0..8].try_into().expect("8-byte window");
    match endian {
        Endianness::Little => u64::from_le_bytes(arr),
        Endianness::Big => u64::from_be_bytes(arr),
    }
}

/// Reads an unsigned integer of `width` bytes (1, 2, 4, or 8) at `offset`,
/// widened to `u64`. `width` is known only at run time, derived from the
/// file's detected format (32-bit vs. 64-bit).
pub fn read_uint_at(
    endian: Endianness,
    bytes: &[u8],
    offset: usize,
    width: usize,
    section: Section,
) -> Result<u64> {
    let window = bounded(bytes, offset, width, section)?;
    Ok(match width {
        1 => u64::from(window[0]),
        2 => u64::from(read_u16(endian, window)),
        4 => u64::from(read_u32(endian, window)),
        8 => read_u64(endian, window),
        _ => unreachable!("integer width is always 1, 2, 4, or 8"),
    })
}

/// Reads an `f64` by first reading a 64-bit integer at the declared
/// endianness and bit-casting — this matches the on-disk representation
/// regardless of host float endianness.
pub fn read_f64_at(
    endian: Endianness,
    bytes: &[u8],
    offset: usize,
    section: Section,
) -> Result<f64> {
    let window = bounded(bytes, offset, 8, section)?;
    Ok(f64::from_bits(read_u64(endian, window)))
}

/// Reads a fixed-width ASCII/codec string at `offset`: trims trailing
/// `0x00`/`0x20`, then leading `0x20`, then decodes with `codec`.
pub fn read_text_at(
    bytes: &[u8],
    offset: usize,
    width: usize,
    codec: &'static encoding_rs::Encoding,
    section: Section,
) -> Result<String> {
    let window = bounded(bytes, offset, width, section)?;
    let trimmed = crate::parser::encoding::trim_trailing(window);
    let leading_trimmed = trim_leading_space(trimmed);
    let (text, _, _) = codec.decode(leading_trimmed);
    Ok(text.into_owned())
}

fn trim_leading_space(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != b' ') {
        Some(first) => &bytes[first..],
        None => &[],
    }
}
