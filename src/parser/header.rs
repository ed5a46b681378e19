//! Header decoder (§4.6): the fixed 288-byte (or larger) prefix of the file.

use std::io::Read;

use time::{Date, Duration, Month, OffsetDateTime};

use crate::error::{Error, Result, Section};
use crate::metadata::{Endianness, FileMetadata, Format, Platform};
use crate::parser::byteorder::{read_f64_at, read_text_at, read_u32};
use crate::parser::encoding::resolve_encoding_byte;

const MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC2, 0xEA, 0x81, 0x60,
    0xB3, 0x14, 0x11, 0xCF, 0xBD, 0x92, 0x08, 0x00, 0x09, 0xC7, 0x31, 0x8C, 0x18, 0x1F, 0x10, 0x11,
];

const FIXED_HEADER_LEN: usize = 288;

fn sas_seconds_to_instant(seconds: f64) -> Option<OffsetDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let epoch = OffsetDateTime::UNIX_EPOCH
        .replace_date(Date::from_calendar_date(1960, Month::January, 1).ok()?);
    epoch.checked_add(Duration::seconds_f64(
        crate::parser::field::round_half_away_from_zero(seconds),
    ))
}

/// Reads and parses the fixed header, performing the optional extension read
/// when `header_length > 288`.
pub fn parse_header<R: Read>(reader: &mut R) -> Result<FileMetadata> {
    let mut buf = vec![0u8; FIXED_HEADER_LEN];
    read_exact_or_truncated(reader, &mut buf, Section::Header)?;

    if buf[0..32] != MAGIC {
        return Err(Error::BadMagic);
    }

    let format = if buf[32] == b'3' {
        Format::Bit64
    } else {
        Format::Bit32
    };
    let a2: usize = if format == Format::Bit64 { 4 } else { 0 };
    let a1: usize = if buf[35] == b'3' { 4 } else { 0 };
    let total = a1 + a2;

    let endian = if buf[37] == 0x01 {
        Endianness::Little
    } else {
        Endianness::Big
    };

    let platform = match buf[39] {
        b'1' => Platform::Unix,
        b'2' => Platform::Windows,
        _ => Platform::Unknown,
    };

    let encoding = resolve_encoding_byte(buf[70]);

    let header_length_offset = 196 + a1;
    let header_length = u64::from(read_u32(
        endian,
        buf.get(header_length_offset..header_length_offset + 4)
            .ok_or(Error::Truncation {
                section: Section::Header,
            })?,
    ));

    let full: Vec<u8> = if header_length as usize > FIXED_HEADER_LEN {
        let mut full = buf;
        full.resize(header_length as usize, 0);
        read_exact_or_truncated(
            reader,
            &mut full[FIXED_HEADER_LEN..],
            Section::HeaderExtension,
        )?;
        full
    } else {
        buf
    };

    let dataset_name = read_text_at(&full, 92, 64, encoding, Section::Header)?;
    let file_type = read_text_at(&full, 156, 8, encoding, Section::Header)?;

    let date_created =
        sas_seconds_to_instant(read_f64_at(endian, &full, 164 + a1, Section::Header)?);
    let date_modified =
        sas_seconds_to_instant(read_f64_at(endian, &full, 172 + a1, Section::Header)?);

    let page_length_offset = 200 + a1;
    let page_length = u64::from(read_u32(
        endian,
        full.get(page_length_offset..page_length_offset + 4)
            .ok_or(Error::Truncation {
                section: Section::Header,
            })?,
    ));
    let page_count_offset = 204 + a1;
    let page_count = u64::from(read_u32(
        endian,
        full.get(page_count_offset..page_count_offset + 4)
            .ok_or(Error::Truncation {
                section: Section::Header,
            })?,
    ));

    let sas_release = read_text_at(&full, 216 + total, 8, encoding, Section::Header)?;
    let sas_server_type = read_text_at(&full, 224 + total, 16, encoding, Section::Header)?;
    let os_type = read_text_at(&full, 240 + total, 16, encoding, Section::Header)?;

    let os_name_flag_offset = 272 + total;
    let os_name_flag = *full.get(os_name_flag_offset).ok_or(Error::Truncation {
        section: Section::Header,
    })?;
    let os_name = if os_name_flag != 0 {
        read_text_at(&full, 272 + total, 16, encoding, Section::Header)?
    } else {
        read_text_at(&full, 256 + total, 16, encoding, Section::Header)?
    };

    Ok(FileMetadata {
        endian,
        format,
        platform,
        encoding,
        dataset_name,
        file_type,
        sas_release,
        sas_server_type,
        os_type,
        os_name,
        creator: String::new(),
        creator_proc: String::new(),
        date_created,
        date_modified,
        header_length,
        page_length,
        page_count,
        compression: crate::metadata::Compression::None,
        row_length: 0,
        row_count: 0,
        mix_page_row_count: 0,
        column_count: 0,
        col_count_p1: 0,
        col_count_p2: 0,
        lcs: 0,
        lcp: 0,
    })
}

fn read_exact_or_truncated<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    section: Section,
) -> Result<()> {
    reader
        .read_exact(buf)
        .map_err(|_| Error::Truncation { section })
}
