//! Page decoder (§4.8): classifies a page and enumerates its row slices.

use crate::error::{Error, Result, Section};
use crate::metadata::{Compression, Endianness, Format};
use crate::parser::byteorder::{read_u16, read_uint_at};
use crate::parser::compression;

const META: u16 = 0x0000;
const DATA: u16 = 0x0100;
const MIX: u16 = 0x0200;
const AMD: u16 = 0x0400;
const METADATA_CONTINUATION: u16 = 0x4000;
#[allow(dead_code)]
const SPECIAL: u16 = 0x8000;
const HAS_DELETED_OR_EXTENDED: u16 = 0x0080;
const COMPRESSED: u16 = 0x1000;

/// The raw page header triple, located at `page_bit_offset`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageHeader {
    pub page_type: u16,
    pub block_count: u16,
    pub subheader_count: u16,
}

pub(crate) fn read_page_header(
    page: &[u8],
    endian: Endianness,
    format: Format,
    page_index: u64,
) -> Result<PageHeader> {
    let base = format.page_bit_offset();
    let window = page
        .get(base..base + 6)
        .ok_or(Error::Truncation {
            section: Section::Page { index: page_index },
        })?;
    Ok(PageHeader {
        page_type: read_u16(endian, &window[0..2]),
        block_count: read_u16(endian, &window[2..4]),
        subheader_count: read_u16(endian, &window[4..6]),
    })
}

impl PageHeader {
    pub(crate) const fn is_data(&self) -> bool {
        self.page_type & DATA != 0
    }

    pub(crate) const fn is_mix(&self) -> bool {
        self.page_type & MIX != 0
    }

    pub(crate) const fn is_meta(&self) -> bool {
        self.page_type == META
    }

    /// Amd pages (§4.8) are a standalone primary type, not a flag combined
    /// with others, like `Meta`.
    pub(crate) const fn is_amd(&self) -> bool {
        self.page_type == AMD
    }

    pub(crate) const fn is_metadata_continuation(&self) -> bool {
        self.page_type & METADATA_CONTINUATION != 0
    }

    pub(crate) const fn has_deleted_or_extended(&self) -> bool {
        self.page_type & HAS_DELETED_OR_EXTENDED != 0
    }

    pub(crate) const fn is_compressed_flag(&self) -> bool {
        self.page_type & COMPRESSED != 0
    }
}

pub(crate) const TRUNCATED: u8 = 1;
pub(crate) const COMPRESSED_SUBTYPE: u8 = 1;

/// One `(offset, length, compression_flag, subtype_flag)` descriptor from the
/// subheader pointer array.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubheaderDescriptor {
    pub offset: u64,
    pub length: u64,
    pub compression_flag: u8,
    pub subtype_flag: u8,
}

impl SubheaderDescriptor {
    pub(crate) const fn is_skipped(&self) -> bool {
        self.length == 0 || self.compression_flag == TRUNCATED
    }

    /// The gating predicate for a meta-page subheader that actually carries a
    /// data row rather than metadata (§3 invariants, §4.8 Meta page rule).
    pub(crate) fn carries_embedded_row(&self, file_compressed: bool, is_known_metadata: bool) -> bool {
        file_compressed
            && matches!(self.compression_flag, 0 | 4)
            && self.subtype_flag == COMPRESSED_SUBTYPE
            && !is_known_metadata
    }
}

/// Reads every subheader descriptor for a page whose header is `header`.
pub(crate) fn read_subheader_descriptors(
    page: &[u8],
    endian: Endianness,
    format: Format,
    header: &PageHeader,
    page_index: u64,
) -> Result<Vec<SubheaderDescriptor>> {
    let width = format.integer_width();
    let stride = 3 * width;
    let first = format.page_bit_offset() + 8;
    let section = || Section::Page { index: page_index };

    (0..header.subheader_count as usize)
        .map(|i| {
            let base = first + i * stride;
            let offset = read_uint_at(endian, page, base, width, section())?;
            let length = read_uint_at(endian, page, base + width, width, section())?;
            let compression_flag = *page.get(base + 2 * width).ok_or(Error::Truncation {
                section: section(),
            })?;
            let subtype_flag = *page.get(base + 2 * width + 1).ok_or(Error::Truncation {
                section: section(),
            })?;
            Ok(SubheaderDescriptor {
                offset,
                length,
                compression_flag,
                subtype_flag,
            })
        })
        .collect()
}

/// Yields the embedded data rows of a Meta page: subheaders satisfying the
/// "carries embedded row" gating predicate. A subheader body at least
/// `row_length` bytes is yielded directly; a shorter, compressed body is
/// expanded into a fresh `row_length`-byte buffer.
pub(crate) fn meta_embedded_rows(
    page: &[u8],
    endian: Endianness,
    format: Format,
    header: &PageHeader,
    descriptors: &[SubheaderDescriptor],
    row_length: u64,
    file_compressed: bool,
    compression: Compression,
    page_index: u64,
    is_known_metadata: impl Fn(&[u8]) -> bool,
) -> Result<Vec<Vec<u8>>> {
    let _ = header;
    let width = format.integer_width();
    let mut rows = Vec::new();
    for descriptor in descriptors {
        if descriptor.is_skipped() {
            continue;
        }
        let body = page
            .get(descriptor.offset as usize..(descriptor.offset + descriptor.length) as usize)
            .ok_or(Error::Truncation {
                section: Section::Page { index: page_index },
            })?;
        let signature = body.get(..width).unwrap_or(body);
        let known = is_known_metadata(signature);
        if !descriptor.carries_embedded_row(file_compressed, known) {
            continue;
        }
        if body.len() as u64 >= row_length {
            rows.push(body[..row_length as usize].to_vec());
        } else {
            let mut scratch = vec![0u8; row_length as usize];
            compression::decompress(compression, body, &mut scratch, page_index)?;
            rows.push(scratch);
        }
    }
    Ok(rows)
}

/// A page classified into one of the format's four structural shapes, ready
/// to enumerate its row slices.
pub(crate) enum Page<'a> {
    Data {
        page: &'a [u8],
        page_bit_offset: usize,
        row_length: u64,
        block_count: u64,
    },
    Mix {
        page: &'a [u8],
        rows_start: usize,
        row_length: u64,
        row_count: u64,
    },
    Meta {
        page: &'a [u8],
        endian: Endianness,
        header: PageHeader,
        format: Format,
        row_length: u64,
        file_compressed: bool,
        compression: Compression,
        page_index: u64,
    },
    Unknown,
}

impl<'a> Page<'a> {
    /// Enumerates row slices for this page. For `Data`/`Mix` pages the slices
    /// borrow directly from the page buffer; for `Meta` pages an embedded,
    /// decompressed row is written into `scratch` and a view into `scratch`
    /// is returned through the closure instead (see the iteration caller).
    pub(crate) fn data_row_slices(&self) -> Vec<&'a [u8]> {
        match self {
            Page::Data {
                page,
                page_bit_offset,
                row_length,
                block_count,
            } => {
                let start = page_bit_offset + 8;
                let row_length = *row_length as usize;
                (0..*block_count as usize)
                    .filter_map(|i| {
                        let offset = start + i * row_length;
                        page.get(offset..offset + row_length)
                    })
                    .collect()
            }
            Page::Mix {
                page,
                rows_start,
                row_length,
                row_count,
            } => {
                let row_length = *row_length as usize;
                let mut rows = Vec::with_capacity(*row_count as usize);
                let mut offset = *rows_start;
                for _ in 0..*row_count {
                    if offset + row_length > page.len() {
                        break;
                    }
                    rows.push(&page[offset..offset + row_length]);
                    offset += row_length;
                }
                rows
            }
            Page::Meta { .. } | Page::Unknown => Vec::new(),
        }
    }

    /// Embedded data rows carried inside a Meta page's subheaders, if any.
    pub(crate) fn meta_row_slices(
        &self,
        is_known_metadata: impl Fn(&[u8]) -> bool,
    ) -> Result<Vec<Vec<u8>>> {
        match self {
            Page::Meta {
                page,
                endian,
                header,
                format,
                row_length,
                file_compressed,
                compression,
                page_index,
            } => {
                let descriptors = read_subheader_descriptors(page, *endian, *format, header, *page_index)?;
                meta_embedded_rows(
                    page,
                    *endian,
                    *format,
                    header,
                    &descriptors,
                    *row_length,
                    *file_compressed,
                    *compression,
                    *page_index,
                    is_known_metadata,
                )
            }
            Page::Data { .. } | Page::Mix { .. } | Page::Unknown => Ok(Vec::new()),
        }
    }
}

/// Rounds `value` up to the next multiple of 8.
pub(crate) const fn align8(value: usize) -> usize {
    (value + 7) & !7
}

/// Classifies a just-read page for row enumeration, given the geometry
/// established by header/subheader decoding.
#[allow(clippy::too_many_arguments)]
pub(crate) fn classify_page(
    page: &[u8],
    endian: Endianness,
    format: Format,
    compression: Compression,
    file_compressed: bool,
    row_length: u64,
    row_count: u64,
    mix_page_row_count: u64,
    rows_already_emitted: u64,
    page_index: u64,
) -> Result<Page<'_>> {
    let header = read_page_header(page, endian, format, page_index)?;

    if header.is_meta() {
        return Ok(Page::Meta {
            page,
            endian,
            header,
            format,
            row_length,
            file_compressed,
            compression,
            page_index,
        });
    }
    if header.is_data() {
        if header.is_compressed_flag() {
            log::trace!(
                "page {page_index}: Data page carries the Compressed flag; its rows are still \
                 read as fixed-width row_length slices, not decompressed"
            );
        }
        return Ok(Page::Data {
            page,
            page_bit_offset: format.page_bit_offset(),
            row_length,
            block_count: u64::from(header.block_count),
        });
    }
    if header.is_mix() {
        let width = format.integer_width();
        let subheader_region_end =
            format.page_bit_offset() + 8 + header.subheader_count as usize * 3 * width;
        let rows_start = align8(subheader_region_end);
        let remaining = row_count.saturating_sub(rows_already_emitted);
        let clamped = mix_page_row_count.min(remaining);
        if clamped < mix_page_row_count {
            log::debug!(
                "page {page_index}: clamping mix-page row count {mix_page_row_count} to {clamped} remaining rows"
            );
        }
        return Ok(Page::Mix {
            page,
            rows_start,
            row_length,
            row_count: clamped,
        });
    }
    Ok(Page::Unknown)
}
