//! Subheader decoder (§4.7): parses the page-0..N subheader graph into
//! columns and final row geometry.

use crate::error::{Error, Result, Section};
use crate::metadata::{ColumnInfo, Compression, Endianness, FileMetadata, Format, StorageKind};
use crate::parser::byteorder::{read_u16, read_uint_at};
use crate::parser::compression as codec;
use crate::parser::page::{align8, read_page_header, read_subheader_descriptors, PageHeader, SubheaderDescriptor};
use crate::parser::type_inference::infer_type;
use crate::value::LogicalType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubheaderKind {
    RowSize,
    ColumnSize,
    SubheaderCounts,
    ColumnText,
    ColumnName,
    ColumnAttributes,
    FormatAndLabel,
    ColumnList,
    Unknown,
}

/// Byte-exact signature tables (§4.7.2). `w` identifies which table to use.
pub(crate) fn classify_signature(signature: &[u8], format: Format) -> SubheaderKind {
    match format {
        Format::Bit64 => classify_64(signature),
        Format::Bit32 => classify_32(signature),
    }
}

/// Whether `signature` classifies as one of the known metadata subheader
/// types (used by the Meta-page "embedded row" gating predicate, §4.8/§9).
pub(crate) fn is_known_metadata_signature(signature: &[u8], format: Format) -> bool {
    !matches!(classify_signature(signature, format), SubheaderKind::Unknown)
}

fn classify_64(sig: &[u8]) -> SubheaderKind {
    const ROW_SIZE: &[[u8; 8]] = &[
        [0, 0, 0, 0, 0xF7, 0xF7, 0xF7, 0xF7],
        [0xF7, 0xF7, 0xF7, 0xF7, 0, 0, 0, 0],
        [0xF7, 0xF7, 0xF7, 0xF7, 0xFF, 0xFF, 0xFB, 0xFE],
        [0xFF, 0xFF, 0xFB, 0xFE, 0xF7, 0xF7, 0xF7, 0xF7],
    ];
    const COLUMN_SIZE: &[[u8; 8]] = &[
        [0, 0, 0, 0, 0xF6, 0xF6, 0xF6, 0xF6],
        [0xF6, 0xF6, 0xF6, 0xF6, 0, 0, 0, 0],
        [0xF6, 0xF6, 0xF6, 0xF6, 0xFF, 0xFF, 0xFB, 0xFE],
        [0xFF, 0xFF, 0xFB, 0xFE, 0xF6, 0xF6, 0xF6, 0xF6],
    ];
    const SUBHEADER_COUNTS: &[[u8; 8]] = &[
        [0, 0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC, 0],
    ];
    const COLUMN_TEXT: &[[u8; 8]] = &[
        [0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFD],
    ];
    const COLUMN_NAME: [u8; 8] = [0xFF; 8];
    const COLUMN_ATTRIBUTES: &[[u8; 8]] = &[
        [0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC],
    ];
    const FORMAT_AND_LABEL: &[[u8; 8]] = &[
        [0xFE, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFB, 0xFE],
    ];
    const COLUMN_LIST: &[[u8; 8]] = &[
        [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE],
    ];

    if sig.len() != 8 {
        return SubheaderKind::Unknown;
    }
    if ROW_SIZE.iter().any(|s| s == sig) {
        SubheaderKind::RowSize
    } else if COLUMN_SIZE.iter().any(|s| s == sig) {
        SubheaderKind::ColumnSize
    } else if SUBHEADER_COUNTS.iter().any(|s| s == sig) {
        SubheaderKind::SubheaderCounts
    } else if COLUMN_TEXT.iter().any(|s| s == sig) {
        SubheaderKind::ColumnText
    } else if sig == COLUMN_NAME {
        SubheaderKind::ColumnName
    } else if COLUMN_ATTRIBUTES.iter().any(|s| s == sig) {
        SubheaderKind::ColumnAttributes
    } else if FORMAT_AND_LABEL.iter().any(|s| s == sig) {
        SubheaderKind::FormatAndLabel
    } else if COLUMN_LIST.iter().any(|s| s == sig) {
        SubheaderKind::ColumnList
    } else {
        SubheaderKind::Unknown
    }
}

fn classify_32(sig: &[u8]) -> SubheaderKind {
    const ROW_SIZE: [u8; 4] = [0xF7, 0xF7, 0xF7, 0xF7];
    const COLUMN_SIZE: [u8; 4] = [0xF6, 0xF6, 0xF6, 0xF6];
    const SUBHEADER_COUNTS: &[[u8; 4]] = &[[0, 0xFC, 0xFF, 0xFF], [0xFF, 0xFF, 0xFC, 0]];
    const COLUMN_TEXT: &[[u8; 4]] = &[[0xFD, 0xFF, 0xFF, 0xFF], [0xFF, 0xFF, 0xFF, 0xFD]];
    const COLUMN_NAME: [u8; 4] = [0xFF; 4];
    const COLUMN_ATTRIBUTES: &[[u8; 4]] = &[[0xFC, 0xFF, 0xFF, 0xFF], [0xFF, 0xFF, 0xFF, 0xFC]];
    const FORMAT_AND_LABEL: &[[u8; 4]] = &[[0xFE, 0xFB, 0xFF, 0xFF], [0xFF, 0xFF, 0xFB, 0xFE]];
    const COLUMN_LIST: &[[u8; 4]] = &[[0xFE, 0xFF, 0xFF, 0xFF], [0xFF, 0xFF, 0xFF, 0xFE]];

    if sig.len() != 4 {
        return SubheaderKind::Unknown;
    }
    if sig == ROW_SIZE {
        SubheaderKind::RowSize
    } else if sig == COLUMN_SIZE {
        SubheaderKind::ColumnSize
    } else if SUBHEADER_COUNTS.iter().any(|s| s == sig) {
        SubheaderKind::SubheaderCounts
    } else if COLUMN_TEXT.iter().any(|s| s == sig) {
        SubheaderKind::ColumnText
    } else if sig == COLUMN_NAME {
        SubheaderKind::ColumnName
    } else if COLUMN_ATTRIBUTES.iter().any(|s| s == sig) {
        SubheaderKind::ColumnAttributes
    } else if FORMAT_AND_LABEL.iter().any(|s| s == sig) {
        SubheaderKind::FormatAndLabel
    } else if COLUMN_LIST.iter().any(|s| s == sig) {
        SubheaderKind::ColumnList
    } else {
        SubheaderKind::Unknown
    }
}

/// Raw byte blocks harvested from `ColumnText` subheaders. Substrings are
/// decoded and trimmed at extraction time rather than up front, so byte
/// offsets recorded by `ColumnName`/`FormatAndLabel` entries stay aligned to
/// the untouched source bytes.
#[derive(Default)]
struct TextPool {
    blocks: Vec<Vec<u8>>,
}

impl TextPool {
    fn push(&mut self, bytes: &[u8]) -> usize {
        self.blocks.push(bytes.to_vec());
        self.blocks.len() - 1
    }

    fn substring(
        &self,
        index: u64,
        offset: u64,
        length: u64,
        codec: &'static encoding_rs::Encoding,
    ) -> String {
        let Some(block) = self.blocks.get(index as usize) else {
            return String::new();
        };
        let offset = offset as usize;
        if offset >= block.len() {
            return String::new();
        }
        let length = (length as usize).min(block.len() - offset);
        let raw = &block[offset..offset + length];
        let trimmed = crate::parser::encoding::trim_trailing(raw);
        let (text, _, _) = codec.decode(trimmed);
        text.trim_start_matches(' ').to_string()
    }
}

#[derive(Default, Clone)]
struct RawColumn {
    offset: u64,
    length: u64,
    storage: StorageKind,
}

/// Accumulates subheader-derived state while walking metadata pages.
pub(crate) struct MetadataScan {
    pub metadata: FileMetadata,
    text_pool: TextPool,
    first_column_text_seen: bool,
    names: Vec<String>,
    fields: Vec<RawColumn>,
    formats: Vec<String>,
    labels: Vec<String>,
    rows_region_end: Option<usize>,
}

impl MetadataScan {
    pub(crate) fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            text_pool: TextPool::default(),
            first_column_text_seen: false,
            names: Vec::new(),
            fields: Vec::new(),
            formats: Vec::new(),
            labels: Vec::new(),
            rows_region_end: None,
        }
    }

    fn endian(&self) -> Endianness {
        self.metadata.endian
    }

    fn format(&self) -> Format {
        self.metadata.format
    }

    fn codec(&self) -> &'static encoding_rs::Encoding {
        self.metadata.encoding
    }

    /// Walks pages starting at the first page after the header until a pure
    /// data page is seen or metadata concludes on a Mix page.
    pub(crate) fn scan<R: std::io::Read>(&mut self, reader: &mut R) -> Result<()> {
        let page_length = self.metadata.page_length as usize;
        let mut page_index = 0u64;
        let mut page = vec![0u8; page_length];

        loop {
            if reader.read_exact(&mut page).is_err() {
                break;
            }

            let header = read_page_header(&page, self.endian(), self.format(), page_index)?;

            if header.is_data() {
                break;
            }
            if header.is_mix() {
                self.process_subheaders(&page, &header, page_index)?;
                self.finalize_mix_page_row_count(&header);
                break;
            }
            if header.is_meta()
                || header.is_amd()
                || header.is_metadata_continuation()
                || header.has_deleted_or_extended()
            {
                self.process_subheaders(&page, &header, page_index)?;
            }

            page_index += 1;
        }

        Ok(())
    }

    fn finalize_mix_page_row_count(&mut self, header: &PageHeader) {
        if self.metadata.mix_page_row_count != 0 {
            return;
        }
        let width = self.format().integer_width();
        let h = self.format().page_bit_offset() + 8 + header.subheader_count as usize * 3 * width;
        let h_aligned = align8(h);
        self.rows_region_end = Some(h_aligned);
        let data_area = self.metadata.page_length as usize - h_aligned.min(self.metadata.page_length as usize);
        self.metadata.mix_page_row_count = if self.metadata.row_length == 0 {
            0
        } else {
            (data_area as u64) / self.metadata.row_length
        };
    }

    fn process_subheaders(&mut self, page: &[u8], header: &PageHeader, page_index: u64) -> Result<()> {
        let descriptors = read_subheader_descriptors(page, self.endian(), self.format(), header, page_index)?;
        for descriptor in descriptors {
            if descriptor.is_skipped() {
                log::trace!(
                    "skipping zero-length or truncated subheader on page {page_index} at offset {}",
                    descriptor.offset
                );
                continue;
            }
            self.process_one(page, &descriptor, page_index)?;
        }
        Ok(())
    }

    fn process_one(
        &mut self,
        page: &[u8],
        descriptor: &SubheaderDescriptor,
        page_index: u64,
    ) -> Result<()> {
        let width = self.format().integer_width();
        let endian = self.endian();
        let bit64 = self.format() == Format::Bit64;
        let off = descriptor.offset as usize;
        let len = descriptor.length;

        let signature = page
            .get(off..off + width)
            .ok_or(Error::Truncation {
                section: Section::Page { index: page_index },
            })?;
        let kind = classify_signature(signature, self.format());
        let section = || Section::subheader(page_index, read_uint_at(endian, page, off, width, Section::Page { index: page_index }).unwrap_or(0));

        match kind {
            SubheaderKind::RowSize => {
                let lcs_off = off + if bit64 { 682 } else { 354 };
                let lcp_off = off + if bit64 { 706 } else { 378 };
                self.metadata.lcs = read_u16(endian, page.get(lcs_off..lcs_off + 2).ok_or(Error::Truncation { section: section() })?);
                self.metadata.lcp = read_u16(endian, page.get(lcp_off..lcp_off + 2).ok_or(Error::Truncation { section: section() })?);
                self.metadata.row_length = read_uint_at(endian, page, off + 5 * width, width, section())?;
                self.metadata.row_count = read_uint_at(endian, page, off + 6 * width, width, section())?;
                self.metadata.col_count_p1 = read_uint_at(endian, page, off + 9 * width, width, section())?;
                self.metadata.col_count_p2 = read_uint_at(endian, page, off + 10 * width, width, section())?;
                self.metadata.mix_page_row_count = read_uint_at(endian, page, off + 15 * width, width, section())?;
            }
            SubheaderKind::ColumnSize => {
                self.metadata.column_count = read_uint_at(endian, page, off + width, width, section())?;
            }
            SubheaderKind::ColumnText => {
                let block_len = u64::from(read_u16(
                    endian,
                    page.get(off + width..off + width + 2).ok_or(Error::Truncation { section: section() })?,
                ));
                let block = page
                    .get(off + width..off + width + block_len as usize)
                    .ok_or(Error::Truncation { section: section() })?;
                let pool_index = self.text_pool.push(block);

                if !self.first_column_text_seen {
                    self.first_column_text_seen = true;
                    self.metadata.compression = codec::detect(block);

                    let c = off + if bit64 { 20 } else { 16 };
                    let creator_proc_marker =
                        crate::parser::encoding::trim_trailing(page.get(c..c + 8).unwrap_or(&[]));
                    if creator_proc_marker.is_empty() {
                        self.metadata.lcs = 0;
                        self.metadata.creator_proc = self
                            .text_pool
                            .substring(pool_index as u64, (c - (off + width)) as u64 + 16, u64::from(self.metadata.lcp), self.codec());
                    } else if creator_proc_marker == b"SASYZCRL" {
                        self.metadata.creator_proc = self.text_pool.substring(
                            pool_index as u64,
                            (c - (off + width)) as u64 + 24,
                            u64::from(self.metadata.lcp),
                            self.codec(),
                        );
                    } else if self.metadata.lcs > 0 {
                        self.metadata.lcp = 0;
                        self.metadata.creator = self.text_pool.substring(
                            pool_index as u64,
                            (c - (off + width)) as u64,
                            u64::from(self.metadata.lcs),
                            self.codec(),
                        );
                    }
                }
                let _ = len;
            }
            SubheaderKind::ColumnName => {
                let mut entry_start = off + width + 8;
                let limit = (off + descriptor.length as usize).saturating_sub(12 + width);
                while entry_start <= limit {
                    let read16 = |o: usize| -> Result<u64> {
                        Ok(u64::from(read_u16(
                            endian,
                            page.get(o..o + 2).ok_or(Error::Truncation { section: section() })?,
                        )))
                    };
                    let idx = read16(entry_start)?;
                    let name_offset = read16(entry_start + 2)?;
                    let name_length = read16(entry_start + 4)?;
                    let name = self.text_pool.substring(idx, name_offset, name_length, self.codec());
                    self.names.push(name);
                    entry_start += 8;
                }
            }
            SubheaderKind::ColumnAttributes => {
                let mut entry_start = off + width + 8;
                let limit = (off + descriptor.length as usize).saturating_sub(12 + width);
                while entry_start <= limit {
                    let data_offset = read_uint_at(endian, page, entry_start, width, section())?;
                    let data_length = u64::from(read_uint_at(endian, page, entry_start + width, 4, section())? as u32);
                    let storage_type_byte = *page.get(entry_start + width + 6).ok_or(Error::Truncation { section: section() })?;
                    let storage = if storage_type_byte == 1 {
                        StorageKind::Number
                    } else {
                        StorageKind::String
                    };
                    self.fields.push(RawColumn {
                        offset: data_offset,
                        length: data_length,
                        storage,
                    });
                    entry_start += width + 8;
                }
            }
            SubheaderKind::FormatAndLabel => {
                let base = off + 3 * width;
                let read16 = |o: usize| -> Result<u64> {
                    Ok(u64::from(read_u16(endian, page.get(o..o + 2).ok_or(Error::Truncation { section: section() })?)))
                };
                let format_idx = read16(base + 22)?;
                let format_offset = read16(base + 24)?;
                let format_length = read16(base + 26)?;
                let label_idx = read16(base + 28)?;
                let label_offset = read16(base + 30)?;
                let label_length = read16(base + 32)?;
                self.formats.push(self.text_pool.substring(format_idx, format_offset, format_length, self.codec()));
                self.labels.push(self.text_pool.substring(label_idx, label_offset, label_length, self.codec()));
            }
            SubheaderKind::ColumnList | SubheaderKind::SubheaderCounts => {}
            SubheaderKind::Unknown => {
                log::trace!(
                    "unrecognized subheader signature on page {page_index} at offset {off}"
                );
            }
        }

        Ok(())
    }

    /// Assembles the final ordered `ColumnInfo` vector (§4.7.4).
    pub(crate) fn assemble_columns(self) -> Vec<ColumnInfo> {
        let column_count = self.metadata.column_count as usize;
        let mut columns = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let name = self
                .names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Column{}", i + 1));
            let label = self.labels.get(i).cloned().unwrap_or_default();
            let format = self.formats.get(i).cloned().unwrap_or_default();
            let field = self.fields.get(i).cloned().unwrap_or_default();
            let logical_type = infer_logical_type(field.storage, &format, field.length);
            columns.push(ColumnInfo {
                name,
                label,
                format,
                logical_type,
                offset: field.offset,
                length: field.length,
                index: i,
                storage: field.storage,
            });
        }
        columns
    }
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Unknown
    }
}

fn infer_logical_type(storage: StorageKind, format: &str, length: u64) -> LogicalType {
    infer_type(storage, format, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_size_signature_classifies_on_both_formats() {
        assert_eq!(
            classify_signature(&[0xF7, 0xF7, 0xF7, 0xF7, 0, 0, 0, 0], Format::Bit64),
            SubheaderKind::RowSize
        );
        assert_eq!(
            classify_signature(&[0xF7, 0xF7, 0xF7, 0xF7], Format::Bit32),
            SubheaderKind::RowSize
        );
    }

    #[test]
    fn unrecognized_signature_is_unknown() {
        assert_eq!(
            classify_signature(&[1, 2, 3, 4, 5, 6, 7, 8], Format::Bit64),
            SubheaderKind::Unknown
        );
    }

    #[test]
    fn amd_pages_have_their_subheaders_scanned() {
        use crate::metadata::{Endianness, Platform};
        use std::io::Cursor;

        const PAGE_LENGTH: usize = 256;
        let mut page = vec![0u8; PAGE_LENGTH];
        page[32..34].copy_from_slice(&0x0400u16.to_le_bytes()); // Amd page type
        page[34..36].copy_from_slice(&0u16.to_le_bytes()); // block_count (unused)
        page[36..38].copy_from_slice(&1u16.to_le_bytes()); // subheader_count

        // One subheader descriptor: ColumnSize at offset 200, length 16.
        page[40..48].copy_from_slice(&200u64.to_le_bytes());
        page[48..56].copy_from_slice(&16u64.to_le_bytes());
        page[56] = 0; // compression_flag
        page[57] = 0; // subtype_flag

        page[200..208].copy_from_slice(&[0xF6, 0xF6, 0xF6, 0xF6, 0, 0, 0, 0]);
        page[208..216].copy_from_slice(&7u64.to_le_bytes()); // column_count

        let metadata = FileMetadata {
            endian: Endianness::Little,
            format: Format::Bit64,
            platform: Platform::Unknown,
            encoding: encoding_rs::WINDOWS_1252,
            dataset_name: String::new(),
            file_type: String::new(),
            sas_release: String::new(),
            sas_server_type: String::new(),
            os_type: String::new(),
            os_name: String::new(),
            creator: String::new(),
            creator_proc: String::new(),
            date_created: None,
            date_modified: None,
            header_length: 0,
            page_length: PAGE_LENGTH as u64,
            page_count: 1,
            compression: Compression::None,
            row_length: 0,
            row_count: 0,
            mix_page_row_count: 0,
            column_count: 0,
            col_count_p1: 0,
            col_count_p2: 0,
            lcs: 0,
            lcp: 0,
        };

        let mut scan = MetadataScan::new(metadata);
        let mut cursor = Cursor::new(page);
        scan.scan(&mut cursor).unwrap();
        assert_eq!(scan.metadata.column_count, 7);
    }

    #[test]
    fn truncated_column_name_subheader_fails_cleanly_instead_of_panicking() {
        use crate::metadata::{Endianness, Platform};
        use std::io::Cursor;

        const PAGE_LENGTH: usize = 256;
        let mut page = vec![0u8; PAGE_LENGTH];
        page[32..34].copy_from_slice(&0x0000u16.to_le_bytes()); // Meta page type
        page[34..36].copy_from_slice(&0u16.to_le_bytes());
        page[36..38].copy_from_slice(&1u16.to_le_bytes()); // subheader_count

        // A ColumnName subheader whose declared length (4) is far shorter
        // than the 12 + integer_width entry-table overhead the handler
        // subtracts when computing its scan limit: previously `off + length
        // - 12 - width` underflowed `usize` and panicked.
        page[40..48].copy_from_slice(&200u64.to_le_bytes()); // descriptor offset
        page[48..56].copy_from_slice(&4u64.to_le_bytes()); // descriptor length
        page[56] = 0; // compression_flag
        page[57] = 0; // subtype_flag
        page[200..208].copy_from_slice(&[0xFF; 8]); // ColumnName signature

        let metadata = FileMetadata {
            endian: Endianness::Little,
            format: Format::Bit64,
            platform: Platform::Unknown,
            encoding: encoding_rs::WINDOWS_1252,
            dataset_name: String::new(),
            file_type: String::new(),
            sas_release: String::new(),
            sas_server_type: String::new(),
            os_type: String::new(),
            os_name: String::new(),
            creator: String::new(),
            creator_proc: String::new(),
            date_created: None,
            date_modified: None,
            header_length: 0,
            page_length: PAGE_LENGTH as u64,
            page_count: 1,
            compression: Compression::None,
            row_length: 0,
            row_count: 0,
            mix_page_row_count: 0,
            column_count: 0,
            col_count_p1: 0,
            col_count_p2: 0,
            lcs: 0,
            lcp: 0,
        };

        let mut scan = MetadataScan::new(metadata);
        let mut cursor = Cursor::new(page);
        scan.scan(&mut cursor).unwrap();
        assert!(scan.names.is_empty());
    }

    #[test]
    fn text_pool_substring_is_bounded_and_trimmed() {
        let mut pool = TextPool::default();
        let idx = pool.push(b"  hello world   ") as u64;
        let value = pool.substring(idx, 2, 5, encoding_rs::WINDOWS_1252);
        assert_eq!(value, "hello");
        assert_eq!(pool.substring(99, 0, 5, encoding_rs::WINDOWS_1252), "");
        assert_eq!(pool.substring(idx, 1000, 5, encoding_rs::WINDOWS_1252), "");
    }
}
