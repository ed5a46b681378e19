use time::OffsetDateTime;

use crate::value::LogicalType;

/// Byte order in which every multi-byte integer and float in the file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Format width: governs the integer width used for every in-page offset,
/// length, and count, and the byte offset of the page-header triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bit32,
    Bit64,
}

impl Format {
    #[must_use]
    pub const fn integer_width(self) -> usize {
        match self {
            Self::Bit32 => 4,
            Self::Bit64 => 8,
        }
    }

    #[must_use]
    pub const fn page_bit_offset(self) -> usize {
        match self {
            Self::Bit32 => 16,
            Self::Bit64 => 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Rle,
    Rdc,
}

/// File-level metadata, built once at open and immutable afterward.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub endian: Endianness,
    pub format: Format,
    pub platform: Platform,
    pub encoding: &'static encoding_rs::Encoding,
    pub dataset_name: String,
    pub file_type: String,
    pub sas_release: String,
    pub sas_server_type: String,
    pub os_type: String,
    pub os_name: String,
    pub creator: String,
    pub creator_proc: String,
    pub date_created: Option<OffsetDateTime>,
    pub date_modified: Option<OffsetDateTime>,
    pub header_length: u64,
    pub page_length: u64,
    pub page_count: u64,
    pub compression: Compression,
    pub row_length: u64,
    pub row_count: u64,
    pub mix_page_row_count: u64,
    pub(crate) column_count: u64,
    pub(crate) col_count_p1: u64,
    pub(crate) col_count_p2: u64,
    pub(crate) lcs: u16,
    pub(crate) lcp: u16,
}

/// One column's schema, ordered by column index.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub label: String,
    pub format: String,
    pub logical_type: LogicalType,
    pub offset: u64,
    pub length: u64,
    pub index: usize,
    pub(crate) storage: StorageKind,
}

/// Raw on-disk storage kind for a column, prior to type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Number,
    String,
    Unknown,
}
