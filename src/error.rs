use std::borrow::Cow;
use std::fmt;
use std::io;

/// Result type used across the reader implementation.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced by the reader. Variants are kinds, not file-specific
/// messages: every corrupt-input failure carries a `Section` describing where
/// in the file it was encountered.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure, including the open-time "file not found" precondition.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The first 32 bytes did not match the fixed magic constant.
    #[error("bad magic number: not a SAS7BDAT file")]
    BadMagic,

    /// A read returned fewer bytes than the format requires at this point.
    #[error("truncated SAS file while reading {section}")]
    Truncation { section: Section },

    /// A decompression command was malformed or otherwise violated the codec's contract.
    #[error("malformed compressed data in {section}: {details}")]
    BadCodec {
        section: Section,
        details: Cow<'static, str>,
    },

    /// A numeric cell's width fell outside the supported set, or a field decoder
    /// was asked to interpret bytes it cannot represent.
    #[error("invalid field in {section}: {details}")]
    BadField {
        section: Section,
        details: Cow<'static, str>,
    },

    /// Cooperative cancellation was requested during iteration.
    #[error("iteration cancelled")]
    Cancelled,
}

/// Logical section of the file being decoded, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Header,
    HeaderExtension,
    Page { index: u64 },
    Subheader { page_index: u64, signature: u64 },
    Row { index: u64 },
    Column { index: u32 },
    Decompression { page_index: u64 },
    Encoding,
}

impl Section {
    #[must_use]
    pub const fn subheader(page_index: u64, signature: u64) -> Self {
        Self::Subheader {
            page_index,
            signature,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "file header"),
            Self::HeaderExtension => write!(f, "header extension"),
            Self::Page { index } => write!(f, "page {index}"),
            Self::Subheader {
                page_index,
                signature,
            } => write!(
                f,
                "subheader signature 0x{signature:X} on page {page_index}"
            ),
            Self::Row { index } => write!(f, "row {index}"),
            Self::Column { index } => write!(f, "column {index}"),
            Self::Decompression { page_index } => {
                write!(f, "page {page_index} during decompression")
            }
            Self::Encoding => write!(f, "character encoding conversion"),
        }
    }
}
