//! A streaming reader for the SAS7BDAT binary file format.
//!
//! [`SasReader::open`] parses a file's header and metadata once; each call to
//! [`SasReader::read_rows`] then yields an independent, cancellable,
//! forward-only sequence of decoded [`Value`] rows.

pub mod cancellation;
pub mod error;
pub mod metadata;
pub mod options;
pub mod parser;
pub mod reader;
pub mod source;
pub mod value;

pub use cancellation::CancellationToken;
pub use error::{Error, Result};
pub use metadata::{ColumnInfo, Compression, Endianness, FileMetadata, Format, Platform};
pub use options::ReadOptions;
pub use reader::SasReader;
pub use source::{DataSource, MemorySource};
pub use value::{LogicalType, Row, Value};
