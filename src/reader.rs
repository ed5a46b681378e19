//! Public reader surface (§6.3): `open`/`metadata`/`columns`/`read_rows`/
//! `read_records`/`close`.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::metadata::{ColumnInfo, FileMetadata};
use crate::options::ReadOptions;
use crate::parser::header::parse_header;
use crate::parser::projection::Projection;
use crate::parser::row::RowReader;
use crate::parser::subheader::MetadataScan;
use crate::source::{DataSource, MemorySource};
use crate::value::Value;

/// An open SAS7BDAT dataset: immutable metadata and column schema, plus the
/// ability to spawn independent, cancellable row iterations (§5, §6.3).
pub struct SasReader<S: DataSource> {
    source: S,
    metadata: Arc<FileMetadata>,
    columns: Arc<[ColumnInfo]>,
}

impl SasReader<PathBuf> {
    /// Opens a SAS7BDAT file from disk, parsing its header and metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, the magic is wrong, or
    /// the header/metadata pages are truncated or malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_source(path.as_ref().to_path_buf())
    }
}

impl SasReader<MemorySource> {
    /// Opens a SAS7BDAT dataset already resident in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the header/metadata pages are truncated or
    /// malformed.
    pub fn open_in_memory(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::from_source(MemorySource::new(bytes))
    }
}

impl<S: DataSource> SasReader<S> {
    /// Builds a reader from any [`DataSource`], parsing header and metadata
    /// through a freshly opened handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be opened or metadata parsing
    /// fails.
    pub fn from_source(source: S) -> Result<Self> {
        let mut handle = source.open_handle()?;
        let metadata = parse_header(&mut handle)?;
        let mut scan = MetadataScan::new(metadata);
        scan.scan(&mut handle)?;
        let metadata = scan.metadata.clone();
        let columns = scan.assemble_columns();
        Ok(Self {
            source,
            metadata: Arc::new(metadata),
            columns: columns.into(),
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Opens a fresh, independent row iteration (§5 "Multi-reader safety").
    ///
    /// # Errors
    ///
    /// Returns an error if a new handle cannot be opened or positioned past
    /// the header.
    pub fn read_rows(&self, options: &ReadOptions) -> Result<RowReader<BufReader<S::Handle>>> {
        self.read_rows_cancellable(options, None)
    }

    /// Like [`Self::read_rows`], but the returned iteration can be cancelled
    /// cooperatively through the given token.
    ///
    /// # Errors
    ///
    /// Returns an error if a new handle cannot be opened or positioned past
    /// the header.
    pub fn read_rows_cancellable(
        &self,
        options: &ReadOptions,
        cancellation: Option<CancellationToken>,
    ) -> Result<RowReader<BufReader<S::Handle>>> {
        let mut handle = self.source.open_handle()?;
        skip_header(&mut handle, self.metadata.header_length)?;
        let buffer_size = options
            .file_buffer_size
            .unwrap_or_else(|| default_buffer_size(self.metadata.page_length));
        let buffered = BufReader::with_capacity(buffer_size, handle);
        let projection = Projection::resolve(options, &self.columns);
        RowReader::new(
            buffered,
            Arc::clone(&self.metadata),
            Arc::clone(&self.columns),
            projection,
            options.skip_rows,
            options.max_rows,
            cancellation,
        )
    }

    /// Maps every row through `transform`, per §6.3.
    ///
    /// # Errors
    ///
    /// Returns an error if a new handle cannot be opened or row decoding
    /// fails partway through.
    pub fn read_records<T>(
        &self,
        options: &ReadOptions,
        mut transform: impl FnMut(&[Value<'static>]) -> T,
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for row in self.read_rows(options)? {
            out.push(transform(row?.as_slice()));
        }
        Ok(out)
    }

    /// Releases the reader. Dropping it has the same effect; this exists so
    /// callers can make the release explicit (§6.3).
    pub fn close(self) {
        drop(self);
    }
}

fn default_buffer_size(page_length: u64) -> usize {
    let system_page = 4096usize;
    (2 * page_length as usize).max(system_page)
}

fn skip_header<H: Read>(handle: &mut H, header_length: u64) -> Result<()> {
    let mut remaining = header_length as usize;
    let mut scratch = [0u8; 4096];
    while remaining > 0 {
        let take = remaining.min(scratch.len());
        handle.read_exact(&mut scratch[..take])?;
        remaining -= take;
    }
    Ok(())
}
