//! Row reader (§4.9): double-buffered page iteration with skip/limit/
//! projection, yielding decoded rows.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::error::{Error, Result};
use crate::metadata::{ColumnInfo, Compression, FileMetadata};
use crate::parser::page::{self, Page};
use crate::parser::projection::{self, Projection};
use crate::parser::subheader;
use crate::value::Row;

/// A lazy, forward-only, cancellable sequence of decoded rows over a single
/// independent handle (§4.9, §5).
pub struct RowReader<H: Read> {
    handle: H,
    metadata: Arc<FileMetadata>,
    columns: Arc<[ColumnInfo]>,
    projection: Projection,
    skip_rows: u64,
    max_rows: Option<u64>,
    cancellation: Option<CancellationToken>,
    buffers: [Vec<u8>; 2],
    current: usize,
    page_index: u64,
    file_rows_seen: u64,
    rows_returned: u64,
    pending: VecDeque<Vec<u8>>,
    finished: bool,
}

impl<H: Read> RowReader<H> {
    pub(crate) fn new(
        handle: H,
        metadata: Arc<FileMetadata>,
        columns: Arc<[ColumnInfo]>,
        projection: Projection,
        skip_rows: u64,
        max_rows: Option<u64>,
        cancellation: Option<CancellationToken>,
    ) -> Result<Self> {
        if let Some(token) = &cancellation
            && token.is_cancelled()
        {
            return Err(Error::Cancelled);
        }

        let page_length = metadata.page_length as usize;
        let mut reader = Self {
            handle,
            metadata,
            columns,
            projection,
            skip_rows,
            max_rows,
            cancellation,
            buffers: [vec![0u8; page_length], vec![0u8; page_length]],
            current: 0,
            page_index: 0,
            file_rows_seen: 0,
            rows_returned: 0,
            pending: VecDeque::new(),
            finished: page_length == 0,
        };
        if !reader.finished {
            match reader.load_next_page() {
                Ok(true) => {}
                Ok(false) => reader.finished = true,
                Err(err) => return Err(err),
            }
        }
        Ok(reader)
    }

    fn load_next_page(&mut self) -> Result<bool> {
        let spare = 1 - self.current;
        let page_length = self.metadata.page_length as usize;
        self.buffers[spare].resize(page_length, 0);
        let bytes_read = read_fully(&mut self.handle, &mut self.buffers[spare])?;
        if bytes_read < page_length {
            return Ok(false);
        }
        self.current = spare;
        self.populate_pending_from_current_page()?;
        self.page_index += 1;

        if let Some(token) = &self.cancellation
            && token.is_cancelled()
        {
            return Err(Error::Cancelled);
        }
        Ok(true)
    }

    fn populate_pending_from_current_page(&mut self) -> Result<()> {
        let endian = self.metadata.endian;
        let format = self.metadata.format;
        let compression = self.metadata.compression;
        let file_compressed = !matches!(compression, Compression::None);
        let row_length = self.metadata.row_length;
        let row_count = self.metadata.row_count;
        let mix_page_row_count = self.metadata.mix_page_row_count;
        let rows_already_emitted = self.file_rows_seen;
        let page_index = self.page_index;
        let buffer = &self.buffers[self.current];

        let page = page::classify_page(
            buffer,
            endian,
            format,
            compression,
            file_compressed,
            row_length,
            row_count,
            mix_page_row_count,
            rows_already_emitted,
            page_index,
        )?;

        let rows: Vec<Vec<u8>> = match &page {
            Page::Meta { .. } => {
                page.meta_row_slices(|sig| subheader::is_known_metadata_signature(sig, format))?
            }
            Page::Data { .. } | Page::Mix { .. } => page
                .data_row_slices()
                .into_iter()
                .map(<[u8]>::to_vec)
                .collect(),
            Page::Unknown => Vec::new(),
        };
        self.pending.extend(rows);
        Ok(())
    }
}

fn read_fully<H: Read>(handle: &mut H, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match handle.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

impl<H: Read> Iterator for RowReader<H> {
    type Item = Result<Row<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(token) = &self.cancellation
            && token.is_cancelled()
        {
            self.finished = true;
            return Some(Err(Error::Cancelled));
        }

        loop {
            if let Some(row) = self.pending.pop_front() {
                if self.file_rows_seen >= self.metadata.row_count {
                    self.finished = true;
                    return None;
                }
                self.file_rows_seen += 1;

                if self.skip_rows > 0 {
                    self.skip_rows -= 1;
                    continue;
                }
                if let Some(max) = self.max_rows
                    && self.rows_returned >= max
                {
                    self.finished = true;
                    return None;
                }
                self.rows_returned += 1;

                let result = projection::project_row(
                    &row,
                    &self.columns,
                    &self.projection,
                    self.metadata.encoding,
                    self.metadata.endian,
                );
                if result.is_err() {
                    self.finished = true;
                }
                return Some(result);
            }

            match self.load_next_page() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
