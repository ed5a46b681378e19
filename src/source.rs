//! `DataSource` (§4.9, §5): gives every row iteration its own sequentially
//! scanning handle and seek position, rather than sharing one.
//!
//! Cloning a `std::fs::File` handle (`try_clone`) shares the underlying OS
//! file offset on Unix, which would break the "each iteration sees the same
//! deterministic sequence independently" guarantee (§5, "Multi-reader
//! safety", §8 property 3). Re-opening the path, or cloning an `Arc<[u8]>`
//! backing buffer, gives each iteration a genuinely independent handle.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Something that can hand out fresh, independently-positioned read handles.
pub trait DataSource {
    type Handle: Read;

    /// Opens a brand-new handle positioned at the start of the underlying
    /// byte stream.
    fn open_handle(&self) -> io::Result<Self::Handle>;
}

impl DataSource for PathBuf {
    type Handle = File;

    fn open_handle(&self) -> io::Result<File> {
        File::open(self)
    }
}

impl DataSource for &Path {
    type Handle = File;

    fn open_handle(&self) -> io::Result<File> {
        File::open(self)
    }
}

/// An in-memory byte buffer shared cheaply across iterations.
#[derive(Debug, Clone)]
pub struct MemorySource(Arc<[u8]>);

impl MemorySource {
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

impl DataSource for MemorySource {
    type Handle = Cursor<Arc<[u8]>>;

    fn open_handle(&self) -> io::Result<Self::Handle> {
        Ok(Cursor::new(Arc::clone(&self.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn memory_source_handles_are_independent() {
        let source = MemorySource::new(vec![1u8, 2, 3, 4]);
        let mut a = source.open_handle().unwrap();
        let mut b = source.open_handle().unwrap();
        let mut first_byte = [0u8; 1];
        a.read_exact(&mut first_byte).unwrap();
        assert_eq!(first_byte, [1]);

        let mut whole = Vec::new();
        b.read_to_end(&mut whole).unwrap();
        assert_eq!(whole, vec![1, 2, 3, 4]);
    }
}
