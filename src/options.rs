//! Reader configuration (§6.2).

use std::collections::HashSet;

/// Options accepted by [`crate::reader::SasReader::read_rows`] and
/// [`crate::reader::SasReader::read_records`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub(crate) selected_column_names: Option<HashSet<String>>,
    pub(crate) selected_column_indices: Option<HashSet<usize>>,
    pub(crate) skip_rows: u64,
    pub(crate) max_rows: Option<u64>,
    pub(crate) file_buffer_size: Option<usize>,
}

impl ReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects columns by name. Overridden by `selected_column_indices` if
    /// both are set (§6.2).
    #[must_use]
    pub fn with_column_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.selected_column_names = Some(names.into_iter().collect());
        self
    }

    /// Selects columns by index. Wins over `selected_column_names` if both
    /// are set (§6.2).
    #[must_use]
    pub fn with_column_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.selected_column_indices = Some(indices.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn with_skip_rows(mut self, skip_rows: u64) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    #[must_use]
    pub const fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    #[must_use]
    pub const fn with_file_buffer_size(mut self, bytes: usize) -> Self {
        self.file_buffer_size = Some(bytes);
        self
    }
}
