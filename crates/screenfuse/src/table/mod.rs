//! Tabular data: the in-memory table and the backends that read and write it.
//!
//! The pipeline only talks to backends through [`TableSource`] and
//! [`TableSink`]; [`DelimitedBackend`] is the stock implementation.

mod data;
mod delimited;
mod metadata;

pub use data::Table;
pub use delimited::{delimiter_for_path, DelimitedBackend, DelimitedConfig};
pub use metadata::{content_hash, SourceMetadata};

use std::path::Path;

use crate::error::TableError;

/// Reads one sheet of a tabular file.
pub trait TableSource {
    /// Parse the sheet `sheet` of the file at `path`.
    fn parse_sheet(&self, path: &Path, sheet: &str) -> Result<Table, TableError>;
}

/// Writes a table as one sheet of a tabular file.
pub trait TableSink {
    /// Write `table` as sheet `sheet` of the file at `path`, replacing it.
    fn write_sheet(&self, table: &Table, path: &Path, sheet: &str) -> Result<(), TableError>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn parse_sheet(&self, path: &Path, sheet: &str) -> Result<Table, TableError> {
        (**self).parse_sheet(path, sheet)
    }
}

impl<T: TableSink + ?Sized> TableSink for &T {
    fn write_sheet(&self, table: &Table, path: &Path, sheet: &str) -> Result<(), TableError> {
        (**self).write_sheet(table, path, sheet)
    }
}
