//! Delimited-text backend (CSV/TSV) with delimiter detection.
//!
//! A delimited file holds exactly one sheet, so the requested sheet name is
//! recorded in the table's metadata but does not select anything. Every
//! record must have exactly as many fields as the header; ragged records are
//! reported, never padded or cut.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TableError;

use super::data::Table;
use super::metadata::SourceMetadata;
use super::{TableSink, TableSource};

/// Delimiters to try when auto-detecting, in order of preference on ties.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Number of leading lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 10;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    /// Delimiter to use when reading (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
        }
    }
}

/// How a candidate delimiter splits the sampled lines. Consistency ranks
/// above width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Split {
    consistent: bool,
    width: usize,
}

/// Reads and writes delimited text files.
#[derive(Debug, Clone, Default)]
pub struct DelimitedBackend {
    config: DelimitedConfig,
}

impl DelimitedBackend {
    /// Create a backend with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with custom configuration.
    pub fn with_config(config: DelimitedConfig) -> Self {
        Self { config }
    }

    /// Parse in-memory delimited text.
    pub fn parse_slice(&self, bytes: &[u8]) -> Result<Table, TableError> {
        let delimiter = self.delimiter_for(bytes)?;
        self.parse_bytes(bytes, delimiter)
    }

    fn delimiter_for(&self, bytes: &[u8]) -> Result<u8, TableError> {
        match self.config.delimiter {
            Some(d) => Ok(d),
            None => self.detect_delimiter(bytes),
        }
    }

    fn reader<'b>(&self, delimiter: u8, has_headers: bool, bytes: &'b [u8]) -> csv::Reader<&'b [u8]> {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes)
    }

    /// Parse bytes with a known delimiter.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Table, TableError> {
        let mut reader = self.reader(delimiter, true, bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(TableError::EmptyData("No columns found".to_string()));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        let mut ragged = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() == width {
                rows.push(record.iter().map(String::from).collect());
            } else {
                ragged.push((i + 1, record.len()));
            }
        }

        if !ragged.is_empty() {
            return Err(TableError::RaggedRows {
                expected: width,
                rows: ragged,
            });
        }
        Ok(Table::new(headers, rows))
    }

    /// Pick the candidate that splits the sampled lines into the widest
    /// consistent table. Single-column text falls back to a comma.
    fn detect_delimiter(&self, bytes: &[u8]) -> Result<u8, TableError> {
        let sample = leading_lines(bytes, SAMPLE_LINES);
        if sample.iter().all(u8::is_ascii_whitespace) {
            return Err(TableError::EmptyData("No lines to analyze".to_string()));
        }

        let mut best: Option<(Split, u8)> = None;
        for &delimiter in DELIMITERS {
            let Some(split) = self.split_sample(sample, delimiter) else {
                continue;
            };
            if best.is_none_or(|(current, _)| split > current) {
                best = Some((split, delimiter));
            }
        }

        Ok(best.map_or(b',', |(_, delimiter)| delimiter))
    }

    /// Field counts come from the csv reader itself, so quoted delimiters
    /// never count.
    fn split_sample(&self, sample: &[u8], delimiter: u8) -> Option<Split> {
        let widths: Vec<usize> = self
            .reader(delimiter, false, sample)
            .records()
            .map_while(Result::ok)
            .map(|record| record.len())
            .collect();

        let width = *widths.first()?;
        (width > 1).then(|| Split {
            consistent: widths.iter().all(|&w| w == width),
            width,
        })
    }

    fn write_staged(&self, table: &Table, delimiter: u8, staging: &Path) -> Result<(), TableError> {
        let io_error = |e: std::io::Error| TableError::Io {
            path: staging.to_path_buf(),
            source: e,
        };

        let file = File::create(staging).map_err(io_error)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .from_writer(BufWriter::new(file));

        writer.write_record(table.headers())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }

        writer.flush().map_err(io_error)?;
        let file = writer
            .into_inner()
            .map_err(|e| io_error(std::io::Error::other(e.to_string())))?
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?;
        file.sync_all().map_err(io_error)
    }
}

impl TableSource for DelimitedBackend {
    fn parse_sheet(&self, path: &Path, sheet: &str) -> Result<Table, TableError> {
        let contents = fs::read(path).map_err(|e| TableError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let delimiter = self.delimiter_for(&contents)?;
        let table = self.parse_bytes(&contents, delimiter)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            &contents,
            format_name(delimiter).to_string(),
            sheet.to_string(),
            table.row_count(),
            table.column_count(),
        );
        debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            format = %metadata.format,
            "Parsed delimited sheet"
        );

        Ok(table.with_metadata(metadata))
    }
}

impl TableSink for DelimitedBackend {
    /// The table is written to a hidden sibling first and renamed over
    /// `path` only once complete, so a failed write never leaves a partial
    /// target behind.
    fn write_sheet(&self, table: &Table, path: &Path, sheet: &str) -> Result<(), TableError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| TableError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let staging = staging_path(path);
        let written = self
            .write_staged(table, delimiter_for_path(path), &staging)
            .and_then(|()| {
                fs::rename(&staging, path).map_err(|e| TableError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            });
        if written.is_err() {
            let _ = fs::remove_file(&staging);
        }
        written?;

        debug!(path = %path.display(), sheet, rows = table.row_count(), "Wrote delimited sheet");
        Ok(())
    }
}

/// Name of the format implied by a delimiter.
fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Delimiter to write for a file extension.
pub fn delimiter_for_path(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
        Some(ext) if ext.eq_ignore_ascii_case("psv") => b'|',
        _ => b',',
    }
}

/// Hidden sibling a sheet is staged in before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "sheet".to_string(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{}.tmp", name))
}

/// The first `lines` lines of `bytes`, newline included.
fn leading_lines(bytes: &[u8], lines: usize) -> &[u8] {
    let end = bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .nth(lines.saturating_sub(1))
        .map_or(bytes.len(), |(i, _)| i + 1);
    &bytes[..end]
}
