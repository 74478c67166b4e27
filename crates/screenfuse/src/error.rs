//! Error types for the screenfuse library.
//!
//! Every failure a run can report is a [`ScreenError`]. Stages never stop at
//! the first one: they collect them into an [`Errors`] list, which is always
//! non-empty and keeps the order in which problems were found.

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A single problem found while loading, validating, fusing or writing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    /// The job description could not be parsed or is missing required keys.
    #[error("Malformed configuration '{origin}': {message}")]
    MalformedConfiguration { origin: String, message: String },

    /// A required file does not exist or is not a regular file.
    #[error("File not found for {role}: '{path}'")]
    FileNotFound { role: String, path: PathBuf },

    /// The tabular backend could not produce the requested sheet.
    #[error("Could not load sheet '{sheet}' for {owner} from '{path}': {message}")]
    SheetLoadFailure {
        owner: String,
        path: PathBuf,
        sheet: String,
        message: String,
    },

    /// A review table does not have as many records as the source.
    #[error("Mismatching number of rows for review {reviewer}: source has {expected}, review has {found}")]
    RowCountMismatch {
        reviewer: String,
        expected: usize,
        found: usize,
    },

    /// A review table's header differs from the source header (order matters).
    #[error("Mismatching header for review {reviewer}: expected [{}], found [{}]", .expected.join(", "), .found.join(", "))]
    HeaderMismatch {
        reviewer: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A review table names a reviewer that was not declared.
    #[error("Review {reviewer} names undeclared reviewer '{value}' in column '{column}' (rows {})", format_rows(.rows))]
    UnknownReviewerIdentity {
        reviewer: String,
        column: String,
        value: String,
        rows: Vec<usize>,
    },

    /// A declared reviewer has no loaded review table.
    #[error("No review table submitted for declared reviewer {reviewer}")]
    MissingReviewerSubmission { reviewer: String },

    /// A column required by the configuration is absent from a table.
    #[error("Column '{column}' is missing from the {table} table")]
    MissingColumn { table: String, column: String },

    /// The index column holds the same value twice within one table.
    #[error("Duplicate index value '{value}' in the {table} table (rows {first_row} and {second_row})")]
    DuplicateIndexValue {
        table: String,
        value: String,
        first_row: usize,
        second_row: usize,
    },

    /// A review table lists a different record than the source at the same row.
    #[error("Index mismatch for review {reviewer} at row {row}: source has '{expected}', review has '{found}'")]
    IndexMismatch {
        reviewer: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// The fused table could not be written.
    #[error("Could not write '{path}': {message}")]
    WriteFailure { path: PathBuf, message: String },
}

/// Discriminant of a [`ScreenError`], useful for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedConfiguration,
    FileNotFound,
    SheetLoadFailure,
    RowCountMismatch,
    HeaderMismatch,
    UnknownReviewerIdentity,
    MissingReviewerSubmission,
    MissingColumn,
    DuplicateIndexValue,
    IndexMismatch,
    WriteFailure,
}

impl ErrorKind {
    /// Get a human-readable label for the error kind.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::MalformedConfiguration => "Malformed Configuration",
            ErrorKind::FileNotFound => "File Not Found",
            ErrorKind::SheetLoadFailure => "Sheet Load Failure",
            ErrorKind::RowCountMismatch => "Row Count Mismatch",
            ErrorKind::HeaderMismatch => "Header Mismatch",
            ErrorKind::UnknownReviewerIdentity => "Unknown Reviewer Identity",
            ErrorKind::MissingReviewerSubmission => "Missing Reviewer Submission",
            ErrorKind::MissingColumn => "Missing Column",
            ErrorKind::DuplicateIndexValue => "Duplicate Index Value",
            ErrorKind::IndexMismatch => "Index Mismatch",
            ErrorKind::WriteFailure => "Write Failure",
        }
    }
}

impl ScreenError {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScreenError::MalformedConfiguration { .. } => ErrorKind::MalformedConfiguration,
            ScreenError::FileNotFound { .. } => ErrorKind::FileNotFound,
            ScreenError::SheetLoadFailure { .. } => ErrorKind::SheetLoadFailure,
            ScreenError::RowCountMismatch { .. } => ErrorKind::RowCountMismatch,
            ScreenError::HeaderMismatch { .. } => ErrorKind::HeaderMismatch,
            ScreenError::UnknownReviewerIdentity { .. } => ErrorKind::UnknownReviewerIdentity,
            ScreenError::MissingReviewerSubmission { .. } => ErrorKind::MissingReviewerSubmission,
            ScreenError::MissingColumn { .. } => ErrorKind::MissingColumn,
            ScreenError::DuplicateIndexValue { .. } => ErrorKind::DuplicateIndexValue,
            ScreenError::IndexMismatch { .. } => ErrorKind::IndexMismatch,
            ScreenError::WriteFailure { .. } => ErrorKind::WriteFailure,
        }
    }
}

fn format_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A non-empty, ordered list of errors reported by one stage or one run.
///
/// Dereferences to a slice, so `len`, `iter` and indexing work directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors(Vec<ScreenError>);

impl Errors {
    /// Create a list holding a single error.
    pub fn one(error: ScreenError) -> Self {
        Self(vec![error])
    }

    /// Create a list from collected errors, or `None` if nothing was collected.
    pub fn from_vec(errors: Vec<ScreenError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// Append every error of `other` after the errors already held.
    pub fn extend(&mut self, other: Errors) {
        self.0.extend(other.0);
    }

    /// Human-readable messages, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }

    /// Number of errors of the given kind.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.0.iter().filter(|e| e.kind() == kind).count()
    }
}

impl Deref for Errors {
    type Target = [ScreenError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ScreenError> for Errors {
    fn from(error: ScreenError) -> Self {
        Self::one(error)
    }
}

impl IntoIterator for Errors {
    type Item = ScreenError;
    type IntoIter = std::vec::IntoIter<ScreenError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ScreenError;
    type IntoIter = std::slice::Iter<'a, ScreenError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// Outcome of a fallible stage: a value, or every error the stage found.
pub type Outcome<T> = std::result::Result<T, Errors>;

/// Error raised by a tabular backend while reading or writing a sheet.
#[derive(Debug, Error)]
pub enum TableError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Records whose field count differs from the header. Each entry is a
    /// 1-based record number and the number of fields it holds.
    #[error("{} record(s) do not match the {expected} header columns: {}", .rows.len(), format_ragged(.rows))]
    RaggedRows {
        expected: usize,
        rows: Vec<(usize, usize)>,
    },
}

fn format_ragged(rows: &[(usize, usize)]) -> String {
    rows.iter()
        .map(|(row, fields)| format!("row {} has {}", row, fields))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_display_one_per_line() {
        let mut errors = Errors::one(ScreenError::MissingReviewerSubmission {
            reviewer: "alice".to_string(),
        });
        errors.extend(Errors::one(ScreenError::RowCountMismatch {
            reviewer: "bob".to_string(),
            expected: 3,
            found: 2,
        }));

        let text = errors.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("alice"));
        assert!(lines[1].contains("bob"));
        assert!(lines[1].contains('3') && lines[1].contains('2'));
    }

    #[test]
    fn test_from_vec_rejects_empty() {
        assert!(Errors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_count_by_kind() {
        let errors = Errors::from_vec(vec![
            ScreenError::FileNotFound {
                role: "review a".to_string(),
                path: PathBuf::from("p_a.csv"),
            },
            ScreenError::FileNotFound {
                role: "review b".to_string(),
                path: PathBuf::from("p_b.csv"),
            },
            ScreenError::MissingReviewerSubmission {
                reviewer: "c".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(errors.count(ErrorKind::FileNotFound), 2);
        assert_eq!(errors.count(ErrorKind::MissingReviewerSubmission), 1);
        assert_eq!(errors.count(ErrorKind::WriteFailure), 0);
    }

    #[test]
    fn test_ragged_rows_message_lists_every_row() {
        let error = TableError::RaggedRows {
            expected: 3,
            rows: vec![(1, 4), (5, 2)],
        };
        let message = error.to_string();
        assert!(message.starts_with("2 record(s) do not match the 3 header columns"));
        assert!(message.contains("row 1 has 4"));
        assert!(message.contains("row 5 has 2"));
    }

    #[test]
    fn test_header_mismatch_message_lists_columns() {
        let error = ScreenError::HeaderMismatch {
            reviewer: "alice".to_string(),
            expected: vec!["B".to_string(), "A".to_string()],
            found: vec!["A".to_string(), "B".to_string()],
        };
        let message = error.to_string();
        assert!(message.contains("alice"));
        assert!(message.contains("[B, A]"));
        assert!(message.contains("[A, B]"));
    }
}
