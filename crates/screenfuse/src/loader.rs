//! Loading the source and review tables of a job.

use std::path::Path;

use tracing::{debug, info};

use crate::accumulate::{both, collect_all};
use crate::error::{Errors, Outcome, ScreenError};
use crate::paths::ResolvedFiles;
use crate::table::{Table, TableSource};

/// One reviewer's decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedTable {
    /// Reviewer identifier.
    pub reviewer: String,
    /// The reviewer's copy of the records with their decisions.
    pub table: Table,
}

impl ReviewedTable {
    /// Pair a reviewer with a table.
    pub fn new(reviewer: impl Into<String>, table: Table) -> Self {
        Self {
            reviewer: reviewer.into(),
            table,
        }
    }
}

/// Every table of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Source records.
    pub source: Table,
    /// Review tables in declaration order.
    pub reviews: Vec<ReviewedTable>,
}

impl Dataset {
    /// Create a dataset.
    pub fn new(source: Table, reviews: Vec<ReviewedTable>) -> Self {
        Self { source, reviews }
    }

    /// Reviewer identifiers with a loaded table, in order.
    pub fn reviewers(&self) -> Vec<&str> {
        self.reviews.iter().map(|r| r.reviewer.as_str()).collect()
    }
}

/// Loads tables through a [`TableSource`].
pub struct DatasetLoader<S> {
    source: S,
}

impl<S: TableSource> DatasetLoader<S> {
    /// Create a loader over a tabular backend.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Load the source and every review table.
    ///
    /// Every load is attempted; all failures are reported together.
    pub fn load(&self, files: &ResolvedFiles, sheet: &str) -> Outcome<Dataset> {
        let source = self.load_one("source", files.source.path(), sheet);

        let reviews = collect_all(files.reviews.iter().map(|(reviewer, resolved)| {
            self.load_one(&format!("review {}", reviewer), resolved.path(), sheet)
                .map(|table| ReviewedTable::new(reviewer.clone(), table))
        }));

        let (source, reviews) = both(source, reviews)?;
        info!(
            records = source.row_count(),
            reviews = reviews.len(),
            "Loaded tables"
        );
        Ok(Dataset::new(source, reviews))
    }

    fn load_one(&self, owner: &str, path: &Path, sheet: &str) -> Outcome<Table> {
        debug!(owner, path = %path.display(), sheet, "Loading sheet");
        self.source.parse_sheet(path, sheet).map_err(|e| {
            Errors::one(ScreenError::SheetLoadFailure {
                owner: owner.to_string(),
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
                message: e.to_string(),
            })
        })
    }
}
