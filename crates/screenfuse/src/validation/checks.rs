//! Individual consistency checks.
//!
//! Each check returns the errors it found, never stopping early, so the
//! validator can run all of them for every review.

use indexmap::IndexMap;

use crate::config::Configuration;
use crate::error::ScreenError;
use crate::loader::ReviewedTable;
use crate::table::Table;

/// The source must carry the index column and every decision column.
pub fn check_required_columns(source: &Table, config: &Configuration) -> Vec<ScreenError> {
    std::iter::once(&config.index)
        .chain(config.decisions.iter())
        .filter(|column| !source.has_column(column))
        .map(|column| ScreenError::MissingColumn {
            table: "source".to_string(),
            column: column.clone(),
        })
        .collect()
}

/// A review must have exactly as many rows as the source.
pub fn check_row_count(source: &Table, review: &ReviewedTable) -> Vec<ScreenError> {
    if review.table.row_count() == source.row_count() {
        Vec::new()
    } else {
        vec![ScreenError::RowCountMismatch {
            reviewer: review.reviewer.clone(),
            expected: source.row_count(),
            found: review.table.row_count(),
        }]
    }
}

/// A review's header must equal the source header, order included.
pub fn check_header(source: &Table, review: &ReviewedTable) -> Vec<ScreenError> {
    if review.table.headers() == source.headers() {
        Vec::new()
    } else {
        vec![ScreenError::HeaderMismatch {
            reviewer: review.reviewer.clone(),
            expected: source.headers().to_vec(),
            found: review.table.headers().to_vec(),
        }]
    }
}

/// Every reviewer named in a review's reviewer column must be declared.
///
/// One error per distinct unknown name, listing the 1-based data rows it
/// appears on. Blank and NA-like cells are ignored.
pub fn check_known_reviewers(review: &ReviewedTable, config: &Configuration) -> Vec<ScreenError> {
    let Some(column) = review.table.column_index(&config.reviewer_column) else {
        return Vec::new();
    };

    let mut unknown: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (row, value) in review.table.column_values(column).enumerate() {
        let name = value.trim();
        if Table::is_null_value(name) || config.is_declared(name) {
            continue;
        }
        unknown.entry(name).or_default().push(row + 1);
    }

    unknown
        .into_iter()
        .map(|(value, rows)| ScreenError::UnknownReviewerIdentity {
            reviewer: review.reviewer.clone(),
            column: config.reviewer_column.clone(),
            value: value.to_string(),
            rows,
        })
        .collect()
}

/// Every declared reviewer must have a loaded review table.
pub fn check_submissions(reviews: &[ReviewedTable], config: &Configuration) -> Vec<ScreenError> {
    config
        .reviewers
        .iter()
        .filter(|declared| !reviews.iter().any(|r| &r.reviewer == *declared))
        .map(|declared| ScreenError::MissingReviewerSubmission {
            reviewer: declared.clone(),
        })
        .collect()
}
