//! Record-by-record fusion of reviewer decisions.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accumulate::Accumulator;
use crate::config::Configuration;
use crate::error::{Errors, Outcome, ScreenError};
use crate::loader::Dataset;
use crate::table::Table;

/// Reviewers disagreeing on one decision of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Index value of the record.
    pub index_value: String,
    /// Decision column the disagreement is in.
    pub column: String,
    /// Each reviewer's decision, in declaration order.
    pub decisions: IndexMap<String, String>,
}

/// Counts describing a fusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionSummary {
    /// Records in the fused table.
    pub records: usize,
    /// Decision cells the reviewers agreed on.
    pub unanimous: usize,
    /// Decision cells left unresolved.
    pub conflicted: usize,
}

/// The fused table plus every conflict found while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionResult {
    /// Source records with fused decisions.
    pub fused_table: Table,
    /// Disagreements, in record order then decision-column order.
    pub conflicts: Vec<ConflictRecord>,
    /// Counts.
    pub summary: FusionSummary,
}

impl FusionResult {
    /// Whether every decision was unanimous.
    pub fn is_unanimous(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Conflicts for one record.
    pub fn conflicts_for<'a>(&'a self, index_value: &'a str) -> impl Iterator<Item = &'a ConflictRecord> {
        self.conflicts
            .iter()
            .filter(move |c| c.index_value == index_value)
    }
}

/// Merges reviewer decisions into one table.
///
/// Unanimous decisions are copied into the fused table. Disagreements are
/// never guessed: the cell gets the configured unresolved marker and a
/// [`ConflictRecord`] is returned for adjudication.
pub struct FusionEngine<'a> {
    config: &'a Configuration,
}

impl<'a> FusionEngine<'a> {
    /// Create an engine for a configuration.
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Fuse a validated dataset.
    ///
    /// Fails without a partial result if the index column is missing, holds
    /// duplicates within a table, or lists different records at the same row.
    pub fn fuse(&self, dataset: &Dataset) -> Outcome<FusionResult> {
        let source = &dataset.source;
        let index_col = source.column_index(&self.config.index).ok_or_else(|| {
            Errors::one(ScreenError::MissingColumn {
                table: "source".to_string(),
                column: self.config.index.clone(),
            })
        })?;

        self.check_index(dataset, index_col)?;

        let decision_cols: Vec<(usize, &str)> = self
            .config
            .decisions
            .iter()
            .map(|name| {
                source.column_index(name).map(|idx| (idx, name.as_str())).ok_or_else(|| {
                    ScreenError::MissingColumn {
                        table: "source".to_string(),
                        column: name.clone(),
                    }
                })
            })
            .collect::<Result<_, _>>()
            .map_err(Errors::one)?;

        let mut conflicts = Vec::new();
        let mut summary = FusionSummary {
            records: source.row_count(),
            ..FusionSummary::default()
        };

        let rows: Vec<Vec<String>> = source
            .rows()
            .iter()
            .enumerate()
            .map(|(row_idx, source_row)| {
                let mut row = source_row.clone();
                for &(col_idx, column) in &decision_cols {
                    if dataset.reviews.is_empty() {
                        continue;
                    }

                    let decisions: IndexMap<String, String> = dataset
                        .reviews
                        .iter()
                        .map(|review| {
                            let value = review
                                .table
                                .column_index(column)
                                .and_then(|c| review.table.get(row_idx, c))
                                .unwrap_or("");
                            (review.reviewer.clone(), value.trim().to_string())
                        })
                        .collect();

                    match unanimous(&decisions) {
                        Some(value) => {
                            row[col_idx] = value.to_string();
                            summary.unanimous += 1;
                        }
                        None => {
                            row[col_idx] = self.config.unresolved.clone();
                            summary.conflicted += 1;
                            conflicts.push(ConflictRecord {
                                index_value: source_row[index_col].clone(),
                                column: column.to_string(),
                                decisions,
                            });
                        }
                    }
                }
                row
            })
            .collect();

        info!(
            records = summary.records,
            unanimous = summary.unanimous,
            conflicts = summary.conflicted,
            "Fused reviewer decisions"
        );

        Ok(FusionResult {
            fused_table: Table::new(source.headers().to_vec(), rows),
            conflicts,
            summary,
        })
    }

    /// Index values must be unique within each table and line up across tables.
    fn check_index(&self, dataset: &Dataset, index_col: usize) -> Outcome<()> {
        let mut acc = Accumulator::new();

        for error in duplicate_index_values(&dataset.source, index_col, "source") {
            acc.push(error);
        }

        for review in &dataset.reviews {
            let Some(review_col) = review.table.column_index(&self.config.index) else {
                acc.push(ScreenError::MissingColumn {
                    table: format!("review {}", review.reviewer),
                    column: self.config.index.clone(),
                });
                continue;
            };

            let table_name = format!("review {}", review.reviewer);
            for error in duplicate_index_values(&review.table, review_col, &table_name) {
                acc.push(error);
            }

            for (row, (expected, found)) in dataset
                .source
                .column_values(index_col)
                .zip(review.table.column_values(review_col))
                .enumerate()
            {
                acc.ensure(expected.trim() == found.trim(), || ScreenError::IndexMismatch {
                    reviewer: review.reviewer.clone(),
                    row: row + 1,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        if !acc.is_clean() {
            debug!("Index column is inconsistent, refusing to fuse");
        }
        acc.finish(())
    }
}

/// The common value if every reviewer gave the same decision.
fn unanimous(decisions: &IndexMap<String, String>) -> Option<&str> {
    let mut values = decisions.values();
    let first = values.next()?;
    values.all(|v| v == first).then_some(first.as_str())
}

fn duplicate_index_values(table: &Table, index_col: usize, table_name: &str) -> Vec<ScreenError> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (row, value) in table.column_values(index_col).enumerate() {
        let key = value.trim();
        match first_seen.get(key) {
            Some(&first) => errors.push(ScreenError::DuplicateIndexValue {
                table: table_name.to_string(),
                value: key.to_string(),
                first_row: first + 1,
                second_row: row + 1,
            }),
            None => {
                first_seen.insert(key, row);
            }
        }
    }

    errors
}
