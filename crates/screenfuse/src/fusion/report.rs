//! Conflict report persisted next to the fused output.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Errors, Outcome, ScreenError};
use crate::table::SourceMetadata;

use super::engine::{ConflictRecord, FusionResult, FusionSummary};

/// Everything a human adjudicator needs about one fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Provenance of the source table, if it was read from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
    /// Reviewers whose decisions were fused.
    pub reviewers: Vec<String>,
    /// Marker written into unresolved cells.
    pub unresolved: String,
    /// Counts.
    pub summary: FusionSummary,
    /// Every disagreement.
    pub conflicts: Vec<ConflictRecord>,
}

impl ConflictReport {
    /// Build a report for a fusion result.
    pub fn new(
        result: &FusionResult,
        source: Option<SourceMetadata>,
        reviewers: Vec<String>,
        unresolved: impl Into<String>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            source,
            reviewers,
            unresolved: unresolved.into(),
            summary: result.summary,
            conflicts: result.conflicts.clone(),
        }
    }

    /// Save the report as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Outcome<()> {
        let path = path.as_ref();
        let write_failure = |message: String| {
            Errors::one(ScreenError::WriteFailure {
                path: path.to_path_buf(),
                message,
            })
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    write_failure(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path)
            .map_err(|e| write_failure(format!("Failed to create file: {}", e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| write_failure(format!("Failed to serialize conflict report: {}", e)))?;
        writer
            .flush()
            .map_err(|e| write_failure(format!("Failed to flush conflict report: {}", e)))?;

        Ok(())
    }

    /// Load a report saved with [`ConflictReport::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(BufReader::new(file))?;
        Ok(report)
    }
}
