//! Job configuration for a fusion run.
//!
//! A job description is a small structured document, JSON by default:
//!
//! ```json
//! {
//!   "prefix": "study_001",
//!   "sheet": "screening",
//!   "index": "record_id",
//!   "reviewers": ["alice", "bob"]
//! }
//! ```
//!
//! The four keys above are required. Everything else has a default.

mod loader;

pub use loader::{
    ConfigParser, ConfigurationLoader, JobConfig, JsonConfigParser, TomlConfigParser,
};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::accumulate::Accumulator;
use crate::error::{Outcome, ScreenError};
use crate::paths::{SOURCE_ROLE, TARGET_ROLE};

/// Default decision column name.
pub const DEFAULT_DECISION_COLUMN: &str = "decision";

/// Default column naming the reviewer who screened a record.
pub const DEFAULT_REVIEWER_COLUMN: &str = "reviewer";

/// Default tabular file extension.
pub const DEFAULT_SUFFIX: &str = "csv";

/// Default marker for records the reviewers disagree on.
pub const DEFAULT_UNRESOLVED: &str = "UNRESOLVED";

/// Typed job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// File prefix; every derived file is `<prefix>_<role>.<suffix>`.
    pub prefix: String,
    /// Sheet read from every input and written to the target.
    pub sheet: String,
    /// Column identifying a record across all tables.
    pub index: String,
    /// Declared reviewers, in order.
    pub reviewers: Vec<String>,

    /// Columns holding reviewer decisions.
    #[serde(default = "default_decisions")]
    pub decisions: Vec<String>,

    /// Column whose cells name reviewers (checked only when present).
    #[serde(default = "default_reviewer_column")]
    pub reviewer_column: String,

    /// Extension of the tabular files.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Value written into decision cells the reviewers disagree on.
    #[serde(default = "default_unresolved")]
    pub unresolved: String,

    /// Fuse whichever reviewer files exist instead of requiring all of them.
    #[serde(default)]
    pub allow_missing_reviewers: bool,
}

fn default_decisions() -> Vec<String> {
    vec![DEFAULT_DECISION_COLUMN.to_string()]
}

fn default_reviewer_column() -> String {
    DEFAULT_REVIEWER_COLUMN.to_string()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_unresolved() -> String {
    DEFAULT_UNRESOLVED.to_string()
}

impl Configuration {
    /// Create a configuration with defaults for every optional key.
    pub fn new(
        prefix: impl Into<String>,
        sheet: impl Into<String>,
        index: impl Into<String>,
        reviewers: Vec<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            sheet: sheet.into(),
            index: index.into(),
            reviewers,
            decisions: default_decisions(),
            reviewer_column: default_reviewer_column(),
            suffix: default_suffix(),
            unresolved: default_unresolved(),
            allow_missing_reviewers: false,
        }
    }

    /// Set the decision columns.
    pub fn with_decisions(mut self, decisions: Vec<String>) -> Self {
        self.decisions = decisions;
        self
    }

    /// Set the file suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the unresolved marker.
    pub fn with_unresolved(mut self, unresolved: impl Into<String>) -> Self {
        self.unresolved = unresolved.into();
        self
    }

    /// Allow or forbid fusing with a subset of the declared reviewers.
    pub fn with_missing_reviewers_allowed(mut self, allowed: bool) -> Self {
        self.allow_missing_reviewers = allowed;
        self
    }

    /// Whether `name` is a declared reviewer.
    pub fn is_declared(&self, name: &str) -> bool {
        self.reviewers.iter().any(|r| r == name)
    }

    /// Whether `column` is one of the decision columns.
    pub fn is_decision_column(&self, column: &str) -> bool {
        self.decisions.iter().any(|d| d == column)
    }
}

impl JobConfig for Configuration {
    const REQUIRED_KEYS: &'static [&'static str] = &["prefix", "sheet", "index", "reviewers"];

    fn check(&self, origin: &str) -> Outcome<()> {
        let mut acc = Accumulator::new();
        let malformed = |message: String| ScreenError::MalformedConfiguration {
            origin: origin.to_string(),
            message,
        };

        for (key, value) in [
            ("prefix", &self.prefix),
            ("sheet", &self.sheet),
            ("index", &self.index),
            ("suffix", &self.suffix),
        ] {
            acc.ensure(!value.trim().is_empty(), || {
                malformed(format!("'{}' must not be empty", key))
            });
        }

        acc.ensure(!self.reviewers.is_empty(), || {
            malformed("'reviewers' must declare at least one reviewer".to_string())
        });
        acc.ensure(!self.decisions.is_empty(), || {
            malformed("'decisions' must name at least one column".to_string())
        });

        let mut seen = HashSet::new();
        for reviewer in &self.reviewers {
            if reviewer.trim().is_empty() {
                acc.push(malformed("reviewer identifiers must not be empty".to_string()));
                continue;
            }
            if !seen.insert(reviewer.as_str()) {
                acc.push(malformed(format!("reviewer '{}' is declared twice", reviewer)));
            }
            if reviewer == SOURCE_ROLE || reviewer == TARGET_ROLE {
                acc.push(malformed(format!(
                    "reviewer '{}' collides with a reserved file role",
                    reviewer
                )));
            }
            if reviewer.contains(['/', '\\']) {
                acc.push(malformed(format!(
                    "reviewer '{}' must not contain path separators",
                    reviewer
                )));
            }
        }

        let mut columns = HashSet::new();
        for column in &self.decisions {
            if !columns.insert(column.as_str()) {
                acc.push(malformed(format!(
                    "decision column '{}' is listed twice",
                    column
                )));
            }
        }

        if self.is_decision_column(&self.index) {
            acc.push(malformed(format!(
                "index column '{}' cannot also be a decision column",
                self.index
            )));
        }

        acc.finish(())
    }
}
