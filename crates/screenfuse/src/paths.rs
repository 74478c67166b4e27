//! File naming convention and resolution.
//!
//! Every file of a job sits next to the configuration file and is named
//! `<prefix>_<role>.<suffix>`:
//!
//! ```text
//! study/
//! ├── study_001.json          # configuration
//! ├── study_001_source.csv    # records to screen
//! ├── study_001_alice.csv     # one file per reviewer
//! ├── study_001_bob.csv
//! └── study_001_target.csv    # fused output
//! ```
//!
//! Paths are always joined onto an explicit base directory; the process
//! working directory is never consulted or changed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::accumulate::{both, Accumulator};
use crate::config::Configuration;
use crate::error::{Errors, Outcome, ScreenError};

/// Role name of the source file.
pub const SOURCE_ROLE: &str = "source";

/// Role name of the fused output file.
pub const TARGET_ROLE: &str = "target";

/// What a file is for within a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", content = "reviewer", rename_all = "snake_case")]
pub enum FileRole {
    /// Records to screen.
    Source,
    /// Fused output.
    Target,
    /// One reviewer's decisions.
    Review(String),
}

impl FileRole {
    /// The role part of the file name.
    pub fn name(&self) -> &str {
        match self {
            FileRole::Source => SOURCE_ROLE,
            FileRole::Target => TARGET_ROLE,
            FileRole::Review(reviewer) => reviewer,
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Source => write!(f, "source"),
            FileRole::Target => write!(f, "target"),
            FileRole::Review(reviewer) => write!(f, "review {}", reviewer),
        }
    }
}

/// Build a file name from its parts: `<prefix>_<role>.<suffix>`.
pub fn file_name(prefix: &str, role: &str, suffix: &str) -> String {
    format!("{}_{}.{}", prefix, role, suffix)
}

/// A file location with its existence checked once at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    role: FileRole,
    path: PathBuf,
    exists: bool,
}

impl ResolvedPath {
    /// Role of the file.
    pub fn role(&self) -> &FileRole {
        &self.role
    }

    /// Full path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path was an existing regular file when resolved.
    pub fn exists(&self) -> bool {
        self.exists
    }
}

/// The full file set of a job.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFiles {
    /// Source table.
    pub source: ResolvedPath,
    /// Output table (not required to exist).
    pub target: ResolvedPath,
    /// Review tables in declaration order.
    pub reviews: Vec<(String, ResolvedPath)>,
    /// Declared reviewers without a file, when missing reviewers are allowed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

/// Resolves job files relative to a base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl PathResolver {
    /// Create a resolver.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Create a resolver for a configuration's prefix and suffix.
    pub fn for_config(base_dir: impl Into<PathBuf>, config: &Configuration) -> Self {
        Self::new(base_dir, config.prefix.clone(), config.suffix.clone())
    }

    /// Directory all paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of a role's file. Pure; touches nothing on disk.
    pub fn path_for(&self, role: &FileRole) -> PathBuf {
        self.base_dir
            .join(file_name(&self.prefix, role.name(), &self.suffix))
    }

    /// Resolve a role's path and record whether it is an existing regular file.
    pub fn resolve(&self, role: FileRole) -> ResolvedPath {
        let path = self.path_for(&role);
        let exists = path.is_file();
        ResolvedPath { role, path, exists }
    }

    /// Resolve a role's path and fail with `FileNotFound` if it is missing.
    pub fn resolve_and_check(&self, role: FileRole) -> Outcome<ResolvedPath> {
        let resolved = self.resolve(role);
        if resolved.exists {
            Ok(resolved)
        } else {
            Err(Errors::one(not_found(&resolved)))
        }
    }

    /// Resolve every reviewer's file, reporting all missing files together.
    pub fn resolve_reviewers(&self, reviewers: &[String]) -> Outcome<Vec<(String, ResolvedPath)>> {
        let mut acc = Accumulator::new();
        let resolved: Vec<(String, ResolvedPath)> = reviewers
            .iter()
            .filter_map(|reviewer| {
                acc.absorb(self.resolve_and_check(FileRole::Review(reviewer.clone())))
                    .map(|path| (reviewer.clone(), path))
            })
            .collect();
        acc.finish(resolved)
    }

    /// Resolve the whole file set of a job.
    ///
    /// The source and, unless `allow_missing_reviewers` is set, every
    /// reviewer file must exist. With missing reviewers allowed, absent
    /// review files are skipped with a warning, but at least one must exist.
    pub fn resolve_all(&self, config: &Configuration) -> Outcome<ResolvedFiles> {
        let source = self.resolve_and_check(FileRole::Source);
        let reviews = if config.allow_missing_reviewers {
            self.resolve_available_reviewers(&config.reviewers)
        } else {
            self.resolve_reviewers(&config.reviewers)
                .map(|reviews| (reviews, Vec::new()))
        };

        let (source, (reviews, skipped)) = both(source, reviews)?;
        Ok(ResolvedFiles {
            source,
            target: self.resolve(FileRole::Target),
            reviews,
            skipped,
        })
    }

    /// Resolve the reviewer files that exist, skipping the others.
    fn resolve_available_reviewers(
        &self,
        reviewers: &[String],
    ) -> Outcome<(Vec<(String, ResolvedPath)>, Vec<String>)> {
        let mut found = Vec::new();
        let mut skipped = Vec::new();
        let mut missing = Vec::new();

        for reviewer in reviewers {
            let resolved = self.resolve(FileRole::Review(reviewer.clone()));
            if resolved.exists {
                found.push((reviewer.clone(), resolved));
            } else {
                warn!(reviewer = %reviewer, path = %resolved.path.display(), "Review file missing, skipping reviewer");
                missing.push(not_found(&resolved));
                skipped.push(reviewer.clone());
            }
        }

        if found.is_empty() {
            if let Some(errors) = Errors::from_vec(missing) {
                return Err(errors);
            }
        }
        Ok((found, skipped))
    }
}

fn not_found(resolved: &ResolvedPath) -> ScreenError {
    ScreenError::FileNotFound {
        role: resolved.role.to_string(),
        path: resolved.path.clone(),
    }
}
