//! Staged execution of a fusion job.
//!
//! Stages run in a fixed order and each one completes before the next
//! starts:
//!
//! ```text
//! Start → ConfigLoaded → PathsResolved → TablesLoaded → Validated → Fused → Done
//! ```
//!
//! A stage that fails ends the run; every error it collected is returned,
//! together with the last stage that completed. Relative file names resolve
//! against the configuration file's directory, passed explicitly to each
//! stage, so the process working directory is left untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, info_span};

use crate::config::{Configuration, ConfigurationLoader};
use crate::error::{Errors, ScreenError};
use crate::fusion::{ConflictReport, FusionEngine, FusionResult};
use crate::loader::{Dataset, DatasetLoader};
use crate::paths::{PathResolver, ResolvedFiles};
use crate::table::{DelimitedBackend, TableSink, TableSource};
use crate::validation::ConsistencyValidator;

/// Progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    ConfigLoaded,
    PathsResolved,
    TablesLoaded,
    Validated,
    Fused,
    Done,
    /// Absorbing failure state.
    Failed,
}

impl Stage {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ConfigLoaded => "configuration loaded",
            Stage::PathsResolved => "paths resolved",
            Stage::TablesLoaded => "tables loaded",
            Stage::Validated => "validated",
            Stage::Fused => "fused",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How far a run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Stop after validation; write nothing.
    Check,
    /// Fuse and write the target table.
    Fuse,
}

/// A run that did not reach the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Last stage that completed successfully.
    pub completed: Stage,
    /// Every error of the failing stage, in order.
    pub errors: Errors,
}

impl RunFailure {
    /// The run's state: always [`Stage::Failed`].
    pub fn stage(&self) -> Stage {
        Stage::Failed
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run failed after stage '{}' with {} error(s):",
            self.completed,
            self.errors.len()
        )?;
        write!(f, "{}", self.errors)
    }
}

impl std::error::Error for RunFailure {}

/// A run that reached its final stage.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final stage: [`Stage::Validated`] for checks, [`Stage::Done`] for fusions.
    pub stage: Stage,
    /// Configuration the run used.
    pub config: Configuration,
    /// Directory the job files were resolved against.
    pub base_dir: PathBuf,
    /// The job's file set.
    pub files: ResolvedFiles,
    /// Loaded tables.
    pub dataset: Dataset,
    /// Fusion result, for fusion runs.
    pub fusion: Option<FusionResult>,
}

impl RunReport {
    /// Path the fused table was written to, for completed fusion runs.
    pub fn written(&self) -> Option<&Path> {
        (self.stage == Stage::Done).then(|| self.files.target.path())
    }

    /// Build the conflict report for a fusion run.
    pub fn conflict_report(&self) -> Option<ConflictReport> {
        self.fusion.as_ref().map(|result| {
            ConflictReport::new(
                result,
                self.dataset.source.metadata().cloned(),
                self.dataset.reviewers().iter().map(|r| r.to_string()).collect(),
                self.config.unresolved.clone(),
            )
        })
    }
}

/// Runs jobs through a tabular source and sink.
pub struct PipelineRunner<S, K> {
    source: S,
    sink: K,
}

impl PipelineRunner<DelimitedBackend, DelimitedBackend> {
    /// Create a runner reading and writing delimited text files.
    pub fn delimited() -> Self {
        Self::new(DelimitedBackend::new(), DelimitedBackend::new())
    }
}

impl<S: TableSource, K: TableSink> PipelineRunner<S, K> {
    /// Create a runner.
    pub fn new(source: S, sink: K) -> Self {
        Self { source, sink }
    }

    /// Validate a job without writing anything.
    pub fn check(&self, config_path: impl AsRef<Path>) -> Result<RunReport, RunFailure> {
        self.execute(config_path.as_ref(), RunMode::Check)
    }

    /// Validate, fuse and write a job's target table.
    pub fn run(&self, config_path: impl AsRef<Path>) -> Result<RunReport, RunFailure> {
        self.execute(config_path.as_ref(), RunMode::Fuse)
    }

    /// Run a job in the given mode.
    pub fn execute(&self, config_path: &Path, mode: RunMode) -> Result<RunReport, RunFailure> {
        let span = info_span!("pipeline", config = %config_path.display(), ?mode);
        let _guard = span.enter();

        let mut stage = Stage::Start;
        let fail = |completed: Stage| move |errors: Errors| RunFailure { completed, errors };

        let config: Configuration = ConfigurationLoader::for_path(config_path)
            .load_file(config_path)
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::ConfigLoaded);

        let base_dir = base_directory(config_path);
        let files = PathResolver::for_config(&base_dir, &config)
            .resolve_all(&config)
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::PathsResolved);

        let dataset = DatasetLoader::new(&self.source)
            .load(&files, &config.sheet)
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::TablesLoaded);

        ConsistencyValidator::new(&config)
            .validate(&dataset)
            .into_outcome()
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::Validated);

        if mode == RunMode::Check {
            return Ok(RunReport {
                stage,
                config,
                base_dir,
                files,
                dataset,
                fusion: None,
            });
        }

        let fusion = FusionEngine::new(&config)
            .fuse(&dataset)
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::Fused);

        let target = files.target.path();
        self.sink
            .write_sheet(&fusion.fused_table, target, &config.sheet)
            .map_err(|e| {
                Errors::one(ScreenError::WriteFailure {
                    path: target.to_path_buf(),
                    message: e.to_string(),
                })
            })
            .map_err(fail(stage))?;
        stage = advance(stage, Stage::Done);
        info!(target = %target.display(), "Wrote fused table");

        Ok(RunReport {
            stage,
            config,
            base_dir,
            files,
            dataset,
            fusion: Some(fusion),
        })
    }
}

fn advance(from: Stage, to: Stage) -> Stage {
    info!(from = %from, to = %to, "Stage complete");
    to
}

/// Directory containing the configuration file (`.` for a bare file name).
pub fn base_directory(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Start < Stage::ConfigLoaded);
        assert!(Stage::Validated < Stage::Fused);
        assert!(Stage::Fused < Stage::Done);
    }

    #[test]
    fn test_base_directory() {
        assert_eq!(base_directory(Path::new("jobs/study.json")), PathBuf::from("jobs"));
        assert_eq!(base_directory(Path::new("study.json")), PathBuf::from("."));
    }

    #[test]
    fn test_missing_config_fails_at_start() {
        let failure = PipelineRunner::delimited()
            .check("/nonexistent/study.json")
            .unwrap_err();
        assert_eq!(failure.completed, Stage::Start);
        assert_eq!(failure.stage(), Stage::Failed);
        assert_eq!(failure.errors.len(), 1);
    }
}
