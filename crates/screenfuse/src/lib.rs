//! Screenfuse: validation and fusion of independent screening decisions.
//!
//! Several reviewers each receive a copy of the same source table and
//! record a decision per record. Screenfuse checks that every returned
//! copy still matches the source, then fuses the decisions into a single
//! target table: unanimous decisions are kept, disagreements are marked
//! unresolved and reported for adjudication.
//!
//! # Core Principles
//!
//! - **Report everything**: Every problem of a stage is reported in one pass
//! - **Non-destructive**: The source and review tables are never modified
//! - **All-or-nothing**: No target is written unless every check passes
//!
//! # Example
//!
//! ```no_run
//! use screenfuse::PipelineRunner;
//!
//! let report = PipelineRunner::delimited().run("jobs/study.json").unwrap();
//! let fusion = report.fusion.unwrap();
//!
//! println!("Records: {}", fusion.summary.records);
//! println!("Conflicts: {}", fusion.conflicts.len());
//! ```

pub mod accumulate;
pub mod config;
pub mod error;
pub mod fusion;
pub mod loader;
pub mod paths;
pub mod pipeline;
pub mod table;
pub mod validation;

pub use accumulate::Accumulator;
pub use config::{Configuration, ConfigurationLoader};
pub use error::{ErrorKind, Errors, Outcome, ScreenError, TableError};
pub use fusion::{ConflictRecord, ConflictReport, FusionEngine, FusionResult, FusionSummary};
pub use loader::{Dataset, DatasetLoader, ReviewedTable};
pub use paths::{FileRole, PathResolver, ResolvedFiles, ResolvedPath};
pub use pipeline::{PipelineRunner, RunFailure, RunMode, RunReport, Stage};
pub use table::{DelimitedBackend, SourceMetadata, Table, TableSink, TableSource};
pub use validation::{ConsistencyValidator, ValidationOutcome};
