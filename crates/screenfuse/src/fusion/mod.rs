//! Fusion of reviewer decisions into one authoritative table.

mod engine;
mod report;

pub use engine::{ConflictRecord, FusionEngine, FusionResult, FusionSummary};
pub use report::ConflictReport;
