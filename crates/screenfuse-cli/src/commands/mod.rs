//! CLI command implementations.

pub mod check;
pub mod fuse;

use colored::Colorize;
use screenfuse::{RunFailure, RunReport};

/// Print every error of a failed run and turn it into the command's error.
pub(crate) fn report_failure(
    failure: RunFailure,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        let errors: Vec<_> = failure
            .errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": e.kind().label(),
                    "message": e.to_string(),
                })
            })
            .collect();
        let status = serde_json::json!({
            "ok": false,
            "completed_stage": failure.completed,
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        eprintln!(
            "{} after stage '{}':",
            format!("{} error(s)", failure.errors.len()).red().bold(),
            failure.completed
        );
        for error in failure.errors.iter() {
            eprintln!("  {} {}", format!("[{}]", error.kind().label()).red(), error);
        }
    }

    Err(format!("run failed with {} error(s)", failure.errors.len()).into())
}

/// Print the file set a run used.
pub(crate) fn print_files(report: &RunReport) {
    println!("{}", "Files:".yellow().bold());
    println!("  Directory: {}", report.base_dir.display());
    println!("  Source: {}", report.files.source.path().display());
    for (reviewer, path) in &report.files.reviews {
        println!("  Review {}: {}", reviewer.cyan(), path.path().display());
    }
    for reviewer in &report.files.skipped {
        println!("  Review {}: {}", reviewer.yellow(), "not submitted".dimmed());
    }
    println!("  Target: {}", report.files.target.path().display());
    println!();
}
