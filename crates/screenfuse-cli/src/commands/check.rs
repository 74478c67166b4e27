//! Check command - validate review tables without writing anything.

use std::path::PathBuf;

use colored::Colorize;
use screenfuse::PipelineRunner;

use super::{print_files, report_failure};

pub fn run(config: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = match PipelineRunner::delimited().check(&config) {
        Ok(report) => report,
        Err(failure) => return report_failure(failure, json_output),
    };

    if json_output {
        let status = serde_json::json!({
            "ok": true,
            "completed_stage": report.stage,
            "files": report.files,
            "records": report.dataset.source.row_count(),
            "reviewers": report.dataset.reviewers(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "{} {}",
            "Checked".cyan().bold(),
            config.display().to_string().white()
        );
        println!();
        print_files(&report);
        println!(
            "{} {} review(s) of {} record(s) are consistent with the source.",
            "OK".green().bold(),
            report.dataset.reviews.len(),
            report.dataset.source.row_count()
        );
        println!(
            "Run {} to write the fused table.",
            format!("screenfuse fuse {}", config.display()).cyan().bold()
        );
    }

    Ok(())
}
