//! Fuse command - validate, fuse and write the target table.

use std::path::PathBuf;

use colored::Colorize;
use screenfuse::PipelineRunner;
use tracing::info;

use super::{print_files, report_failure};

pub fn run(
    config: PathBuf,
    conflicts: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = match PipelineRunner::delimited().run(&config) {
        Ok(report) => report,
        Err(failure) => return report_failure(failure, json_output),
    };

    let conflict_report = report
        .conflict_report()
        .ok_or("fusion run finished without a fusion result")?;
    if let Some(path) = &conflicts {
        conflict_report.save(path)?;
        info!(
            path = %path.display(),
            conflicts = conflict_report.conflicts.len(),
            "Saved conflict report"
        );
    }

    if json_output {
        let status = serde_json::json!({
            "ok": true,
            "completed_stage": report.stage,
            "target": report.written(),
            "conflict_report": conflicts,
            "summary": conflict_report.summary,
            "conflicts": conflict_report.conflicts,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Fused".cyan().bold(),
        config.display().to_string().white()
    );
    println!();
    print_files(&report);

    let summary = conflict_report.summary;
    println!("{}", "Summary:".yellow().bold());
    println!("  Records:    {}", summary.records.to_string().white());
    println!("  Unanimous:  {}", summary.unanimous.to_string().green());
    println!("  Conflicted: {}", summary.conflicted.to_string().red());
    println!();

    if !conflict_report.conflicts.is_empty() {
        println!("{}", "Conflicts:".yellow().bold());
        for conflict in &conflict_report.conflicts {
            let decisions: Vec<String> = conflict
                .decisions
                .iter()
                .map(|(reviewer, decision)| format!("{}={}", reviewer, decision))
                .collect();
            println!(
                "  {} [{}] {}",
                conflict.index_value.white().bold(),
                conflict.column,
                decisions.join(", ").dimmed()
            );
        }
        println!();
    }

    if let Some(target) = report.written() {
        println!("Wrote {}", target.display().to_string().green());
    }
    if let Some(path) = conflicts {
        println!("Wrote conflict report {}", path.display().to_string().green());
    } else if summary.conflicted > 0 {
        println!(
            "{} cell(s) marked {}. Use {} to save them for adjudication.",
            summary.conflicted,
            report.config.unresolved.yellow(),
            "--conflicts <PATH>".cyan().bold()
        );
    }

    Ok(())
}
