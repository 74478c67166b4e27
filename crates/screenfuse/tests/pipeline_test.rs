//! End-to-end tests for the screenfuse pipeline.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use screenfuse::{
    ConflictReport, DelimitedBackend, ErrorKind, PipelineRunner, ScreenError, Stage, Table,
    TableSource,
};

const SOURCE: &str = "id,title,decision,reviewer\n\
                      R1,Alpha,,\n\
                      R2,Beta,,\n\
                      R3,Gamma,,\n";

const ALICE: &str = "id,title,decision,reviewer\n\
                     R1,Alpha,include,alice\n\
                     R2,Beta,exclude,alice\n\
                     R3,Gamma,include,alice\n";

const BOB_AGREES: &str = "id,title,decision,reviewer\n\
                          R1,Alpha,include,bob\n\
                          R2,Beta,exclude,bob\n\
                          R3,Gamma,include,bob\n";

const BOB_DISAGREES: &str = "id,title,decision,reviewer\n\
                             R1,Alpha,include,bob\n\
                             R2,Beta,include,bob\n\
                             R3,Gamma,include,bob\n";

const CONFIG: &str = r#"{
    "prefix": "study",
    "sheet": "screening",
    "index": "id",
    "reviewers": ["alice", "bob"]
}"#;

/// A job directory holding a configuration and its tables.
struct Job {
    dir: TempDir,
}

impl Job {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A standard two-reviewer job.
    fn standard(bob: &str) -> Self {
        let job = Self::new();
        job.write("study.json", CONFIG);
        job.write("study_source.csv", SOURCE);
        job.write("study_alice.csv", ALICE);
        job.write("study_bob.csv", bob);
        job
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).expect("Failed to write job file");
    }

    fn config(&self) -> PathBuf {
        self.path("study.json")
    }

    fn target(&self) -> PathBuf {
        self.path("study_target.csv")
    }

    fn read_target(&self) -> Table {
        DelimitedBackend::new()
            .parse_sheet(&self.target(), "screening")
            .expect("Failed to read target")
    }
}

fn decisions(table: &Table) -> Vec<String> {
    table
        .column_by_name("decision")
        .expect("decision column")
        .into_iter()
        .map(String::from)
        .collect()
}

// =============================================================================
// Fusion
// =============================================================================

#[test]
fn test_unanimous_job_writes_target() {
    let job = Job::standard(BOB_AGREES);

    let report = PipelineRunner::delimited().run(job.config()).expect("Run failed");

    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.written(), Some(job.target().as_path()));
    let fusion = report.fusion.as_ref().unwrap();
    assert!(fusion.is_unanimous());
    assert_eq!(fusion.summary.records, 3);
    assert_eq!(fusion.summary.unanimous, 3);

    let target = job.read_target();
    assert_eq!(target.headers(), ["id", "title", "decision", "reviewer"]);
    assert_eq!(decisions(&target), ["include", "exclude", "include"]);
    assert_eq!(target.column_by_name("title").unwrap(), ["Alpha", "Beta", "Gamma"]);
}

#[test]
fn test_conflict_is_marked_and_reported() {
    let job = Job::standard(BOB_DISAGREES);

    let report = PipelineRunner::delimited().run(job.config()).expect("Run failed");
    let fusion = report.fusion.as_ref().unwrap();

    assert_eq!(fusion.summary.conflicted, 1);
    assert_eq!(fusion.conflicts.len(), 1);
    let conflict = &fusion.conflicts[0];
    assert_eq!(conflict.index_value, "R2");
    assert_eq!(conflict.column, "decision");
    let reviewers: Vec<&str> = conflict.decisions.keys().map(String::as_str).collect();
    assert_eq!(reviewers, ["alice", "bob"]);
    assert_eq!(conflict.decisions["alice"], "exclude");
    assert_eq!(conflict.decisions["bob"], "include");

    assert_eq!(decisions(&job.read_target()), ["include", "UNRESOLVED", "include"]);
}

#[test]
fn test_custom_unresolved_marker() {
    let job = Job::standard(BOB_DISAGREES);
    job.write(
        "study.json",
        r#"{
            "prefix": "study",
            "sheet": "screening",
            "index": "id",
            "reviewers": ["alice", "bob"],
            "unresolved": "ADJUDICATE"
        }"#,
    );

    PipelineRunner::delimited().run(job.config()).expect("Run failed");

    assert_eq!(decisions(&job.read_target())[1], "ADJUDICATE");
}

#[test]
fn test_decisions_are_trimmed() {
    let job = Job::standard(
        "id,title,decision,reviewer\n\
         R1,Alpha, include ,bob\n\
         R2,Beta,exclude  ,bob\n\
         R3,Gamma,include,bob\n",
    );

    let report = PipelineRunner::delimited().run(job.config()).expect("Run failed");

    assert!(report.fusion.unwrap().is_unanimous());
    assert_eq!(decisions(&job.read_target()), ["include", "exclude", "include"]);
}

#[test]
fn test_conflict_report_round_trip() {
    let job = Job::standard(BOB_DISAGREES);

    let report = PipelineRunner::delimited().run(job.config()).expect("Run failed");
    let conflicts = report.conflict_report().expect("fusion run has a report");
    let path = job.path("reports/conflicts.json");
    conflicts.save(&path).expect("Failed to save report");

    let loaded = ConflictReport::load(&path).expect("Failed to load report");
    assert_eq!(loaded.reviewers, ["alice", "bob"]);
    assert_eq!(loaded.unresolved, "UNRESOLVED");
    assert_eq!(loaded.conflicts, conflicts.conflicts);
    let source = loaded.source.expect("source metadata");
    assert_eq!(source.file, "study_source.csv");
    assert!(source.hash.starts_with("sha256:"));
}

#[test]
fn test_rerun_is_idempotent() {
    let job = Job::standard(BOB_DISAGREES);
    let runner = PipelineRunner::delimited();

    runner.run(job.config()).expect("First run failed");
    let first = fs::read(job.target()).unwrap();
    runner.run(job.config()).expect("Second run failed");
    let second = fs::read(job.target()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_source_is_not_modified() {
    let job = Job::standard(BOB_DISAGREES);

    PipelineRunner::delimited().run(job.config()).expect("Run failed");

    assert_eq!(fs::read_to_string(job.path("study_source.csv")).unwrap(), SOURCE);
    assert_eq!(fs::read_to_string(job.path("study_alice.csv")).unwrap(), ALICE);
}

#[test]
fn test_working_directory_unchanged() {
    let job = Job::standard(BOB_AGREES);
    let before = std::env::current_dir().unwrap();

    PipelineRunner::delimited().run(job.config()).expect("Run failed");
    let _ = PipelineRunner::delimited().check(job.path("missing.json"));

    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
fn test_toml_configuration() {
    let job = Job::standard(BOB_AGREES);
    job.write(
        "study.toml",
        r#"
prefix = "study"
sheet = "screening"
index = "id"
reviewers = ["alice", "bob"]
"#,
    );

    let report = PipelineRunner::delimited()
        .run(job.path("study.toml"))
        .expect("Run failed");

    assert_eq!(report.stage, Stage::Done);
    assert!(job.target().exists());
}

#[test]
fn test_tsv_suffix() {
    let job = Job::new();
    job.write(
        "study.json",
        r#"{
            "prefix": "study",
            "sheet": "screening",
            "index": "id",
            "reviewers": ["alice"],
            "suffix": "tsv"
        }"#,
    );
    job.write("study_source.tsv", "id\tdecision\nR1\t\nR2\t\n");
    job.write("study_alice.tsv", "id\tdecision\nR1\tinclude\nR2\texclude\n");

    PipelineRunner::delimited().run(job.config()).expect("Run failed");

    let written = fs::read_to_string(job.path("study_target.tsv")).unwrap();
    assert_eq!(written, "id\tdecision\nR1\tinclude\nR2\texclude\n");
}

// =============================================================================
// Check mode
// =============================================================================

#[test]
fn test_check_writes_nothing() {
    let job = Job::standard(BOB_DISAGREES);

    let report = PipelineRunner::delimited().check(job.config()).expect("Check failed");

    assert_eq!(report.stage, Stage::Validated);
    assert_eq!(report.base_dir, job.dir.path());
    assert!(report.fusion.is_none());
    assert!(report.written().is_none());
    assert!(!job.target().exists());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_every_row_count_mismatch_is_reported() {
    let job = Job::standard(
        "id,title,decision,reviewer\n\
         R1,Alpha,include,bob\n\
         R2,Beta,include,bob\n\
         R3,Gamma,include,bob\n\
         R4,Delta,include,bob\n",
    );
    job.write(
        "study_alice.csv",
        "id,title,decision,reviewer\nR1,Alpha,include,alice\n",
    );

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::TablesLoaded);
    assert_eq!(failure.errors.count(ErrorKind::RowCountMismatch), 2);
    assert!(matches!(
        &failure.errors[0],
        ScreenError::RowCountMismatch { reviewer, expected: 3, found: 1 } if reviewer == "alice"
    ));
    assert!(matches!(
        &failure.errors[1],
        ScreenError::RowCountMismatch { reviewer, expected: 3, found: 4 } if reviewer == "bob"
    ));
    assert!(!job.target().exists());
}

#[test]
fn test_unquoted_delimiter_in_source_fails_load() {
    let job = Job::standard(BOB_AGREES);
    job.write(
        "study_source.csv",
        "id,title,decision,reviewer\n\
         R1,Smith, J.,,\n\
         R2,Beta,,\n\
         R3,Gamma,,\n",
    );

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::PathsResolved);
    assert_eq!(failure.errors.len(), 1);
    match &failure.errors[0] {
        ScreenError::SheetLoadFailure { owner, message, .. } => {
            assert_eq!(owner, "source");
            assert!(message.contains("row 1 has 5"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!job.target().exists());
}

#[test]
fn test_ragged_reviews_are_all_reported() {
    let job = Job::standard(
        "id,title,decision,reviewer\n\
         R1,Alpha,include\n\
         R2,Beta,exclude,bob\n\
         R3,Gamma,include,bob\n",
    );
    job.write(
        "study_alice.csv",
        "id,title,decision,reviewer\n\
         R1,Alpha,include,alice,extra\n\
         R2,Beta,exclude,alice\n\
         R3,Gamma,include,alice\n",
    );

    let failure = PipelineRunner::delimited().check(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::PathsResolved);
    assert_eq!(failure.errors.count(ErrorKind::SheetLoadFailure), 2);
}

#[test]
fn test_header_order_matters() {
    let job = Job::standard(
        "title,id,decision,reviewer\n\
         Alpha,R1,include,bob\n\
         Beta,R2,exclude,bob\n\
         Gamma,R3,include,bob\n",
    );

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(
        &failure.errors[0],
        ScreenError::HeaderMismatch { reviewer, .. } if reviewer == "bob"
    ));
}

#[test]
fn test_unknown_reviewer_identity() {
    let job = Job::standard(
        "id,title,decision,reviewer\n\
         R1,Alpha,include,mallory\n\
         R2,Beta,exclude,bob\n\
         R3,Gamma,include,mallory\n",
    );

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    match &failure.errors[0] {
        ScreenError::UnknownReviewerIdentity {
            reviewer,
            value,
            rows,
            ..
        } => {
            assert_eq!(reviewer, "bob");
            assert_eq!(value, "mallory");
            assert_eq!(rows, &[1, 3]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_files_are_all_reported() {
    let job = Job::new();
    job.write(
        "study.json",
        r#"{
            "prefix": "study",
            "sheet": "screening",
            "index": "id",
            "reviewers": ["alice", "bob", "carol"]
        }"#,
    );
    job.write("study_source.csv", SOURCE);
    job.write("study_alice.csv", ALICE);

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::ConfigLoaded);
    assert_eq!(failure.errors.len(), 2);
    assert_eq!(failure.errors.count(ErrorKind::FileNotFound), 2);
    let messages = failure.errors.messages();
    assert!(messages[0].contains("study_bob.csv"));
    assert!(messages[1].contains("study_carol.csv"));
}

#[test]
fn test_missing_reviewer_allowed() {
    let job = Job::new();
    job.write(
        "study.json",
        r#"{
            "prefix": "study",
            "sheet": "screening",
            "index": "id",
            "reviewers": ["alice", "bob"],
            "allow_missing_reviewers": true
        }"#,
    );
    job.write("study_source.csv", SOURCE);
    job.write("study_alice.csv", ALICE);

    let report = PipelineRunner::delimited().run(job.config()).expect("Run failed");

    assert_eq!(report.files.skipped, ["bob"]);
    assert_eq!(report.dataset.reviewers(), ["alice"]);
    assert_eq!(decisions(&job.read_target()), ["include", "exclude", "include"]);
}

#[test]
fn test_missing_configuration_keys() {
    let job = Job::new();
    job.write("study.json", r#"{ "prefix": "study", "reviewers": ["alice"] }"#);

    let failure = PipelineRunner::delimited().check(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::Start);
    assert_eq!(failure.errors.count(ErrorKind::MalformedConfiguration), 2);
    let messages = failure.errors.messages();
    assert!(messages[0].contains("'sheet'"));
    assert!(messages[1].contains("'index'"));
}

#[test]
fn test_failed_run_leaves_existing_target() {
    let job = Job::standard(
        "id,title,decision,reviewer\n\
         R1,Alpha,include,bob\n",
    );
    job.write("study_target.csv", "previous output\n");

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.stage(), Stage::Failed);
    assert_eq!(
        fs::read_to_string(job.target()).unwrap(),
        "previous output\n"
    );
}

#[test]
fn test_duplicate_index_fails_fusion() {
    let source = "id,title,decision,reviewer\nR1,Alpha,,\nR1,Beta,,\n";
    let review = "id,title,decision,reviewer\nR1,Alpha,include,\nR1,Beta,include,\n";
    let job = Job::new();
    job.write(
        "study.json",
        r#"{ "prefix": "study", "sheet": "screening", "index": "id", "reviewers": ["alice"] }"#,
    );
    job.write("study_source.csv", source);
    job.write("study_alice.csv", review);

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();

    assert_eq!(failure.completed, Stage::Validated);
    assert_eq!(failure.errors.count(ErrorKind::DuplicateIndexValue), 2);
    assert!(!job.target().exists());
}

#[test]
fn test_run_failure_display_lists_errors() {
    let job = Job::standard("id,title,decision,reviewer\n");

    let failure = PipelineRunner::delimited().run(job.config()).unwrap_err();
    let text = failure.to_string();

    assert!(text.contains("tables loaded"));
    assert!(text.contains("Mismatching number of rows for review bob"));
}
