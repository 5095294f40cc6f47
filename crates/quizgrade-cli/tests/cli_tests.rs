//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizgrade() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("quizgrade").unwrap()
}

fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

#[test]
fn validate_sample_quiz() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("../../quizzes/sample-quiz.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust Tour (13 questions)"))
        .stdout(predicate::str::contains("All quizzes valid"));
}

#[test]
fn validate_directory() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("../../quizzes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust Tour"));
}

#[test]
fn validate_nonexistent_file() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_reports_broken_questions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[quiz]
id = "broken"
title = "Broken"

[[questions]]
id = "pick"
type = "single_choice"
text = "Pick one"
points = 1

[questions.data]
options = ["a", "b"]
correct_option_index = 5
"#,
    )
    .unwrap();

    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[pick] ERROR: data.correct_option_index"))
        .stderr(predicate::str::contains("1 issue(s) found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizgrade.toml"))
        .stdout(predicate::str::contains("Created quizzes/example.toml"));

    assert!(dir.path().join("quizgrade.toml").exists());
    assert!(dir.path().join("quizzes/example.toml").exists());

    // The generated quiz must pass validation.
    quizgrade()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--quiz")
        .arg("quizzes/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All quizzes valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn truth_table_prints_every_row() {
    quizgrade()
        .arg("truth-table")
        .arg("--expression")
        .arg("a and not b")
        .assert()
        .success()
        .stdout(predicate::str::contains("a AND NOT b"))
        .stdout(predicate::str::contains("Result"));
}

#[test]
fn truth_table_symbolic() {
    quizgrade()
        .arg("truth-table")
        .arg("--expression")
        .arg("A & !B")
        .arg("--symbolic")
        .assert()
        .success()
        .stdout(predicate::str::contains("A ∧ ¬B"));
}

#[test]
fn truth_table_rejects_parentheses() {
    quizgrade()
        .arg("truth-table")
        .arg("--expression")
        .arg("(A OR B)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parentheses are not supported"));
}

#[cfg(unix)]
#[test]
fn grade_then_review() {
    let dir = TempDir::new().unwrap();
    let reports = dir.path().join("reports");

    quizgrade()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("grade")
        .arg("--quiz")
        .arg(fixture("quizzes/sample-quiz.toml"))
        .arg("--submission")
        .arg(fixture("submissions/sample-submission.json"))
        .arg("--output")
        .arg(&reports)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 23.00/26.00 (88.5% of graded)"))
        .stdout(predicate::str::contains("1 question(s) awaiting review"))
        .stderr(predicate::str::contains("Report saved to"));

    let saved: Vec<PathBuf> = std::fs::read_dir(&reports)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("rust-tour-alice-"));

    quizgrade()
        .arg("review")
        .arg("--report")
        .arg(&saved[0])
        .arg("--question")
        .arg("sa-borrow")
        .arg("--points")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 still pending"))
        .stdout(predicate::str::contains("Final: 86.7%"));

    // Already resolved.
    quizgrade()
        .arg("review")
        .arg("--report")
        .arg(&saved[0])
        .arg("--question")
        .arg("sa-borrow")
        .arg("--points")
        .arg("4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not pending manual review"));
}

#[cfg(unix)]
#[test]
fn grade_json_output_without_saving() {
    let dir = TempDir::new().unwrap();

    let output = quizgrade()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("grade")
        .arg("--quiz")
        .arg(fixture("quizzes/sample-quiz.toml"))
        .arg("--submission")
        .arg(fixture("submissions/sample-submission.json"))
        .arg("--json")
        .arg("--no-save")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["quiz_id"], "rust-tour");
    assert_eq!(report["questions"].as_array().unwrap().len(), 13);
    assert_eq!(report["summary"]["pending_count"], 1);
    assert!(!dir.path().join("quizgrade-reports").exists());
}

#[test]
fn grade_missing_submission() {
    quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg("../../quizzes/sample-quiz.toml")
        .arg("--submission")
        .arg("no_such_file.json")
        .arg("--no-save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read submission file"));
}

#[test]
fn help_output() {
    quizgrade()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz validation and grading"));
}

#[test]
fn version_output() {
    quizgrade()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizgrade"));
}
