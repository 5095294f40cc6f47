//! The `quizgrade grade` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use quizgrade_core::engine::{Grader, GradingProgress};
use quizgrade_core::error::GradingError;
use quizgrade_core::model::ScoringPolicy;
use quizgrade_core::parser;
use quizgrade_core::report::{QuestionOutcome, SubmissionReport};
use quizgrade_core::results::{GradeStatus, GradingResult};
use quizgrade_runner::{create_runner, load_config_from};

pub struct GradeArgs {
    pub quiz: PathBuf,
    pub submission: PathBuf,
    pub output: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub test_timeout: Option<u64>,
    pub all_or_nothing: bool,
    pub json: bool,
    pub save: bool,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleProgress;

impl GradingProgress for ConsoleProgress {
    fn on_question_start(&self, question_id: &str) {
        eprintln!("  Grading: {question_id}");
    }

    fn on_question_complete(&self, result: &GradingResult) {
        eprintln!(
            "  Done: {} [{}] {:.2}/{:.2}",
            result.question_id,
            status_label(result.status),
            result.points_earned,
            result.max_points,
        );
    }

    fn on_question_error(&self, question_id: &str, error: &GradingError) {
        eprintln!("  ERROR: {question_id}: {error}");
    }

    fn on_submission_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {} graded, {failed} failed ({:.1}s)",
            total - failed,
            elapsed.as_secs_f64()
        );
    }
}

fn status_label(status: GradeStatus) -> &'static str {
    match status {
        GradeStatus::Graded => "graded",
        GradeStatus::PendingManualReview => "pending review",
        GradeStatus::AwaitingExecution => "awaiting execution",
    }
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(parallelism) = args.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
        config.parallelism = parallelism;
    }
    if let Some(secs) = args.test_timeout {
        anyhow::ensure!(secs >= 1, "test timeout must be at least 1 second");
        config.test_timeout_secs = secs;
    }
    if args.all_or_nothing {
        config.scoring = ScoringPolicy::AllOrNothing;
    }

    let quiz = parser::parse_quiz(&args.quiz)?;
    let issues = parser::validate_quiz(&quiz);
    for issue in &issues {
        tracing::warn!("quiz issue: {issue}");
    }

    let submission = parser::parse_submission(&args.submission)?;

    let grader = Grader::new(create_runner(&config), config.grader_config());
    eprintln!(
        "quizgrade v{}: grading {} answers from {} on '{}'",
        env!("CARGO_PKG_VERSION"),
        submission.answers.len(),
        submission.student_id,
        quiz.title
    );
    eprintln!();

    let report = grader
        .grade_submission(&quiz, &submission, &ConsoleProgress)
        .await;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    if args.save {
        let output = args.output.unwrap_or(config.output_dir);
        let path = report_path(&output, &report);
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn report_path(output: &Path, report: &SubmissionReport) -> PathBuf {
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let student: String = report
        .student_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    output.join(format!("{}-{student}-{timestamp}.json", report.quiz_id))
}

fn print_report(report: &SubmissionReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Status", "Points", "Feedback"]);

    for question in &report.questions {
        let (status, points, feedback) = match &question.outcome {
            QuestionOutcome::Graded(r) => (
                status_label(r.status).to_string(),
                format!("{:.2}/{:.2}", r.points_earned, r.max_points),
                r.feedback.clone().unwrap_or_default(),
            ),
            QuestionOutcome::Failed { kind, message, .. } => (
                format!("failed ({})", kind.as_str()),
                format!("-/{:.2}", question.max_points),
                message.clone(),
            ),
        };
        table.add_row(vec![
            Cell::new(&question.question_id),
            Cell::new(question.question_type),
            Cell::new(status),
            Cell::new(points),
            Cell::new(feedback),
        ]);
    }

    println!("{table}");

    let summary = &report.summary;
    println!(
        "Score: {:.2}/{:.2} ({:.1}% of graded)",
        summary.total_score, summary.graded_max_score, summary.percentage
    );
    match summary.final_percentage {
        Some(pct) => println!("Final: {pct:.1}%"),
        None => println!(
            "Final: pending ({} question(s) awaiting review)",
            summary.pending_count
        ),
    }
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_sanitizes_student_id() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "created_at": "2026-03-01T10:20:30Z",
            "quiz_id": "rust-basics",
            "quiz_title": "Rust Basics",
            "submission_id": "00000000-0000-0000-0000-000000000000",
            "student_id": "team/alice smith",
            "attempt": 1,
            "questions": [],
            "summary": {
                "total_score": 0.0, "max_score": 0.0, "graded_max_score": 0.0,
                "pending_count": 0, "percentage": 0.0, "final_percentage": null
            },
            "duration_ms": 0
        }"#;
        let report: SubmissionReport = serde_json::from_str(json).unwrap();
        let path = report_path(Path::new("out"), &report);
        assert_eq!(
            path,
            Path::new("out").join("rust-basics-team_alice_smith-2026-03-01T102030.json")
        );
    }
}
