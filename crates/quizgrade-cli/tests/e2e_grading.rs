//! End-to-end grading tests over the sample quiz with a scripted runner.
//!
//! These exercise the whole pipeline (parse → validate → grade → aggregate
//! → report) without executing any student code.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quizgrade_core::answer::SubmittedAnswer;
use quizgrade_core::engine::{GraderConfig, Grader, NoopProgress};
use quizgrade_core::error::{FailureKind, MalformedReason};
use quizgrade_core::model::{QuestionType, Quiz, ScoringPolicy};
use quizgrade_core::parser;
use quizgrade_core::report::QuestionOutcome;
use quizgrade_core::results::GradeStatus;
use quizgrade_core::submission::Submission;
use quizgrade_runner::{ScriptedOutcome, ScriptedRunner};

fn sample_quiz() -> Quiz {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../quizzes/sample-quiz.toml");
    parser::parse_quiz(&path).unwrap()
}

fn sample_submission() -> Submission {
    let path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../submissions/sample-submission.json");
    parser::parse_submission(&path).unwrap()
}

fn grader(runner: ScriptedRunner, scoring: ScoringPolicy) -> (Arc<ScriptedRunner>, Grader) {
    let runner = Arc::new(runner);
    let config = GraderConfig {
        parallelism: 3,
        test_timeout: Duration::from_secs(5),
        scoring,
    };
    (runner.clone(), Grader::new(runner, config))
}

#[test]
fn sample_quiz_covers_every_type_and_is_valid() {
    let quiz = sample_quiz();
    let mut types: Vec<QuestionType> = quiz.questions.iter().map(|q| q.question_type()).collect();
    types.sort();
    types.dedup();
    assert_eq!(types.len(), QuestionType::ALL.len());
    assert!(parser::validate_quiz(&quiz).is_empty());
}

#[tokio::test]
async fn e2e_sample_submission() {
    let quiz = sample_quiz();
    let submission = sample_submission();
    let (runner, grader) = grader(ScriptedRunner::passing(), ScoringPolicy::PartialCredit);

    let report = grader
        .grade_submission(&quiz, &submission, &NoopProgress)
        .await;

    // Two algorithmic cases plus two coding cases.
    assert_eq!(runner.call_count(), 4);
    assert_eq!(report.questions.len(), 13);
    assert_eq!(report.failure_count(), 0);
    assert!(report.warnings.is_empty());

    let order: Vec<&str> = report
        .questions
        .iter()
        .map(|q| q.question_id.as_str())
        .collect();
    let expected: Vec<&str> = quiz.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(order, expected);

    let matching = report.question("match-traits").unwrap();
    let result = matching.outcome.result().unwrap();
    assert!((result.points_earned - 2.0).abs() < 1e-9);
    assert_eq!(result.is_correct, Some(false));

    let essay = report.question("sa-borrow").unwrap().outcome.result().unwrap();
    assert_eq!(essay.status, GradeStatus::PendingManualReview);

    let logic = report.question("logic-xor").unwrap().outcome.result().unwrap();
    assert_eq!(logic.is_correct, Some(true));

    assert!((report.summary.total_score - 23.0).abs() < 1e-9);
    assert!((report.summary.graded_max_score - 26.0).abs() < 1e-9);
    assert!((report.summary.max_score - 30.0).abs() < 1e-9);
    assert_eq!(report.summary.pending_count, 1);
    assert_eq!(report.summary.final_percentage, None);

    let reviewed = report
        .with_manual_score("sa-borrow", 4.0, Some("complete".into()))
        .unwrap();
    assert!(reviewed.summary.is_final());
    assert!((reviewed.summary.total_score - 27.0).abs() < 1e-9);
    assert!((reviewed.summary.percentage - 90.0).abs() < 1e-9);
}

#[tokio::test]
async fn e2e_all_or_nothing_policy() {
    let quiz = sample_quiz();
    let submission = sample_submission();
    let (_, grader) = grader(ScriptedRunner::passing(), ScoringPolicy::AllOrNothing);

    let report = grader
        .grade_submission(&quiz, &submission, &NoopProgress)
        .await;

    // Matching drops to zero; ordering keeps its own partial credit flag.
    let matching = report.question("match-traits").unwrap().outcome.result().unwrap();
    assert_eq!(matching.points_earned, 0.0);
    let ordering = report.question("order-build").unwrap().outcome.result().unwrap();
    assert!((ordering.points_earned - 1.0).abs() < 1e-9);
    assert!((report.summary.total_score - 21.0).abs() < 1e-9);
}

#[tokio::test]
async fn e2e_runner_failures_are_per_test_case() {
    let quiz = sample_quiz();
    let submission = sample_submission();
    let runner = ScriptedRunner::passing()
        .with_outcome(
            "negative",
            ScriptedOutcome::Fail {
                actual_output: "-5".into(),
            },
        )
        .with_outcome(
            "zero",
            ScriptedOutcome::Error {
                message: "sandbox unavailable".into(),
            },
        );
    let (_, grader) = grader(runner, ScoringPolicy::PartialCredit);

    let report = grader
        .grade_submission(&quiz, &submission, &NoopProgress)
        .await;

    let coding = report.question("code-sum").unwrap().outcome.result().unwrap();
    assert!((coding.points_earned - 2.0).abs() < 1e-9);
    assert_eq!(coding.test_outcomes.len(), 2);

    let algo = report.question("algo-double").unwrap().outcome.result().unwrap();
    assert!((algo.points_earned - 1.0).abs() < 1e-9);
    let zero = algo
        .test_outcomes
        .iter()
        .find(|o| o.test_case_id == "zero")
        .unwrap();
    assert!(!zero.passed);
    assert!(zero.error.as_deref().unwrap().contains("sandbox unavailable"));
}

#[tokio::test]
async fn e2e_bad_answers_do_not_stop_grading() {
    let quiz = sample_quiz();
    let mut submission = sample_submission();
    submission.answers.insert(
        "order-build".into(),
        SubmittedAnswer::Ordering {
            order: vec!["parse".into(), "parse".into(), "codegen".into()],
        },
    );
    submission.answers.insert(
        "tf-gc".into(),
        SubmittedAnswer::SingleChoice { selected_index: 0 },
    );
    submission.answers.remove("num-bits");
    submission.answers.insert(
        "extra".into(),
        SubmittedAnswer::TrueFalse { answer: true },
    );
    let (_, grader) = grader(ScriptedRunner::passing(), ScoringPolicy::PartialCredit);

    let report = grader
        .grade_submission(&quiz, &submission, &NoopProgress)
        .await;

    assert_eq!(report.questions.len(), 13);
    assert_eq!(report.failure_count(), 2);
    match &report.question("order-build").unwrap().outcome {
        QuestionOutcome::Failed { kind, reason, .. } => {
            assert_eq!(*kind, FailureKind::MalformedAnswer);
            assert_eq!(*reason, Some(MalformedReason::DuplicateSelection));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &report.question("tf-gc").unwrap().outcome {
        QuestionOutcome::Failed { kind, reason, .. } => {
            assert_eq!(*kind, FailureKind::MalformedAnswer);
            assert_eq!(*reason, Some(MalformedReason::TypeMismatch));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let unanswered = report.question("num-bits").unwrap().outcome.result().unwrap();
    assert_eq!(unanswered.points_earned, 0.0);
    assert_eq!(unanswered.is_correct, Some(false));

    assert!(report.warnings.iter().any(|w| w.contains("extra")));
    // 23 minus ordering (1), true/false (1) and numerical (1).
    assert!((report.summary.total_score - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn e2e_report_roundtrip() {
    let quiz = sample_quiz();
    let submission = sample_submission();
    let (_, grader) = grader(ScriptedRunner::passing(), ScoringPolicy::PartialCredit);
    let report = grader
        .grade_submission(&quiz, &submission, &NoopProgress)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.save_json(&path).unwrap();

    let loaded = quizgrade_core::report::SubmissionReport::load_json(&path).unwrap();
    assert_eq!(loaded.submission_id, submission.id);
    assert_eq!(loaded.summary, report.summary);
    assert_eq!(loaded.questions.len(), 13);
}
