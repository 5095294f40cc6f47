//! Per-question grading results.

use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::model::QuestionDefinition;

/// Where a result stands in the grading lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    /// Scored automatically or by an instructor.
    Graded,
    /// Needs an instructor (short answers).
    PendingManualReview,
    /// Needs the external test runner (coding, algorithmic).
    AwaitingExecution,
}

/// Result of one test case reported by the test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    pub test_case_id: String,
    pub passed: bool,
    #[serde(default)]
    pub actual_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCaseOutcome {
    pub fn passed(test_case_id: impl Into<String>, actual_output: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            passed: true,
            actual_output: actual_output.into(),
            error: None,
        }
    }

    pub fn failed(test_case_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            passed: false,
            actual_output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// The outcome of grading one answer against one question.
///
/// Always recomputable from the question and the answer; never the
/// authoritative record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub question_id: String,
    pub status: GradeStatus,
    /// Set only when `status` is [`GradeStatus::Graded`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub points_earned: f64,
    pub max_points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_outcomes: Vec<TestCaseOutcome>,
}

impl GradingResult {
    /// A graded result. `points_earned` is clamped into `0..=points`.
    pub fn graded(
        question: &QuestionDefinition,
        is_correct: bool,
        points_earned: f64,
        feedback: Option<String>,
    ) -> Self {
        Self {
            question_id: question.id.clone(),
            status: GradeStatus::Graded,
            is_correct: Some(is_correct),
            points_earned: points_earned.max(0.0).min(question.points),
            max_points: question.points,
            feedback,
            test_outcomes: Vec::new(),
        }
    }

    /// Full points when correct, zero otherwise.
    pub fn all_or_nothing(
        question: &QuestionDefinition,
        is_correct: bool,
        feedback: Option<String>,
    ) -> Self {
        let earned = if is_correct { question.points } else { 0.0 };
        Self::graded(question, is_correct, earned, feedback)
    }

    /// An incorrect result for a question the student left blank.
    pub fn unanswered(question: &QuestionDefinition) -> Self {
        let feedback = if question.is_required {
            "required question was not answered"
        } else {
            "no answer submitted"
        };
        Self::graded(question, false, 0.0, Some(feedback.to_string()))
    }

    pub fn pending_review(question: &QuestionDefinition, feedback: Option<String>) -> Self {
        Self {
            question_id: question.id.clone(),
            status: GradeStatus::PendingManualReview,
            is_correct: None,
            points_earned: 0.0,
            max_points: question.points,
            feedback,
            test_outcomes: Vec::new(),
        }
    }

    pub fn awaiting_execution(question: &QuestionDefinition) -> Self {
        Self {
            question_id: question.id.clone(),
            status: GradeStatus::AwaitingExecution,
            is_correct: None,
            points_earned: 0.0,
            max_points: question.points,
            feedback: Some("awaiting test runner".to_string()),
            test_outcomes: Vec::new(),
        }
    }

    /// Whether this result still waits on an instructor or the test runner.
    pub fn is_pending(&self) -> bool {
        self.status != GradeStatus::Graded
    }

    /// Record an instructor's score for a pending result.
    pub fn resolve_manual(
        &self,
        points: f64,
        feedback: Option<String>,
    ) -> Result<GradingResult, GradingError> {
        if !points.is_finite() || points < 0.0 || points > self.max_points {
            return Err(GradingError::InvalidManualScore {
                points,
                max_points: self.max_points,
            });
        }
        Ok(GradingResult {
            status: GradeStatus::Graded,
            is_correct: Some(points >= self.max_points),
            points_earned: points,
            feedback: feedback.or_else(|| self.feedback.clone()),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionData, ShortAnswerData, TrueFalseData};

    fn true_false(points: f64) -> QuestionDefinition {
        QuestionDefinition::new(
            "tf",
            "The sky is blue.",
            points,
            QuestionData::TrueFalse(TrueFalseData {
                correct_answer: true,
            }),
        )
    }

    #[test]
    fn graded_clamps_points() {
        let q = true_false(2.0);
        let r = GradingResult::graded(&q, true, 5.0, None);
        assert_eq!(r.points_earned, 2.0);
        let r = GradingResult::graded(&q, false, -1.0, None);
        assert_eq!(r.points_earned, 0.0);
    }

    #[test]
    fn unanswered_required_question_mentions_requirement() {
        let mut q = true_false(1.0);
        q.is_required = true;
        let r = GradingResult::unanswered(&q);
        assert_eq!(r.is_correct, Some(false));
        assert!(r.feedback.unwrap().contains("required"));
    }

    #[test]
    fn resolve_manual_scores_pending_result() {
        let q = QuestionDefinition::new(
            "sa",
            "Explain ownership.",
            4.0,
            QuestionData::ShortAnswer(ShortAnswerData {
                max_length: None,
                keywords: vec![],
                sample_answer: None,
            }),
        );
        let pending = GradingResult::pending_review(&q, None);
        assert!(pending.is_pending());
        assert_eq!(pending.is_correct, None);

        let resolved = pending
            .resolve_manual(3.0, Some("good".into()))
            .unwrap();
        assert_eq!(resolved.status, GradeStatus::Graded);
        assert_eq!(resolved.points_earned, 3.0);
        assert_eq!(resolved.is_correct, Some(false));
        assert!(!resolved.is_pending());

        assert!(matches!(
            pending.resolve_manual(4.5, None),
            Err(GradingError::InvalidManualScore { .. })
        ));
    }
}
