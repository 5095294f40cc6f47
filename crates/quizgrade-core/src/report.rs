//! Submission reports with JSON persistence.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate, ScoreSummary};
use crate::error::{FailureKind, GradingError, MalformedReason};
use crate::model::{QuestionType, Quiz};
use crate::results::{GradeStatus, GradingResult};
use crate::submission::Submission;

/// A graded submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub quiz_id: String,
    pub quiz_title: String,
    pub submission_id: Uuid,
    pub student_id: String,
    pub attempt: u32,
    /// One entry per quiz question, in quiz order.
    pub questions: Vec<QuestionReport>,
    pub summary: ScoreSummary,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReport {
    pub question_id: String,
    pub question_type: QuestionType,
    pub weight: f64,
    pub max_points: f64,
    pub outcome: QuestionOutcome,
}

/// Either a result or the reason grading failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    Graded(GradingResult),
    Failed {
        kind: FailureKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<MalformedReason>,
        message: String,
    },
}

impl QuestionOutcome {
    pub fn failed(error: &GradingError) -> Self {
        QuestionOutcome::Failed {
            kind: error.kind(),
            reason: error.malformed_reason(),
            message: error.to_string(),
        }
    }

    pub fn result(&self) -> Option<&GradingResult> {
        match self {
            QuestionOutcome::Graded(r) => Some(r),
            QuestionOutcome::Failed { .. } => None,
        }
    }
}

impl QuestionReport {
    /// The result this question contributes to the score.
    ///
    /// Broken questions wait for an instructor like pending reviews; bad
    /// answers score zero.
    pub fn scoring_view(&self) -> GradingResult {
        match &self.outcome {
            QuestionOutcome::Graded(r) => r.clone(),
            QuestionOutcome::Failed { kind, message, .. } => {
                let status = if *kind == FailureKind::Configuration {
                    GradeStatus::PendingManualReview
                } else {
                    GradeStatus::Graded
                };
                GradingResult {
                    question_id: self.question_id.clone(),
                    status,
                    is_correct: (status == GradeStatus::Graded).then_some(false),
                    points_earned: 0.0,
                    max_points: self.max_points,
                    feedback: Some(message.clone()),
                    test_outcomes: Vec::new(),
                }
            }
        }
    }
}

/// Score a list of question reports with their weights.
fn summarize(questions: &[QuestionReport], warnings: &mut Vec<String>) -> ScoreSummary {
    let views: Vec<GradingResult> = questions.iter().map(QuestionReport::scoring_view).collect();
    let weights: Vec<f64> = questions.iter().map(|q| q.weight).collect();
    match aggregate(&views, &weights) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("ignoring quiz weights: {e}");
            let warning = format!("quiz weights ignored: {e}");
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
            // Unit weights cannot fail.
            aggregate(&views, &[]).unwrap_or_default()
        }
    }
}

impl SubmissionReport {
    pub fn new(
        id: Uuid,
        quiz: &Quiz,
        submission: &Submission,
        questions: Vec<QuestionReport>,
        mut warnings: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        let summary = summarize(&questions, &mut warnings);
        Self {
            id,
            created_at: Utc::now(),
            quiz_id: quiz.id.clone(),
            quiz_title: quiz.title.clone(),
            submission_id: submission.id,
            student_id: submission.student_id.clone(),
            attempt: submission.attempt,
            questions,
            summary,
            warnings,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&QuestionReport> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    /// Number of questions whose grading failed.
    pub fn failure_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| matches!(q.outcome, QuestionOutcome::Failed { .. }))
            .count()
    }

    /// A copy with an instructor's score recorded for a pending question.
    pub fn with_manual_score(
        &self,
        question_id: &str,
        points: f64,
        feedback: Option<String>,
    ) -> Result<SubmissionReport> {
        let mut next = self.clone();
        let entry = next
            .questions
            .iter_mut()
            .find(|q| q.question_id == question_id)
            .with_context(|| format!("question '{question_id}' is not in this report"))?;

        let pending = match &entry.outcome {
            QuestionOutcome::Graded(r) if r.status == GradeStatus::PendingManualReview => r,
            QuestionOutcome::Graded(_) => {
                anyhow::bail!("question '{question_id}' is not pending manual review")
            }
            QuestionOutcome::Failed { message, .. } => {
                anyhow::bail!("question '{question_id}' failed to grade: {message}")
            }
        };
        let resolved = pending.resolve_manual(points, feedback)?;
        entry.outcome = QuestionOutcome::Graded(resolved);

        next.summary = summarize(&next.questions, &mut next.warnings);
        Ok(next)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SubmissionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
