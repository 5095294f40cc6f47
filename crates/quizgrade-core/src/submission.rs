//! A student's attempt at a quiz.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::answer::SubmittedAnswer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("submission {0} was already submitted and can no longer change")]
    AlreadySubmitted(Uuid),
}

/// Answers for one (student, quiz, attempt). Editable until submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub quiz_id: String,
    pub student_id: String,
    #[serde(default = "first_attempt")]
    pub attempt: u32,
    /// Question id to answer.
    #[serde(default)]
    pub answers: BTreeMap<String, SubmittedAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

fn first_attempt() -> u32 {
    1
}

impl Submission {
    pub fn new(quiz_id: impl Into<String>, student_id: impl Into<String>, attempt: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz_id: quiz_id.into(),
            student_id: student_id.into(),
            attempt,
            answers: BTreeMap::new(),
            submitted_at: None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// A copy with `answer` recorded for `question_id`, replacing any
    /// earlier answer.
    pub fn with_answer(
        &self,
        question_id: impl Into<String>,
        answer: SubmittedAnswer,
    ) -> Result<Submission, SubmissionError> {
        if self.is_submitted() {
            return Err(SubmissionError::AlreadySubmitted(self.id));
        }
        let mut next = self.clone();
        next.answers.insert(question_id.into(), answer);
        Ok(next)
    }

    /// Freeze the submission at `at`.
    pub fn submit(&self, at: DateTime<Utc>) -> Result<Submission, SubmissionError> {
        if self.is_submitted() {
            return Err(SubmissionError::AlreadySubmitted(self.id));
        }
        Ok(Submission {
            submitted_at: Some(at),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_can_be_replaced_until_submitted() {
        let draft = Submission::new("quiz-1", "student-7", 1)
            .with_answer("q1", SubmittedAnswer::TrueFalse { answer: false })
            .unwrap();
        let draft = draft
            .with_answer("q1", SubmittedAnswer::TrueFalse { answer: true })
            .unwrap();
        assert_eq!(
            draft.answers["q1"],
            SubmittedAnswer::TrueFalse { answer: true }
        );

        let submitted = draft.submit(Utc::now()).unwrap();
        assert!(submitted.is_submitted());
        assert!(!draft.is_submitted());

        let err = submitted
            .with_answer("q2", SubmittedAnswer::TrueFalse { answer: true })
            .unwrap_err();
        assert_eq!(err, SubmissionError::AlreadySubmitted(submitted.id));
        assert!(submitted.submit(Utc::now()).is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "quiz_id": "quiz-1",
            "student_id": "s1",
            "answers": { "q1": { "type": "single_choice", "selected_index": 2 } }
        }"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.attempt, 1);
        assert_eq!(submission.answers.len(), 1);
        assert!(submission.submitted_at.is_none());
    }
}
