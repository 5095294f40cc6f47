//! Grading error types.
//!
//! None of these mean "wrong answer". They are kept apart from incorrect
//! results so that a broken question or an unreadable submission is never
//! silently scored as zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expression::ExpressionError;
use crate::validation::ValidationError;

/// Why an answer could not be matched against its question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    /// Answer variant does not match the question type.
    TypeMismatch,
    /// An index is outside the question's option list.
    IndexOutOfRange,
    /// An id does not exist in the question.
    UnknownId,
    /// The same index or id was submitted more than once.
    DuplicateSelection,
    /// More responses than the question has slots for.
    TooManyResponses,
    /// An ordering does not cover every item exactly once.
    IncompleteSequence,
    /// A numeric answer is NaN or infinite.
    InvalidNumber,
    /// Text exceeds the configured maximum length.
    TooLong,
}

impl MalformedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MalformedReason::TypeMismatch => "type_mismatch",
            MalformedReason::IndexOutOfRange => "index_out_of_range",
            MalformedReason::UnknownId => "unknown_id",
            MalformedReason::DuplicateSelection => "duplicate_selection",
            MalformedReason::TooManyResponses => "too_many_responses",
            MalformedReason::IncompleteSequence => "incomplete_sequence",
            MalformedReason::InvalidNumber => "invalid_number",
            MalformedReason::TooLong => "too_long",
        }
    }
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while grading a single question.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    /// The question definition failed validation.
    #[error("question '{question_id}' is misconfigured: {}", join_errors(.errors))]
    Configuration {
        question_id: String,
        errors: Vec<ValidationError>,
    },

    /// The answer references ids or indices the question does not have.
    #[error("malformed answer for question '{question_id}' ({reason}): {detail}")]
    MalformedAnswer {
        question_id: String,
        reason: MalformedReason,
        detail: String,
    },

    /// The submitted expression is not a valid token stream.
    #[error("invalid expression: {0}")]
    MalformedExpression(String),

    /// The submitted expression uses a variable the question does not declare.
    #[error("invalid expression: unknown variable '{0}'")]
    UnknownVariable(String),

    /// A manual score was outside the question's point range.
    #[error("manual score {points} is outside 0..={max_points}")]
    InvalidManualScore { points: f64, max_points: f64 },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ExpressionError> for GradingError {
    fn from(err: ExpressionError) -> Self {
        match err {
            ExpressionError::Malformed(msg) => GradingError::MalformedExpression(msg),
            ExpressionError::UnknownVariable(name) => GradingError::UnknownVariable(name),
        }
    }
}

/// Stable, serializable classification of a grading failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    MalformedAnswer,
    MalformedExpression,
    UnknownVariable,
    InvalidManualScore,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::MalformedAnswer => "malformed_answer",
            FailureKind::MalformedExpression => "malformed_expression",
            FailureKind::UnknownVariable => "unknown_variable",
            FailureKind::InvalidManualScore => "invalid_manual_score",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GradingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GradingError::Configuration { .. } => FailureKind::Configuration,
            GradingError::MalformedAnswer { .. } => FailureKind::MalformedAnswer,
            GradingError::MalformedExpression(_) => FailureKind::MalformedExpression,
            GradingError::UnknownVariable(_) => FailureKind::UnknownVariable,
            GradingError::InvalidManualScore { .. } => FailureKind::InvalidManualScore,
        }
    }

    /// Returns `true` if the student can fix this before final submission.
    pub fn is_student_fixable(&self) -> bool {
        matches!(
            self,
            GradingError::MalformedExpression(_) | GradingError::UnknownVariable(_)
        )
    }

    /// The malformed-answer reason code, if applicable.
    pub fn malformed_reason(&self) -> Option<MalformedReason> {
        match self {
            GradingError::MalformedAnswer { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
