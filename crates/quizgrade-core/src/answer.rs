//! Submitted answers, one shape per question type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expression::{Expression, ExpressionError, Token};
use crate::model::QuestionType;

/// A student's expression, either as free text or as a token list built by
/// an expression editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionInput {
    Text(String),
    Tokens(Vec<Token>),
}

impl ExpressionInput {
    pub fn to_expression(&self) -> Result<Expression, ExpressionError> {
        match self {
            ExpressionInput::Text(text) => Expression::parse(text),
            ExpressionInput::Tokens(tokens) => Ok(Expression::new(tokens.clone())),
        }
    }
}

/// An answer to a single question. Ids and indices refer to the question's
/// authoring data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmittedAnswer {
    SingleChoice {
        selected_index: usize,
    },
    MultipleChoice {
        selected_indices: Vec<usize>,
    },
    TrueFalse {
        answer: bool,
    },
    Matching {
        /// Left item id to right item id.
        matches: BTreeMap<String, String>,
    },
    FillBlank {
        answers: Vec<String>,
    },
    Dropdown {
        /// Selected option text per dropdown; empty means unanswered.
        selections: Vec<String>,
    },
    Numerical {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Algorithmic {
        solution: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    ShortAnswer {
        text: String,
    },
    Coding {
        code: String,
    },
    LogicalExpression {
        expression: ExpressionInput,
    },
    DragDrop {
        /// Drop zone id to the item ids placed in it.
        placements: BTreeMap<String, Vec<String>>,
    },
    Ordering {
        order: Vec<String>,
    },
}

impl SubmittedAnswer {
    pub fn question_type(&self) -> QuestionType {
        match self {
            SubmittedAnswer::SingleChoice { .. } => QuestionType::SingleChoice,
            SubmittedAnswer::MultipleChoice { .. } => QuestionType::MultipleChoice,
            SubmittedAnswer::TrueFalse { .. } => QuestionType::TrueFalse,
            SubmittedAnswer::Matching { .. } => QuestionType::Matching,
            SubmittedAnswer::FillBlank { .. } => QuestionType::FillBlank,
            SubmittedAnswer::Dropdown { .. } => QuestionType::Dropdown,
            SubmittedAnswer::Numerical { .. } => QuestionType::Numerical,
            SubmittedAnswer::Algorithmic { .. } => QuestionType::Algorithmic,
            SubmittedAnswer::ShortAnswer { .. } => QuestionType::ShortAnswer,
            SubmittedAnswer::Coding { .. } => QuestionType::Coding,
            SubmittedAnswer::LogicalExpression { .. } => QuestionType::LogicalExpression,
            SubmittedAnswer::DragDrop { .. } => QuestionType::DragDrop,
            SubmittedAnswer::Ordering { .. } => QuestionType::Ordering,
        }
    }
}
