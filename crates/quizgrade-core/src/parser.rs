//! Quiz and submission file loading.
//!
//! Quizzes are TOML or JSON (chosen by file extension) with a `[quiz]`
//! header and a `[[questions]]` list. Submissions are JSON.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{QuestionDefinition, Quiz};
use crate::submission::Submission;
use crate::validation::validate_question;

/// On-disk quiz layout.
#[derive(Debug, Serialize, Deserialize)]
struct QuizFile {
    quiz: QuizHeader,
    #[serde(default)]
    questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QuizHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    weights: std::collections::BTreeMap<String, f64>,
}

/// Supported quiz file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizFormat {
    Toml,
    Json,
}

impl QuizFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "toml" => Some(QuizFormat::Toml),
            "json" => Some(QuizFormat::Json),
            _ => None,
        }
    }
}

/// Parse a single quiz file.
pub fn parse_quiz(path: &Path) -> Result<Quiz> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_str(&content, path)
}

/// Parse quiz text; the format follows `source_path`'s extension and
/// defaults to TOML.
pub fn parse_quiz_str(content: &str, source_path: &Path) -> Result<Quiz> {
    let format = QuizFormat::from_path(source_path).unwrap_or(QuizFormat::Toml);
    let parsed: QuizFile = match format {
        QuizFormat::Toml => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
        QuizFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
    };

    Ok(Quiz {
        id: parsed.quiz.id,
        title: parsed.quiz.title,
        description: parsed.quiz.description,
        questions: parsed.questions,
        weights: parsed.quiz.weights,
    })
}

/// Render a quiz in the on-disk TOML layout.
pub fn quiz_to_toml(quiz: &Quiz) -> Result<String> {
    let file = QuizFile {
        quiz: QuizHeader {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            weights: quiz.weights.clone(),
        },
        questions: quiz.questions.clone(),
    };
    toml::to_string_pretty(&file).context("failed to serialize quiz as TOML")
}

/// Recursively load all quiz files from a directory, skipping files that
/// fail to parse.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<Quiz>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    let mut quizzes = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            quizzes.extend(load_quiz_directory(&path)?);
        } else if QuizFormat::from_path(&path).is_some() {
            match parse_quiz(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(quizzes)
}

/// Load a quiz file, or every quiz under a directory.
pub fn load_quizzes(path: &Path) -> Result<Vec<Quiz>> {
    if path.is_dir() {
        load_quiz_directory(path)
    } else {
        Ok(vec![parse_quiz(path)?])
    }
}

/// Parse a JSON submission file.
pub fn parse_submission(path: &Path) -> Result<Submission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submission: {}", path.display()))
}

/// A problem found in a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizIssue {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

impl fmt::Display for QuizIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.question_id {
            Some(id) => write!(f, "[{id}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Validate a quiz: its questions and the quiz-level invariants.
pub fn validate_quiz(quiz: &Quiz) -> Vec<QuizIssue> {
    let mut issues = Vec::new();

    if quiz.questions.is_empty() {
        issues.push(QuizIssue {
            question_id: None,
            message: "quiz has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &quiz.questions {
        if !seen_ids.insert(question.id.as_str()) {
            issues.push(QuizIssue {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &quiz.questions {
        for error in validate_question(question) {
            issues.push(QuizIssue {
                question_id: Some(question.id.clone()),
                message: error.to_string(),
            });
        }
    }

    for (id, weight) in &quiz.weights {
        if !seen_ids.contains(id.as_str()) {
            issues.push(QuizIssue {
                question_id: Some(id.clone()),
                message: "weight given for a question that is not in the quiz".into(),
            });
        }
        if !weight.is_finite() || *weight < 0.0 {
            issues.push(QuizIssue {
                question_id: Some(id.clone()),
                message: format!("weight {weight} must be a finite, non-negative number"),
            });
        }
    }

    issues
}
