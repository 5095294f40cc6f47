//! Core data model types for quizgrade.
//!
//! A [`QuestionDefinition`] pairs common metadata with a [`QuestionData`]
//! payload whose shape is selected by the question's [`QuestionType`].
//! On the wire the type lives next to the metadata and the payload sits
//! under `data`:
//!
//! ```json
//! { "id": "q1", "type": "true_false", "text": "...", "points": 1,
//!   "data": { "correct_answer": true } }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::expression::{ExpressionFormat, TruthTableRow};

/// Marker for a blank in fill-in-the-blank question text.
pub const BLANK_MARKER: &str = "{{blank}}";

/// Marker for a dropdown in dropdown question text.
pub const DROPDOWN_MARKER: &str = "{{dropdown}}";

/// The closed set of question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    Matching,
    FillBlank,
    Dropdown,
    Numerical,
    Algorithmic,
    ShortAnswer,
    Coding,
    LogicalExpression,
    DragDrop,
    Ordering,
}

impl QuestionType {
    pub const ALL: [QuestionType; 13] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::Matching,
        QuestionType::FillBlank,
        QuestionType::Dropdown,
        QuestionType::Numerical,
        QuestionType::Algorithmic,
        QuestionType::ShortAnswer,
        QuestionType::Coding,
        QuestionType::LogicalExpression,
        QuestionType::DragDrop,
        QuestionType::Ordering,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Matching => "matching",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Numerical => "numerical",
            QuestionType::Algorithmic => "algorithmic",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Coding => "coding",
            QuestionType::LogicalExpression => "logical_expression",
            QuestionType::DragDrop => "drag_drop",
            QuestionType::Ordering => "ordering",
        }
    }

    /// Whether grading this type needs the external test runner.
    pub fn requires_execution(self) -> bool {
        matches!(self, QuestionType::Algorithmic | QuestionType::Coding)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// How sub-item questions (matching, dropdown, fill-blank) are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Award `points * correct / total`.
    #[default]
    PartialCredit,
    /// Award full points only when every sub-item is correct.
    AllOrNothing,
}

/// A text item with a stable id (matching sides, draggable items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledItem {
    pub id: String,
    pub text: String,
}

impl LabeledItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleChoiceData {
    pub options: Vec<String>,
    pub correct_option_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceData {
    pub options: Vec<String>,
    pub correct_option_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

impl MultipleChoiceData {
    /// Effective minimum number of selections (0 when unset).
    pub fn min_bound(&self) -> usize {
        self.min_selections.unwrap_or(0)
    }

    /// Effective maximum number of selections (all options when unset).
    pub fn max_bound(&self) -> usize {
        self.max_selections.unwrap_or(self.options.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseData {
    pub correct_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingData {
    pub left_items: Vec<LabeledItem>,
    pub right_items: Vec<LabeledItem>,
    /// Left item id to right item id.
    pub correct_matches: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlankSpec {
    pub acceptable_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillBlankData {
    /// Question text with one [`BLANK_MARKER`] per blank.
    pub text: String,
    pub blanks: Vec<BlankSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownSpec {
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownData {
    /// Question text with one [`DROPDOWN_MARKER`] per dropdown.
    pub text: String,
    pub dropdowns: Vec<DropdownSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalData {
    pub correct_answer: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptable_range: Option<NumericRange>,
}

/// A test case executed by the external test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub input: String,
    pub expected_output: String,
    #[serde(default = "default_test_points")]
    pub points: f64,
    /// Hidden cases are not shown to students before grading.
    #[serde(default)]
    pub hidden: bool,
}

fn default_test_points() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmicData {
    pub description: String,
    #[serde(default)]
    pub input_format: String,
    #[serde(default)]
    pub output_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingData {
    pub language: String,
    #[serde(default)]
    pub starter_code: String,
    pub test_cases: Vec<TestCase>,
}

/// Declared type of an expression variable. Only booleans are evaluable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    #[default]
    Boolean,
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariableType,
}

impl VariableSpec {
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableType::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalExpressionData {
    #[serde(default)]
    pub expression_format: ExpressionFormat,
    pub variables: Vec<VariableSpec>,
    pub correct_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth_table: Option<Vec<TruthTableRow>>,
}

impl LogicalExpressionData {
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub correct_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragDropData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub drop_zones: Vec<DropZone>,
    pub draggable_items: Vec<LabeledItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub text: String,
    /// 1-based position in the correct sequence.
    pub target_position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingData {
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub allow_partial_credit: bool,
}

/// The per-type authoring payload.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionData {
    SingleChoice(SingleChoiceData),
    MultipleChoice(MultipleChoiceData),
    TrueFalse(TrueFalseData),
    Matching(MatchingData),
    FillBlank(FillBlankData),
    Dropdown(DropdownData),
    Numerical(NumericalData),
    Algorithmic(AlgorithmicData),
    ShortAnswer(ShortAnswerData),
    Coding(CodingData),
    LogicalExpression(LogicalExpressionData),
    DragDrop(DragDropData),
    Ordering(OrderingData),
}

impl QuestionData {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionData::SingleChoice(_) => QuestionType::SingleChoice,
            QuestionData::MultipleChoice(_) => QuestionType::MultipleChoice,
            QuestionData::TrueFalse(_) => QuestionType::TrueFalse,
            QuestionData::Matching(_) => QuestionType::Matching,
            QuestionData::FillBlank(_) => QuestionType::FillBlank,
            QuestionData::Dropdown(_) => QuestionType::Dropdown,
            QuestionData::Numerical(_) => QuestionType::Numerical,
            QuestionData::Algorithmic(_) => QuestionType::Algorithmic,
            QuestionData::ShortAnswer(_) => QuestionType::ShortAnswer,
            QuestionData::Coding(_) => QuestionType::Coding,
            QuestionData::LogicalExpression(_) => QuestionType::LogicalExpression,
            QuestionData::DragDrop(_) => QuestionType::DragDrop,
            QuestionData::Ordering(_) => QuestionType::Ordering,
        }
    }

    /// Decode a payload for the given type from a JSON value.
    pub fn from_value(
        question_type: QuestionType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        use serde_json::from_value;

        Ok(match question_type {
            QuestionType::SingleChoice => QuestionData::SingleChoice(from_value(value)?),
            QuestionType::MultipleChoice => QuestionData::MultipleChoice(from_value(value)?),
            QuestionType::TrueFalse => QuestionData::TrueFalse(from_value(value)?),
            QuestionType::Matching => QuestionData::Matching(from_value(value)?),
            QuestionType::FillBlank => QuestionData::FillBlank(from_value(value)?),
            QuestionType::Dropdown => QuestionData::Dropdown(from_value(value)?),
            QuestionType::Numerical => QuestionData::Numerical(from_value(value)?),
            QuestionType::Algorithmic => QuestionData::Algorithmic(from_value(value)?),
            QuestionType::ShortAnswer => QuestionData::ShortAnswer(from_value(value)?),
            QuestionType::Coding => QuestionData::Coding(from_value(value)?),
            QuestionType::LogicalExpression => {
                QuestionData::LogicalExpression(from_value(value)?)
            }
            QuestionType::DragDrop => QuestionData::DragDrop(from_value(value)?),
            QuestionType::Ordering => QuestionData::Ordering(from_value(value)?),
        })
    }

    /// Encode the payload as a JSON value (without the type tag).
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        use serde_json::to_value;

        match self {
            QuestionData::SingleChoice(d) => to_value(d),
            QuestionData::MultipleChoice(d) => to_value(d),
            QuestionData::TrueFalse(d) => to_value(d),
            QuestionData::Matching(d) => to_value(d),
            QuestionData::FillBlank(d) => to_value(d),
            QuestionData::Dropdown(d) => to_value(d),
            QuestionData::Numerical(d) => to_value(d),
            QuestionData::Algorithmic(d) => to_value(d),
            QuestionData::ShortAnswer(d) => to_value(d),
            QuestionData::Coding(d) => to_value(d),
            QuestionData::LogicalExpression(d) => to_value(d),
            QuestionData::DragDrop(d) => to_value(d),
            QuestionData::Ordering(d) => to_value(d),
        }
    }
}

/// A question as authored. Treat published definitions as immutable and
/// use [`QuestionDefinition::revise`] to produce a new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct QuestionDefinition {
    pub id: String,
    pub text: String,
    /// Maximum points; must be positive.
    pub points: f64,
    pub time_limit_seconds: Option<u32>,
    pub is_required: bool,
    pub version: u32,
    /// Per-question override of the grader's scoring policy.
    pub scoring: Option<ScoringPolicy>,
    pub data: QuestionData,
}

impl QuestionDefinition {
    pub fn new(id: impl Into<String>, text: impl Into<String>, points: f64, data: QuestionData) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            points,
            time_limit_seconds: None,
            is_required: false,
            version: 1,
            scoring: None,
            data,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.data.question_type()
    }

    /// Produce the next version of this question with `edit` applied.
    pub fn revise(&self, edit: impl FnOnce(&mut QuestionDefinition)) -> QuestionDefinition {
        let mut next = self.clone();
        edit(&mut next);
        next.id = self.id.clone();
        next.version = self.version + 1;
        next
    }
}

/// Wire shape of a question: the payload is decoded once `type` is known.
#[derive(Serialize, Deserialize)]
struct RawQuestion {
    id: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    text: String,
    points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_limit_seconds: Option<u32>,
    #[serde(default)]
    is_required: bool,
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scoring: Option<ScoringPolicy>,
    data: serde_json::Value,
}

fn default_version() -> u32 {
    1
}

impl TryFrom<RawQuestion> for QuestionDefinition {
    type Error = String;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let data = QuestionData::from_value(raw.question_type, raw.data).map_err(|e| {
            format!(
                "invalid data for {} question '{}': {e}",
                raw.question_type, raw.id
            )
        })?;
        Ok(QuestionDefinition {
            id: raw.id,
            text: raw.text,
            points: raw.points,
            time_limit_seconds: raw.time_limit_seconds,
            is_required: raw.is_required,
            version: raw.version,
            scoring: raw.scoring,
            data,
        })
    }
}

impl From<QuestionDefinition> for RawQuestion {
    fn from(q: QuestionDefinition) -> Self {
        // Payloads are plain structs of strings, numbers and maps with string
        // keys, which always serialize to a JSON value.
        let data = q.data.to_value();
        debug_assert!(data.is_ok(), "question payload failed to serialize: {data:?}");
        RawQuestion {
            question_type: q.question_type(),
            data: data.unwrap_or_default(),
            id: q.id,
            text: q.text,
            points: q.points,
            time_limit_seconds: q.time_limit_seconds,
            is_required: q.is_required,
            version: q.version,
            scoring: q.scoring,
        }
    }
}

/// A quiz: an ordered list of questions plus optional per-question weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    /// Question id to score multiplier; missing entries weigh 1.0.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl Quiz {
    pub fn question(&self, id: &str) -> Option<&QuestionDefinition> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn weight_of(&self, question_id: &str) -> f64 {
        self.weights.get(question_id).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_display_and_parse() {
        for t in QuestionType::ALL {
            assert_eq!(t.to_string().parse::<QuestionType>().unwrap(), t);
        }
        assert_eq!(
            "Drag-Drop".parse::<QuestionType>().unwrap(),
            QuestionType::DragDrop
        );
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn question_type_serde_is_snake_case() {
        let json = serde_json::to_string(&QuestionType::LogicalExpression).unwrap();
        assert_eq!(json, "\"logical_expression\"");
    }

    #[test]
    fn question_definition_serde_roundtrip() {
        let json = r#"{
            "id": "q1",
            "type": "single_choice",
            "text": "Pick one",
            "points": 2,
            "is_required": true,
            "data": { "options": ["a", "b", "c"], "correct_option_index": 1 }
        }"#;
        let q: QuestionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(q.question_type(), QuestionType::SingleChoice);
        assert_eq!(q.points, 2.0);
        assert_eq!(q.version, 1);
        assert!(q.is_required);

        let encoded = serde_json::to_value(&q).unwrap();
        assert_eq!(encoded["type"], "single_choice");
        assert_eq!(encoded["data"]["correct_option_index"], 1);

        let decoded: QuestionDefinition = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, q);
    }

    #[test]
    fn data_not_matching_type_is_rejected() {
        let json = r#"{
            "id": "q1",
            "type": "true_false",
            "text": "Pick one",
            "points": 1,
            "data": { "options": ["a"], "correct_option_index": 0 }
        }"#;
        let err = serde_json::from_str::<QuestionDefinition>(json).unwrap_err();
        assert!(err.to_string().contains("true_false"), "got: {err}");
    }

    #[test]
    fn revise_bumps_version_and_keeps_original() {
        let original = QuestionDefinition::new(
            "q1",
            "Is water wet?",
            1.0,
            QuestionData::TrueFalse(TrueFalseData {
                correct_answer: true,
            }),
        );
        let revised = original.revise(|q| q.text = "Is ice cold?".into());
        assert_eq!(original.version, 1);
        assert_eq!(original.text, "Is water wet?");
        assert_eq!(revised.version, 2);
        assert_eq!(revised.id, "q1");
        assert_eq!(revised.text, "Is ice cold?");
    }

    #[test]
    fn multiple_choice_bounds_default() {
        let data = MultipleChoiceData {
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_option_indices: vec![0, 2],
            min_selections: None,
            max_selections: None,
        };
        assert_eq!(data.min_bound(), 0);
        assert_eq!(data.max_bound(), 3);
    }

    #[test]
    fn quiz_weight_defaults_to_one() {
        let quiz = Quiz {
            id: "quiz".into(),
            title: "Quiz".into(),
            description: String::new(),
            questions: vec![],
            weights: BTreeMap::from([("q2".to_string(), 2.5)]),
        };
        assert_eq!(quiz.weight_of("q1"), 1.0);
        assert_eq!(quiz.weight_of("q2"), 2.5);
    }
}
