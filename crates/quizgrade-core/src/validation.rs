//! Authoring-time structural checks for question definitions.
//!
//! Validators never fail fast: every problem is collected so an authoring
//! UI can show them all at once. A definition with any error is not
//! gradable.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expression::Expression;
use crate::model::{
    AlgorithmicData, CodingData, DragDropData, DropdownData, FillBlankData, LabeledItem,
    LogicalExpressionData, MatchingData, MultipleChoiceData, NumericalData, OrderingData,
    QuestionData, QuestionDefinition, ShortAnswerData, SingleChoiceData, TestCase, VariableType,
    BLANK_MARKER, DROPDOWN_MARKER,
};

/// A single problem in a question definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `drop_zones[0].width`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct Errors(Vec<ValidationError>);

impl Errors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    fn non_empty<T>(&mut self, field: &str, list: &[T]) -> bool {
        if list.is_empty() {
            self.push(field, "must not be empty");
            false
        } else {
            true
        }
    }

    fn non_blank_texts(&mut self, field: &str, texts: &[String]) {
        for (i, t) in texts.iter().enumerate() {
            if t.trim().is_empty() {
                self.push(format!("{field}[{i}]"), "must not be blank");
            }
        }
    }

    fn labeled_items(&mut self, field: &str, items: &[LabeledItem]) {
        let mut seen = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                self.push(format!("{field}[{i}].id"), "must not be blank");
            } else if !seen.insert(item.id.as_str()) {
                self.push(format!("{field}[{i}].id"), format!("duplicate id '{}'", item.id));
            }
            if item.text.trim().is_empty() {
                self.push(format!("{field}[{i}].text"), "must not be blank");
            }
        }
    }

    fn index_in_range(&mut self, field: &str, index: usize, len: usize) {
        if index >= len {
            self.push(field, format!("index {index} is out of range 0..{len}"));
        }
    }

    fn finite(&mut self, field: &str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.push(field, "must be a finite number");
            false
        }
    }
}

/// Validate a whole question: metadata plus its payload.
pub fn validate_question(question: &QuestionDefinition) -> Vec<ValidationError> {
    let mut errors = Errors::default();

    if question.id.trim().is_empty() {
        errors.push("id", "must not be blank");
    }
    if question.text.trim().is_empty() {
        errors.push("text", "must not be blank");
    }
    if !question.points.is_finite() || question.points <= 0.0 {
        errors.push("points", "must be greater than 0");
    }
    if question.time_limit_seconds == Some(0) {
        errors.push("time_limit_seconds", "must be greater than 0");
    }

    let mut all = errors.0;
    all.extend(
        validate(&question.data)
            .into_iter()
            .map(|e| ValidationError::new(format!("data.{}", e.field), e.message)),
    );
    all
}

/// Validate a question payload.
pub fn validate(data: &QuestionData) -> Vec<ValidationError> {
    let mut errors = Errors::default();
    match data {
        QuestionData::SingleChoice(d) => single_choice(d, &mut errors),
        QuestionData::MultipleChoice(d) => multiple_choice(d, &mut errors),
        QuestionData::TrueFalse(_) => {}
        QuestionData::Matching(d) => matching(d, &mut errors),
        QuestionData::FillBlank(d) => fill_blank(d, &mut errors),
        QuestionData::Dropdown(d) => dropdown(d, &mut errors),
        QuestionData::Numerical(d) => numerical(d, &mut errors),
        QuestionData::Algorithmic(d) => algorithmic(d, &mut errors),
        QuestionData::ShortAnswer(d) => short_answer(d, &mut errors),
        QuestionData::Coding(d) => coding(d, &mut errors),
        QuestionData::LogicalExpression(d) => logical_expression(d, &mut errors),
        QuestionData::DragDrop(d) => drag_drop(d, &mut errors),
        QuestionData::Ordering(d) => ordering(d, &mut errors),
    }
    errors.0
}

fn single_choice(d: &SingleChoiceData, errors: &mut Errors) {
    if errors.non_empty("options", &d.options) {
        errors.non_blank_texts("options", &d.options);
        errors.index_in_range("correct_option_index", d.correct_option_index, d.options.len());
    }
}

fn multiple_choice(d: &MultipleChoiceData, errors: &mut Errors) {
    if !errors.non_empty("options", &d.options) {
        return;
    }
    errors.non_blank_texts("options", &d.options);

    if errors.non_empty("correct_option_indices", &d.correct_option_indices) {
        let mut seen = HashSet::new();
        for (i, &idx) in d.correct_option_indices.iter().enumerate() {
            let field = format!("correct_option_indices[{i}]");
            errors.index_in_range(&field, idx, d.options.len());
            if !seen.insert(idx) {
                errors.push(field, format!("duplicate index {idx}"));
            }
        }
    }

    let (min, max) = (d.min_bound(), d.max_bound());
    if min > max {
        errors.push(
            "min_selections",
            format!("must not exceed max_selections ({min} > {max})"),
        );
    }
    if max > d.options.len() {
        errors.push(
            "max_selections",
            format!("must not exceed the number of options ({max} > {})", d.options.len()),
        );
    }
    let correct = d.correct_option_indices.len();
    if correct > 0 && min <= max && !(min..=max).contains(&correct) {
        errors.push(
            "correct_option_indices",
            format!("{correct} correct option(s) cannot be selected within {min}..={max}"),
        );
    }
}

fn matching(d: &MatchingData, errors: &mut Errors) {
    let has_left = errors.non_empty("left_items", &d.left_items);
    let has_right = errors.non_empty("right_items", &d.right_items);
    errors.labeled_items("left_items", &d.left_items);
    errors.labeled_items("right_items", &d.right_items);
    if !(has_left && has_right) {
        return;
    }

    let left: HashSet<&str> = d.left_items.iter().map(|i| i.id.as_str()).collect();
    let right: HashSet<&str> = d.right_items.iter().map(|i| i.id.as_str()).collect();
    for (l, r) in &d.correct_matches {
        if !left.contains(l.as_str()) {
            errors.push(
                format!("correct_matches.{l}"),
                format!("left item '{l}' does not exist"),
            );
        }
        if !right.contains(r.as_str()) {
            errors.push(
                format!("correct_matches.{l}"),
                format!("right item '{r}' does not exist"),
            );
        }
    }
    for (i, item) in d.left_items.iter().enumerate() {
        if !d.correct_matches.contains_key(&item.id) {
            errors.push(
                format!("left_items[{i}]"),
                format!("left item '{}' has no correct match", item.id),
            );
        }
    }
}

fn fill_blank(d: &FillBlankData, errors: &mut Errors) {
    let markers = d.text.matches(BLANK_MARKER).count();
    if markers != d.blanks.len() {
        errors.push(
            "text",
            format!(
                "has {markers} {BLANK_MARKER} marker(s) but {} blank(s) are defined",
                d.blanks.len()
            ),
        );
    }
    errors.non_empty("blanks", &d.blanks);
    for (i, blank) in d.blanks.iter().enumerate() {
        let field = format!("blanks[{i}].acceptable_answers");
        if errors.non_empty(&field, &blank.acceptable_answers) {
            errors.non_blank_texts(&field, &blank.acceptable_answers);
        }
    }
}

fn dropdown(d: &DropdownData, errors: &mut Errors) {
    let markers = d.text.matches(DROPDOWN_MARKER).count();
    if markers != d.dropdowns.len() {
        errors.push(
            "text",
            format!(
                "has {markers} {DROPDOWN_MARKER} marker(s) but {} dropdown(s) are defined",
                d.dropdowns.len()
            ),
        );
    }
    errors.non_empty("dropdowns", &d.dropdowns);
    for (i, dd) in d.dropdowns.iter().enumerate() {
        let field = format!("dropdowns[{i}].options");
        if !errors.non_empty(&field, &dd.options) {
            continue;
        }
        errors.non_blank_texts(&field, &dd.options);
        let mut seen = HashSet::new();
        for (j, opt) in dd.options.iter().enumerate() {
            if !seen.insert(opt.as_str()) {
                errors.push(format!("{field}[{j}]"), format!("duplicate option '{opt}'"));
            }
        }
        match &dd.correct_option {
            None => errors.push(
                format!("dropdowns[{i}].correct_option"),
                "a correct option must be selected",
            ),
            Some(correct) if !dd.options.contains(correct) => errors.push(
                format!("dropdowns[{i}].correct_option"),
                format!("'{correct}' is not one of the options"),
            ),
            Some(_) => {}
        }
    }
}

fn numerical(d: &NumericalData, errors: &mut Errors) {
    errors.finite("correct_answer", d.correct_answer);
    if let Some(tolerance) = d.tolerance {
        if errors.finite("tolerance", tolerance) && tolerance < 0.0 {
            errors.push("tolerance", "must not be negative");
        }
    }
    if let Some(range) = &d.acceptable_range {
        let min_ok = errors.finite("acceptable_range.min", range.min);
        let max_ok = errors.finite("acceptable_range.max", range.max);
        if min_ok && max_ok && range.min > range.max {
            errors.push("acceptable_range", "min must not exceed max");
        }
    }
    if d.units.as_deref().is_some_and(|u| u.trim().is_empty()) {
        errors.push("units", "must not be blank when present");
    }
}

fn test_cases(cases: &[TestCase], errors: &mut Errors) {
    if !errors.non_empty("test_cases", cases) {
        return;
    }
    let mut seen = HashSet::new();
    for (i, case) in cases.iter().enumerate() {
        if case.id.trim().is_empty() {
            errors.push(format!("test_cases[{i}].id"), "must not be blank");
        } else if !seen.insert(case.id.as_str()) {
            errors.push(format!("test_cases[{i}].id"), format!("duplicate id '{}'", case.id));
        }
        if !case.points.is_finite() || case.points < 0.0 {
            errors.push(format!("test_cases[{i}].points"), "must not be negative");
        }
    }
}

fn algorithmic(d: &AlgorithmicData, errors: &mut Errors) {
    if d.description.trim().is_empty() {
        errors.push("description", "must not be blank");
    }
    test_cases(&d.test_cases, errors);
}

fn coding(d: &CodingData, errors: &mut Errors) {
    if d.language.trim().is_empty() {
        errors.push("language", "must not be blank");
    }
    test_cases(&d.test_cases, errors);
}

fn short_answer(d: &ShortAnswerData, errors: &mut Errors) {
    if d.max_length == Some(0) {
        errors.push("max_length", "must be greater than 0");
    }
    errors.non_blank_texts("keywords", &d.keywords);
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let keyword = matches!(name.to_uppercase().as_str(), "AND" | "OR" | "XOR" | "NOT");
    starts_ok && !keyword && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn logical_expression(d: &LogicalExpressionData, errors: &mut Errors) {
    if !errors.non_empty("variables", &d.variables) {
        return;
    }

    let mut declared = HashSet::new();
    for (i, var) in d.variables.iter().enumerate() {
        if !is_identifier(&var.name) {
            errors.push(
                format!("variables[{i}].name"),
                format!("'{}' is not a valid variable name", var.name),
            );
        } else if !declared.insert(var.name.as_str()) {
            errors.push(
                format!("variables[{i}].name"),
                format!("duplicate variable '{}'", var.name),
            );
        }
        if var.kind != VariableType::Boolean {
            errors.push(
                format!("variables[{i}].type"),
                "only boolean variables are supported",
            );
        }
    }

    match Expression::parse(&d.correct_expression) {
        Err(e) => errors.push("correct_expression", e.to_string()),
        Ok(expr) if expr.is_empty() => errors.push("correct_expression", "must not be empty"),
        Ok(expr) => {
            for name in expr.variables() {
                if !declared.contains(name.as_str()) {
                    errors.push(
                        "correct_expression",
                        format!("references undeclared variable '{name}'"),
                    );
                }
            }
            let all_false: BTreeMap<String, bool> =
                declared.iter().map(|n| (n.to_string(), false)).collect();
            if let Err(e @ crate::expression::ExpressionError::Malformed(_)) =
                expr.evaluate(&all_false)
            {
                errors.push("correct_expression", e.to_string());
            }
        }
    }

    if let Some(table) = &d.truth_table {
        for (i, row) in table.iter().enumerate() {
            let assigned: HashSet<&str> = row.inputs.keys().map(String::as_str).collect();
            if assigned != declared {
                errors.push(
                    format!("truth_table[{i}].inputs"),
                    "must assign exactly the declared variables",
                );
            }
        }
    }
}

fn drag_drop(d: &DragDropData, errors: &mut Errors) {
    errors.non_empty("drop_zones", &d.drop_zones);
    errors.non_empty("draggable_items", &d.draggable_items);
    errors.labeled_items("draggable_items", &d.draggable_items);

    let items: HashSet<&str> = d.draggable_items.iter().map(|i| i.id.as_str()).collect();
    let mut zone_ids = HashSet::new();
    // Each item can be placed only once, so it may be expected in one zone.
    let mut expected = HashSet::new();
    for (i, zone) in d.drop_zones.iter().enumerate() {
        let prefix = format!("drop_zones[{i}]");
        if zone.id.trim().is_empty() {
            errors.push(format!("{prefix}.id"), "must not be blank");
        } else if !zone_ids.insert(zone.id.as_str()) {
            errors.push(format!("{prefix}.id"), format!("duplicate id '{}'", zone.id));
        }
        for (name, value) in [("x", zone.x), ("y", zone.y)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{prefix}.{name}"), "must be a non-negative number");
            }
        }
        for (name, value) in [("width", zone.width), ("height", zone.height)] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{prefix}.{name}"), "must be greater than 0");
            }
        }
        for (j, item) in zone.correct_items.iter().enumerate() {
            if !items.contains(item.as_str()) {
                errors.push(
                    format!("{prefix}.correct_items[{j}]"),
                    format!("draggable item '{item}' does not exist"),
                );
            } else if !expected.insert(item.as_str()) {
                errors.push(
                    format!("{prefix}.correct_items[{j}]"),
                    format!("draggable item '{item}' is expected more than once"),
                );
            }
        }
    }
}

fn ordering(d: &OrderingData, errors: &mut Errors) {
    if !errors.non_empty("items", &d.items) {
        return;
    }
    let n = d.items.len();
    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    for (i, item) in d.items.iter().enumerate() {
        if item.id.trim().is_empty() {
            errors.push(format!("items[{i}].id"), "must not be blank");
        } else if !ids.insert(item.id.as_str()) {
            errors.push(format!("items[{i}].id"), format!("duplicate id '{}'", item.id));
        }
        if item.text.trim().is_empty() {
            errors.push(format!("items[{i}].text"), "must not be blank");
        }
        if !(1..=n).contains(&item.target_position) {
            errors.push(
                format!("items[{i}].target_position"),
                format!("must be within 1..={n}"),
            );
        } else if !positions.insert(item.target_position) {
            errors.push(
                format!("items[{i}].target_position"),
                format!("duplicate position {}", item.target_position),
            );
        }
    }
}
