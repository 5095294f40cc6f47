//! Per-type grading rules.
//!
//! [`grade`] is a pure function of `(question, answer)`: it validates the
//! question, checks the answer shape against the question type and then
//! dispatches on the payload. Coding and algorithmic questions come back
//! as [`GradeStatus::AwaitingExecution`](crate::results::GradeStatus); the
//! async [`Grader`](crate::engine::Grader) finishes them with
//! [`score_test_outcomes`].

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::answer::{ExpressionInput, SubmittedAnswer};
use crate::error::{GradingError, MalformedReason};
use crate::expression::Expression;
use crate::model::{
    DragDropData, DropdownData, FillBlankData, LogicalExpressionData, MatchingData,
    MultipleChoiceData, NumericalData, OrderingData, QuestionData, QuestionDefinition,
    ScoringPolicy, ShortAnswerData, TestCase,
};
use crate::results::{GradingResult, TestCaseOutcome};
use crate::validation::validate_question;

/// Slack added to numeric tolerances so that `0.1 + 0.2` matches `0.3`.
pub const FLOAT_SLACK: f64 = 1e-9;

/// Language used for algorithmic answers when neither the answer nor the
/// question names one.
pub const DEFAULT_ALGORITHMIC_LANGUAGE: &str = "text";

/// What the test runner needs to execute a coding or algorithmic answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCase>,
}

/// Grade with the default [`ScoringPolicy`].
pub fn grade(
    question: &QuestionDefinition,
    answer: &SubmittedAnswer,
) -> Result<GradingResult, GradingError> {
    grade_with_policy(question, answer, ScoringPolicy::default())
}

/// Grade a single answer.
///
/// `policy` applies to matching, dropdown and fill-blank questions unless
/// the question carries its own `scoring` override.
pub fn grade_with_policy(
    question: &QuestionDefinition,
    answer: &SubmittedAnswer,
    policy: ScoringPolicy,
) -> Result<GradingResult, GradingError> {
    let errors = validate_question(question);
    if !errors.is_empty() {
        return Err(GradingError::Configuration {
            question_id: question.id.clone(),
            errors,
        });
    }

    let policy = question.scoring.unwrap_or(policy);
    let ctx = Ctx { question, policy };

    let result = match &question.data {
        QuestionData::SingleChoice(d) => {
            let SubmittedAnswer::SingleChoice { selected_index } = answer else {
                return Err(ctx.mismatch(answer));
            };
            if *selected_index >= d.options.len() {
                return Err(ctx.malformed(
                    MalformedReason::IndexOutOfRange,
                    format!(
                        "option {selected_index} does not exist ({} options)",
                        d.options.len()
                    ),
                ));
            }
            GradingResult::all_or_nothing(question, *selected_index == d.correct_option_index, None)
        }
        QuestionData::MultipleChoice(d) => {
            let SubmittedAnswer::MultipleChoice { selected_indices } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.multiple_choice(d, selected_indices)?
        }
        QuestionData::TrueFalse(d) => {
            let SubmittedAnswer::TrueFalse { answer: given } = answer else {
                return Err(ctx.mismatch(answer));
            };
            GradingResult::all_or_nothing(question, *given == d.correct_answer, None)
        }
        QuestionData::Matching(d) => {
            let SubmittedAnswer::Matching { matches } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.matching(d, matches)?
        }
        QuestionData::FillBlank(d) => {
            let SubmittedAnswer::FillBlank { answers } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.fill_blank(d, answers)?
        }
        QuestionData::Dropdown(d) => {
            let SubmittedAnswer::Dropdown { selections } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.dropdown(d, selections)?
        }
        QuestionData::Numerical(d) => {
            let SubmittedAnswer::Numerical { value, unit } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.numerical(d, *value, unit.as_deref())?
        }
        QuestionData::Algorithmic(_) => {
            let SubmittedAnswer::Algorithmic { .. } = answer else {
                return Err(ctx.mismatch(answer));
            };
            GradingResult::awaiting_execution(question)
        }
        QuestionData::ShortAnswer(d) => {
            let SubmittedAnswer::ShortAnswer { text } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.short_answer(d, text)?
        }
        QuestionData::Coding(_) => {
            let SubmittedAnswer::Coding { .. } = answer else {
                return Err(ctx.mismatch(answer));
            };
            GradingResult::awaiting_execution(question)
        }
        QuestionData::LogicalExpression(d) => {
            let SubmittedAnswer::LogicalExpression { expression } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.logical_expression(d, expression)?
        }
        QuestionData::DragDrop(d) => {
            let SubmittedAnswer::DragDrop { placements } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.drag_drop(d, placements)?
        }
        QuestionData::Ordering(d) => {
            let SubmittedAnswer::Ordering { order } = answer else {
                return Err(ctx.mismatch(answer));
            };
            ctx.ordering(d, order)?
        }
    };

    debug!(
        question_id = %question.id,
        question_type = %question.question_type(),
        status = ?result.status,
        points_earned = result.points_earned,
        "graded question"
    );
    Ok(result)
}

/// The runner input for a coding or algorithmic answer, or `None` for any
/// other question/answer pair.
pub fn execution_plan(
    question: &QuestionDefinition,
    answer: &SubmittedAnswer,
) -> Option<ExecutionPlan> {
    match (&question.data, answer) {
        (QuestionData::Coding(d), SubmittedAnswer::Coding { code }) => Some(ExecutionPlan {
            language: d.language.clone(),
            code: code.clone(),
            test_cases: d.test_cases.clone(),
        }),
        (QuestionData::Algorithmic(d), SubmittedAnswer::Algorithmic { solution, language }) => {
            let language = language
                .clone()
                .or_else(|| d.language.clone())
                .unwrap_or_else(|| DEFAULT_ALGORITHMIC_LANGUAGE.to_string());
            Some(ExecutionPlan {
                language,
                code: solution.clone(),
                test_cases: d.test_cases.clone(),
            })
        }
        _ => None,
    }
}

/// Turn test-runner outcomes into a graded result.
///
/// Each case weighs its `points`; when every case is worth zero they
/// weigh one each. Cases without an outcome count as failed and outcomes
/// for unknown case ids are ignored.
pub fn score_test_outcomes(
    question: &QuestionDefinition,
    test_cases: &[TestCase],
    outcomes: Vec<TestCaseOutcome>,
) -> GradingResult {
    let mut by_id: HashMap<String, TestCaseOutcome> = outcomes
        .into_iter()
        .map(|o| (o.test_case_id.clone(), o))
        .collect();

    let use_points = test_cases.iter().any(|tc| tc.points > 0.0);
    let weight = |tc: &TestCase| if use_points { tc.points } else { 1.0 };

    let mut ordered = Vec::with_capacity(test_cases.len());
    let (mut passed_weight, mut total_weight, mut passed) = (0.0, 0.0, 0usize);
    for tc in test_cases {
        let outcome = by_id
            .remove(&tc.id)
            .unwrap_or_else(|| TestCaseOutcome::failed(&tc.id, "no result reported"));
        total_weight += weight(tc);
        if outcome.passed {
            passed_weight += weight(tc);
            passed += 1;
        }
        ordered.push(outcome);
    }

    let all_passed = !test_cases.is_empty() && passed == test_cases.len();
    let earned = if total_weight > 0.0 {
        question.points * passed_weight / total_weight
    } else {
        0.0
    };
    let feedback = format!("passed {passed}/{} test cases", test_cases.len());
    let mut result = GradingResult::graded(question, all_passed, earned, Some(feedback));
    result.test_outcomes = ordered;
    result
}

struct Ctx<'a> {
    question: &'a QuestionDefinition,
    policy: ScoringPolicy,
}

impl Ctx<'_> {
    fn malformed(&self, reason: MalformedReason, detail: impl Into<String>) -> GradingError {
        GradingError::MalformedAnswer {
            question_id: self.question.id.clone(),
            reason,
            detail: detail.into(),
        }
    }

    fn mismatch(&self, answer: &SubmittedAnswer) -> GradingError {
        self.malformed(
            MalformedReason::TypeMismatch,
            format!(
                "{} answer submitted for a {} question",
                answer.question_type(),
                self.question.question_type()
            ),
        )
    }

    /// Score `correct` of `total` sub-items under the active policy.
    fn sub_items(&self, correct: usize, total: usize, noun: &str) -> GradingResult {
        let all = total > 0 && correct == total;
        let feedback = Some(format!("{correct}/{total} {noun} correct"));
        match self.policy {
            ScoringPolicy::AllOrNothing => {
                GradingResult::all_or_nothing(self.question, all, feedback)
            }
            ScoringPolicy::PartialCredit => {
                let earned = if total == 0 {
                    0.0
                } else {
                    self.question.points * correct as f64 / total as f64
                };
                GradingResult::graded(self.question, all, earned, feedback)
            }
        }
    }

    fn multiple_choice(
        &self,
        d: &MultipleChoiceData,
        selected: &[usize],
    ) -> Result<GradingResult, GradingError> {
        let mut chosen = HashSet::with_capacity(selected.len());
        for &idx in selected {
            if idx >= d.options.len() {
                return Err(self.malformed(
                    MalformedReason::IndexOutOfRange,
                    format!("option {idx} does not exist ({} options)", d.options.len()),
                ));
            }
            if !chosen.insert(idx) {
                return Err(self.malformed(
                    MalformedReason::DuplicateSelection,
                    format!("option {idx} selected more than once"),
                ));
            }
        }

        let (min, max) = (d.min_bound(), d.max_bound());
        if !(min..=max).contains(&chosen.len()) {
            return Ok(GradingResult::all_or_nothing(
                self.question,
                false,
                Some(format!("select between {min} and {max} options")),
            ));
        }

        let correct: HashSet<usize> = d.correct_option_indices.iter().copied().collect();
        Ok(GradingResult::all_or_nothing(self.question, chosen == correct, None))
    }

    fn matching(
        &self,
        d: &MatchingData,
        matches: &BTreeMap<String, String>,
    ) -> Result<GradingResult, GradingError> {
        for (left, right) in matches {
            if !d.left_items.iter().any(|i| &i.id == left) {
                return Err(self.malformed(
                    MalformedReason::UnknownId,
                    format!("left item '{left}' does not exist"),
                ));
            }
            if !d.right_items.iter().any(|i| &i.id == right) {
                return Err(self.malformed(
                    MalformedReason::UnknownId,
                    format!("right item '{right}' does not exist"),
                ));
            }
        }

        let correct = d
            .left_items
            .iter()
            .filter(|item| {
                matches.get(&item.id).is_some_and(|given| {
                    d.correct_matches.get(&item.id) == Some(given)
                })
            })
            .count();
        Ok(self.sub_items(correct, d.left_items.len(), "matches"))
    }

    fn fill_blank(
        &self,
        d: &FillBlankData,
        answers: &[String],
    ) -> Result<GradingResult, GradingError> {
        if answers.len() > d.blanks.len() {
            return Err(self.malformed(
                MalformedReason::TooManyResponses,
                format!("{} answers for {} blanks", answers.len(), d.blanks.len()),
            ));
        }

        let correct = d
            .blanks
            .iter()
            .zip(answers)
            .filter(|(blank, given)| {
                let given = given.trim();
                !given.is_empty()
                    && blank.acceptable_answers.iter().any(|accepted| {
                        let accepted = accepted.trim();
                        if blank.case_sensitive {
                            accepted == given
                        } else {
                            accepted.to_lowercase() == given.to_lowercase()
                        }
                    })
            })
            .count();
        Ok(self.sub_items(correct, d.blanks.len(), "blanks"))
    }

    fn dropdown(
        &self,
        d: &DropdownData,
        selections: &[String],
    ) -> Result<GradingResult, GradingError> {
        if selections.len() > d.dropdowns.len() {
            return Err(self.malformed(
                MalformedReason::TooManyResponses,
                format!(
                    "{} selections for {} dropdowns",
                    selections.len(),
                    d.dropdowns.len()
                ),
            ));
        }

        let mut correct = 0;
        for (i, (spec, selected)) in d.dropdowns.iter().zip(selections).enumerate() {
            if selected.is_empty() {
                continue;
            }
            if !spec.options.contains(selected) {
                return Err(self.malformed(
                    MalformedReason::UnknownId,
                    format!("'{selected}' is not an option of dropdown {}", i + 1),
                ));
            }
            if spec.correct_option.as_ref() == Some(selected) {
                correct += 1;
            }
        }
        Ok(self.sub_items(correct, d.dropdowns.len(), "dropdowns"))
    }

    fn numerical(
        &self,
        d: &NumericalData,
        value: f64,
        unit: Option<&str>,
    ) -> Result<GradingResult, GradingError> {
        if !value.is_finite() {
            return Err(self.malformed(
                MalformedReason::InvalidNumber,
                format!("{value} is not a finite number"),
            ));
        }

        if let (Some(expected), Some(given)) = (d.units.as_deref(), unit) {
            if expected.trim().to_lowercase() != given.trim().to_lowercase() {
                return Ok(GradingResult::all_or_nothing(
                    self.question,
                    false,
                    Some(format!("expected units '{}'", expected.trim())),
                ));
            }
        }

        let tolerance = d.tolerance.unwrap_or(0.0);
        let within_tolerance = (value - d.correct_answer).abs() <= tolerance + FLOAT_SLACK;
        let within_range = d.acceptable_range.is_some_and(|r| r.contains(value));
        Ok(GradingResult::all_or_nothing(
            self.question,
            within_tolerance || within_range,
            None,
        ))
    }

    fn short_answer(
        &self,
        d: &ShortAnswerData,
        text: &str,
    ) -> Result<GradingResult, GradingError> {
        let length = text.chars().count();
        if let Some(max) = d.max_length {
            if length > max {
                return Err(self.malformed(
                    MalformedReason::TooLong,
                    format!("{length} characters exceeds the limit of {max}"),
                ));
            }
        }

        let feedback = if d.keywords.is_empty() {
            None
        } else {
            let lowered = text.to_lowercase();
            let matched: Vec<&str> = d
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| lowered.contains(&k.to_lowercase()))
                .collect();
            Some(if matched.is_empty() {
                "no keywords matched".to_string()
            } else {
                format!("matched keywords: {}", matched.join(", "))
            })
        };
        Ok(GradingResult::pending_review(self.question, feedback))
    }

    fn logical_expression(
        &self,
        d: &LogicalExpressionData,
        input: &ExpressionInput,
    ) -> Result<GradingResult, GradingError> {
        let submitted = input.to_expression()?;
        if submitted.is_empty() {
            return Ok(GradingResult::all_or_nothing(
                self.question,
                false,
                Some("no expression submitted".to_string()),
            ));
        }

        // Surfaces malformed streams and undeclared variables before any
        // comparison.
        let all_false: BTreeMap<String, bool> = d
            .variable_names()
            .into_iter()
            .map(|name| (name, false))
            .collect();
        submitted.evaluate(&all_false)?;

        let is_correct = match d.truth_table.as_deref() {
            Some(rows) if !rows.is_empty() => {
                let mut all_match = true;
                for row in rows {
                    if submitted.evaluate(&row.inputs)? != Some(row.output) {
                        all_match = false;
                        break;
                    }
                }
                all_match
            }
            _ => {
                let expected = Expression::parse(&d.correct_expression)?;
                submitted.normalized() == expected.normalized()
            }
        };
        Ok(GradingResult::all_or_nothing(self.question, is_correct, None))
    }

    fn drag_drop(
        &self,
        d: &DragDropData,
        placements: &BTreeMap<String, Vec<String>>,
    ) -> Result<GradingResult, GradingError> {
        let mut placed_once = HashSet::new();
        for (zone, items) in placements {
            if !d.drop_zones.iter().any(|z| &z.id == zone) {
                return Err(self.malformed(
                    MalformedReason::UnknownId,
                    format!("drop zone '{zone}' does not exist"),
                ));
            }
            for item in items {
                if !d.draggable_items.iter().any(|i| &i.id == item) {
                    return Err(self.malformed(
                        MalformedReason::UnknownId,
                        format!("draggable item '{item}' does not exist"),
                    ));
                }
                if !placed_once.insert(item.as_str()) {
                    return Err(self.malformed(
                        MalformedReason::DuplicateSelection,
                        format!("draggable item '{item}' is placed more than once"),
                    ));
                }
            }
        }

        let correct_zones = d
            .drop_zones
            .iter()
            .filter(|zone| {
                let expected: HashSet<&str> =
                    zone.correct_items.iter().map(String::as_str).collect();
                let given: HashSet<&str> = placements
                    .get(&zone.id)
                    .map(|items| items.iter().map(String::as_str).collect())
                    .unwrap_or_default();
                expected == given
            })
            .count();
        let total = d.drop_zones.len();
        Ok(GradingResult::all_or_nothing(
            self.question,
            correct_zones == total,
            Some(format!("{correct_zones}/{total} zones correct")),
        ))
    }

    fn ordering(&self, d: &OrderingData, order: &[String]) -> Result<GradingResult, GradingError> {
        let targets: HashMap<&str, usize> = d
            .items
            .iter()
            .map(|i| (i.id.as_str(), i.target_position))
            .collect();

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !targets.contains_key(id.as_str()) {
                return Err(self.malformed(
                    MalformedReason::UnknownId,
                    format!("item '{id}' does not exist"),
                ));
            }
            if !seen.insert(id.as_str()) {
                return Err(self.malformed(
                    MalformedReason::DuplicateSelection,
                    format!("item '{id}' appears more than once"),
                ));
            }
        }
        if order.len() != d.items.len() {
            return Err(self.malformed(
                MalformedReason::IncompleteSequence,
                format!("{} of {} items ordered", order.len(), d.items.len()),
            ));
        }

        let in_place = order
            .iter()
            .enumerate()
            .filter(|(pos, id)| targets.get(id.as_str()) == Some(&(pos + 1)))
            .count();
        let total = d.items.len();
        let feedback = Some(format!("{in_place}/{total} positions correct"));

        if d.allow_partial_credit {
            let earned = self.question.points * in_place as f64 / total as f64;
            Ok(GradingResult::graded(self.question, in_place == total, earned, feedback))
        } else {
            Ok(GradingResult::all_or_nothing(self.question, in_place == total, feedback))
        }
    }
}
