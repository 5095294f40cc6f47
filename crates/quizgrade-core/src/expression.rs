//! Left-to-right boolean expression evaluator for logical-expression questions.
//!
//! Expressions are flat token streams built from named boolean variables,
//! the prefix operator `NOT` and the binary operators `AND`, `OR`, `XOR`.
//! There is no operator precedence and no grouping: after every `NOT` is
//! folded into the variable that follows it, the stream is reduced strictly
//! from left to right.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest variable count accepted by [`truth_table`].
pub const MAX_TRUTH_TABLE_VARIABLES: usize = 16;

/// Errors produced while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The token stream does not follow the `var (op var)*` shape.
    #[error("malformed expression: {0}")]
    Malformed(String),

    /// A referenced variable has no value in the assignment.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

/// Binary boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
    Xor,
}

impl Operator {
    /// Apply the operator to an accumulated value and the next operand.
    pub fn apply(self, acc: bool, value: bool) -> bool {
        match self {
            Operator::And => acc && value,
            Operator::Or => acc || value,
            Operator::Xor => acc != value,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Xor => "XOR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::And => "∧",
            Operator::Or => "∨",
            Operator::Xor => "⊕",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single expression token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
    Variable { name: String },
    Operator { operator: Operator },
    Not,
}

impl Token {
    pub fn var(name: impl Into<String>) -> Self {
        Token::Variable { name: name.into() }
    }

    pub fn op(operator: Operator) -> Self {
        Token::Operator { operator }
    }
}

/// How an expression is presented to students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionFormat {
    /// `NOT A AND B`
    #[default]
    Keyword,
    /// `¬A ∧ B`
    Symbolic,
}

/// One row of a truth table: an assignment and the expected output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTableRow {
    pub inputs: BTreeMap<String, bool>,
    pub output: bool,
}

/// A variable after `NOT` resolution; negation is applied at lookup time.
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    Operand { name: &'a str, negated: bool },
    Operator(Operator),
}

/// Evaluate a token stream against a variable assignment.
///
/// Returns `Ok(None)` for an empty expression. Structural problems are
/// reported before any variable lookup happens.
pub fn evaluate(
    tokens: &[Token],
    assignment: &BTreeMap<String, bool>,
) -> Result<Option<bool>, ExpressionError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let resolved = resolve_not(tokens)?;
    check_alternation(&resolved)?;

    let lookup = |name: &str, negated: bool| -> Result<bool, ExpressionError> {
        assignment
            .get(name)
            .map(|v| *v != negated)
            .ok_or_else(|| ExpressionError::UnknownVariable(name.to_string()))
    };

    let mut iter = resolved.iter();
    let mut acc = match iter.next() {
        Some(Resolved::Operand { name, negated }) => lookup(*name, *negated)?,
        _ => unreachable!("alternation check guarantees a leading operand"),
    };
    while let (Some(Resolved::Operator(op)), Some(Resolved::Operand { name, negated })) =
        (iter.next(), iter.next())
    {
        acc = op.apply(acc, lookup(*name, *negated)?);
    }

    Ok(Some(acc))
}

fn resolve_not(tokens: &[Token]) -> Result<Vec<Resolved<'_>>, ExpressionError> {
    let mut resolved = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Not => match tokens.get(i + 1) {
                Some(Token::Variable { name }) => {
                    resolved.push(Resolved::Operand {
                        name: name.as_str(),
                        negated: true,
                    });
                    i += 2;
                }
                Some(Token::Operator { operator }) => {
                    return Err(ExpressionError::Malformed(format!(
                        "NOT at position {i} is followed by operator {operator}"
                    )));
                }
                Some(Token::Not) => {
                    return Err(ExpressionError::Malformed(format!(
                        "NOT at position {i} is followed by another NOT"
                    )));
                }
                None => {
                    return Err(ExpressionError::Malformed(format!(
                        "NOT at position {i} has no operand"
                    )));
                }
            },
            Token::Variable { name } => {
                resolved.push(Resolved::Operand {
                    name: name.as_str(),
                    negated: false,
                });
                i += 1;
            }
            Token::Operator { operator } => {
                resolved.push(Resolved::Operator(*operator));
                i += 1;
            }
        }
    }
    Ok(resolved)
}

fn check_alternation(resolved: &[Resolved<'_>]) -> Result<(), ExpressionError> {
    let operands = resolved
        .iter()
        .filter(|r| matches!(r, Resolved::Operand { .. }))
        .count();
    let operators = resolved.len() - operands;
    if operands != operators + 1 {
        return Err(ExpressionError::Malformed(format!(
            "expected {} operand(s) for {operators} operator(s), found {operands}",
            operators + 1
        )));
    }
    for (pos, r) in resolved.iter().enumerate() {
        let expect_operand = pos % 2 == 0;
        let is_operand = matches!(r, Resolved::Operand { .. });
        if expect_operand != is_operand {
            let expected = if expect_operand { "an operand" } else { "an operator" };
            return Err(ExpressionError::Malformed(format!(
                "expected {expected} at term {}",
                pos + 1
            )));
        }
    }
    Ok(())
}

/// An ordered token stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression {
    tokens: Vec<Token>,
}

impl Expression {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Tokenize expression text.
    ///
    /// Accepts identifiers, the keywords `AND OR XOR NOT` in any case, and
    /// the symbols `&`/`&&`/`∧`, `|`/`||`/`∨`, `^`/`⊕`, `!`/`~`/`¬`.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.to_uppercase().as_str() {
                    "AND" => Token::op(Operator::And),
                    "OR" => Token::op(Operator::Or),
                    "XOR" => Token::op(Operator::Xor),
                    "NOT" => Token::Not,
                    _ => Token::var(word),
                };
                tokens.push(token);
                continue;
            }

            let token = match c {
                '&' | '∧' => {
                    if c == '&' && chars.get(i + 1) == Some(&'&') {
                        i += 1;
                    }
                    Token::op(Operator::And)
                }
                '|' | '∨' => {
                    if c == '|' && chars.get(i + 1) == Some(&'|') {
                        i += 1;
                    }
                    Token::op(Operator::Or)
                }
                '^' | '⊕' => Token::op(Operator::Xor),
                '!' | '~' | '¬' => Token::Not,
                '(' | ')' => {
                    return Err(ExpressionError::Malformed(
                        "parentheses are not supported".into(),
                    ))
                }
                other => {
                    return Err(ExpressionError::Malformed(format!(
                        "unexpected character '{other}' at position {i}"
                    )))
                }
            };
            tokens.push(token);
            i += 1;
        }

        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn evaluate(&self, assignment: &BTreeMap<String, bool>) -> Result<Option<bool>, ExpressionError> {
        evaluate(&self.tokens, assignment)
    }

    /// Distinct variable names in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for token in &self.tokens {
            if let Token::Variable { name } = token {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    }

    /// Canonical keyword rendering used for textual comparison.
    pub fn normalized(&self) -> String {
        self.render(ExpressionFormat::Keyword)
    }

    pub fn render(&self, format: ExpressionFormat) -> String {
        let mut out = String::new();
        let mut after_not = false;
        for token in &self.tokens {
            if !out.is_empty() && !(after_not && format == ExpressionFormat::Symbolic) {
                out.push(' ');
            }
            after_not = false;
            match (token, format) {
                (Token::Variable { name }, _) => out.push_str(name),
                (Token::Operator { operator }, ExpressionFormat::Keyword) => {
                    out.push_str(operator.keyword())
                }
                (Token::Operator { operator }, ExpressionFormat::Symbolic) => {
                    out.push_str(operator.symbol())
                }
                (Token::Not, ExpressionFormat::Keyword) => {
                    out.push_str("NOT");
                    after_not = true;
                }
                (Token::Not, ExpressionFormat::Symbolic) => {
                    out.push('¬');
                    after_not = true;
                }
            }
        }
        out
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Enumerate every assignment of `variables` and evaluate `expression` on it.
///
/// Rows run from all-true to all-false with the first variable as the most
/// significant bit, so `A, B` yields `TT, TF, FT, FF`.
pub fn truth_table(
    expression: &Expression,
    variables: &[String],
) -> Result<Vec<TruthTableRow>, ExpressionError> {
    if expression.is_empty() {
        return Err(ExpressionError::Malformed("expression is empty".into()));
    }
    if variables.len() > MAX_TRUTH_TABLE_VARIABLES {
        return Err(ExpressionError::Malformed(format!(
            "truth tables are limited to {MAX_TRUTH_TABLE_VARIABLES} variables, got {}",
            variables.len()
        )));
    }

    let n = variables.len();
    let row_count = 1usize << n;
    let mut rows = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let bits = row_count - 1 - row;
        let inputs: BTreeMap<String, bool> = variables
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), bits & (1 << (n - 1 - j)) != 0))
            .collect();
        let output = expression
            .evaluate(&inputs)?
            .ok_or_else(|| ExpressionError::Malformed("expression is empty".into()))?;
        rows.push(TruthTableRow { inputs, output });
    }
    Ok(rows)
}
