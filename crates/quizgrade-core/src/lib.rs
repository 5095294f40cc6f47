//! quizgrade-core: question model, validators and grading engine.
//!
//! This crate defines the thirteen question types, their authoring-time
//! validators, the boolean expression evaluator, per-question grading,
//! score aggregation and the async batch grader that drives an external
//! test runner for code questions.

pub mod aggregate;
pub mod answer;
pub mod engine;
pub mod error;
pub mod expression;
pub mod grading;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod submission;
pub mod traits;
pub mod validation;
