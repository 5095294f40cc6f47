//! The test-runner seam.
//!
//! Coding and algorithmic answers are executed outside this crate. The
//! `quizgrade-runner` crate implements [`TestRunner`] for external
//! commands and for scripted outcomes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::TestCase;
use crate::results::TestCaseOutcome;

// ---------------------------------------------------------------------------
// Test runner trait
// ---------------------------------------------------------------------------

/// Executes one submitted program against one test case.
///
/// An `Err` means the runner itself broke (spawn failure, I/O); a program
/// that runs and prints the wrong thing is an `Ok` outcome with
/// `passed == false`. The batch grader scores both as a failed case.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Human-readable runner name (e.g. "command").
    fn name(&self) -> &str;

    /// Run the code against a single test case.
    async fn run_test_case(&self, request: &TestCaseRequest) -> anyhow::Result<TestCaseOutcome>;
}

/// Input for a single test-case execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRequest {
    /// Language key used to pick the runner command.
    pub language: String,
    /// The submitted source code.
    pub code: String,
    pub test_case: TestCase,
}

impl TestCaseRequest {
    pub fn new(language: impl Into<String>, code: impl Into<String>, test_case: TestCase) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            test_case,
        }
    }
}

/// Compare program output with the expected output, ignoring surrounding
/// whitespace and line-ending differences.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let normalize = |s: &str| {
        s.trim()
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    };
    normalize(actual) == normalize(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_match_ignores_trailing_whitespace() {
        assert!(outputs_match("3\n", "3"));
        assert!(outputs_match("a  \r\nb\r\n", "a\nb"));
        assert!(!outputs_match("3", "4"));
        assert!(!outputs_match("a b", "ab"));
    }

    #[test]
    fn request_serializes_test_case() {
        let request = TestCaseRequest::new(
            "python",
            "print(1)",
            TestCase {
                id: "t1".into(),
                input: String::new(),
                expected_output: "1".into(),
                points: 1.0,
                hidden: false,
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["language"], "python");
        assert_eq!(json["test_case"]["id"], "t1");
    }
}
