//! Scripted test runner for testing the grader without executing code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quizgrade_core::results::TestCaseOutcome;
use quizgrade_core::traits::{TestCaseRequest, TestRunner};

/// What a scripted test case does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScriptedOutcome {
    /// Pass, echoing the expected output.
    Pass,
    /// Fail with the given output.
    Fail {
        #[serde(default)]
        actual_output: String,
    },
    /// The runner itself errors.
    Error { message: String },
}

/// Returns configured outcomes keyed by test-case id.
pub struct ScriptedRunner {
    outcomes: HashMap<String, ScriptedOutcome>,
    delays: HashMap<String, Duration>,
    default_outcome: ScriptedOutcome,
    call_count: AtomicU32,
    last_request: Mutex<Option<TestCaseRequest>>,
}

impl ScriptedRunner {
    /// A runner where every test case gets `default_outcome`.
    pub fn new(default_outcome: ScriptedOutcome) -> Self {
        Self {
            outcomes: HashMap::new(),
            delays: HashMap::new(),
            default_outcome,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Every test case passes unless scripted otherwise.
    pub fn passing() -> Self {
        Self::new(ScriptedOutcome::Pass)
    }

    /// Every test case fails unless scripted otherwise.
    pub fn failing() -> Self {
        Self::new(ScriptedOutcome::Fail {
            actual_output: String::new(),
        })
    }

    pub fn with_outcome(mut self, test_case_id: &str, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(test_case_id.to_string(), outcome);
        self
    }

    /// Sleep before answering for `test_case_id`.
    pub fn with_delay(mut self, test_case_id: &str, delay: Duration) -> Self {
        self.delays.insert(test_case_id.to_string(), delay);
        self
    }

    /// Get the number of test cases run.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this runner.
    pub fn last_request(&self) -> Option<TestCaseRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl TestRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_test_case(&self, request: &TestCaseRequest) -> anyhow::Result<TestCaseOutcome> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let id = &request.test_case.id;
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }

        match self.outcomes.get(id).unwrap_or(&self.default_outcome) {
            ScriptedOutcome::Pass => Ok(TestCaseOutcome::passed(
                id,
                &request.test_case.expected_output,
            )),
            ScriptedOutcome::Fail { actual_output } => Ok(TestCaseOutcome {
                test_case_id: id.clone(),
                passed: false,
                actual_output: actual_output.clone(),
                error: Some("output did not match the expected output".to_string()),
            }),
            ScriptedOutcome::Error { message } => anyhow::bail!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgrade_core::model::TestCase;

    fn request(id: &str) -> TestCaseRequest {
        TestCaseRequest::new(
            "python",
            "print(42)",
            TestCase {
                id: id.into(),
                input: String::new(),
                expected_output: "42".into(),
                points: 1.0,
                hidden: false,
            },
        )
    }

    #[tokio::test]
    async fn default_and_scripted_outcomes() {
        let runner = ScriptedRunner::passing()
            .with_outcome(
                "bad",
                ScriptedOutcome::Fail {
                    actual_output: "41".into(),
                },
            )
            .with_outcome(
                "boom",
                ScriptedOutcome::Error {
                    message: "interpreter missing".into(),
                },
            );

        let ok = runner.run_test_case(&request("ok")).await.unwrap();
        assert!(ok.passed);
        assert_eq!(ok.actual_output, "42");

        let bad = runner.run_test_case(&request("bad")).await.unwrap();
        assert!(!bad.passed);
        assert_eq!(bad.actual_output, "41");

        let err = runner.run_test_case(&request("boom")).await.unwrap_err();
        assert!(err.to_string().contains("interpreter missing"));

        assert_eq!(runner.call_count(), 3);
        assert_eq!(runner.last_request().unwrap().test_case.id, "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn delays_are_applied() {
        let runner = ScriptedRunner::failing().with_delay("slow", Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        let outcome = runner.run_test_case(&request("slow")).await.unwrap();
        assert!(!outcome.passed);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[test]
    fn outcome_serde() {
        let outcome: ScriptedOutcome =
            serde_json::from_str(r#"{"result":"fail","actual_output":"7"}"#).unwrap();
        assert_eq!(
            outcome,
            ScriptedOutcome::Fail {
                actual_output: "7".into()
            }
        );
    }
}
