//! Test runner that executes submissions as external processes.
//!
//! For each test case the submitted code is written to a fresh scratch
//! directory, the language's configured command is started with the test
//! input on stdin, and trimmed stdout is compared with the expected
//! output. Nothing here isolates the child process beyond scrubbing a few
//! environment variables.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use quizgrade_core::results::TestCaseOutcome;
use quizgrade_core::traits::{outputs_match, TestCaseRequest, TestRunner};

use crate::config::CommandSpec;
use crate::error::RunnerError;
use crate::workdir::WorkDir;

/// Longest stderr excerpt kept in an outcome.
const MAX_ERROR_CHARS: usize = 2000;

pub struct CommandRunner {
    runners: HashMap<String, CommandSpec>,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(runners: HashMap<String, CommandSpec>, timeout: Duration) -> Self {
        let runners = runners
            .into_iter()
            .map(|(lang, spec)| (lang.to_lowercase(), spec))
            .collect();
        Self { runners, timeout }
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.runners.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    fn spec_for(&self, language: &str) -> Result<&CommandSpec, RunnerError> {
        self.runners
            .get(&language.to_lowercase())
            .ok_or_else(|| RunnerError::UnsupportedLanguage(language.to_string()))
    }
}

fn truncate(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= MAX_ERROR_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_ERROR_CHARS).collect();
        format!("{cut}…")
    }
}

#[async_trait]
impl TestRunner for CommandRunner {
    fn name(&self) -> &str {
        "command"
    }

    async fn run_test_case(&self, request: &TestCaseRequest) -> Result<TestCaseOutcome> {
        let spec = self.spec_for(&request.language)?;
        let work = WorkDir::with_source(spec, &request.code)?;
        let test_case = &request.test_case;
        let start = Instant::now();

        let mut cmd = Command::new(&spec.command);
        cmd.args(work.expand_args(spec))
            .current_dir(work.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, val) in work.build_env(spec) {
            cmd.env(&key, &val);
        }

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            command: spec.command.clone(),
            source,
        })?;

        // Feed stdin from its own task so a child that echoes its input can
        // keep writing stdout while `wait_with_output` drains it.
        if let Some(mut stdin) = child.stdin.take() {
            let input = test_case.input.clone().into_bytes();
            let case_id = test_case.id.clone();
            tokio::spawn(async move {
                // Programs that never read stdin may exit before we finish writing.
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!("stdin write for test case {case_id} failed: {e}");
                }
                let _ = stdin.shutdown().await;
            });
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| RunnerError::Io {
                command: spec.command.clone(),
                source,
            })?,
            Err(_) => {
                return Ok(TestCaseOutcome::failed(
                    &test_case.id,
                    format!("timed out after {}s", self.timeout.as_secs_f64()),
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            test_case = %test_case.id,
            language = %request.language,
            exit = ?output.status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "test case finished"
        );

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let mut message = format!("exited with status {code}");
            if !stderr.trim().is_empty() {
                message.push_str(": ");
                message.push_str(&truncate(&stderr));
            }
            return Ok(TestCaseOutcome {
                test_case_id: test_case.id.clone(),
                passed: false,
                actual_output: stdout,
                error: Some(message),
            });
        }

        let passed = outputs_match(&stdout, &test_case.expected_output);
        Ok(TestCaseOutcome {
            test_case_id: test_case.id.clone(),
            passed,
            actual_output: stdout,
            error: (!passed).then(|| "output did not match the expected output".to_string()),
        })
    }
}
