//! Batch grader.
//!
//! Grades every answer of a submission concurrently and drives the test
//! runner for coding and algorithmic questions. One failing question
//! never stops the others.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::answer::SubmittedAnswer;
use crate::error::GradingError;
use crate::grading::{execution_plan, grade_with_policy, score_test_outcomes, ExecutionPlan};
use crate::model::{QuestionDefinition, Quiz, ScoringPolicy};
use crate::report::{QuestionOutcome, QuestionReport, SubmissionReport};
use crate::results::{GradeStatus, GradingResult, TestCaseOutcome};
use crate::submission::Submission;
use crate::traits::{TestCaseRequest, TestRunner};

/// Configuration for the batch grader.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Maximum questions graded at once.
    pub parallelism: usize,
    /// Limit for a single test-case execution.
    pub test_timeout: Duration,
    /// Default policy for matching, dropdown and fill-blank questions.
    pub scoring: ScoringPolicy,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            test_timeout: Duration::from_secs(10),
            scoring: ScoringPolicy::PartialCredit,
        }
    }
}

/// Progress reporting trait.
pub trait GradingProgress: Send + Sync {
    fn on_question_start(&self, question_id: &str);
    fn on_question_complete(&self, result: &GradingResult);
    fn on_question_error(&self, question_id: &str, error: &GradingError);
    fn on_submission_complete(&self, total: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl GradingProgress for NoopProgress {
    fn on_question_start(&self, _: &str) {}
    fn on_question_complete(&self, _: &GradingResult) {}
    fn on_question_error(&self, _: &str, _: &GradingError) {}
    fn on_submission_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Grades answers, running code through a [`TestRunner`] where needed.
pub struct Grader {
    runner: Arc<dyn TestRunner>,
    config: GraderConfig,
}

impl Grader {
    pub fn new(runner: Arc<dyn TestRunner>, config: GraderConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade one answer to completion.
    ///
    /// Coding and algorithmic answers run every test case concurrently;
    /// a runner error or timeout fails that case only.
    pub async fn grade(
        &self,
        question: &QuestionDefinition,
        answer: &SubmittedAnswer,
    ) -> Result<GradingResult, GradingError> {
        let result = grade_with_policy(question, answer, self.config.scoring)?;
        if result.status != GradeStatus::AwaitingExecution {
            return Ok(result);
        }
        let Some(plan) = execution_plan(question, answer) else {
            return Ok(result);
        };

        let outcomes = self.execute(&question.id, &plan).await;
        Ok(score_test_outcomes(question, &plan.test_cases, outcomes))
    }

    async fn execute(&self, question_id: &str, plan: &ExecutionPlan) -> Vec<TestCaseOutcome> {
        let mut futures = FuturesUnordered::new();
        for test_case in &plan.test_cases {
            let runner = Arc::clone(&self.runner);
            let request = TestCaseRequest::new(&plan.language, &plan.code, test_case.clone());
            let timeout = self.config.test_timeout;

            futures.push(async move {
                let id = request.test_case.id.clone();
                match tokio::time::timeout(timeout, runner.run_test_case(&request)).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => {
                        tracing::warn!("runner failed on test case {id}: {e:#}");
                        TestCaseOutcome::failed(id, format!("runner error: {e:#}"))
                    }
                    Err(_) => TestCaseOutcome::failed(
                        id,
                        format!("timed out after {}ms", timeout.as_millis()),
                    ),
                }
            });
        }

        let mut outcomes = Vec::with_capacity(plan.test_cases.len());
        while let Some(outcome) = futures.next().await {
            outcomes.push(outcome);
        }
        tracing::debug!(
            question_id,
            runner = self.runner.name(),
            passed = outcomes.iter().filter(|o| o.passed).count(),
            total = outcomes.len(),
            "executed test cases"
        );
        outcomes
    }

    /// Grade every question of `quiz` against `submission`.
    pub async fn grade_submission(
        &self,
        quiz: &Quiz,
        submission: &Submission,
        progress: &dyn GradingProgress,
    ) -> SubmissionReport {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut warnings = Vec::new();
        if submission.quiz_id != quiz.id {
            warnings.push(format!(
                "submission is for quiz '{}' but was graded against '{}'",
                submission.quiz_id, quiz.id
            ));
        }
        for question_id in submission.answers.keys() {
            if quiz.question(question_id).is_none() {
                tracing::warn!("ignoring answer for unknown question '{question_id}'");
                warnings.push(format!("answer for unknown question '{question_id}' ignored"));
            }
        }

        let mut futures = FuturesUnordered::new();
        for (index, question) in quiz.questions.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let answer = submission.answers.get(&question.id);

            futures.push(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.ok();
                progress.on_question_start(&question.id);
                let outcome = match answer {
                    Some(answer) => self.grade(question, answer).await,
                    None => Ok(GradingResult::unanswered(question)),
                };
                (index, question, outcome)
            });
        }

        let total = futures.len();
        let mut failed = 0usize;
        let mut questions = Vec::with_capacity(total);
        while let Some((index, question, outcome)) = futures.next().await {
            let outcome = match outcome {
                Ok(result) => {
                    progress.on_question_complete(&result);
                    QuestionOutcome::Graded(result)
                }
                Err(e) => {
                    tracing::error!("grading failed for question '{}': {e}", question.id);
                    progress.on_question_error(&question.id, &e);
                    failed += 1;
                    QuestionOutcome::failed(&e)
                }
            };
            questions.push((
                index,
                QuestionReport {
                    question_id: question.id.clone(),
                    question_type: question.question_type(),
                    weight: quiz.weight_of(&question.id),
                    max_points: question.points,
                    outcome,
                },
            ));
        }
        questions.sort_by_key(|(index, _)| *index);

        let elapsed = start.elapsed();
        progress.on_submission_complete(total, failed, elapsed);

        SubmissionReport::new(
            Uuid::new_v4(),
            quiz,
            submission,
            questions.into_iter().map(|(_, q)| q).collect(),
            warnings,
            elapsed,
        )
    }
}
