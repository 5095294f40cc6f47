//! quizgrade-runner: test runners for coding and algorithmic questions.
//!
//! Provides a command-based runner that executes submissions as external
//! processes, a scripted runner for tests, and configuration loading.

pub mod command;
pub mod config;
pub mod error;
pub mod scripted;
pub mod workdir;

use std::sync::Arc;

use quizgrade_core::traits::TestRunner;

pub use command::CommandRunner;
pub use config::{load_config, load_config_from, CommandSpec, QuizgradeConfig};
pub use error::RunnerError;
pub use scripted::{ScriptedOutcome, ScriptedRunner};

/// Build the command runner described by `config`.
pub fn create_runner(config: &QuizgradeConfig) -> Arc<dyn TestRunner> {
    tracing::debug!(
        languages = config.runners.len(),
        timeout_secs = config.test_timeout_secs,
        "creating command runner"
    );
    Arc::new(CommandRunner::new(
        config.runners.clone(),
        config.test_timeout(),
    ))
}
