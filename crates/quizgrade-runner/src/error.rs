//! Runner error types.

use thiserror::Error;

/// Failures of the runner itself, as opposed to failing test cases.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no runner configured for language '{0}'")]
    UnsupportedLanguage(String),

    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
