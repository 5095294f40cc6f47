//! Runner and grader configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgrade_core::engine::GraderConfig;
use quizgrade_core::model::ScoringPolicy;

/// How to run programs written in one language.
///
/// `args` may contain `{file}` (path of the written source file) and
/// `{dir}` (the scratch directory).
///
/// Note: Custom Debug impl masks env values to keep secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Name of the source file written into the scratch directory.
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env: Vec<&String> = self.env.keys().collect();
        f.debug_struct("CommandSpec")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("file_name", &self.file_name)
            .field("env", &env)
            .finish()
    }
}

fn default_file_name() -> String {
    "solution".to_string()
}

impl CommandSpec {
    pub fn new(command: &str, args: &[&str], file_name: &str) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            file_name: file_name.to_string(),
            env: HashMap::new(),
        }
    }
}

/// Top-level quizgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    /// Max questions graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Limit for one test-case execution, in seconds.
    #[serde(default = "default_test_timeout")]
    pub test_timeout_secs: u64,
    /// Default policy for matching, dropdown and fill-blank questions.
    #[serde(default)]
    pub scoring: ScoringPolicy,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Commands keyed by language.
    #[serde(default = "default_runners")]
    pub runners: HashMap<String, CommandSpec>,
}

fn default_parallelism() -> usize {
    4
}
fn default_test_timeout() -> u64 {
    10
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizgrade-reports")
}

/// Built-in language commands used when the config names none.
pub fn default_runners() -> HashMap<String, CommandSpec> {
    HashMap::from([
        (
            "python".to_string(),
            CommandSpec::new("python3", &["{file}"], "main.py"),
        ),
        (
            "javascript".to_string(),
            CommandSpec::new("node", &["{file}"], "main.js"),
        ),
        (
            "shell".to_string(),
            CommandSpec::new("sh", &["{file}"], "main.sh"),
        ),
    ])
}

impl Default for QuizgradeConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            test_timeout_secs: default_test_timeout(),
            scoring: ScoringPolicy::default(),
            output_dir: default_output_dir(),
            runners: default_runners(),
        }
    }
}

impl QuizgradeConfig {
    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }

    pub fn grader_config(&self) -> GraderConfig {
        GraderConfig {
            parallelism: self.parallelism.max(1),
            test_timeout: self.test_timeout(),
            scoring: self.scoring,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_command_spec(spec: &CommandSpec) -> CommandSpec {
    CommandSpec {
        command: resolve_env_vars(&spec.command),
        args: spec.args.iter().map(|a| resolve_env_vars(a)).collect(),
        file_name: spec.file_name.clone(),
        env: spec
            .env
            .iter()
            .map(|(k, v)| (k.clone(), resolve_env_vars(v)))
            .collect(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    config.runners = config
        .runners
        .iter()
        .map(|(lang, spec)| (lang.to_lowercase(), resolve_command_spec(spec)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}
