//! Per-execution scratch directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::config::CommandSpec;

/// Variables blanked out for submitted programs.
const SCRUBBED_ENV: &[&str] = &[
    "SSH_AUTH_SOCK",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GITHUB_TOKEN",
    "GH_TOKEN",
    "DATABASE_URL",
    "NPM_TOKEN",
    "KUBECONFIG",
];

/// A temporary directory holding one submitted source file.
///
/// On drop, the directory is removed.
pub struct WorkDir {
    dir: TempDir,
    source_path: PathBuf,
}

impl WorkDir {
    /// Create a scratch directory and write `code` into it under the
    /// spec's file name.
    pub fn with_source(spec: &CommandSpec, code: &str) -> Result<Self> {
        let dir = TempDir::new().context("failed to create temp directory")?;
        let file_name = Path::new(&spec.file_name)
            .file_name()
            .context("runner file_name must name a file")?;
        let source_path = dir.path().join(file_name);
        std::fs::write(&source_path, code)
            .with_context(|| format!("failed to write {}", source_path.display()))?;
        Ok(Self { dir, source_path })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Expand `{file}` and `{dir}` in the command arguments.
    pub fn expand_args(&self, spec: &CommandSpec) -> Vec<String> {
        let file = self.source_path.to_string_lossy();
        let dir = self.dir.path().to_string_lossy();
        spec.args
            .iter()
            .map(|a| a.replace("{file}", &file).replace("{dir}", &dir))
            .collect()
    }

    /// Environment for the child process: scrubbed secrets, then the
    /// spec's own variables.
    pub fn build_env(&self, spec: &CommandSpec) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = SCRUBBED_ENV
            .iter()
            .map(|var| (var.to_string(), String::new()))
            .collect();
        env.extend(spec.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}
