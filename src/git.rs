use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::info;

/// Lists release tag refs of a remote repository as `<commit> <ref>` lines.
pub trait RefLister {
    fn list_tags(&self, repo_url: &str, tag_project: &str) -> Result<String>;
}

pub struct GitRefLister {
    program: PathBuf,
}

impl GitRefLister {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitRefLister {
    fn default() -> Self {
        Self::new()
    }
}

fn ls_remote_args(repo_url: &str, tag_project: &str) -> Vec<String> {
    vec![
        "ls-remote".to_string(),
        "--tags".to_string(),
        "--sort=v:refname".to_string(),
        repo_url.to_string(),
        format!("refs/tags*/{tag_project}_*"),
    ]
}

impl RefLister for GitRefLister {
    fn list_tags(&self, repo_url: &str, tag_project: &str) -> Result<String> {
        let args = ls_remote_args(repo_url, tag_project);
        info!("running {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(anyhow!(
                "git ls-remote for {} exited with code {:?}: {}",
                repo_url,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}
