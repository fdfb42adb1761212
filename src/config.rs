use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::version::PackageVersion;

const DEFAULT_PACKAGE: &str = "jitsi-meet";
const DEFAULT_CUTOFF: &str = "2.0.6030-1";
const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// Everything a sync run needs to know about its sources and outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    pub deps: DepsConfig,
    pub tags: TagsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DepsConfig {
    /// Package whose stanzas are extracted from each index.
    pub package: String,
    /// Oldest version kept, in `MAJOR.MINOR.PATCH[-SUBVERSION]` form.
    pub cutoff: String,
    pub channels: Vec<DepsChannel>,
}

impl Default for DepsConfig {
    fn default() -> Self {
        let channel = |name: &str| DepsChannel {
            name: name.to_string(),
            index_url: format!("https://download.jitsi.org/{name}/Packages"),
            output: format!("deps_{name}_{DEFAULT_PACKAGE}.json"),
        };

        Self {
            package: DEFAULT_PACKAGE.to_string(),
            cutoff: DEFAULT_CUTOFF.to_string(),
            channels: vec![channel("stable"), channel("unstable")],
        }
    }
}

impl DepsConfig {
    pub fn cutoff_version(&self) -> Result<PackageVersion> {
        self.cutoff
            .parse()
            .with_context(|| format!("Invalid deps cutoff '{}'", self.cutoff))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepsChannel {
    pub name: String,
    pub index_url: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TagsConfig {
    /// Prefix joined with `repo` to form the remote URL.
    pub remote_base: String,
    pub projects: Vec<TrackedProject>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        let project = |name: &str| TrackedProject {
            name: name.to_string(),
            repo: format!("jitsi/{name}"),
            tag_project: DEFAULT_PACKAGE.to_string(),
        };

        Self {
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            projects: vec![
                project("jitsi-meet"),
                project("jitsi-videobridge"),
                project("jicofo"),
            ],
        }
    }
}

impl TagsConfig {
    pub fn repo_url(&self, project: &TrackedProject) -> String {
        format!("{}/{}", self.remote_base.trim_end_matches('/'), project.repo)
    }

    pub fn find(&self, name: &str) -> Result<&TrackedProject> {
        self.projects
            .iter()
            .find(|project| project.name == name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.projects.iter().map(|p| p.name.as_str()).collect();
                anyhow!(
                    "Unknown project '{}'. Known projects: {}",
                    name,
                    known.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProject {
    pub name: String,
    /// `owner/name` on the remote host.
    pub repo: String,
    /// Name embedded in release tags, e.g. `jitsi-meet` in `jitsi-meet_9000`.
    pub tag_project: String,
}

impl TrackedProject {
    pub fn stable_output(&self) -> String {
        format!("tags_stable_{}.json", self.name)
    }

    pub fn unstable_output(&self) -> String {
        format!("tags_unstable_{}.json", self.name)
    }
}

/// Loads `path` when given, otherwise the built-in jitsi defaults.
pub fn load(path: Option<&Path>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => {
            debug!("loading config from {}", path.display());
            let payload = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&payload)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => SyncConfig::default(),
    };

    config.deps.cutoff_version()?;
    Ok(config)
}
