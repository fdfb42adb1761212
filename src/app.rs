use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::config::{SyncConfig, TrackedProject};
use crate::deps;
use crate::git::RefLister;
use crate::index::IndexSource;
use crate::output;
use crate::tags::{self, RefClassifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Deps,
    Tags { project: Option<String> },
    All,
}

pub fn run(
    index: &dyn IndexSource,
    refs: &dyn RefLister,
    config: &SyncConfig,
    out_dir: &Path,
    command: CliCommand,
) -> Result<()> {
    match command {
        CliCommand::Deps => sync_deps(index, config, out_dir)?,
        CliCommand::Tags { project } => sync_tags(refs, config, out_dir, project.as_deref())?,
        CliCommand::All => {
            sync_deps(index, config, out_dir)?;
            sync_tags(refs, config, out_dir, None)?;
        }
    }

    Ok(())
}

fn sync_deps(index: &dyn IndexSource, config: &SyncConfig, out_dir: &Path) -> Result<()> {
    let deps_config = &config.deps;
    let cutoff = deps_config.cutoff_version()?;

    for channel in &deps_config.channels {
        let text = index.fetch(&channel.index_url)?;

        info!(channel = %channel.name, "filtering and parsing deps for {}", deps_config.package);
        let records = deps::extract_dependency_records(text.lines(), &deps_config.package, &cutoff)
            .with_context(|| format!("Failed to extract dependencies from {}", channel.index_url))?;

        output::write_json(&out_dir.join(&channel.output), &records)?;
    }

    Ok(())
}

fn sync_tags(
    refs: &dyn RefLister,
    config: &SyncConfig,
    out_dir: &Path,
    only: Option<&str>,
) -> Result<()> {
    let projects: Vec<&TrackedProject> = match only {
        Some(name) => vec![config.tags.find(name)?],
        None => config.tags.projects.iter().collect(),
    };

    for project in projects {
        let repo_url = config.tags.repo_url(project);
        let listing = refs.list_tags(&repo_url, &project.tag_project)?;
        let sync_at = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        let classifier = RefClassifier::new(&project.tag_project)?;
        let reports = tags::build_reports(&listing, &classifier, &project.repo, &sync_at);

        output::write_json(&out_dir.join(project.stable_output()), &reports.stable)?;
        output::write_json(&out_dir.join(project.unstable_output()), &reports.unstable)?;
    }

    Ok(())
}
