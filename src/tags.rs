use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info};

use crate::model::{RefTag, TagEntry, TagReport, TagReports};

/// Recognises `refs/tags/[stable/]<project>_<N>` refs.
pub struct RefClassifier {
    pattern: Regex,
}

impl RefClassifier {
    pub fn new(project: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^refs/tags/((stable/)?{}_(\d+))$",
            regex::escape(project)
        ))
        .with_context(|| format!("Failed to compile tag regex for {project}"))?;
        Ok(Self { pattern })
    }

    /// Returns `None` for refs outside the naming convention.
    pub fn classify(&self, reference: &str) -> Option<RefTag> {
        let caps = self.pattern.captures(reference)?;
        let version = caps[3].parse().ok()?;
        Some(RefTag {
            tag: caps[1].to_string(),
            stable: caps.get(2).is_some(),
            version,
        })
    }
}

#[derive(Default)]
struct StreamBuilder {
    tags: IndexMap<u64, TagEntry>,
}

impl StreamBuilder {
    fn insert(&mut self, version: u64, entry: TagEntry) {
        self.tags.insert(version, entry);
    }

    fn finish(self, repo: &str, sync_at: &str) -> TagReport {
        let mut versions: Vec<u64> = self.tags.keys().copied().collect();
        versions.sort_unstable_by(|a, b| b.cmp(a));
        TagReport {
            repo: repo.to_string(),
            sync_at: sync_at.to_string(),
            versions,
            tags: self.tags,
        }
    }
}

/// Classifies `git ls-remote` output into stable and unstable reports.
///
/// Lines that are not `<commit> <ref>` pairs, or whose ref does not match
/// the classifier, are ignored. A repeated version keeps the last line.
pub fn build_reports(
    listing: &str,
    classifier: &RefClassifier,
    repo: &str,
    sync_at: &str,
) -> TagReports {
    let mut stable = StreamBuilder::default();
    let mut unstable = StreamBuilder::default();

    for line in listing.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(commit), Some(reference), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            continue;
        };

        let Some(ref_tag) = classifier.classify(reference) else {
            debug!(reference, "ignoring ref");
            continue;
        };

        let entry = TagEntry {
            commit: commit.to_string(),
            tag: ref_tag.tag,
        };
        if ref_tag.stable {
            stable.insert(ref_tag.version, entry);
        } else {
            unstable.insert(ref_tag.version, entry);
        }
    }

    let reports = TagReports {
        stable: stable.finish(repo, sync_at),
        unstable: unstable.finish(repo, sync_at),
    };

    info!(
        repo,
        stable = reports.stable.versions.len(),
        unstable = reports.unstable.versions.len(),
        "classified tags"
    );
    if let Some(latest) = reports.stable.latest() {
        info!(repo, tag = %latest.tag, "latest stable");
    }
    if let Some(latest) = reports.unstable.latest() {
        info!(repo, tag = %latest.tag, "latest unstable");
    }

    reports
}
