use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Exact dependency pins of one published package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub version: String,
    pub deps: IndexMap<String, String>,
    pub recommends: IndexMap<String, String>,
}

/// A tag ref that follows the `[stable/]<project>_<N>` naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTag {
    pub tag: String,
    pub stable: bool,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub commit: String,
    pub tag: String,
}

/// Tags of one release stream, newest version first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReport {
    pub repo: String,
    #[serde(rename = "syncAt")]
    pub sync_at: String,
    pub versions: Vec<u64>,
    pub tags: IndexMap<u64, TagEntry>,
}

impl TagReport {
    pub fn latest(&self) -> Option<&TagEntry> {
        self.versions
            .first()
            .and_then(|version| self.tags.get(version))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReports {
    pub stable: TagReport,
    pub unstable: TagReport,
}
