use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info};

use crate::model::DependencyRecord;
use crate::stanza::select_package;
use crate::version::PackageVersion;

/// Extracts `name (= version)` pins from a Debian relationship field.
///
/// Alternatives (`|`) are split like plain commas. Entries with range
/// constraints or without a version are skipped.
pub struct ExactPinParser {
    pattern: Regex,
}

impl ExactPinParser {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^([\w-]+) \(= (.+)\)$")
            .context("Failed to compile exact-pin dependency regex")?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, field: Option<&str>) -> IndexMap<String, String> {
        let mut pins = IndexMap::new();
        let Some(field) = field else {
            return pins;
        };

        for entry in field.split([',', '|']).map(str::trim) {
            if let Some(caps) = self.pattern.captures(entry) {
                pins.insert(caps[1].to_string(), caps[2].to_string());
            }
        }

        pins
    }
}

/// Builds one record per `package` stanza at or above `cutoff`, sorted by
/// the raw version string, highest first.
pub fn extract_dependency_records<I, S>(
    lines: I,
    package: &str,
    cutoff: &PackageVersion,
) -> Result<Vec<DependencyRecord>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pins = ExactPinParser::new()?;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for fields in select_package(lines, package) {
        let fields = fields.with_context(|| format!("Malformed stanza for package {package}"))?;
        let version = fields
            .version()
            .ok_or_else(|| anyhow!("Stanza for package {package} has no Version field"))?;
        let parsed: PackageVersion = version.parse()?;

        if parsed < *cutoff {
            debug!(%version, %cutoff, "skipping version below cutoff");
            skipped += 1;
            continue;
        }

        let mut deps = pins.parse(fields.pre_depends());
        deps.extend(pins.parse(fields.depends()));
        let recommends = pins.parse(fields.recommends());

        debug!(
            %version,
            fields = fields.field_count(),
            deps = deps.len(),
            recommends = recommends.len(),
            "collected dependency record"
        );
        records.push(DependencyRecord {
            version: version.to_string(),
            deps,
            recommends,
        });
    }

    records.sort_by(|a, b| b.version.cmp(&a.version));
    info!(
        package,
        kept = records.len(),
        skipped,
        "extracted dependency records"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use indexmap::IndexMap;

    use super::{ExactPinParser, extract_dependency_records};
    use crate::error::ParseError;
    use crate::version::PackageVersion;

    fn pins(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn cutoff() -> PackageVersion {
        PackageVersion::new(2, 0, 6030, "1")
    }

    #[test]
    fn keeps_only_exact_pins() -> Result<()> {
        let parser = ExactPinParser::new()?;
        let parsed = parser.parse(Some("foo (= 1.2.3), bar (>= 4.0), baz (= 5)"));
        assert_eq!(parsed, pins(&[("foo", "1.2.3"), ("baz", "5")]));
        Ok(())
    }

    #[test]
    fn treats_alternatives_as_separate_entries() -> Result<()> {
        let parser = ExactPinParser::new()?;
        let parsed = parser.parse(Some(
            "nginx (= 1.18) | apache2 (= 2.4-1), openjdk-11-jre-headless | java11-runtime, prosody",
        ));
        assert_eq!(parsed, pins(&[("nginx", "1.18"), ("apache2", "2.4-1")]));
        Ok(())
    }

    #[test]
    fn absent_or_empty_field_is_empty() -> Result<()> {
        let parser = ExactPinParser::new()?;
        assert!(parser.parse(None).is_empty());
        assert!(parser.parse(Some("")).is_empty());
        Ok(())
    }

    #[test]
    fn later_duplicate_overwrites_earlier() -> Result<()> {
        let parser = ExactPinParser::new()?;
        let parsed = parser.parse(Some("x (= 1), y (= 2), x (= 3)"));
        assert_eq!(parsed, pins(&[("x", "3"), ("y", "2")]));
        Ok(())
    }

    #[test]
    fn depends_override_pre_depends() -> Result<()> {
        let index = "\
Package: jitsi-meet
Version: 2.0.7001-1
Pre-Depends: x (= 1), pre (= 0.1)
Depends: x (= 2)
";
        let records = extract_dependency_records(index.lines(), "jitsi-meet", &cutoff())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].deps, pins(&[("x", "2"), ("pre", "0.1")]));
        Ok(())
    }

    #[test]
    fn filters_by_cutoff_and_sorts_by_version_string() -> Result<()> {
        let index = "\
Package: jitsi-meet
Version: 2.0.6029-9
Depends: jicofo (= 1.0-500-1)

Package: jitsi-meet
Version: 2.0.6030-1
Depends: jicofo (= 1.0-600-1), jitsi-meet-web (= 1.0.4000-1)
Recommends: jitsi-meet-turnserver (= 1.0.4000-1) | apache2

Package: jitsi-meet
Version: 2.0.6030-0

Package: jitsi-meet
Version: 2.0.10000-1
Depends: jicofo (= 1.0-900-1),
 jitsi-meet-web (= 1.0.9000-1)

Package: jitsi-meet
Version: 2.0.7001-1
Depends: jicofo (>= 1.0)
";
        let records = extract_dependency_records(index.lines(), "jitsi-meet", &cutoff())?;

        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["2.0.7001-1", "2.0.6030-1", "2.0.10000-1"]);

        assert!(records[0].deps.is_empty());
        assert_eq!(
            records[1].deps,
            pins(&[("jicofo", "1.0-600-1"), ("jitsi-meet-web", "1.0.4000-1")])
        );
        assert_eq!(
            records[1].recommends,
            pins(&[("jitsi-meet-turnserver", "1.0.4000-1")])
        );
        assert_eq!(
            records[2].deps,
            pins(&[("jicofo", "1.0-900-1"), ("jitsi-meet-web", "1.0.9000-1")])
        );
        Ok(())
    }

    #[test]
    fn malformed_version_aborts_extraction() {
        let index = "Package: jitsi-meet\nVersion: 2.0\n";
        let error = extract_dependency_records(index.lines(), "jitsi-meet", &cutoff())
            .expect_err("version without patch component must fail");
        assert!(matches!(
            error.downcast_ref::<ParseError>(),
            Some(ParseError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn missing_version_field_aborts_extraction() {
        let index = "Package: jitsi-meet\nDepends: a (= 1)\n";
        let error = extract_dependency_records(index.lines(), "jitsi-meet", &cutoff())
            .expect_err("stanza without Version must fail");
        assert!(error.to_string().contains("no Version field"));
    }

    #[test]
    fn orphan_continuation_aborts_extraction() {
        let index = " orphan\n\nPackage: jitsi-meet\nVersion: 2.0.7001-1\n";
        let error = extract_dependency_records(index.lines(), "jitsi-meet", &cutoff())
            .expect_err("orphan continuation must fail");
        assert!(matches!(
            error.downcast_ref::<ParseError>(),
            Some(ParseError::OrphanContinuation { line: 1, .. })
        ));
    }
}
