use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// `MAJOR.MINOR.PATCH[-SUBVERSION]` as published in the jitsi package index.
///
/// Ordering compares the fields left to right; `subversion` is compared
/// as a plain string, so `"10" < "9"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub subversion: String,
}

impl PackageVersion {
    pub fn new(major: u64, minor: u64, patch: u64, subversion: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            patch,
            subversion: subversion.into(),
        }
    }
}

impl FromStr for PackageVersion {
    type Err = ParseError;

    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ParseError::InvalidVersion {
            version: version.to_string(),
            reason,
        };

        let parts: Vec<&str> = version.split('.').collect();
        let &[major, minor, rest] = parts.as_slice() else {
            return Err(invalid(format!(
                "expected 3 dot-separated components, found {}",
                parts.len()
            )));
        };
        let (patch, subversion) = rest.split_once('-').unwrap_or((rest, ""));

        let number = |name: &str, value: &str| {
            value
                .parse::<u64>()
                .map_err(|err| invalid(format!("{name} component '{value}': {err}")))
        };

        Ok(Self::new(
            number("major", major)?,
            number("minor", minor)?,
            number("patch", patch)?,
            subversion,
        ))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.subversion.is_empty() {
            write!(f, "-{}", self.subversion)?;
        }
        Ok(())
    }
}
