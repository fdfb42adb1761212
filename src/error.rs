use thiserror::Error;

/// Malformed input found while reading a package index. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("continuation line without a preceding field (line {line}): {content:?}")]
    OrphanContinuation { line: usize, content: String },
    #[error("field line without ': ' separator: {0:?}")]
    MissingSeparator(String),
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}
