//! Reader for the Debian repository `Packages` index format.
//!
//! An index is a sequence of stanzas separated by blank lines. Lines
//! starting with `#` are comments. Lines starting with a space or a tab
//! fold into the previous field.

use std::collections::HashMap;

use crate::error::ParseError;

/// One record of the index: its logical lines, folded continuations
/// already joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stanza {
    lines: Vec<String>,
}

impl Stanza {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }
}

/// Splits a stream of physical lines into stanzas.
///
/// Works over any line source so it can be driven by a network response
/// or an in-memory list. The iterator stops after the first error.
pub struct Stanzas<I> {
    lines: I,
    buffer: Vec<String>,
    line_no: usize,
    done: bool,
}

impl<I> Stanzas<I> {
    pub fn new<L>(lines: L) -> Self
    where
        L: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            buffer: Vec::new(),
            line_no: 0,
            done: false,
        }
    }
}

fn take_stanza(buffer: &mut Vec<String>) -> Option<Stanza> {
    if buffer.is_empty() {
        None
    } else {
        Some(Stanza {
            lines: std::mem::take(buffer),
        })
    }
}

impl<I, S> Iterator for Stanzas<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<Stanza, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for raw in self.lines.by_ref() {
            self.line_no += 1;
            let raw = raw.as_ref();
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.is_empty() {
                if let Some(stanza) = take_stanza(&mut self.buffer) {
                    return Some(Ok(stanza));
                }
                continue;
            }

            if line.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match self.buffer.last_mut() {
                    Some(last) => {
                        last.push('\n');
                        last.push_str(line);
                    }
                    None => {
                        self.done = true;
                        return Some(Err(ParseError::OrphanContinuation {
                            line: self.line_no,
                            content: line.to_string(),
                        }));
                    }
                }
                continue;
            }

            self.buffer.push(line.to_string());
        }

        self.done = true;
        take_stanza(&mut self.buffer).map(Ok)
    }
}

/// Field view of a stanza, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub const PACKAGE: &'static str = "Package";
    pub const VERSION: &'static str = "Version";
    pub const PRE_DEPENDS: &'static str = "Pre-Depends";
    pub const DEPENDS: &'static str = "Depends";
    pub const RECOMMENDS: &'static str = "Recommends";

    /// Splits each logical line on the first `": "`.
    pub fn from_stanza(stanza: &Stanza) -> Result<Self, ParseError> {
        let mut values = HashMap::with_capacity(stanza.lines().len());
        for line in stanza.lines() {
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| ParseError::MissingSeparator(line.clone()))?;
            values.insert(key.to_string(), value.to_string());
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    pub fn version(&self) -> Option<&str> {
        self.get(Self::VERSION)
    }

    pub fn pre_depends(&self) -> Option<&str> {
        self.get(Self::PRE_DEPENDS)
    }

    pub fn depends(&self) -> Option<&str> {
        self.get(Self::DEPENDS)
    }

    pub fn recommends(&self) -> Option<&str> {
        self.get(Self::RECOMMENDS)
    }
}

/// Yields the parsed fields of every stanza describing `package`.
///
/// A stanza is selected when its first line is exactly `Package: <name>`;
/// other stanzas are skipped without being split into fields.
pub fn select_package<I, S>(
    lines: I,
    package: &str,
) -> impl Iterator<Item = Result<Fields, ParseError>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sentinel = format!("{}: {}", Fields::PACKAGE, package);
    Stanzas::new(lines).filter_map(move |stanza| match stanza {
        Ok(stanza) if stanza.first_line() == Some(sentinel.as_str()) => {
            Some(Fields::from_stanza(&stanza))
        }
        Ok(_) => None,
        Err(error) => Some(Err(error)),
    })
}
