//! Reader for Clawpack-style `.data` parameter files.
//!
//! The Python setup tools write each parameter as one line of values
//! followed by `=:` and the parameter name, optionally with a description.
//!
//! # File Format
//!
//! ```text
//! # comment lines start with '#'
//! 1                    =: n_point_sources  Number of point sources
//!
//! 0                    =: id  ID of this point source
//! 10.0 11.0            =: coord  coordinates
//! 3                    =: n_times  number of time segments
//! 60.0 1800.0 7200.0   =: end_times  end times of segments
//! 1.0 0.5 0.1          =: vol_rates  volumetric rates of segments
//! ```
//!
//! Entries are consumed in order: the file layout is positional, and names
//! such as `id` repeat once per record.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Error type for `.data` file parsing.
#[derive(Debug, Error)]
pub enum DataFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line without the `=:` separator
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Next entry does not carry the expected name
    #[error("Expected entry {expected:?} at line {line}, found {found:?}")]
    UnexpectedEntry {
        line: usize,
        expected: String,
        found: String,
    },

    /// File ended before the expected entry
    #[error("Missing entry {0:?}")]
    MissingEntry(String),

    /// Entry values cannot be converted to the requested type
    #[error("Invalid value for {name:?} at line {line}: {message}")]
    InvalidValue {
        line: usize,
        name: String,
        message: String,
    },
}

/// One `values =: name description` line.
#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    /// 1-based line number
    pub line: usize,
    /// Value tokens, with a quoted run kept as one token
    pub values: Vec<String>,
    /// Tokens after `=:` (name followed by description words)
    pub label: Vec<String>,
}

impl DataEntry {
    /// Whether the label starts with the tokens of `name`.
    fn matches(&self, name: &str) -> bool {
        let wanted: Vec<&str> = name.split_whitespace().collect();
        wanted.len() <= self.label.len()
            && wanted.iter().zip(&self.label).all(|(w, l)| *w == l.as_str())
    }

    fn invalid(&self, name: &str, message: impl Into<String>) -> DataFileError {
        DataFileError::InvalidValue {
            line: self.line,
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Sequential cursor over the entries of a `.data` file.
#[derive(Clone, Debug)]
pub struct DataFile {
    entries: Vec<DataEntry>,
    cursor: usize,
}

impl DataFile {
    /// Load and parse a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataFileError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Parse file contents.
    pub fn parse(text: &str) -> Result<Self, DataFileError> {
        let mut entries = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (values, label) = line.split_once("=:").ok_or_else(|| DataFileError::Parse {
                line: line_num + 1,
                message: "missing '=:' separator".into(),
            })?;

            entries.push(DataEntry {
                line: line_num + 1,
                values: split_values(values),
                label: label.split_whitespace().map(str::to_string).collect(),
            });
        }

        Ok(Self { entries, cursor: 0 })
    }

    /// Number of entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Consume the next entry, which must be named `name`.
    pub fn next_entry(&mut self, name: &str) -> Result<&DataEntry, DataFileError> {
        let entry = self
            .entries
            .get(self.cursor)
            .ok_or_else(|| DataFileError::MissingEntry(name.to_string()))?;

        if !entry.matches(name) {
            return Err(DataFileError::UnexpectedEntry {
                line: entry.line,
                expected: name.to_string(),
                found: entry.label.join(" "),
            });
        }

        self.cursor += 1;
        Ok(&self.entries[self.cursor - 1])
    }

    /// Read a single floating-point value.
    pub fn read_f64(&mut self, name: &str) -> Result<f64, DataFileError> {
        let entry = self.next_entry(name)?;
        match entry.values.as_slice() {
            [one] => parse_f64(one).ok_or_else(|| entry.invalid(name, format!("{:?} is not a number", one))),
            other => Err(entry.invalid(name, format!("expected 1 value, found {}", other.len()))),
        }
    }

    /// Read a list of floating-point values.
    pub fn read_f64s(&mut self, name: &str) -> Result<Vec<f64>, DataFileError> {
        let entry = self.next_entry(name)?;
        entry
            .values
            .iter()
            .map(|v| parse_f64(v).ok_or_else(|| entry.invalid(name, format!("{:?} is not a number", v))))
            .collect()
    }

    /// Read a single signed integer.
    pub fn read_i64(&mut self, name: &str) -> Result<i64, DataFileError> {
        let entry = self.next_entry(name)?;
        match entry.values.as_slice() {
            [one] => one
                .parse()
                .map_err(|_| entry.invalid(name, format!("{:?} is not an integer", one))),
            other => Err(entry.invalid(name, format!("expected 1 value, found {}", other.len()))),
        }
    }

    /// Read a single non-negative integer.
    pub fn read_usize(&mut self, name: &str) -> Result<usize, DataFileError> {
        let line = self.entries.get(self.cursor).map(|e| e.line).unwrap_or(0);
        let value = self.read_i64(name)?;
        usize::try_from(value).map_err(|_| DataFileError::InvalidValue {
            line,
            name: name.to_string(),
            message: format!("{} is negative", value),
        })
    }

    /// Read a single string value (quotes stripped).
    pub fn read_string(&mut self, name: &str) -> Result<String, DataFileError> {
        let entry = self.next_entry(name)?;
        if entry.values.is_empty() {
            return Err(entry.invalid(name, "empty value"));
        }
        Ok(entry.values.join(" "))
    }
}

/// Parse a float, accepting Fortran `d` exponents and Python `None` as NaN.
fn parse_f64(token: &str) -> Option<f64> {
    if token.eq_ignore_ascii_case("none") {
        return Some(f64::NAN);
    }
    token
        .parse()
        .ok()
        .or_else(|| token.replace(['d', 'D'], "e").parse().ok())
}

fn unquote(token: &str) -> String {
    token.trim_matches(|c| c == '\'' || c == '"').to_string()
}

/// Split the value part of a line on whitespace. A quoted run is one token
/// and keeps its inner whitespace verbatim.
fn split_values(values: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = values.trim_start();

    while !rest.is_empty() {
        let quote = rest.chars().next().filter(|&c| c == '\'' || c == '"');
        if let Some(quote) = quote {
            let body = &rest[1..];
            match body.find(quote) {
                Some(end) => {
                    tokens.push(body[..end].to_string());
                    rest = &body[end + 1..];
                }
                // Unterminated quote: take the rest of the line.
                None => {
                    tokens.push(body.trim_end().to_string());
                    rest = "";
                }
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(unquote(&rest[..end]));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }

    tokens
}
