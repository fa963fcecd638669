//! Fixture files: loading, schema checks and stress-placeholder expansion.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::baseline::sanitize_name;
use crate::contract::envelope::{self, Envelope};
use crate::contract::PipelineConfig;

/// Sentence repeated to build filler text.
const FILLER_SENTENCE: &str =
    "Regional demand keeps shifting as operators add capacity and regulators revise tariff frameworks. ";

const MAX_FILLER_CHARS: usize = 1_000_000;
const MAX_TABLE_ROWS: usize = 2_000;
const MAX_TABLE_COLS: usize = 64;

lazy_static! {
    static ref FILLER: Regex = Regex::new(r"\{\{FILLER:(\d+)\}\}").unwrap();
    static ref TABLE: Regex = Regex::new(r"^\{\{TABLE:(\d+)x(\d+)\}\}$").unwrap();
}

/// Errors raised while loading fixtures.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Invalid fixture name: {0:?}")]
    BadName(String),

    #[error("Fixture '{name}' not found at {}", .path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("Failed to read fixture {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fixture {} is not valid JSON: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fixture {} violates the fixture schema: {}", .path.display(), .errors.join("; "))]
    SchemaViolation { path: PathBuf, errors: Vec<String> },
}

/// Outcomes a fixture declares for itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expectations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_pass: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppt_pass: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_classes: Vec<String>,
}

/// A stored example document with its declared outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub expected: Expectations,
    pub document: Value,
}

/// Reads fixtures from one directory.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    dir: PathBuf,
    stress: Vec<String>,
}

impl FixtureLoader {
    pub fn new(dir: impl Into<PathBuf>, config: &PipelineConfig) -> Self {
        Self {
            dir: dir.into(),
            stress: config.stress_fixtures.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load one fixture by name. Only the final path component of `name`
    /// is used.
    pub fn load(&self, name: &str) -> Result<Fixture, FixtureError> {
        let stem = sanitize_name(name).map_err(|_| FixtureError::BadName(name.to_string()))?;
        let path = self.dir.join(format!("{}.json", stem));

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FixtureError::NotFound { name: stem, path })
            }
            Err(source) => return Err(FixtureError::Io { path, source }),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|source| FixtureError::Malformed {
            path: path.clone(),
            source,
        })?;
        envelope::check(Envelope::Fixture, &value).map_err(|errors| FixtureError::SchemaViolation {
            path: path.clone(),
            errors,
        })?;
        let mut fixture: Fixture =
            serde_json::from_value(value).map_err(|source| FixtureError::Malformed { path, source })?;

        if self.stress.iter().any(|s| *s == stem) {
            expand_placeholders(&mut fixture.document);
            tracing::debug!(fixture = %stem, "Expanded stress placeholders");
        }
        Ok(fixture)
    }

    /// Sorted names of every fixture file in the directory.
    pub fn list(&self) -> Result<Vec<String>, FixtureError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| FixtureError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FixtureError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Replace `{{FILLER:n}}` tokens inside strings and whole-string
/// `{{TABLE:RxC}}` tokens throughout the tree.
pub fn expand_placeholders(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(caps) = TABLE.captures(s) {
                let rows = caps[1].parse().unwrap_or(0);
                let cols = caps[2].parse().unwrap_or(0);
                *value = table(rows, cols);
            } else if FILLER.is_match(s) {
                let expanded = FILLER.replace_all(s, |caps: &Captures| filler(caps[1].parse().unwrap_or(0)));
                *s = expanded.into_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(map) => map.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

/// Exactly `chars` characters of repeating text.
pub fn filler(chars: usize) -> String {
    FILLER_SENTENCE.chars().cycle().take(chars.min(MAX_FILLER_CHARS)).collect()
}

/// A `{headers, rows}` table with deterministic cell text.
pub fn table(rows: usize, cols: usize) -> Value {
    let rows = rows.min(MAX_TABLE_ROWS);
    let cols = cols.min(MAX_TABLE_COLS);
    let headers: Vec<String> = (1..=cols).map(|c| format!("Column {}", c)).collect();
    let body: Vec<Vec<String>> = (1..=rows)
        .map(|r| (1..=cols).map(|c| format!("R{}C{} {}", r, c, (r * 31 + c * 17) % 1000)).collect())
        .collect();
    json!({ "headers": headers, "rows": body })
}
