//! On-disk baseline namespaces.
//!
//! ```text
//! <root>/gates/<name>.json
//! <root>/structural/<name>.json
//! ```
//!
//! Files are written once. Replacing a baseline means deleting it first.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::contract::envelope::{self, Envelope};

pub const FORMAT_VERSION: u32 = 1;

/// Errors raised by baseline persistence.
#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Invalid baseline name: {0:?}")]
    BadName(String),

    #[error("Baseline '{0}' already exists; delete it before creating a replacement")]
    AlreadyExists(String),

    #[error("Baseline I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Baseline {} is not valid JSON: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Baseline {} violates its schema: {}", .path.display(), .errors.join("; "))]
    SchemaViolation { path: PathBuf, errors: Vec<String> },
}

/// The two baseline namespaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BaselineKind {
    Gates,
    Structural,
}

impl BaselineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineKind::Gates => "gates",
            BaselineKind::Structural => "structural",
        }
    }

    fn envelope(&self) -> Envelope {
        match self {
            BaselineKind::Gates => Envelope::GateBaseline,
            BaselineKind::Structural => Envelope::StructuralBaseline,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMeta {
    pub name: String,
    pub kind: BaselineKind,
    /// RFC 3339 creation time
    pub created_at: String,
    pub format_version: u32,
}

impl BaselineMeta {
    pub fn new(name: &str, kind: BaselineKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            created_at: chrono::Utc::now().to_rfc3339(),
            format_version: FORMAT_VERSION,
        }
    }
}

/// Reduce a caller-supplied name to a safe file stem.
///
/// Only the final path component survives; characters outside
/// `[A-Za-z0-9_.-]` become `_` and leading dots are trimmed.
pub fn sanitize_name(name: &str) -> Result<String, BaselineError> {
    let base = name
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = cleaned.strip_suffix(".json").unwrap_or(cleaned);

    if cleaned.is_empty() {
        Err(BaselineError::BadName(name.to_string()))
    } else {
        Ok(cleaned.to_string())
    }
}

/// Named snapshot files under one root directory.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, kind: BaselineKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    pub fn path_for(&self, kind: BaselineKind, name: &str) -> Result<PathBuf, BaselineError> {
        let stem = sanitize_name(name)?;
        Ok(self.dir(kind).join(format!("{}.json", stem)))
    }

    /// Write a new snapshot. Fails if one with the same name exists.
    pub fn write_new(&self, kind: BaselineKind, name: &str, value: &Value) -> Result<PathBuf, BaselineError> {
        let path = self.path_for(kind, name)?;
        let io_err = |source: std::io::Error| BaselineError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(self.dir(kind)).map_err(io_err)?;
        let body = serde_json::to_string_pretty(value).map_err(|source| BaselineError::Malformed {
            path: path.clone(),
            source,
        })?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BaselineError::AlreadyExists(name.to_string()))
            }
            Err(e) => return Err(io_err(e)),
        };
        file.write_all(body.as_bytes()).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;

        tracing::info!(kind = kind.as_str(), path = %path.display(), "Baseline written");
        Ok(path)
    }

    /// Read and schema-check a snapshot. `Ok(None)` when it does not exist.
    pub fn read(&self, kind: BaselineKind, name: &str) -> Result<Option<Value>, BaselineError> {
        let path = self.path_for(kind, name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BaselineError::Io { path, source }),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|source| BaselineError::Malformed {
            path: path.clone(),
            source,
        })?;
        envelope::check(kind.envelope(), &value)
            .map_err(|errors| BaselineError::SchemaViolation { path, errors })?;
        Ok(Some(value))
    }

    /// Remove a snapshot. Returns whether anything was deleted.
    pub fn delete(&self, kind: BaselineKind, name: &str) -> Result<bool, BaselineError> {
        let path = self.path_for(kind, name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(kind = kind.as_str(), path = %path.display(), "Baseline deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(BaselineError::Io { path, source }),
        }
    }

    /// Sorted baseline names in one namespace.
    pub fn list(&self, kind: BaselineKind) -> Result<Vec<String>, BaselineError> {
        let dir = self.dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(BaselineError::Io { path: dir, source }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BaselineError::Io {
                path: dir.clone(),
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
