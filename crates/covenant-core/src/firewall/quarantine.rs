//! Lossless side-store for fields the canonical schema does not recognize.
//!
//! Quarantine walks two levels: root keys, and the sub-keys of each known
//! object section. Keys carrying the internal prefix are left in place at
//! both levels. Objects nested inside arrays are not walked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::contract::PipelineConfig;
use crate::tree;

pub const REASON_UNKNOWN_ROOT: &str = "unknown-root-key";
pub const REASON_UNKNOWN_SECTION_FIELD: &str = "unknown-section-field";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarantineEntry {
    pub value: Value,
    pub reason: String,
}

/// Dotted path → quarantined value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct QuarantineStore {
    entries: BTreeMap<String, QuarantineEntry>,
}

impl QuarantineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: Value, reason: impl Into<String>) {
        self.entries.insert(
            path.into(),
            QuarantineEntry {
                value,
                reason: reason.into(),
            },
        );
    }

    pub fn get(&self, path: &str) -> Option<&QuarantineEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full listing in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &QuarantineEntry)> {
        self.entries.iter()
    }
}

/// Moves unrecognized keys out of a coerced document.
pub struct Quarantine<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Quarantine<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Split a document into its recognized part (returned) and its
    /// unrecognized part (added to `store`). Non-object input is returned
    /// unchanged.
    pub fn extract(&self, document: &Value, store: &mut QuarantineStore) -> Value {
        let Some(root) = document.as_object() else {
            return document.clone();
        };

        let shape = self.config.shape_of(document);
        let schema = self.config.schema_for(shape);
        let mut out = Map::new();

        for (key, value) in root {
            if self.config.is_internal_key(key) || self.config.is_meta_key(key) {
                out.insert(key.clone(), value.clone());
                continue;
            }

            let Some(spec) = schema.section(key) else {
                tracing::warn!(path = %key, "Quarantined unknown root key");
                store.insert(key.clone(), value.clone(), REASON_UNKNOWN_ROOT);
                continue;
            };

            let cleaned = match value {
                Value::Object(section) if spec.is_closed() => {
                    let mut kept = Map::new();
                    for (sub_key, sub_value) in section {
                        if spec.child(sub_key).is_some() || self.config.is_internal_key(sub_key) {
                            kept.insert(sub_key.clone(), sub_value.clone());
                        } else {
                            let path = tree::join(key, sub_key);
                            tracing::warn!(path = %path, "Quarantined unknown section field");
                            store.insert(path, sub_value.clone(), REASON_UNKNOWN_SECTION_FIELD);
                        }
                    }
                    Value::Object(kept)
                }
                other => other.clone(),
            };
            out.insert(key.clone(), cleaned);
        }

        Value::Object(out)
    }
}
