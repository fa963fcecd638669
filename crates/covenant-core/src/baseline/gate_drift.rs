//! Gate-level drift between two gate-result payloads.
//!
//! Four categories, all computed on plain JSON so any gate's result shape
//! can be baselined:
//! - `scoreChanges`: `pass` flips and numeric score leaves that differ
//! - `newFailures` / `fixedFailures`: set difference of issue messages
//! - `structuralChanges`: key paths added or removed

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::tree;

lazy_static! {
    /// Paths of numeric leaves that carry a score
    static ref SCORE_KEY: Regex = Regex::new(r"(?i)score|overall").unwrap();
}

/// Keys whose array values hold issue messages.
const MESSAGE_LISTS: [&str; 4] = ["failures", "issues", "warnings", "errors"];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub path: String,
    pub baseline: Value,
    pub current: Value,
    /// Numeric difference, absent for pass flips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StructuralChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GateDriftReport {
    pub baseline_found: bool,
    pub has_drift: bool,
    pub new_failures: Vec<String>,
    pub fixed_failures: Vec<String>,
    pub score_changes: Vec<ScoreChange>,
    pub structural_changes: StructuralChanges,
    pub total_drift_items: usize,
}

impl GateDriftReport {
    /// Report for a comparison whose baseline does not exist.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Compare current gate results against a baseline payload.
pub fn compare(baseline: &Value, current: &Value) -> GateDriftReport {
    let score_changes = score_changes(baseline, current);

    let before = messages(baseline);
    let after = messages(current);
    let new_failures = difference(&after, &before);
    let fixed_failures = difference(&before, &after);

    let before_paths = tree::key_paths(baseline);
    let after_paths = tree::key_paths(current);
    let structural_changes = StructuralChanges {
        added: after_paths.difference(&before_paths).cloned().collect(),
        removed: before_paths.difference(&after_paths).cloned().collect(),
    };

    let total_drift_items = score_changes.len()
        + new_failures.len()
        + fixed_failures.len()
        + structural_changes.added.len()
        + structural_changes.removed.len();

    GateDriftReport {
        baseline_found: true,
        has_drift: total_drift_items > 0,
        new_failures,
        fixed_failures,
        score_changes,
        structural_changes,
        total_drift_items,
    }
}

fn is_tracked(path: &str, value: &Value) -> bool {
    let key = tree::last_segment(path);
    match value {
        Value::Bool(_) => key == "pass",
        Value::Number(_) => SCORE_KEY.is_match(path),
        _ => false,
    }
}

fn score_changes(baseline: &Value, current: &Value) -> Vec<ScoreChange> {
    let before: BTreeMap<String, Value> = tree::flatten_leaves(baseline, is_tracked);
    let after: BTreeMap<String, Value> = tree::flatten_leaves(current, is_tracked);

    before
        .iter()
        .filter_map(|(path, old)| {
            let new = after.get(path)?;
            if old == new {
                return None;
            }
            let delta = match (old.as_f64(), new.as_f64()) {
                (Some(a), Some(b)) => Some(b - a),
                _ => None,
            };
            Some(ScoreChange {
                path: path.clone(),
                baseline: old.clone(),
                current: new.clone(),
                delta,
            })
        })
        .collect()
}

/// Distinct issue messages in first-seen order.
fn messages(results: &Value) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut push = |list: &Value| {
        for item in list.as_array().into_iter().flatten() {
            let text = match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
                _ => None,
            };
            if let Some(text) = text {
                if seen.insert(text.clone()) {
                    out.push(text);
                }
            }
        }
    };

    tree::walk(results, &mut |path, value| {
        if MESSAGE_LISTS.contains(&tree::last_segment(path)) {
            push(value);
        }
        true
    });
    out
}

fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let right: BTreeSet<&String> = right.iter().collect();
    left.iter().filter(|m| !right.contains(m)).cloned().collect()
}
