//! Best-effort shape repair.
//!
//! The coercer applies a fixed, ordered rule set to each declared field:
//!
//! | Rule | Input | Output |
//! |------|-------|--------|
//! | narrative split | string where a narrative array is expected | paragraphs |
//! | alias rename | legacy key, canonical absent | canonical key |
//! | alias conflict | legacy key, canonical present | legacy displaced |
//! | wrapper | bare array where `{wrap_key: [...]}` is expected | wrapped object |
//! | keyed collection | object of objects where an array is expected | values in order |
//! | single wrap | any other object where an array is expected | one-element array |
//! | insight filter | non-object / placeholder insight entries | removed |
//! | insight rename | `headline`, `evidence` inside an insight | `title`, `data` |
//!
//! Coercion is total and idempotent. Shapes no rule recognizes pass through
//! untouched for the quarantine and post-validation to report. Every value
//! removed from the document is returned as `displaced` so the caller can
//! keep it.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::contract::{AliasRule, FieldSpec, PipelineConfig, Shape};
use crate::gates::patterns;
use crate::tree;
use crate::types::{ActionLedger, LedgerAction};

/// A value removed from the document by coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Displaced {
    pub path: String,
    pub value: Value,
    pub reason: String,
}

/// Output of one coercion pass.
#[derive(Debug, Clone)]
pub struct CoercionOutcome {
    pub document: Value,
    pub ledger: ActionLedger,
    pub displaced: Vec<Displaced>,
}

pub const REASON_SUPERSEDED: &str = "superseded-by-canonical";
pub const REASON_NON_OBJECT_INSIGHT: &str = "non-object-insight";
pub const REASON_PLACEHOLDER_INSIGHT: &str = "instruction-placeholder";

/// Applies the repair rules configured in a `PipelineConfig`.
pub struct Coercer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Coercer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Run one coercion pass over a document.
    pub fn coerce(&self, document: &Value) -> CoercionOutcome {
        let mut ledger = ActionLedger::new();
        let mut displaced = Vec::new();

        let Some(root) = document.as_object() else {
            return CoercionOutcome {
                document: document.clone(),
                ledger,
                displaced,
            };
        };

        let shape = self.config.shape_of(document);
        let schema = self.config.schema_for(shape);
        // Root renames only target sections of this document's shape.
        let rules: Vec<&AliasRule> = self
            .config
            .aliases_in("")
            .filter(|r| schema.is_section(&r.canonical))
            .collect();
        let renamed = rename_keys("", root.clone(), &rules, &mut ledger, &mut displaced);

        let mut out = Map::new();
        for (key, value) in renamed {
            let coerced = match schema.section(&key) {
                Some(spec) => self.coerce_field(&key, &key, spec, value, &mut ledger, &mut displaced),
                None => value,
            };
            out.insert(key, coerced);
        }

        CoercionOutcome {
            document: Value::Object(out),
            ledger,
            displaced,
        }
    }

    fn coerce_field(
        &self,
        path: &str,
        scope: &str,
        spec: &FieldSpec,
        value: Value,
        ledger: &mut ActionLedger,
        displaced: &mut Vec<Displaced>,
    ) -> Value {
        match spec.shape {
            Shape::Array => self.coerce_array(path, scope, spec, value, ledger, displaced),
            Shape::Object => self.coerce_object(path, scope, spec, value, ledger, displaced),
            Shape::Scalar => {
                ledger.record(path, LedgerAction::Kept, describe_kept(Shape::Scalar, &value));
                value
            }
        }
    }

    fn coerce_array(
        &self,
        path: &str,
        scope: &str,
        spec: &FieldSpec,
        value: Value,
        ledger: &mut ActionLedger,
        displaced: &mut Vec<Displaced>,
    ) -> Value {
        let (items, mut detail) = match value {
            Value::Array(items) => (items, None),
            Value::String(text) if spec.narrative => {
                let paragraphs = patterns::split_paragraphs(&text);
                let detail = format!("split narrative string into {} paragraphs", paragraphs.len());
                (paragraphs.into_iter().map(Value::String).collect(), Some(detail))
            }
            Value::Object(map) if !map.is_empty() && map.values().all(Value::is_object) => {
                let detail = format!("converted keyed object with {} entries to array", map.len());
                (map.into_iter().map(|(_, v)| v).collect(), Some(detail))
            }
            Value::Object(map) => (
                vec![Value::Object(map)],
                Some("wrapped single object in one-element array".to_string()),
            ),
            other => {
                ledger.record(path, LedgerAction::Kept, describe_kept(Shape::Array, &other));
                return other;
            }
        };

        let mut children = ActionLedger::new();
        let items = if spec.insights {
            let before = items.len();
            let kept = self.filter_insights(path, items, &mut children, displaced);
            let removed = before - kept.len();
            if removed > 0 {
                let note = format!("filtered {} insight entries", removed);
                detail = Some(match detail {
                    Some(d) => format!("{}; {}", d, note),
                    None => note,
                });
            }
            kept
        } else {
            match spec.items.as_deref() {
                Some(item_spec) if item_spec.is_closed() => {
                    let item_scope = format!("{}[]", scope);
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let item_path = tree::index(path, i);
                            self.coerce_field(&item_path, &item_scope, item_spec, item, &mut children, displaced)
                        })
                        .collect()
                }
                _ => items,
            }
        };

        match detail {
            Some(d) => {
                tracing::debug!(path, detail = %d, "Coerced array field");
                ledger.record(path, LedgerAction::Coerced, d);
            }
            None => ledger.record(path, LedgerAction::Kept, "array shape ok"),
        }
        ledger.append(children);
        Value::Array(items)
    }

    fn coerce_object(
        &self,
        path: &str,
        scope: &str,
        spec: &FieldSpec,
        value: Value,
        ledger: &mut ActionLedger,
        displaced: &mut Vec<Displaced>,
    ) -> Value {
        let (map, detail) = match (value, spec.wrap_key.as_deref()) {
            (Value::Object(map), _) => (map, None),
            (Value::Array(items), Some(key)) => {
                let mut map = Map::new();
                map.insert(key.to_string(), Value::Array(items));
                (map, Some(format!("wrapped bare array under '{}'", key)))
            }
            (other, _) => {
                ledger.record(path, LedgerAction::Kept, describe_kept(Shape::Object, &other));
                return other;
            }
        };

        let mut children = ActionLedger::new();
        let rules: Vec<&AliasRule> = self.config.aliases_in(scope).collect();
        let map = rename_keys(path, map, &rules, &mut children, displaced);

        let mut out = Map::new();
        for (key, child) in map {
            let coerced = match spec.child(&key) {
                Some(child_spec) => {
                    let child_path = tree::join(path, &key);
                    let child_scope = tree::join(scope, &key);
                    self.coerce_field(&child_path, &child_scope, child_spec, child, &mut children, displaced)
                }
                None => child,
            };
            out.insert(key, coerced);
        }

        match detail {
            Some(d) => {
                tracing::debug!(path, detail = %d, "Coerced object field");
                ledger.record(path, LedgerAction::Coerced, d);
            }
            None => ledger.record(path, LedgerAction::Kept, "object shape ok"),
        }
        ledger.append(children);
        Value::Object(out)
    }

    /// Drop non-object and placeholder entries, rename alternate fields.
    /// Ledger paths index the source array.
    fn filter_insights(
        &self,
        path: &str,
        items: Vec<Value>,
        ledger: &mut ActionLedger,
        displaced: &mut Vec<Displaced>,
    ) -> Vec<Value> {
        let rules: Vec<&AliasRule> = self.config.insight_aliases.iter().collect();
        let mut kept = Vec::with_capacity(items.len());

        for (i, item) in items.into_iter().enumerate() {
            let item_path = tree::index(path, i);
            match item {
                Value::Object(map) if is_placeholder_insight(&map) => {
                    tracing::warn!(path = %item_path, "Placeholder insight displaced");
                    ledger.record(&item_path, LedgerAction::Dropped, "instructional placeholder moved to quarantine");
                    displaced.push(Displaced {
                        path: item_path,
                        value: Value::Object(map),
                        reason: REASON_PLACEHOLDER_INSIGHT.to_string(),
                    });
                }
                Value::Object(map) => {
                    let mut renames = ActionLedger::new();
                    let map = rename_keys(&item_path, map, &rules, &mut renames, displaced);
                    if renames.is_empty() {
                        ledger.record(&item_path, LedgerAction::Kept, "insight ok");
                    } else {
                        ledger.record(&item_path, LedgerAction::Coerced, "normalized insight field names");
                    }
                    ledger.append(renames);
                    kept.push(Value::Object(map));
                }
                other => {
                    tracing::warn!(path = %item_path, "Non-object insight entry displaced");
                    ledger.record(&item_path, LedgerAction::Dropped, "non-object insight entry moved to quarantine");
                    displaced.push(Displaced {
                        path: item_path,
                        value: other,
                        reason: REASON_NON_OBJECT_INSIGHT.to_string(),
                    });
                }
            }
        }

        kept
    }
}

/// Rename legacy keys to canonical ones, in place and in order. A legacy key
/// whose canonical key already exists is displaced; canonical wins.
fn rename_keys(
    path: &str,
    map: Map<String, Value>,
    rules: &[&AliasRule],
    ledger: &mut ActionLedger,
    displaced: &mut Vec<Displaced>,
) -> Map<String, Value> {
    if rules.is_empty() || !map.keys().any(|k| rules.iter().any(|r| &r.legacy == k)) {
        return map;
    }

    let original: HashSet<String> = map.keys().cloned().collect();
    let mut out = Map::new();

    for (key, value) in map {
        let Some(rule) = rules.iter().find(|r| r.legacy == key) else {
            out.insert(key, value);
            continue;
        };

        let legacy_path = tree::join(path, &key);
        if original.contains(&rule.canonical) || out.contains_key(&rule.canonical) {
            tracing::warn!(
                path = %legacy_path,
                canonical = %rule.canonical,
                "Legacy key dropped, canonical key wins"
            );
            ledger.record(
                &legacy_path,
                LedgerAction::Dropped,
                format!("legacy key '{}' dropped: canonical '{}' present", key, rule.canonical),
            );
            displaced.push(Displaced {
                path: legacy_path,
                value,
                reason: REASON_SUPERSEDED.to_string(),
            });
        } else {
            tracing::debug!(path = %legacy_path, canonical = %rule.canonical, "Renamed legacy key");
            ledger.record(
                &legacy_path,
                LedgerAction::Coerced,
                format!("renamed '{}' to '{}'", key, rule.canonical),
            );
            out.insert(rule.canonical.clone(), value);
        }
    }

    out
}

/// Only the title decides; body fields may legitimately open with a verb.
fn is_placeholder_insight(map: &Map<String, Value>) -> bool {
    ["title", "headline"]
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .any(patterns::is_placeholder_title)
}

fn describe_kept(expected: Shape, value: &Value) -> String {
    match Shape::of(value) {
        Some(actual) if actual == expected => format!("{} shape ok", actual.as_str()),
        Some(actual) => format!(
            "expected {}, found {}; no repair rule applies",
            expected.as_str(),
            actual.as_str()
        ),
        None => "null value left as-is".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(document: Value) -> CoercionOutcome {
        let config = PipelineConfig::default();
        Coercer::new(&config).coerce(&document)
    }

    #[test]
    fn test_narrative_string_split_into_paragraphs() {
        let outcome = coerce(json!({
            "summary": { "overview": "First point.\n\nSecond point.\n\n\nThird point." }
        }));
        assert_eq!(
            outcome.document["summary"]["overview"],
            json!(["First point.", "Second point.", "Third point."])
        );
        let entry = outcome.ledger.entry("summary.overview").unwrap();
        assert_eq!(entry.action, LedgerAction::Coerced);
    }

    #[test]
    fn test_alias_renamed_when_canonical_absent() {
        let outcome = coerce(json!({
            "marketData": { "marketSize": "USD 1bn" },
            "summary": { "insights": [ { "title": "A", "data": "x" } ] }
        }));
        assert_eq!(outcome.document["market"]["marketSize"], json!("USD 1bn"));
        assert!(outcome.document.get("marketData").is_none());
        assert_eq!(outcome.document["summary"]["keyInsights"][0]["title"], json!("A"));
        assert_eq!(
            outcome.ledger.entry("marketData").unwrap().action,
            LedgerAction::Coerced
        );
        assert!(outcome.displaced.is_empty());
    }

    #[test]
    fn test_root_alias_limited_to_document_shape() {
        let outcome = coerce(json!({
            "insights": [ { "title": "A", "data": "x" } ],
            "roadmap": { "phases": [] }
        }));
        assert!(outcome.document.get("keyInsights").is_none());
        assert!(outcome.document.get("implementation").is_none());
        assert_eq!(outcome.document["insights"][0]["title"], json!("A"));
        assert!(outcome.ledger.entry("insights").is_none());

        let single = coerce(json!({
            "isSingleCompany": true,
            "insights": [ { "title": "A", "data": "x" } ],
            "marketData": { "marketSize": "USD 1bn" }
        }));
        assert_eq!(single.document["keyInsights"][0]["title"], json!("A"));
        assert!(single.document.get("market").is_none());
        assert_eq!(single.document["marketData"]["marketSize"], json!("USD 1bn"));
    }

    #[test]
    fn test_alias_conflict_canonical_wins() {
        let outcome = coerce(json!({
            "summary": {
                "insights": [ { "title": "legacy" } ],
                "keyInsights": [ { "title": "canonical" } ]
            }
        }));
        assert_eq!(outcome.document["summary"]["keyInsights"][0]["title"], json!("canonical"));
        assert!(outcome.document["summary"].get("insights").is_none());
        assert_eq!(
            outcome.ledger.entry("summary.insights").unwrap().action,
            LedgerAction::Dropped
        );
        assert_eq!(outcome.displaced.len(), 1);
        assert_eq!(outcome.displaced[0].path, "summary.insights");
        assert_eq!(outcome.displaced[0].reason, REASON_SUPERSEDED);
    }

    #[test]
    fn test_bare_competitor_array_wrapped() {
        let outcome = coerce(json!({
            "competitors": [ { "name": "Alpha" }, { "name": "Beta" } ]
        }));
        assert_eq!(
            outcome.document["competitors"],
            json!({ "players": [ { "name": "Alpha" }, { "name": "Beta" } ] })
        );
        assert_eq!(
            outcome.ledger.entry("competitors").unwrap().action,
            LedgerAction::Coerced
        );
    }

    #[test]
    fn test_single_object_wrapped_in_array() {
        let outcome = coerce(json!({
            "summary": {
                "opportunities": { "title": "Grid upgrades", "size": "large" },
                "obstacles": { "title": "Permitting" }
            }
        }));
        assert_eq!(
            outcome.document["summary"]["opportunities"],
            json!([ { "title": "Grid upgrades", "size": "large" } ])
        );
        assert_eq!(outcome.document["summary"]["obstacles"], json!([ { "title": "Permitting" } ]));
    }

    #[test]
    fn test_keyed_phases_become_ordered_array() {
        let outcome = coerce(json!({
            "isSingleCompany": true,
            "implementation": {
                "phases": {
                    "phase2": { "name": "Scale", "activities": ["Hire"] },
                    "phase1": { "name": "Enter", "activities": ["License"] }
                }
            }
        }));
        let phases = outcome.document["implementation"]["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0]["name"], json!("Scale"));
        assert_eq!(phases[1]["name"], json!("Enter"));
    }

    #[test]
    fn test_insight_filter_and_rename() {
        let outcome = coerce(json!({
            "isSingleCompany": true,
            "keyInsights": [
                { "headline": "Tariffs rising", "evidence": "12% in 2024", "implication": "Margins" },
                "stray string",
                { "title": "Insert a key insight here", "data": "" },
                { "title": "Kept", "data": "d", "evidence": "older" }
            ]
        }));
        let insights = outcome.document["keyInsights"].as_array().unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0]["title"], json!("Tariffs rising"));
        assert_eq!(insights[0]["data"], json!("12% in 2024"));
        assert!(insights[0].get("headline").is_none());
        assert_eq!(insights[1]["data"], json!("d"));

        assert_eq!(outcome.ledger.entry("keyInsights").unwrap().action, LedgerAction::Coerced);
        assert_eq!(outcome.ledger.entry("keyInsights[1]").unwrap().action, LedgerAction::Dropped);
        assert_eq!(outcome.ledger.entry("keyInsights[2]").unwrap().action, LedgerAction::Dropped);

        let reasons: Vec<(&str, &str)> = outcome
            .displaced
            .iter()
            .map(|d| (d.path.as_str(), d.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("keyInsights[1]", REASON_NON_OBJECT_INSIGHT),
                ("keyInsights[2]", REASON_PLACEHOLDER_INSIGHT),
                ("keyInsights[3].evidence", REASON_SUPERSEDED),
            ]
        );
        assert_eq!(outcome.displaced[1].value["title"], json!("Insert a key insight here"));
    }

    #[test]
    fn test_imperative_body_fields_keep_insight() {
        let outcome = coerce(json!({
            "summary": {
                "keyInsights": [
                    {
                        "title": "Local partner gap",
                        "data": "Only 2 EPC firms licensed in 2024",
                        "implication": "Provide a financing bridge to local partners"
                    },
                    { "title": "Tariff reset", "data": "Auction prices fell 40%", "implication": "Describe the new tariff path to investors" }
                ]
            }
        }));
        let insights = outcome.document["summary"]["keyInsights"].as_array().unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0]["implication"], json!("Provide a financing bridge to local partners"));
        assert!(outcome.displaced.is_empty());
        assert_eq!(outcome.ledger.count(LedgerAction::Dropped), 0);
    }

    #[test]
    fn test_ledger_is_traversal_ordered() {
        let outcome = coerce(json!({
            "summary": { "overview": "a\n\nb" },
            "policy": { "acts": [ { "name": "Energy Law", "year": 2010 } ] }
        }));
        let paths: Vec<&str> = outcome.ledger.entries().iter().map(|e| e.path.as_str()).collect();
        let summary = paths.iter().position(|p| *p == "summary").unwrap();
        let policy = paths.iter().position(|p| *p == "policy").unwrap();
        let acts = paths.iter().position(|p| *p == "policy.acts").unwrap();
        assert!(summary < policy);
        assert!(policy < acts);

        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let once = coerce(json!({
            "competitiveLandscape": [ { "name": "Alpha" } ],
            "summary": {
                "overview": "a\n\nb",
                "insights": { "title": "Only", "evidence": "x" },
                "risks": { "title": "Permits" }
            },
            "depth": { "implementation": { "stages": { "p1": { "activities": "Scout\n\nLicense" } } } }
        }));
        let twice = coerce(once.document.clone());
        assert_eq!(once.document, twice.document);
        assert_eq!(twice.ledger.count(LedgerAction::Coerced), 0);
        assert_eq!(twice.ledger.count(LedgerAction::Dropped), 0);
    }

    #[test]
    fn test_unrecognized_shapes_pass_through() {
        let outcome = coerce(json!({ "market": 42, "unknownRoot": [1, 2] }));
        assert_eq!(outcome.document["market"], json!(42));
        assert_eq!(outcome.document["unknownRoot"], json!([1, 2]));
        assert_eq!(outcome.ledger.entry("market").unwrap().action, LedgerAction::Kept);
    }

    #[test]
    fn test_non_object_document_untouched() {
        let outcome = coerce(Value::Null);
        assert_eq!(outcome.document, Value::Null);
        assert!(outcome.ledger.is_empty());
    }
}
