//! JSON Schema checks for persisted files.
//!
//! Baseline snapshots and replay fixtures are validated against the schemas
//! under `schemas/` when they are read back, so a hand-edited or truncated file
//! surfaces as a typed error instead of a confusing comparison.

use std::sync::OnceLock;

const GATE_BASELINE_SCHEMA_JSON: &str = include_str!("../../../../schemas/gate-baseline.schema.json");
const STRUCTURAL_BASELINE_SCHEMA_JSON: &str =
    include_str!("../../../../schemas/structural-baseline.schema.json");
const FIXTURE_SCHEMA_JSON: &str = include_str!("../../../../schemas/fixture.schema.json");

static GATE_BASELINE: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static STRUCTURAL_BASELINE: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static FIXTURE: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// The kinds of persisted file with an embedded schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    GateBaseline,
    StructuralBaseline,
    Fixture,
}

impl Envelope {
    fn slot(&self) -> (&'static OnceLock<Result<jsonschema::Validator, String>>, &'static str) {
        match self {
            Envelope::GateBaseline => (&GATE_BASELINE, GATE_BASELINE_SCHEMA_JSON),
            Envelope::StructuralBaseline => (&STRUCTURAL_BASELINE, STRUCTURAL_BASELINE_SCHEMA_JSON),
            Envelope::Fixture => (&FIXTURE, FIXTURE_SCHEMA_JSON),
        }
    }

    fn validator(&self) -> Result<&'static jsonschema::Validator, String> {
        let (slot, raw) = self.slot();
        let compiled = slot.get_or_init(|| {
            let schema_value: serde_json::Value = match serde_json::from_str(raw) {
                Ok(v) => v,
                Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
            };

            match jsonschema::options().build(&schema_value) {
                Ok(v) => Ok(v),
                Err(e) => Err(format!("Failed to compile schema: {}", e)),
            }
        });

        match compiled {
            Ok(v) => Ok(v),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Validate a parsed file against its envelope schema.
///
/// Returns every violation, each qualified with its instance path.
pub fn check(envelope: Envelope, value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = envelope.validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(kind: &str) -> serde_json::Value {
        json!({
            "name": "release-1",
            "kind": kind,
            "createdAt": "2026-01-05T10:00:00Z",
            "formatVersion": 1
        })
    }

    #[test]
    fn test_gate_baseline_envelope() {
        let valid = json!({ "meta": meta("gates"), "gateResults": { "synthesis": { "pass": true } } });
        assert!(check(Envelope::GateBaseline, &valid).is_ok());

        let wrong_kind = json!({ "meta": meta("structural"), "gateResults": {} });
        assert!(check(Envelope::GateBaseline, &wrong_kind).is_err());

        let missing = json!({ "meta": meta("gates") });
        let errors = check(Envelope::GateBaseline, &missing).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_structural_envelope_requires_all_parts() {
        let partial = json!({ "meta": meta("structural"), "slideDimensions": {} });
        assert!(check(Envelope::StructuralBaseline, &partial).is_err());

        let complete = json!({
            "meta": meta("structural"),
            "slideDimensions": { "width": 13.3333, "height": 7.5 },
            "geometryInvariants": { "title": { "x": 0.5, "y": 0.4, "w": 12.3, "h": 0.8 } },
            "textInvariants": { "headings": ["Market Overview"] },
            "fontSpecifications": { "title.face": "Arial" },
            "colorSpecifications": {},
            "sectionStructure": { "policy": { "present": true, "subKeys": ["foundationalActs"] } },
            "templateStructure": {}
        });
        assert!(check(Envelope::StructuralBaseline, &complete).is_ok());
    }

    #[test]
    fn test_fixture_envelope() {
        let fixture = json!({
            "name": "minimal",
            "expected": { "synthesisPass": false },
            "document": null
        });
        assert!(check(Envelope::Fixture, &fixture).is_ok());

        let bad_expectation = json!({
            "name": "minimal",
            "expected": { "unknownKey": true },
            "document": {}
        });
        assert!(check(Envelope::Fixture, &bad_expectation).is_err());
    }
}
