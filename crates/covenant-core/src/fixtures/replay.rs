//! Deterministic, offline replay of a fixture through the firewall and the
//! document gates.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::coverage::classify;
use super::loader::Fixture;
use crate::contract::PipelineConfig;
use crate::firewall::Firewall;
use crate::gates::{Gate, PresentationGate, PresentationResult, SynthesisGate, SynthesisResult, PRESENTATION_SECTIONS};
use crate::types::{DocumentShape, Issue, ValidationResult};

/// Raw gate results for one fixture, keyed by gate name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResult {
    pub fixture: String,
    pub schema: ValidationResult,
    pub synthesis: SynthesisResult,
    pub ppt_data: PresentationResult,
    pub expectations_met: BTreeMap<String, bool>,
}

impl ReplayResult {
    /// Every issue from all three gates, schema first.
    pub fn issues(&self) -> Vec<Issue> {
        let mut out = self.schema.issues();
        out.extend(self.synthesis.failures.iter().cloned());
        out.extend(self.synthesis.warnings.iter().cloned());
        out.extend(self.ppt_data.failures.iter().cloned());
        out.extend(self.ppt_data.warnings.iter().cloned());
        out
    }

    /// Whether every declared expectation held.
    pub fn as_expected(&self) -> bool {
        self.expectations_met.values().all(|met| *met)
    }

    /// Gate results in the payload shape gate baselines store.
    pub fn gate_results(&self) -> Value {
        serde_json::json!({
            "schema": self.schema,
            "synthesis": self.synthesis,
            "pptData": self.ppt_data,
        })
    }
}

/// Runs fixtures through one pipeline configuration.
pub struct Replayer {
    firewall: Firewall,
}

impl Replayer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            firewall: Firewall::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.firewall.config()
    }

    pub fn replay(&self, fixture: &Fixture) -> ReplayResult {
        let config = self.config();
        let outcome = self.firewall.run(&fixture.document);

        let synthesis = SynthesisGate::new(config)
            .with_industry(fixture.industry.clone())
            .check(&outcome.canonical);
        let blocks = flatten_blocks(&outcome.canonical, config);
        let ppt_data = PresentationGate::new(&config.gates).check(&blocks);

        let mut result = ReplayResult {
            fixture: fixture.name.clone(),
            schema: outcome.pre_validation,
            synthesis,
            ppt_data,
            expectations_met: BTreeMap::new(),
        };
        result.expectations_met = expectations(fixture, &result);

        tracing::info!(
            fixture = %fixture.name,
            synthesis_pass = result.synthesis.pass,
            ppt_pass = result.ppt_data.pass,
            as_expected = result.as_expected(),
            "Fixture replayed"
        );
        result
    }
}

fn expectations(fixture: &Fixture, result: &ReplayResult) -> BTreeMap<String, bool> {
    let expected = &fixture.expected;
    let mut met = BTreeMap::new();
    if let Some(pass) = expected.synthesis_pass {
        met.insert("synthesisPass".to_string(), result.synthesis.pass == pass);
    }
    if let Some(pass) = expected.ppt_pass {
        met.insert("pptPass".to_string(), result.ppt_data.pass == pass);
    }
    if !expected.failure_classes.is_empty() {
        let seen: Vec<&str> = result.issues().iter().filter_map(classify).collect();
        for class in &expected.failure_classes {
            met.insert(format!("failureClasses.{}", class), seen.contains(&class.as_str()));
        }
    }
    met
}

/// Presentation section each single-entity section renders into.
fn presentation_section(shape: DocumentShape, section: &str) -> Option<&str> {
    match shape {
        DocumentShape::MultiEntity => PRESENTATION_SECTIONS.iter().copied().find(|s| *s == section),
        DocumentShape::SingleEntity => match section {
            "executiveSummary" | "keyInsights" | "nextSteps" => Some("summary"),
            "marketOpportunityAssessment" => Some("market"),
            "competitivePositioning" => Some("competitors"),
            "implementation" => Some("depth"),
            _ => None,
        },
    }
}

/// Flatten a canonical document into renderable blocks.
///
/// One block per section/sub-key pair. Object sub-values contribute their
/// fields to the block, arrays land under `items`, scalars under `value`.
/// A section that is not an object becomes a single block keyed by the
/// section name.
pub fn flatten_blocks(document: &Value, config: &PipelineConfig) -> Value {
    let Some(root) = document.as_object() else {
        return Value::Array(Vec::new());
    };
    let shape = config.shape_of(document);

    let mut blocks = Vec::new();
    for (name, value) in root {
        let Some(section) = presentation_section(shape, name) else {
            continue;
        };
        match value {
            Value::Object(fields) => {
                for (key, sub) in fields {
                    if config.is_internal_key(key) {
                        continue;
                    }
                    blocks.push(block(section, key, sub));
                }
            }
            Value::Null => {}
            other => blocks.push(block(section, name, other)),
        }
    }
    Value::Array(blocks)
}

fn block(section: &str, key: &str, value: &Value) -> Value {
    let mut out = Map::new();
    out.insert("section".to_string(), Value::String(section.to_string()));
    out.insert("key".to_string(), Value::String(key.to_string()));
    match value {
        Value::Object(fields) => {
            for (k, v) in fields {
                if !out.contains_key(k) {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
        Value::Array(_) => {
            out.insert("items".to_string(), value.clone());
        }
        _ => {
            out.insert("value".to_string(), value.clone());
        }
    }
    Value::Object(out)
}
