//! Pipeline configuration: schemas, alias tables and thresholds.
//!
//! A `PipelineConfig` is an immutable value handed to each component's
//! constructor. Files may override any subset of it; missing keys fall back
//! to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::DocumentSchema;
use crate::types::DocumentShape;

/// Errors that can occur when loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Renames a legacy key to its canonical name within a scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliasRule {
    /// Dotted section path the rule applies to ("" for the root)
    #[serde(default)]
    pub scope: String,

    pub legacy: String,

    pub canonical: String,
}

impl AliasRule {
    pub fn new(scope: &str, legacy: &str, canonical: &str) -> Self {
        Self {
            scope: scope.to_string(),
            legacy: legacy.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

/// How industry-relevance mentions are counted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceMatching {
    /// Raw case-insensitive substring occurrences
    #[default]
    Substring,
    /// Occurrences bounded by non-word characters
    TokenBoundary,
}

/// Thresholds shared by the quality gates and the trust scorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GateThresholds {
    pub research_pass: f64,
    /// Research also needs a company name or a recent year to pass
    pub research_requires_specificity: bool,
    pub research_volume_chars: usize,
    pub research_breadth_topics: usize,
    pub research_structured_topics: usize,
    pub min_topic_chars: usize,

    pub multi_entity_pass: f64,
    pub single_entity_pass: f64,
    pub quality_weight: f64,
    pub relevance_points_per_match: f64,
    pub relevance_cap: f64,

    pub min_acts: usize,
    pub min_chart_sections: usize,
    pub min_players_multi: usize,
    pub min_players_single: usize,
    pub competitor_words_multi: usize,
    pub competitor_words_single: usize,
    pub long_description_words: usize,
    pub paragraph_words: usize,
    pub min_insights: usize,
    pub min_opportunities: usize,
    pub insight_completeness_ratio: f64,

    pub min_ppt_sections: usize,
    pub ppt_company_words: usize,
    pub overflow_chars: usize,
    pub min_chart_points: usize,
    pub chart_warn_points: usize,
    pub max_unavailable_ratio: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            research_pass: 40.0,
            research_requires_specificity: true,
            research_volume_chars: 2000,
            research_breadth_topics: 5,
            research_structured_topics: 3,
            min_topic_chars: 300,

            multi_entity_pass: 40.0,
            single_entity_pass: 60.0,
            quality_weight: 0.7,
            relevance_points_per_match: 3.0,
            relevance_cap: 30.0,

            min_acts: 2,
            min_chart_sections: 3,
            min_players_multi: 5,
            min_players_single: 3,
            competitor_words_multi: 40,
            competitor_words_single: 30,
            long_description_words: 45,
            paragraph_words: 20,
            min_insights: 2,
            min_opportunities: 2,
            insight_completeness_ratio: 0.75,

            min_ppt_sections: 3,
            ppt_company_words: 30,
            overflow_chars: 300,
            min_chart_points: 4,
            chart_warn_points: 5,
            max_unavailable_ratio: 0.4,
        }
    }
}

/// Strict/tolerated split for structural drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DriftThresholds {
    /// Largest positional delta (in slide units) still tolerated
    pub geometry_tolerance: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            geometry_tolerance: 0.05,
        }
    }
}

/// Per-field weights for the trust score aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustWeights {
    pub multi_entity: BTreeMap<String, f64>,
    pub single_entity: BTreeMap<String, f64>,
}

impl Default for TrustWeights {
    fn default() -> Self {
        let weights = |pairs: &[(&str, f64)]| {
            pairs
                .iter()
                .map(|(k, w)| (k.to_string(), *w))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            multi_entity: weights(&[
                ("policy", 0.2),
                ("market", 0.25),
                ("competitors", 0.2),
                ("depth", 0.1),
                ("summary", 0.25),
            ]),
            single_entity: weights(&[
                ("executiveSummary", 0.2),
                ("marketOpportunityAssessment", 0.2),
                ("competitivePositioning", 0.2),
                ("keyInsights", 0.25),
                ("implementation", 0.15),
            ]),
        }
    }
}

/// Complete configuration of one enforcement pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub multi_entity_schema: DocumentSchema,

    pub single_entity_schema: DocumentSchema,

    /// Legacy → canonical key renames, applied only when canonical is absent
    pub aliases: Vec<AliasRule>,

    /// Renames applied inside each insight object
    pub insight_aliases: Vec<AliasRule>,

    /// Root keys that are metadata rather than sections
    pub meta_keys: Vec<String>,

    /// Keys starting with this prefix are internal and never quarantined
    pub internal_prefix: String,

    /// Root key whose `true` value marks a single-entity document
    pub single_entity_flag: String,

    /// Nesting depth beyond which the validator warns
    pub max_nesting_depth: usize,

    /// Fixtures whose size placeholders are expanded on load
    pub stress_fixtures: Vec<String>,

    pub relevance_matching: RelevanceMatching,

    pub gates: GateThresholds,

    pub drift: DriftThresholds,

    pub trust: TrustWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let aliases = [
            ("", "policyAndRegulation", "policy"),
            ("", "marketData", "market"),
            ("", "competitiveLandscape", "competitors"),
            ("", "deepDive", "depth"),
            ("", "executive_summary", "executiveSummary"),
            ("", "marketOpportunity", "marketOpportunityAssessment"),
            ("", "competitivePosition", "competitivePositioning"),
            ("", "insights", "keyInsights"),
            ("", "roadmap", "implementation"),
            ("policy", "acts", "foundationalActs"),
            ("competitors", "companies", "players"),
            ("summary", "insights", "keyInsights"),
            ("summary", "risks", "obstacles"),
            ("marketOpportunityAssessment", "tam", "totalAddressableMarket"),
            ("marketOpportunityAssessment", "sam", "serviceableMarket"),
            ("competitivePositioning", "competitors", "keyCompetitors"),
            ("implementation", "stages", "phases"),
            ("depth.implementation", "stages", "phases"),
        ];

        Self {
            multi_entity_schema: DocumentSchema::multi_entity(),
            single_entity_schema: DocumentSchema::single_entity(),
            aliases: aliases
                .iter()
                .map(|(s, l, c)| AliasRule::new(s, l, c))
                .collect(),
            insight_aliases: vec![
                AliasRule::new("", "headline", "title"),
                AliasRule::new("", "evidence", "data"),
            ],
            meta_keys: [
                "country",
                "industry",
                "clientContext",
                "companyName",
                "projectName",
                "isSingleCompany",
                "generatedAt",
                "language",
                "version",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            internal_prefix: "_".to_string(),
            single_entity_flag: "isSingleCompany".to_string(),
            max_nesting_depth: 8,
            stress_fixtures: vec!["stress-large".to_string()],
            relevance_matching: RelevanceMatching::default(),
            gates: GateThresholds::default(),
            drift: DriftThresholds::default(),
            trust: TrustWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    pub fn schema_for(&self, shape: DocumentShape) -> &DocumentSchema {
        match shape {
            DocumentShape::MultiEntity => &self.multi_entity_schema,
            DocumentShape::SingleEntity => &self.single_entity_schema,
        }
    }

    pub fn shape_of(&self, document: &serde_json::Value) -> DocumentShape {
        DocumentShape::detect(document, &self.single_entity_flag)
    }

    pub fn is_meta_key(&self, key: &str) -> bool {
        self.meta_keys.iter().any(|k| k == key)
    }

    pub fn is_internal_key(&self, key: &str) -> bool {
        !self.internal_prefix.is_empty() && key.starts_with(&self.internal_prefix)
    }

    /// Alias rules for a scope path.
    pub fn aliases_in<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a AliasRule> + 'a {
        self.aliases.iter().filter(move |a| a.scope == scope)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (label, schema) in [
            ("multiEntitySchema", &self.multi_entity_schema),
            ("singleEntitySchema", &self.single_entity_schema),
        ] {
            if schema.sections.is_empty() {
                return Err(ConfigError::Invalid(format!("{} has no sections", label)));
            }
            let mut seen = HashSet::new();
            for section in &schema.sections {
                if !seen.insert(section.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "Duplicate section '{}' in {}",
                        section.name, label
                    )));
                }
            }
        }

        for alias in self.aliases.iter().chain(self.insight_aliases.iter()) {
            if alias.legacy == alias.canonical {
                return Err(ConfigError::Invalid(format!(
                    "Alias '{}' maps to itself",
                    alias.legacy
                )));
            }
        }

        if self.single_entity_flag.is_empty() {
            return Err(ConfigError::Invalid("singleEntityFlag must not be empty".to_string()));
        }

        if self.drift.geometry_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "drift.geometryTolerance must be non-negative".to_string(),
            ));
        }

        let ratio = self.gates.max_unavailable_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(
                "gates.maxUnavailableRatio must be within 0..=1".to_string(),
            ));
        }

        let negative_weight = self
            .trust
            .multi_entity
            .values()
            .chain(self.trust.single_entity.values())
            .any(|w| *w < 0.0);
        if negative_weight {
            return Err(ConfigError::Invalid("trust weights must be non-negative".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_meta_key("industry"));
        assert!(config.is_internal_key("_trace"));
        assert!(!config.is_internal_key("trace"));
        assert_eq!(config.aliases_in("summary").count(), 2);
    }

    #[test]
    fn test_partial_yaml_override() {
        let yaml = r#"
drift:
  geometryTolerance: 0.1
gates:
  researchPass: 55
relevanceMatching: token-boundary
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.drift.geometry_tolerance, 0.1);
        assert_eq!(config.gates.research_pass, 55.0);
        assert_eq!(config.gates.min_topic_chars, 300);
        assert_eq!(config.relevance_matching, RelevanceMatching::TokenBoundary);
        assert!(config.multi_entity_schema.is_section("policy"));
    }

    #[test]
    fn test_json_override() {
        let config = PipelineConfig::from_json(r#"{"maxNestingDepth": 4}"#).unwrap();
        assert_eq!(config.max_nesting_depth, 4);
    }

    #[test]
    fn test_self_alias_rejected() {
        let yaml = r#"
aliases:
  - scope: ""
    legacy: policy
    canonical: policy
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let result = PipelineConfig::from_yaml("drift:\n  geometryTolerance: -1\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unreadable_file() {
        let result = PipelineConfig::from_file("/nonexistent/covenant.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
