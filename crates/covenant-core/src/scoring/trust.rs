//! Continuous trust scoring.
//!
//! Uses the same completeness signals as the synthesis gate, but each
//! criterion earns partial credit in proportion to how close it comes to
//! its threshold. The overall score is the weight-normalized mean of the
//! per-field scores for the document's shape.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::contract::PipelineConfig;
use crate::gates::patterns::{self, text_of};
use crate::gates::signals::{self, ratio};
use crate::types::DocumentShape;

/// Score for one top-level field.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldTrust {
    pub score: f64,
    pub present: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrustScore {
    pub overall: f64,
    pub shape: DocumentShape,
    pub per_field: BTreeMap<String, FieldTrust>,
}

pub struct TrustScorer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> TrustScorer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Score a document. Missing, null and non-object input scores 0.
    pub fn score(&self, document: &Value) -> TrustScore {
        let shape = self.config.shape_of(document);
        let weights = match shape {
            DocumentShape::MultiEntity => &self.config.trust.multi_entity,
            DocumentShape::SingleEntity => &self.config.trust.single_entity,
        };
        let empty = Map::new();
        let doc = document.as_object().unwrap_or(&empty);

        let mut per_field = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (field, weight) in weights {
            let value = doc.get(field).filter(|v| !patterns::is_blank(Some(v)));
            let score = value.map_or(0.0, |v| round1(self.field_score(shape, field, v) * 100.0));
            weighted += score * weight;
            total_weight += weight;
            per_field.insert(
                field.clone(),
                FieldTrust {
                    score,
                    present: value.is_some(),
                    weight: *weight,
                },
            );
        }

        let overall = if total_weight > 0.0 {
            round1(weighted / total_weight)
        } else {
            0.0
        };
        tracing::debug!(shape = shape.as_str(), overall, "Trust scored");

        TrustScore {
            overall,
            shape,
            per_field,
        }
    }

    /// Completeness of one populated field in 0..=1.
    fn field_score(&self, shape: DocumentShape, field: &str, value: &Value) -> f64 {
        let t = &self.config.gates;
        let half = |a: f64, b: f64| 0.5 * a + 0.5 * b;

        match (shape, field) {
            (DocumentShape::MultiEntity, "policy") => {
                let acts = signals::foundational_acts(Some(value));
                half(
                    ratio(acts.count as f64, t.min_acts as f64),
                    ratio(acts.named_with_year as f64, t.min_acts as f64),
                )
            }
            (DocumentShape::MultiEntity, "market") => half(
                ratio(
                    signals::chart_sections(Some(value)) as f64,
                    t.min_chart_sections as f64,
                ),
                flag(signals::is_populated(value.get("marketSize"))),
            ),
            (DocumentShape::MultiEntity, "competitors") => {
                let players = signals::players(Some(value), "players");
                half(
                    ratio(signals::named_count(&players) as f64, t.min_players_multi as f64),
                    ratio(
                        signals::average_description_words(&players),
                        t.competitor_words_multi as f64,
                    ),
                )
            }
            (DocumentShape::MultiEntity, "summary") => {
                let insights = signals::insights(value.get("keyInsights"));
                let backed = insights.iter().filter(|i| signals::insight_has_data(i)).count();
                half(
                    ratio(backed as f64, t.min_insights as f64),
                    ratio(
                        signals::list_len(value.get("opportunities")) as f64,
                        t.min_opportunities as f64,
                    ),
                )
            }
            (DocumentShape::SingleEntity, "executiveSummary") => ratio(
                signals::substantial_paragraphs(Some(value), t.paragraph_words) as f64,
                3.0,
            ),
            (DocumentShape::SingleEntity, "marketOpportunityAssessment") => {
                let tam = value.get("totalAddressableMarket").map(text_of).unwrap_or_default();
                let secondary = ["serviceableMarket", "growthTrajectory", "timingConsiderations"]
                    .iter()
                    .filter(|k| signals::is_populated(value.get(**k)))
                    .count();
                half(flag(patterns::DIGIT.is_match(&tam)), secondary as f64 / 3.0)
            }
            (DocumentShape::SingleEntity, "competitivePositioning") => {
                let players = signals::players(Some(value), "keyCompetitors");
                half(
                    ratio(signals::named_count(&players) as f64, t.min_players_single as f64),
                    ratio(
                        signals::average_description_words(&players),
                        t.competitor_words_single as f64,
                    ),
                )
            }
            (DocumentShape::SingleEntity, "keyInsights") => {
                let insights = signals::insights(Some(value));
                if insights.is_empty() {
                    return 0.0;
                }
                let complete = insights.iter().filter(|i| signals::insight_complete(i)).count() as f64;
                0.7 * ratio(complete, t.min_insights as f64) + 0.3 * complete / insights.len() as f64
            }
            (DocumentShape::SingleEntity, "implementation") => {
                let roadmap = signals::phases(Some(value));
                if roadmap.phases == 0 {
                    return 0.0;
                }
                (roadmap.with_activities + roadmap.with_investment) as f64 / (2 * roadmap.phases) as f64
            }
            _ => self.child_coverage(shape, field, value),
        }
    }

    /// Share of the field's declared children that are populated. Fields
    /// without declared children count as fully covered once present.
    fn child_coverage(&self, shape: DocumentShape, field: &str, value: &Value) -> f64 {
        let Some(spec) = self.config.schema_for(shape).section(field) else {
            return 1.0;
        };
        if spec.children.is_empty() {
            return 1.0;
        }
        let populated = spec
            .children
            .iter()
            .filter(|c| signals::is_populated(value.get(&c.name)))
            .count();
        populated as f64 / spec.children.len() as f64
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(document: Value) -> TrustScore {
        let config = PipelineConfig::default();
        TrustScorer::new(&config).score(&document)
    }

    #[test]
    fn test_null_and_non_object_score_zero() {
        for input in [Value::Null, json!(7), json!("text"), json!({})] {
            let trust = score(input);
            assert_eq!(trust.overall, 0.0);
            assert!(trust.per_field.values().all(|f| !f.present && f.score == 0.0));
        }
    }

    #[test]
    fn test_partial_credit() {
        let trust = score(json!({
            "policy": { "foundationalActs": [ { "name": "Electricity Law", "year": 2004 } ] },
            "summary": null
        }));
        assert_eq!(trust.per_field["policy"].score, 50.0);
        assert!(!trust.per_field["summary"].present);
        assert_eq!(trust.overall, 10.0);
    }

    #[test]
    fn test_populated_multi_entity_scores_high() {
        let description = vec!["detail"; 45].join(" ");
        let players: Vec<Value> = (1..=5)
            .map(|i| json!({ "name": format!("P{}", i), "description": description }))
            .collect();
        let chart = json!({ "chartData": { "values": [1, 2, 3, 4] } });
        let trust = score(json!({
            "policy": { "foundationalActs": [
                { "name": "A", "year": 2001 }, { "name": "B", "year": 2011 }
            ]},
            "market": { "marketSize": "USD 1bn", "pricing": chart, "segments": chart, "trends": chart },
            "competitors": { "players": players },
            "depth": { "dealEconomics": "IRR 14%", "entryStrategy": "JV" },
            "summary": {
                "keyInsights": [ { "title": "a", "data": "x" }, { "title": "b", "data": "y" } ],
                "opportunities": ["one", "two"]
            }
        }));
        assert_eq!(trust.per_field["depth"].score, 50.0);
        assert_eq!(trust.overall, 95.0);
        assert!(trust.overall >= 60.0);
    }

    #[test]
    fn test_single_entity_fields() {
        let trust = score(json!({
            "isSingleCompany": true,
            "keyInsights": [
                { "title": "a", "data": "x", "implication": "y" },
                { "title": "b", "data": "x" }
            ],
            "implementation": { "phases": [ { "activities": ["a"], "investment": null } ] }
        }));
        assert_eq!(trust.shape, DocumentShape::SingleEntity);
        assert_eq!(trust.per_field["keyInsights"].score, 50.0);
        assert_eq!(trust.per_field["implementation"].score, 50.0);
        assert!(!trust.per_field.contains_key("policy"));
    }
}
