//! Research-quality gate.
//!
//! Scores a topic → content map on five metrics:
//!
//! | Metric | Points | Full credit at |
//! |--------|--------|----------------|
//! | volume | 30 | 2000 characters total |
//! | breadth | 25 | 5 topics with ≥ 300 characters |
//! | structured data | 25 | 3 topics carrying tables/series |
//! | company names | 10 | any company-like token |
//! | recent years | 10 | any year ≥ 2020 |
//!
//! Volume, breadth and structured data are linear up to full credit.
//! Passing needs the threshold score. With `researchRequiresSpecificity`
//! (the default) it also needs one specificity signal, a company name or a
//! recent year, so volume and structure alone cannot pass.

use serde::Serialize;
use serde_json::Value;

use super::patterns::{self, text_of};
use super::{Gate, GateOutcome, ERROR_TYPE_EXCEPTION};
use crate::contract::GateThresholds;
use crate::types::{Issue, IssueCode};

const VOLUME_POINTS: f64 = 30.0;
const BREADTH_POINTS: f64 = 25.0;
const STRUCTURED_POINTS: f64 = 25.0;
const COMPANY_POINTS: f64 = 10.0;
const YEAR_POINTS: f64 = 10.0;

/// Keys whose value is the narrative body of a topic object.
const NARRATIVE_KEYS: [&str; 4] = ["content", "text", "summary", "narrative"];

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchMetrics {
    pub volume: f64,
    pub breadth: f64,
    pub structured_data: f64,
    pub company_names: f64,
    pub recent_years: f64,
}

impl ResearchMetrics {
    pub fn total(&self) -> f64 {
        self.volume + self.breadth + self.structured_data + self.company_names + self.recent_years
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub pass: bool,
    pub score: f64,
    pub metrics: ResearchMetrics,
    pub total_chars: usize,
    pub topics_analyzed: usize,
    /// Topics whose content is too thin and should be researched again
    pub retry_topics: Vec<String>,
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl GateOutcome for ResearchResult {
    fn passed(&self) -> bool {
        self.pass
    }

    fn exception(message: String) -> Self {
        let mut result = ResearchResult::rejected(Issue::new(IssueCode::Exception, message));
        result.error_type = Some(ERROR_TYPE_EXCEPTION.to_string());
        result
    }
}

impl ResearchResult {
    fn rejected(issue: Issue) -> Self {
        ResearchResult {
            pass: false,
            score: 0.0,
            metrics: ResearchMetrics::default(),
            total_chars: 0,
            topics_analyzed: 0,
            retry_topics: Vec::new(),
            issues: vec![issue],
            error_type: None,
        }
    }
}

pub struct ResearchGate<'a> {
    thresholds: &'a GateThresholds,
}

impl<'a> ResearchGate<'a> {
    pub fn new(thresholds: &'a GateThresholds) -> Self {
        Self { thresholds }
    }
}

impl Gate for ResearchGate<'_> {
    type Outcome = ResearchResult;

    fn name(&self) -> &'static str {
        "research"
    }

    fn evaluate(&self, input: &Value) -> ResearchResult {
        let t = self.thresholds;
        let Some(topics) = input.as_object().filter(|m| !m.is_empty()) else {
            return ResearchResult::rejected(Issue::new(
                IssueCode::EmptyData,
                "No research topics provided: expected a non-empty topic → content map",
            ));
        };

        let mut total_chars = 0;
        let mut deep_topics = 0;
        let mut structured_topics = 0;
        let mut has_company = false;
        let mut has_year = false;
        let mut retry_topics = Vec::new();
        let mut issues = Vec::new();

        for (topic, content) in topics {
            let narrative = narrative_of(content);
            let chars = narrative.chars().count();
            total_chars += chars;

            if chars >= t.min_topic_chars {
                deep_topics += 1;
            } else {
                retry_topics.push(topic.clone());
                issues.push(Issue::at(
                    IssueCode::InsufficientDepth,
                    topic.as_str(),
                    format!(
                        "Topic '{}' has {} characters, below the {} needed",
                        topic, chars, t.min_topic_chars
                    ),
                ));
            }
            if carries_structured_data(content) {
                structured_topics += 1;
            }

            let all_text = text_of(content);
            has_company |= patterns::contains_company_name(&all_text);
            has_year |= patterns::contains_recent_year(&all_text);
        }

        let metrics = ResearchMetrics {
            volume: linear(total_chars, t.research_volume_chars, VOLUME_POINTS),
            breadth: linear(deep_topics, t.research_breadth_topics, BREADTH_POINTS),
            structured_data: linear(structured_topics, t.research_structured_topics, STRUCTURED_POINTS),
            company_names: if has_company { COMPANY_POINTS } else { 0.0 },
            recent_years: if has_year { YEAR_POINTS } else { 0.0 },
        };
        let score = metrics.total();

        if structured_topics == 0 {
            issues.push(Issue::new(
                IssueCode::SemanticEmpty,
                "No topic carries structured data (tables, series or figures)",
            ));
        }
        if !has_company && !has_year {
            issues.push(Issue::new(
                IssueCode::SemanticEmpty,
                "Research names no companies and cites no year from 2020 onwards",
            ));
        }

        let specific = has_company || has_year || !t.research_requires_specificity;
        ResearchResult {
            pass: score >= t.research_pass && specific,
            score,
            metrics,
            total_chars,
            topics_analyzed: topics.len(),
            retry_topics,
            issues,
            error_type: None,
        }
    }
}

fn linear(actual: usize, target: usize, points: f64) -> f64 {
    if target == 0 {
        return points;
    }
    (actual as f64 / target as f64).min(1.0) * points
}

/// The narrative body of a topic: a string, or the first narrative key of
/// an object.
fn narrative_of(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Object(map) => NARRATIVE_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .map(text_of)
            .unwrap_or_default(),
        other => text_of(other),
    }
}

/// A topic object with any non-empty array or object besides its narrative.
fn carries_structured_data(content: &Value) -> bool {
    content
        .as_object()
        .map(|map| {
            map.iter().any(|(k, v)| {
                !NARRATIVE_KEYS.contains(&k.as_str())
                    && matches!(v, Value::Array(_) | Value::Object(_))
                    && !patterns::is_blank(Some(v))
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn run(input: Value) -> ResearchResult {
        let thresholds = GateThresholds::default();
        ResearchGate::new(&thresholds).check(&input)
    }

    fn filler(chars: usize) -> String {
        "lorem ".repeat(chars / 6 + 1)[..chars].to_string()
    }

    #[test]
    fn test_three_plain_topics_do_not_pass() {
        let mut topics = Map::new();
        for name in ["tariffs", "grid", "demand"] {
            topics.insert(name.to_string(), json!(filler(1000)));
        }
        let result = run(Value::Object(topics));
        assert_eq!(result.total_chars, 3000);
        assert_eq!(result.metrics.volume, 30.0);
        assert_eq!(result.metrics.breadth, 15.0);
        assert_eq!(result.metrics.structured_data, 0.0);
        assert!(result.score >= 30.0 && result.score < 55.0);
        assert!(!result.pass);
        assert!(result.retry_topics.is_empty());
    }

    #[test]
    fn test_high_score_without_specificity() {
        let mut topics = Map::new();
        for name in ["tariffs", "grid", "demand", "pricing", "supply"] {
            topics.insert(
                name.to_string(),
                json!({ "content": filler(1400), "series": [1.0, 2.0, 3.0] }),
            );
        }
        let input = Value::Object(topics);

        let result = run(input.clone());
        assert_eq!(result.score, 80.0);
        assert!(!result.pass);
        assert!(result
            .issues
            .iter()
            .any(|i| i.code == IssueCode::SemanticEmpty && i.message.contains("names no companies")));

        let thresholds = GateThresholds {
            research_requires_specificity: false,
            ..GateThresholds::default()
        };
        let relaxed = ResearchGate::new(&thresholds).check(&input);
        assert_eq!(relaxed.score, 80.0);
        assert!(relaxed.pass);
    }

    #[test]
    fn test_specific_structured_research_passes() {
        let result = run(json!({
            "market": {
                "content": format!("{} Saigon Power Corp expanded in 2024.", filler(700)),
                "dataPoints": [ { "year": 2023, "value": 12.5 } ]
            },
            "policy": { "content": filler(400), "table": { "rows": [["a", "b"]] } },
            "pricing": filler(900),
            "thin": "Too short"
        }));
        assert!(result.pass, "{:?}", result);
        assert_eq!(result.metrics.company_names, 10.0);
        assert_eq!(result.metrics.recent_years, 10.0);
        assert_eq!(result.retry_topics, vec!["thin".to_string()]);
        assert!(result
            .issues
            .iter()
            .any(|i| i.code == IssueCode::InsufficientDepth && i.path.as_deref() == Some("thin")));
    }

    #[test]
    fn test_empty_and_non_object_input() {
        for input in [json!({}), Value::Null, json!(["a"])] {
            let result = run(input);
            assert!(!result.pass);
            assert_eq!(result.issues[0].code, IssueCode::EmptyData);
            assert!(result.error_type.is_none());
        }
    }
}
