//! Presentation-data gate.
//!
//! Validates the flattened list of renderable blocks handed to the slide
//! renderer. A block is an object carrying `section` and `key` plus the
//! fields of the sub-object it was flattened from.
//!
//! Hard checks (decide `pass`): section coverage, chart validity and the
//! unavailable-block ratio. Soft checks (warnings only): company
//! description length, text overflow, short charts and negative values.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::patterns;
use super::signals;
use super::{Gate, GateOutcome, ERROR_TYPE_EXCEPTION};
use crate::contract::GateThresholds;
use crate::tree;
use crate::types::{Issue, IssueCode};

/// The fixed presentation sections, in slide order.
pub const PRESENTATION_SECTIONS: [&str; 5] = ["policy", "market", "competitors", "depth", "summary"];

/// Block fields that describe placement rather than content.
const PLACEMENT_KEYS: [&str; 3] = ["section", "key", "type"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResult {
    pub pass: bool,
    pub block_count: usize,
    pub sections_covered: Vec<String>,
    pub charts_checked: usize,
    pub unavailable_ratio: f64,
    pub failures: Vec<Issue>,
    pub warnings: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl PresentationResult {
    fn rejected(issue: Issue) -> Self {
        PresentationResult {
            pass: false,
            block_count: 0,
            sections_covered: Vec::new(),
            charts_checked: 0,
            unavailable_ratio: 0.0,
            failures: vec![issue],
            warnings: Vec::new(),
            error_type: None,
        }
    }
}

impl GateOutcome for PresentationResult {
    fn passed(&self) -> bool {
        self.pass
    }

    fn exception(message: String) -> Self {
        let mut result = PresentationResult::rejected(Issue::new(IssueCode::Exception, message));
        result.error_type = Some(ERROR_TYPE_EXCEPTION.to_string());
        result
    }
}

pub struct PresentationGate<'a> {
    thresholds: &'a GateThresholds,
}

impl<'a> PresentationGate<'a> {
    pub fn new(thresholds: &'a GateThresholds) -> Self {
        Self { thresholds }
    }

    fn check_companies(&self, label: &str, block: &Map<String, Value>, warnings: &mut Vec<Issue>) {
        let mut companies: Vec<&Map<String, Value>> = Vec::new();
        if signals::name_of(block).is_some() {
            companies.push(block);
        }
        for value in block.values() {
            if let Value::Array(items) = value {
                companies.extend(
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .filter(|item| signals::name_of(item).is_some()),
                );
            }
        }

        for company in companies {
            let words = patterns::word_count(signals::description_of(company));
            if words < self.thresholds.ppt_company_words {
                warnings.push(Issue::at(
                    IssueCode::InsufficientDepth,
                    label,
                    format!(
                        "Company '{}' description has {} words, needs {}",
                        signals::name_of(company).unwrap_or("unnamed"),
                        words,
                        self.thresholds.ppt_company_words
                    ),
                ));
            }
        }
    }

    fn check_chart(&self, label: &str, chart: &Value, failures: &mut Vec<Issue>, warnings: &mut Vec<Issue>) {
        let t = self.thresholds;
        let series = signals::chart_series(chart);
        if series.is_empty() {
            failures.push(Issue::at(
                IssueCode::ChartDataIssues,
                label,
                "Chart has no data series",
            ));
            return;
        }

        for (i, values) in series.iter().enumerate() {
            let path = tree::index(&tree::join(label, "series"), i);
            if values.iter().any(|v| !v.is_number()) {
                failures.push(Issue::at(
                    IssueCode::ChartDataIssues,
                    path.as_str(),
                    "Chart series contains non-numeric values",
                ));
                continue;
            }
            let points = values.len();
            if points < t.min_chart_points {
                failures.push(Issue::at(
                    IssueCode::ChartDataIssues,
                    path.as_str(),
                    format!("Chart series has {} points, needs {}", points, t.min_chart_points),
                ));
            } else if points <= t.chart_warn_points {
                warnings.push(Issue::at(
                    IssueCode::ChartDataIssues,
                    path.as_str(),
                    format!("Chart series has only {} points", points),
                ));
            }
            let negatives = values.iter().filter(|v| v.as_f64().is_some_and(|n| n < 0.0)).count();
            if negatives > 0 {
                warnings.push(Issue::at(
                    IssueCode::BoundaryValues,
                    path.as_str(),
                    format!("{} negative chart values", negatives),
                ));
            }
        }
    }
}

impl Gate for PresentationGate<'_> {
    type Outcome = PresentationResult;

    fn name(&self) -> &'static str {
        "pptData"
    }

    fn evaluate(&self, input: &Value) -> PresentationResult {
        let t = self.thresholds;
        let blocks = match input {
            Value::Array(blocks) if !blocks.is_empty() => blocks,
            Value::Array(_) | Value::Null => {
                return PresentationResult::rejected(Issue::new(
                    IssueCode::EmptyData,
                    "No blocks provided: presentation data is empty",
                ))
            }
            _ => {
                return PresentationResult::rejected(Issue::new(
                    IssueCode::WrongType,
                    "Presentation data must be a list of blocks",
                ))
            }
        };

        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        let mut covered = BTreeSet::new();
        let mut unavailable = 0;
        let mut charts_checked = 0;

        for (i, value) in blocks.iter().enumerate() {
            let Some(block) = value.as_object() else {
                unavailable += 1;
                warnings.push(Issue::at(
                    IssueCode::WrongType,
                    tree::index("blocks", i),
                    "Block is not an object",
                ));
                continue;
            };
            let section = block.get("section").and_then(Value::as_str).unwrap_or("");
            let label = match block.get("key").and_then(Value::as_str) {
                Some(key) if !section.is_empty() => tree::join(section, key),
                _ => tree::index("blocks", i),
            };

            if has_real_content(block) {
                if PRESENTATION_SECTIONS.contains(&section) {
                    covered.insert(section.to_string());
                }
            } else {
                unavailable += 1;
                warnings.push(Issue::at(
                    IssueCode::SemanticEmpty,
                    label.as_str(),
                    "Block has no renderable content",
                ));
            }

            if section == "competitors" {
                self.check_companies(&label, block, &mut warnings);
            }
            if let Some(chart) = block.get("chartData") {
                charts_checked += 1;
                self.check_chart(&label, chart, &mut failures, &mut warnings);
            }
            for (path, chars) in long_strings(value, &label, t.overflow_chars) {
                warnings.push(Issue::at(
                    IssueCode::OverflowRisk,
                    path,
                    format!("Text of {} characters may overflow (limit {})", chars, t.overflow_chars),
                ));
            }
        }

        if covered.len() < t.min_ppt_sections {
            failures.push(Issue::new(
                IssueCode::MissingSection,
                format!(
                    "Only {} of {} sections have renderable content, needs {}",
                    covered.len(),
                    PRESENTATION_SECTIONS.len(),
                    t.min_ppt_sections
                ),
            ));
        }

        let unavailable_ratio = unavailable as f64 / blocks.len() as f64;
        if unavailable_ratio >= t.max_unavailable_ratio {
            failures.push(Issue::new(
                IssueCode::EmptyData,
                format!(
                    "{:.0}% of blocks are unavailable, limit is {:.0}%",
                    unavailable_ratio * 100.0,
                    t.max_unavailable_ratio * 100.0
                ),
            ));
        }

        PresentationResult {
            pass: failures.is_empty(),
            block_count: blocks.len(),
            sections_covered: covered.into_iter().collect(),
            charts_checked,
            unavailable_ratio,
            failures,
            warnings,
            error_type: None,
        }
    }
}

/// Any numeric leaf, or any string leaf that is neither a stand-in for
/// missing data nor a generator instruction.
fn has_real_content(block: &Map<String, Value>) -> bool {
    block
        .iter()
        .filter(|(k, _)| !PLACEMENT_KEYS.contains(&k.as_str()))
        .any(|(_, v)| real_leaf(v))
}

fn real_leaf(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => !patterns::is_unavailable(s) && !patterns::is_instruction_placeholder(s),
        Value::Array(items) => items.iter().any(real_leaf),
        Value::Object(map) => map.values().any(real_leaf),
        Value::Bool(_) | Value::Null => false,
    }
}

/// Paths and lengths of string leaves longer than `limit` characters.
fn long_strings(value: &Value, path: &str, limit: usize) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    collect_long(value, path, limit, &mut out);
    out
}

fn collect_long(value: &Value, path: &str, limit: usize, out: &mut Vec<(String, usize)>) {
    match value {
        Value::String(s) => {
            let chars = s.chars().count();
            if chars > limit {
                out.push((path.to_string(), chars));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_long(item, &tree::index(path, i), limit, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                collect_long(v, &tree::join(path, k), limit, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(input: Value) -> PresentationResult {
        let thresholds = GateThresholds::default();
        PresentationGate::new(&thresholds).check(&input)
    }

    fn long_description() -> String {
        vec!["capable"; 32].join(" ")
    }

    fn good_blocks() -> Value {
        json!([
            { "section": "policy", "key": "foundationalActs", "items": [ { "name": "Energy Law", "year": 2010 } ] },
            { "section": "market", "key": "pricing", "chartData": { "series": [ { "values": [1, 2, 3, 4, 5, 6] } ] } },
            { "section": "competitors", "key": "players", "items": [
                { "name": "Alpha Corp", "description": long_description() }
            ]},
            { "section": "summary", "key": "overview", "value": "Demand is rising across the region." }
        ])
    }

    #[test]
    fn test_empty_and_null_blocks() {
        for input in [json!([]), Value::Null] {
            let result = run(input);
            assert!(!result.pass);
            assert!(result.failures[0].message.contains("No blocks provided"));
            assert_eq!(result.failures[0].code, IssueCode::EmptyData);
        }
        let result = run(json!({ "blocks": [] }));
        assert_eq!(result.failures[0].code, IssueCode::WrongType);
    }

    #[test]
    fn test_good_blocks_pass() {
        let result = run(good_blocks());
        assert!(result.pass, "{:?}", result.failures);
        assert_eq!(result.sections_covered, vec!["competitors", "market", "policy", "summary"]);
        assert_eq!(result.charts_checked, 1);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_chart_rules() {
        let mut blocks = good_blocks();
        blocks.as_array_mut().unwrap().extend([
            json!({ "section": "market", "key": "segments", "chartData": { "values": [1, 2, 3] } }),
            json!({ "section": "market", "key": "trends", "chartData": { "values": [1, 2, -3, 4] } }),
            json!({ "section": "market", "key": "supply", "chartData": { "values": [1, "n/a", 3, 4] } }),
        ]);
        let result = run(blocks);
        assert!(!result.pass);
        let chart_failures: Vec<&str> = result
            .failures
            .iter()
            .filter(|i| i.code == IssueCode::ChartDataIssues)
            .filter_map(|i| i.path.as_deref())
            .collect();
        assert_eq!(chart_failures, vec!["market.segments.series[0]", "market.supply.series[0]"]);
        assert!(result.warnings.iter().any(|i| i.code == IssueCode::BoundaryValues));
        assert!(result
            .warnings
            .iter()
            .any(|i| i.code == IssueCode::ChartDataIssues && i.message.contains("only 4 points")));
    }

    #[test]
    fn test_soft_checks_do_not_fail() {
        let mut blocks = good_blocks();
        blocks[2]["items"][0]["description"] = json!("Short blurb");
        blocks[3]["value"] = json!("x".repeat(301));
        let result = run(blocks);
        assert!(result.pass);
        assert!(result.warnings.iter().any(|i| i.code == IssueCode::InsufficientDepth));
        assert!(result
            .warnings
            .iter()
            .any(|i| i.code == IssueCode::OverflowRisk && i.path.as_deref() == Some("summary.overview.value")));
    }

    #[test]
    fn test_coverage_and_unavailable_ratio() {
        let result = run(json!([
            { "section": "policy", "key": "nationalPolicy", "value": "N/A" },
            { "section": "market", "key": "marketSize", "value": "Insert a market size figure here" },
            { "section": "summary", "key": "overview", "value": "Real text" }
        ]));
        assert!(!result.pass);
        assert_eq!(result.sections_covered, vec!["summary"]);
        assert!((result.unavailable_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!(result.failures.iter().any(|i| i.code == IssueCode::MissingSection));
        assert!(result.failures.iter().any(|i| i.code == IssueCode::EmptyData));
    }
}
