//! Completeness signals extracted from canonical documents.
//!
//! The synthesis gate turns these into pass/fail sub-scores; the trust
//! scorer turns the same signals into continuous estimates.

use serde_json::{Map, Value};

use super::patterns::{self, word_count};

/// Foundational-act counts from a policy section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActSignals {
    pub count: usize,
    pub named_with_year: usize,
    /// Acts whose year is outside 1900..=2100
    pub implausible_years: Vec<(String, i64)>,
}

/// Inspect `policy.foundationalActs`.
pub fn foundational_acts(policy: Option<&Value>) -> ActSignals {
    let mut signals = ActSignals::default();
    let Some(acts) = policy.and_then(|p| p.get("foundationalActs")).and_then(Value::as_array) else {
        return signals;
    };

    for act in acts {
        signals.count += 1;
        let name = act.get("name").and_then(Value::as_str).unwrap_or("").trim();
        let year = act.get("year").and_then(year_of);
        if !name.is_empty() && year.is_some() {
            signals.named_with_year += 1;
        }
        if let Some(y) = year {
            if !(1900..=2100).contains(&y) {
                signals.implausible_years.push((name.to_string(), y));
            }
        }
    }
    signals
}

fn year_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => patterns::ANY_YEAR
            .find(s)
            .and_then(|m| m.as_str().parse().ok())
            .or_else(|| s.trim().parse().ok()),
        _ => None,
    }
}

/// Series arrays inside a `chartData` object: `series[].values`,
/// `series[].data`, or a bare `values` array.
pub fn chart_series(chart_data: &Value) -> Vec<&Vec<Value>> {
    if let Some(series) = chart_data.get("series").and_then(Value::as_array) {
        return series
            .iter()
            .filter_map(|s| {
                s.get("values")
                    .or_else(|| s.get("data"))
                    .and_then(Value::as_array)
            })
            .collect();
    }
    chart_data
        .get("values")
        .and_then(Value::as_array)
        .map(|v| vec![v])
        .unwrap_or_default()
}

/// Whether a block or sub-section carries at least one fully numeric series.
pub fn has_numeric_chart(section: &Value) -> bool {
    section
        .get("chartData")
        .map(|chart| {
            chart_series(chart)
                .iter()
                .any(|s| !s.is_empty() && s.iter().all(Value::is_number))
        })
        .unwrap_or(false)
}

/// Market sub-sections (any object child) carrying numeric chart series.
pub fn chart_sections(market: Option<&Value>) -> usize {
    market
        .and_then(Value::as_object)
        .map(|m| m.values().filter(|v| v.is_object() && has_numeric_chart(v)).count())
        .unwrap_or(0)
}

/// Player objects from `{key: [...]}` or a bare array.
pub fn players<'a>(section: Option<&'a Value>, key: &str) -> Vec<&'a Map<String, Value>> {
    let list = match section {
        Some(Value::Array(items)) => Some(items),
        Some(Value::Object(map)) => map.get(key).and_then(Value::as_array),
        _ => None,
    };
    list.map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

pub fn name_of(item: &Map<String, Value>) -> Option<&str> {
    item.get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
}

pub fn description_of(item: &Map<String, Value>) -> &str {
    item.get("description").and_then(Value::as_str).unwrap_or("")
}

pub fn named_count(items: &[&Map<String, Value>]) -> usize {
    items.iter().filter(|p| name_of(p).is_some()).count()
}

/// Mean description length in words; 0 for an empty list.
pub fn average_description_words(items: &[&Map<String, Value>]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let total: usize = items.iter().map(|p| word_count(description_of(p))).sum();
    total as f64 / items.len() as f64
}

/// Object entries of an insight list.
pub fn insights(list: Option<&Value>) -> Vec<&Map<String, Value>> {
    list.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

/// Evidence of an insight: `data`, falling back to the legacy `evidence`.
pub fn insight_evidence(insight: &Map<String, Value>) -> Option<&Value> {
    [insight.get("data"), insight.get("evidence")]
        .into_iter()
        .flatten()
        .find(|v| !patterns::is_blank(Some(v)))
}

pub fn insight_has_data(insight: &Map<String, Value>) -> bool {
    insight_evidence(insight).is_some()
}

pub fn insight_complete(insight: &Map<String, Value>) -> bool {
    insight_has_data(insight) && !patterns::is_blank(insight.get("implication"))
}

/// Number of entries in a list-like value. A single populated object or
/// string counts as one.
pub fn list_len(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|v| !patterns::is_blank(Some(v))).count(),
        Some(v @ (Value::Object(_) | Value::String(_))) if !patterns::is_blank(Some(v)) => 1,
        _ => 0,
    }
}

/// Paragraphs with at least `min_words` words.
pub fn substantial_paragraphs(value: Option<&Value>, min_words: usize) -> usize {
    let paragraphs: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().map(patterns::text_of).collect(),
        Some(Value::String(s)) => patterns::split_paragraphs(s),
        _ => Vec::new(),
    };
    paragraphs.iter().filter(|p| word_count(p) >= min_words).count()
}

/// Implementation roadmap completeness.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseSignals {
    pub phases: usize,
    pub with_activities: usize,
    pub with_investment: usize,
}

pub fn phases(implementation: Option<&Value>) -> PhaseSignals {
    let mut signals = PhaseSignals::default();
    let Some(list) = implementation
        .and_then(|i| i.get("phases"))
        .and_then(Value::as_array)
    else {
        return signals;
    };

    for phase in list {
        signals.phases += 1;
        if list_len(phase.get("activities")) > 0 {
            signals.with_activities += 1;
        }
        if !patterns::is_blank(phase.get("investment")) {
            signals.with_investment += 1;
        }
    }
    signals
}

/// Whether a scalar or container carries anything other than blank text.
pub fn is_populated(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !patterns::is_unavailable(s),
        Some(v) => !patterns::is_blank(Some(v)),
        None => false,
    }
}

/// Ratio clamped to 0..=1; a zero target counts as satisfied.
pub fn ratio(actual: f64, target: f64) -> f64 {
    if target <= 0.0 {
        1.0
    } else {
        (actual / target).clamp(0.0, 1.0)
    }
}
