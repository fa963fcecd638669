//! Failure-class coverage across the stored fixtures.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::loader::FixtureLoader;
use super::replay::Replayer;
use super::FixtureError;
use crate::types::{Issue, COVERAGE_CLASSES};

lazy_static! {
    /// Keyword patterns for free-text messages, checked in order.
    static ref CLASS_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("null-required-field", Regex::new(r"(?i)\bnull\b").unwrap()),
        ("deep-nesting", Regex::new(r"(?i)nesting|too deep").unwrap()),
        ("overflow-risk", Regex::new(r"(?i)overflow|too long|exceeds \d+ char").unwrap()),
        ("chart-data-issues", Regex::new(r"(?i)chart|series|data points?").unwrap()),
        ("semantic-empty", Regex::new(r"(?i)placeholder|unavailable|no renderable content").unwrap()),
        ("schema-violation", Regex::new(r"(?i)schema|unknown field|unrecognized").unwrap()),
        ("boundary-values", Regex::new(r"(?i)negative|out of range|implausible|boundary").unwrap()),
        ("wrong-type", Regex::new(r"(?i)wrong type|expected (an? )?(object|array|string|number)|must be an? ").unwrap()),
        ("missing-section", Regex::new(r"(?i)missing|not found").unwrap()),
        ("empty-data", Regex::new(r"(?i)\bempty\b|no (data|blocks|topics)").unwrap()),
    ];
}

/// Classify a legacy free-text message.
pub fn classify_message(message: &str) -> Option<&'static str> {
    CLASS_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(message))
        .map(|(class, _)| *class)
}

/// Coverage class of a structured issue, falling back to its message.
pub fn classify(issue: &Issue) -> Option<&'static str> {
    issue
        .code
        .coverage_class()
        .or_else(|| classify_message(&issue.message))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub fixtures_replayed: usize,
    /// Issue count per class, every class listed
    pub class_counts: BTreeMap<String, usize>,
    pub exercised: Vec<String>,
    pub unexercised: Vec<String>,
    /// Classes each fixture exercised
    pub per_fixture: BTreeMap<String, Vec<String>>,
    /// Fixtures that could not be loaded, with the reason
    pub load_errors: BTreeMap<String, String>,
}

pub struct CoverageReporter<'a> {
    loader: &'a FixtureLoader,
    replayer: &'a Replayer,
}

impl<'a> CoverageReporter<'a> {
    pub fn new(loader: &'a FixtureLoader, replayer: &'a Replayer) -> Self {
        Self { loader, replayer }
    }

    /// Replay every stored fixture and tally failure classes.
    ///
    /// A fixture that fails to load is recorded and skipped.
    pub fn report(&self) -> Result<CoverageReport, FixtureError> {
        let mut counts: BTreeMap<String, usize> =
            COVERAGE_CLASSES.iter().map(|c| (c.to_string(), 0)).collect();
        let mut per_fixture = BTreeMap::new();
        let mut load_errors = BTreeMap::new();

        for name in self.loader.list()? {
            let fixture = match self.loader.load(&name) {
                Ok(fixture) => fixture,
                Err(e) => {
                    tracing::warn!(fixture = %name, error = %e, "Fixture skipped");
                    load_errors.insert(name, e.to_string());
                    continue;
                }
            };

            let result = self.replayer.replay(&fixture);
            let mut classes = BTreeSet::new();
            for issue in result.issues() {
                if let Some(class) = classify(&issue) {
                    *counts.entry(class.to_string()).or_default() += 1;
                    classes.insert(class.to_string());
                }
            }
            per_fixture.insert(name, classes.into_iter().collect());
        }

        let (exercised, unexercised): (Vec<String>, Vec<String>) = COVERAGE_CLASSES
            .iter()
            .map(|c| c.to_string())
            .partition(|c| counts.get(c).copied().unwrap_or(0) > 0);

        tracing::info!(
            fixtures = per_fixture.len(),
            exercised = exercised.len(),
            unexercised = unexercised.len(),
            "Coverage report built"
        );

        Ok(CoverageReport {
            fixtures_replayed: per_fixture.len(),
            class_counts: counts,
            exercised,
            unexercised,
            per_fixture,
            load_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::PipelineConfig;
    use crate::types::IssueCode;
    use std::fs;

    #[test]
    fn test_classify_prefers_code() {
        let issue = Issue::new(IssueCode::OverflowRisk, "Section is missing");
        assert_eq!(classify(&issue), Some("overflow-risk"));

        let fallback = Issue::new(IssueCode::Exception, "Chart series has 2 points");
        assert_eq!(classify(&fallback), Some("chart-data-issues"));

        let depth = Issue::new(IssueCode::InsufficientDepth, "Only 3 named competitors");
        assert_eq!(classify(&depth), None);
    }

    #[test]
    fn test_classify_legacy_messages() {
        let cases = [
            ("Null required field: policy", "null-required-field"),
            ("Document nesting exceeds depth 8", "deep-nesting"),
            ("Text may overflow the text box", "overflow-risk"),
            ("Chart has no data series", "chart-data-issues"),
            ("Block contains placeholder text", "semantic-empty"),
            ("Unknown field 'foo' at root", "schema-violation"),
            ("Negative value in pricing", "boundary-values"),
            ("Field 'market' has wrong type", "wrong-type"),
            ("Missing section: summary", "missing-section"),
            ("Research data is empty", "empty-data"),
        ];
        for (message, class) in cases {
            assert_eq!(classify_message(message), Some(class), "{}", message);
        }
        assert_eq!(classify_message("All good"), None);
    }

    #[test]
    fn test_report_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("empty.json"),
            r#"{"name": "empty", "document": {}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "not json").unwrap();

        let config = PipelineConfig::default();
        let loader = FixtureLoader::new(dir.path(), &config);
        let replayer = Replayer::new(config);
        let report = CoverageReporter::new(&loader, &replayer).report().unwrap();

        assert_eq!(report.fixtures_replayed, 1);
        assert!(report.load_errors.contains_key("broken"));
        assert_eq!(report.class_counts.len(), COVERAGE_CLASSES.len());
        assert!(report.exercised.contains(&"missing-section".to_string()));
        assert!(report.unexercised.contains(&"deep-nesting".to_string()));
        assert_eq!(report.exercised.len() + report.unexercised.len(), COVERAGE_CLASSES.len());
        assert!(report.per_fixture["empty"].contains(&"empty-data".to_string()));
    }
}
