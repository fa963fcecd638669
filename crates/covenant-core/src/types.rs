//! Shared result types for the enforcement pipeline.
//!
//! Everything here is plain data: serializable, comparable, and free of
//! behavior beyond small constructors and accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The ten failure classes the coverage reporter tracks, in report order.
pub const COVERAGE_CLASSES: [&str; 10] = [
    "missing-section",
    "empty-data",
    "wrong-type",
    "null-required-field",
    "overflow-risk",
    "chart-data-issues",
    "semantic-empty",
    "schema-violation",
    "deep-nesting",
    "boundary-values",
];

/// Structured classification for every issue the validator and gates emit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    MissingSection,
    EmptyData,
    WrongType,
    NullRequiredField,
    OverflowRisk,
    ChartDataIssues,
    SemanticEmpty,
    SchemaViolation,
    DeepNesting,
    BoundaryValues,
    /// Content is present but below a quality threshold.
    InsufficientDepth,
    /// A gate panicked and was converted into a failed result.
    Exception,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingSection => "missing-section",
            IssueCode::EmptyData => "empty-data",
            IssueCode::WrongType => "wrong-type",
            IssueCode::NullRequiredField => "null-required-field",
            IssueCode::OverflowRisk => "overflow-risk",
            IssueCode::ChartDataIssues => "chart-data-issues",
            IssueCode::SemanticEmpty => "semantic-empty",
            IssueCode::SchemaViolation => "schema-violation",
            IssueCode::DeepNesting => "deep-nesting",
            IssueCode::BoundaryValues => "boundary-values",
            IssueCode::InsufficientDepth => "insufficient-depth",
            IssueCode::Exception => "exception",
        }
    }

    /// The coverage class this code counts towards, if any.
    pub fn coverage_class(&self) -> Option<&'static str> {
        let name = self.as_str();
        COVERAGE_CLASSES.iter().copied().find(|c| *c == name)
    }

    pub fn from_str_code(code: &str) -> Option<Self> {
        serde_json::from_value(Value::String(code.to_string())).ok()
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure, issue or warning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,

    /// Dotted document path the issue refers to, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn at(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Severity of a validation error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Error,
    Warning,
}

impl Severity {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::Error)
    }
}

/// A single path-qualified validation error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
    pub severity: Severity,
    pub code: IssueCode,
}

/// Per-section outcome of validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub present: bool,
    pub valid: bool,
    pub error_count: usize,
}

/// Result of validating a document. Always produced, never an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub field_results: BTreeMap<String, FieldResult>,
}

impl ValidationResult {
    /// Errors that make the document invalid.
    pub fn blocking_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity.is_blocking())
    }

    /// Convert errors into structured issues for coverage and baselines.
    pub fn issues(&self) -> Vec<Issue> {
        self.errors
            .iter()
            .map(|e| Issue::at(e.code, e.path.clone(), e.message.clone()))
            .collect()
    }
}

/// What the coercer did at a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Kept,
    Coerced,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub path: String,
    pub action: LedgerAction,
    pub details: String,
}

/// Append-only, traversal-ordered record of one coercion pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ActionLedger {
    entries: Vec<LedgerEntry>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<String>, action: LedgerAction, details: impl Into<String>) {
        self.entries.push(LedgerEntry {
            path: path.into(),
            action,
            details: details.into(),
        });
    }

    /// Append every entry of another ledger, preserving order.
    pub fn append(&mut self, other: ActionLedger) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, action: LedgerAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    pub fn entry(&self, path: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// The two document layouts the pipeline understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentShape {
    /// Fixed sections: policy, market, competitors, depth, summary
    MultiEntity,
    /// Flag-marked single-company layout
    SingleEntity,
}

impl DocumentShape {
    /// Detect the shape from the single-entity flag key.
    pub fn detect(document: &Value, flag_key: &str) -> Self {
        match document.get(flag_key) {
            Some(Value::Bool(true)) => DocumentShape::SingleEntity,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => DocumentShape::SingleEntity,
            _ => DocumentShape::MultiEntity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentShape::MultiEntity => "multi-entity",
            DocumentShape::SingleEntity => "single-entity",
        }
    }
}

/// Three-valued drift verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    /// Fold strict/tolerated signal counts into a verdict.
    pub fn from_counts(strict: usize, tolerated: usize) -> Self {
        if strict > 0 {
            Verdict::Fail
        } else if tolerated > 0 {
            Verdict::Warn
        } else {
            Verdict::Pass
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Warn => f.write_str("WARN"),
            Verdict::Fail => f.write_str("FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_code_serializes_kebab_case() {
        let value = serde_json::to_value(IssueCode::NullRequiredField).unwrap();
        assert_eq!(value, json!("null-required-field"));
        assert_eq!(
            IssueCode::from_str_code("chart-data-issues"),
            Some(IssueCode::ChartDataIssues)
        );
    }

    #[test]
    fn test_coverage_class_mapping() {
        assert_eq!(IssueCode::OverflowRisk.coverage_class(), Some("overflow-risk"));
        assert_eq!(IssueCode::InsufficientDepth.coverage_class(), None);
        assert_eq!(IssueCode::Exception.coverage_class(), None);
    }

    #[test]
    fn test_shape_detection() {
        assert_eq!(
            DocumentShape::detect(&json!({"isSingleCompany": true}), "isSingleCompany"),
            DocumentShape::SingleEntity
        );
        assert_eq!(
            DocumentShape::detect(&json!({"policy": {}}), "isSingleCompany"),
            DocumentShape::MultiEntity
        );
        assert_eq!(
            DocumentShape::detect(&Value::Null, "isSingleCompany"),
            DocumentShape::MultiEntity
        );
    }

    #[test]
    fn test_verdict_from_counts() {
        assert_eq!(Verdict::from_counts(1, 5), Verdict::Fail);
        assert_eq!(Verdict::from_counts(0, 2), Verdict::Warn);
        assert_eq!(Verdict::from_counts(0, 0), Verdict::Pass);
        assert_eq!(serde_json::to_value(Verdict::Warn).unwrap(), json!("WARN"));
    }

    #[test]
    fn test_ledger_counts() {
        let mut ledger = ActionLedger::new();
        ledger.record("policy", LedgerAction::Kept, "shape ok");
        ledger.record("summary.insights", LedgerAction::Coerced, "renamed");
        ledger.record("summary.keyInsights[1]", LedgerAction::Dropped, "placeholder");

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.count(LedgerAction::Coerced), 1);
        assert_eq!(ledger.entry("policy").unwrap().action, LedgerAction::Kept);
    }
}
