//! Schema validation of generated documents.
//!
//! The validator walks each declared section recursively and reports
//! path-qualified problems. It never fails: malformed input produces a
//! result with `valid: false`, not an error.

use serde_json::Value;

use crate::contract::{FieldSpec, PipelineConfig, Shape};
use crate::tree;
use crate::types::{FieldResult, IssueCode, Severity, ValidationError, ValidationResult};

/// Checks documents against the configured per-shape schema.
pub struct Validator<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Validate a document. Never panics, never returns an error.
    pub fn validate(&self, document: &Value) -> ValidationResult {
        let Some(root) = document.as_object() else {
            let kind = Shape::of(document).map(|s| s.as_str()).unwrap_or("null");
            return ValidationResult {
                valid: false,
                errors: vec![ValidationError {
                    path: "$".to_string(),
                    message: format!("Document must be an object, got {}", kind),
                    severity: Severity::Critical,
                    code: IssueCode::WrongType,
                }],
                field_results: Default::default(),
            };
        };

        let shape = self.config.shape_of(document);
        let schema = self.config.schema_for(shape);
        let mut result = ValidationResult::default();

        for section in &schema.sections {
            let before = result.errors.len();
            let present = match root.get(&section.name) {
                None => {
                    if section.spec.required {
                        push(
                            &mut result.errors,
                            &section.name,
                            format!("Missing required section '{}'", section.name),
                            Severity::Error,
                            IssueCode::MissingSection,
                        );
                    }
                    false
                }
                Some(Value::Null) => {
                    if section.spec.required {
                        push(
                            &mut result.errors,
                            &section.name,
                            format!("Null required field '{}'", section.name),
                            Severity::Error,
                            IssueCode::NullRequiredField,
                        );
                    }
                    false
                }
                Some(value) => {
                    self.check_field(&section.name, &section.spec, value, true, &mut result.errors);
                    true
                }
            };

            let section_errors = &result.errors[before..];
            result.field_results.insert(
                section.name.clone(),
                FieldResult {
                    present,
                    valid: !section_errors.iter().any(|e| e.severity.is_blocking()),
                    error_count: section_errors.len(),
                },
            );
        }

        for key in root.keys() {
            if schema.is_section(key) || self.config.is_meta_key(key) || self.config.is_internal_key(key) {
                continue;
            }
            push(
                &mut result.errors,
                key,
                format!("Unknown field '{}' is not part of the {} schema", key, shape.as_str()),
                Severity::Warning,
                IssueCode::SchemaViolation,
            );
        }

        let depth = tree::max_depth(document);
        if depth > self.config.max_nesting_depth {
            push(
                &mut result.errors,
                "$",
                format!(
                    "Nesting depth {} exceeds limit of {}",
                    depth, self.config.max_nesting_depth
                ),
                Severity::Warning,
                IssueCode::DeepNesting,
            );
        }

        result.valid = !result.errors.iter().any(|e| e.severity.is_blocking());
        tracing::debug!(
            shape = shape.as_str(),
            valid = result.valid,
            errors = result.errors.len(),
            "Document validated"
        );
        result
    }

    fn check_field(
        &self,
        path: &str,
        spec: &FieldSpec,
        value: &Value,
        top_level: bool,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(actual) = Shape::of(value) else {
            return;
        };

        if actual != spec.shape {
            push(
                errors,
                path,
                format!(
                    "Type mismatch at {}: expected {}, got {}",
                    path,
                    spec.shape.as_str(),
                    actual.as_str()
                ),
                Severity::Error,
                IssueCode::WrongType,
            );
            return;
        }

        if spec.required && is_empty(value) {
            push(
                errors,
                path,
                format!("Empty data at {}", path),
                Severity::Warning,
                IssueCode::EmptyData,
            );
        }

        match value {
            Value::Object(map) => {
                for child in &spec.children {
                    let child_path = tree::join(path, &child.name);
                    match map.get(&child.name) {
                        None if child.spec.required => push(
                            errors,
                            &child_path,
                            format!("Missing required field '{}'", child_path),
                            nested_severity(top_level),
                            IssueCode::MissingSection,
                        ),
                        Some(Value::Null) if child.spec.required => push(
                            errors,
                            &child_path,
                            format!("Null required field '{}'", child_path),
                            nested_severity(top_level),
                            IssueCode::NullRequiredField,
                        ),
                        Some(child_value) => {
                            self.check_field(&child_path, &child.spec, child_value, false, errors)
                        }
                        None => {}
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_spec) = &spec.items {
                    for (i, item) in items.iter().enumerate() {
                        self.check_field(&tree::index(path, i), item_spec, item, false, errors);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Required fields directly under a section are errors; deeper ones warn.
fn nested_severity(parent_is_section: bool) -> Severity {
    if parent_is_section {
        Severity::Error
    } else {
        Severity::Warning
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn push(
    errors: &mut Vec<ValidationError>,
    path: &str,
    message: String,
    severity: Severity,
    code: IssueCode,
) {
    errors.push(ValidationError {
        path: path.to_string(),
        message,
        severity,
        code,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(document: Value) -> ValidationResult {
        let config = PipelineConfig::default();
        Validator::new(&config).validate(&document)
    }

    #[test]
    fn test_null_document_is_critical() {
        let result = validate(Value::Null);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Critical);
        assert!(result.errors[0].message.contains("null"));
    }

    #[test]
    fn test_non_object_inputs_never_panic() {
        for input in [json!(42), json!("text"), json!([1, 2]), json!(true)] {
            let result = validate(input);
            assert!(!result.valid);
            assert_eq!(result.errors[0].severity, Severity::Critical);
        }
    }

    #[test]
    fn test_missing_required_sections() {
        let result = validate(json!({ "policy": { "foundationalActs": [] } }));
        assert!(!result.valid);
        let missing: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::MissingSection)
            .map(|e| e.path.as_str())
            .collect();
        assert!(missing.contains(&"market"));
        assert!(missing.contains(&"competitors"));
        assert!(missing.contains(&"summary"));
        assert!(!missing.contains(&"depth"));
        assert!(!result.field_results["market"].present);
    }

    #[test]
    fn test_type_mismatch_is_path_qualified() {
        let result = validate(json!({
            "policy": {},
            "market": "a big market",
            "competitors": { "players": [] },
            "summary": { "keyInsights": {"title": "x"} }
        }));
        let mismatches: Vec<&ValidationError> = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::WrongType)
            .collect();
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches.iter().any(|e| e.path == "market"
            && e.message == "Type mismatch at market: expected object, got scalar"));
        assert!(mismatches.iter().any(|e| e.path == "summary.keyInsights"));
        assert!(!result.field_results["market"].valid);
    }

    #[test]
    fn test_null_required_section() {
        let result = validate(json!({
            "policy": {}, "market": {}, "competitors": {"players": []}, "summary": null
        }));
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == IssueCode::NullRequiredField && e.path == "summary"));
    }

    #[test]
    fn test_nested_required_field_warns() {
        let result = validate(json!({
            "policy": {},
            "market": {},
            "competitors": { "players": [ { "description": "no name" } ] },
            "summary": {}
        }));
        let nested = result
            .errors
            .iter()
            .find(|e| e.path == "competitors.players[0].name")
            .unwrap();
        assert_eq!(nested.severity, Severity::Warning);
        assert_eq!(nested.code, IssueCode::MissingSection);
    }

    #[test]
    fn test_unknown_root_key_and_meta_keys() {
        let result = validate(json!({
            "country": "Vietnam",
            "_trace": "abc",
            "bonusSection": {},
            "policy": {}, "market": {}, "competitors": {"players": [{"name": "A"}]}, "summary": {}
        }));
        let violations: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::SchemaViolation)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(violations, vec!["bonusSection"]);
        assert!(result.valid);
    }

    #[test]
    fn test_single_entity_schema_selected() {
        let result = validate(json!({
            "isSingleCompany": true,
            "executiveSummary": "One paragraph only",
            "marketOpportunityAssessment": {},
            "competitivePositioning": {},
            "keyInsights": []
        }));
        assert!(result
            .errors
            .iter()
            .any(|e| e.path == "executiveSummary" && e.code == IssueCode::WrongType));
        assert!(result.field_results.contains_key("keyInsights"));
        assert!(!result.field_results.contains_key("policy"));
    }

    #[test]
    fn test_deep_nesting_warning() {
        let mut deep = json!("leaf");
        for _ in 0..10 {
            deep = json!({ "inner": deep });
        }
        let result = validate(json!({
            "policy": {}, "market": { "trends": deep }, "competitors": {"players": [{"name": "A"}]}, "summary": {}
        }));
        assert!(result.errors.iter().any(|e| e.code == IssueCode::DeepNesting));
    }
}
