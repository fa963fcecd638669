//! The schema firewall: validate → coerce → quarantine → re-validate.
//!
//! A generated document passes through the firewall once per run. The
//! pre-coercion validation is kept for diagnostics; the post-coercion
//! validation describes the canonical document handed downstream.

mod coercer;
mod quarantine;
mod validator;

pub use coercer::{
    CoercionOutcome, Coercer, Displaced, REASON_NON_OBJECT_INSIGHT, REASON_PLACEHOLDER_INSIGHT,
    REASON_SUPERSEDED,
};
pub use quarantine::{
    Quarantine, QuarantineEntry, QuarantineStore, REASON_UNKNOWN_ROOT,
    REASON_UNKNOWN_SECTION_FIELD,
};
pub use validator::Validator;

use serde::Serialize;
use serde_json::Value;

use crate::contract::PipelineConfig;
use crate::types::{ActionLedger, DocumentShape, ValidationResult};

/// Everything one firewall pass produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallOutcome {
    pub shape: DocumentShape,
    pub pre_validation: ValidationResult,
    pub canonical: Value,
    pub ledger: ActionLedger,
    pub quarantine: QuarantineStore,
    pub post_validation: ValidationResult,
}

/// Runs the full firewall sequence for one pipeline configuration.
pub struct Firewall {
    config: PipelineConfig,
}

impl Firewall {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pass a document through the firewall.
    pub fn run(&self, document: &Value) -> FirewallOutcome {
        let validator = Validator::new(&self.config);
        let pre_validation = validator.validate(document);

        let CoercionOutcome {
            document: coerced,
            ledger,
            displaced,
        } = Coercer::new(&self.config).coerce(document);

        let mut quarantine = QuarantineStore::new();
        for item in displaced {
            quarantine.insert(item.path, item.value, item.reason);
        }
        let canonical = Quarantine::new(&self.config).extract(&coerced, &mut quarantine);

        let post_validation = validator.validate(&canonical);
        let shape = self.config.shape_of(document);

        tracing::info!(
            shape = shape.as_str(),
            pre_errors = pre_validation.errors.len(),
            post_errors = post_validation.errors.len(),
            ledger_entries = ledger.len(),
            quarantined = quarantine.count(),
            valid = post_validation.valid,
            "Firewall pass complete"
        );

        FirewallOutcome {
            shape,
            pre_validation,
            canonical,
            ledger,
            quarantine,
            post_validation,
        }
    }
}

impl Default for Firewall {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
