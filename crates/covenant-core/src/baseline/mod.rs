//! Golden baselines: persisted snapshots of gate results and structural
//! properties, and drift detection against them.

mod gate_drift;
mod store;
mod structural;

pub use gate_drift::{GateDriftReport, ScoreChange, StructuralChanges};
pub use store::{sanitize_name, BaselineError, BaselineKind, BaselineMeta, BaselineStore, FORMAT_VERSION};
pub use structural::{
    DriftItem, Geometry, SectionLayout, SlideDimensions, StructuralCapture, StructuralDriftReport,
    StructuralSnapshot, TemplatePattern, TextInvariants,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::contract::DriftThresholds;
use crate::types::Verdict;

/// File layout of a gate-result baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateBaseline {
    pub meta: BaselineMeta,
    pub gate_results: Value,
}

/// File layout of a structural baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralBaseline {
    pub meta: BaselineMeta,
    #[serde(flatten)]
    pub snapshot: StructuralSnapshot,
}

/// Both drift reports for one baseline name, folded into a verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedReport {
    pub verdict: Verdict,
    pub gates: GateDriftReport,
    pub structural: StructuralDriftReport,
}

/// Creates, compares and manages named baselines under one directory.
#[derive(Debug, Clone)]
pub struct BaselineManager {
    store: BaselineStore,
    thresholds: DriftThresholds,
}

impl BaselineManager {
    pub fn new(root: impl Into<PathBuf>, thresholds: DriftThresholds) -> Self {
        Self {
            store: BaselineStore::new(root),
            thresholds,
        }
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Freeze a gate-result payload under `name`.
    pub fn create_gate_baseline(&self, name: &str, results: &Value) -> Result<PathBuf, BaselineError> {
        let stem = sanitize_name(name)?;
        let file = GateBaseline {
            meta: BaselineMeta::new(&stem, BaselineKind::Gates),
            gate_results: results.clone(),
        };
        self.store.write_new(BaselineKind::Gates, &stem, &to_json(&file))
    }

    /// Compare gate results against the named baseline.
    ///
    /// A missing baseline is not an error: the report has
    /// `baselineFound: false` and no drift.
    pub fn compare_gates(&self, name: &str, current: &Value) -> Result<GateDriftReport, BaselineError> {
        let Some(raw) = self.store.read(BaselineKind::Gates, name)? else {
            tracing::warn!(name, kind = "gates", "No baseline found");
            return Ok(GateDriftReport::missing());
        };
        let baseline = raw.get("gateResults").unwrap_or(&Value::Null);
        let report = gate_drift::compare(baseline, current);

        tracing::info!(
            name,
            drift_items = report.total_drift_items,
            new_failures = report.new_failures.len(),
            fixed_failures = report.fixed_failures.len(),
            "Gate drift computed"
        );
        Ok(report)
    }

    pub fn create_structural_baseline(
        &self,
        name: &str,
        snapshot: &StructuralSnapshot,
    ) -> Result<PathBuf, BaselineError> {
        let stem = sanitize_name(name)?;
        let file = StructuralBaseline {
            meta: BaselineMeta::new(&stem, BaselineKind::Structural),
            snapshot: snapshot.clone(),
        };
        self.store.write_new(BaselineKind::Structural, &stem, &to_json(&file))
    }

    pub fn load_structural(&self, name: &str) -> Result<Option<StructuralBaseline>, BaselineError> {
        let Some(raw) = self.store.read(BaselineKind::Structural, name)? else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|source| BaselineError::Malformed {
                path: self
                    .store
                    .path_for(BaselineKind::Structural, name)
                    .unwrap_or_default(),
                source,
            })
    }

    pub fn compare_structural(
        &self,
        name: &str,
        current: &StructuralSnapshot,
    ) -> Result<StructuralDriftReport, BaselineError> {
        let Some(baseline) = self.load_structural(name)? else {
            tracing::warn!(name, kind = "structural", "No baseline found");
            return Ok(StructuralDriftReport::missing());
        };
        let report = structural::compare(&baseline.snapshot, current, &self.thresholds);

        tracing::info!(
            name,
            strict = report.strict_violations.len(),
            tolerated = report.tolerated_drift.len(),
            verdict = %report.verdict,
            "Structural drift computed"
        );
        Ok(report)
    }

    /// Run gate and structural drift against the same baseline name.
    pub fn check(
        &self,
        name: &str,
        gate_results: &Value,
        snapshot: &StructuralSnapshot,
    ) -> Result<CombinedReport, BaselineError> {
        let gates = self.compare_gates(name, gate_results)?;
        let structural = self.compare_structural(name, snapshot)?;

        let verdict = if !structural.strict_violations.is_empty() || !gates.new_failures.is_empty() {
            Verdict::Fail
        } else if gates.has_drift || !structural.tolerated_drift.is_empty() {
            Verdict::Warn
        } else {
            Verdict::Pass
        };

        tracing::info!(name, verdict = %verdict, "Baseline check finished");
        Ok(CombinedReport {
            verdict,
            gates,
            structural,
        })
    }

    pub fn delete(&self, kind: BaselineKind, name: &str) -> Result<bool, BaselineError> {
        self.store.delete(kind, name)
    }

    pub fn list(&self, kind: BaselineKind) -> Result<Vec<String>, BaselineError> {
        self.store.list(kind)
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    // Plain structs of strings, numbers and JSON values always serialize.
    serde_json::to_value(value).unwrap_or(Value::Null)
}
