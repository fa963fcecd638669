//! # covenant-core
//!
//! Data contract enforcement for machine-generated research documents.
//!
//! A document produced by an upstream generation stage passes through:
//! - a schema firewall that validates it, repairs common shape deviations
//!   and moves unrecognized fields into a quarantine store
//! - advisory scorers (continuous trust score, insight lineage)
//! - quality gates for research input, synthesized content and
//!   presentation blocks
//! - golden baselines that detect drift in gate results and in the
//!   structure of the rendering template
//!
//! ## Key Guarantees
//!
//! 1. **Total**: validation, coercion, gates and scorers never return
//!    errors; malformed input yields failing results
//! 2. **Lossless**: every field the canonical document drops is kept in
//!    the quarantine store with its original path
//! 3. **Deterministic**: no clocks, randomness or network calls influence
//!    any verdict
//! 4. **Configurable**: all schemas, aliases and thresholds live in an
//!    injected [`PipelineConfig`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use covenant_core::{enforce, PipelineConfig};
//!
//! let config = PipelineConfig::from_file("covenant.yaml")?;
//! let document: serde_json::Value = serde_json::from_str(&raw)?;
//! let report = enforce(&config, &document, Some("solar"));
//!
//! if !report.synthesis.pass {
//!     for failure in &report.synthesis.failures {
//!         eprintln!("{}", failure);
//!     }
//! }
//! send_to_renderer(&report.firewall.canonical);
//! ```

pub mod baseline;
pub mod contract;
pub mod firewall;
pub mod fixtures;
pub mod gates;
pub mod scoring;
pub mod tree;
pub mod types;

// Re-export main types at crate root
pub use baseline::{
    BaselineError, BaselineKind, BaselineManager, CombinedReport, GateDriftReport, StructuralCapture,
    StructuralDriftReport, StructuralSnapshot,
};
pub use contract::{ConfigError, PipelineConfig};
pub use firewall::{Firewall, FirewallOutcome, QuarantineStore};
pub use fixtures::{CoverageReport, CoverageReporter, Fixture, FixtureError, FixtureLoader, ReplayResult, Replayer};
pub use gates::{
    Gate, PresentationGate, PresentationResult, ResearchGate, ResearchResult, SynthesisGate,
    SynthesisResult,
};
pub use scoring::{LineageEnforcer, LineageReport, TrustScore, TrustScorer};
pub use types::{
    ActionLedger, DocumentShape, Issue, IssueCode, Severity, ValidationError, ValidationResult, Verdict,
};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from the fallible parts of the pipeline: configuration,
/// baselines and fixtures.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Baseline error: {0}")]
    Baseline(#[from] BaselineError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),
}

/// Everything one enforcement pass produced for a document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementReport {
    pub firewall: FirewallOutcome,
    pub trust: TrustScore,
    pub lineage: LineageReport,
    pub synthesis: SynthesisResult,
    pub presentation: PresentationResult,
}

/// Run a document through the firewall, the scorers and the document gates.
///
/// Scorers and gates see the canonical document. The presentation gate is
/// fed blocks derived with [`fixtures::flatten_blocks`].
pub fn enforce(config: &PipelineConfig, document: &Value, industry: Option<&str>) -> EnforcementReport {
    let firewall = Firewall::new(config.clone()).run(document);
    let canonical = &firewall.canonical;

    let trust = TrustScorer::new(config).score(canonical);
    let lineage = LineageEnforcer::new(config).enforce(canonical);
    let synthesis = SynthesisGate::new(config)
        .with_industry(industry.map(str::to_string))
        .check(canonical);
    let presentation = PresentationGate::new(&config.gates).check(&fixtures::flatten_blocks(canonical, config));

    tracing::info!(
        trust = trust.overall,
        lineage_valid = lineage.valid,
        synthesis_pass = synthesis.pass,
        presentation_pass = presentation.pass,
        "Enforcement pass complete"
    );

    EnforcementReport {
        firewall,
        trust,
        lineage,
        synthesis,
        presentation,
    }
}
