//! Pipeline contract: declarative schemas, alias tables, thresholds and the
//! envelope schemas for persisted files.
//!
//! Every component takes its tables from a `PipelineConfig` passed in at
//! construction, so differently configured pipelines can coexist.

mod config;
pub mod envelope;
mod schema;

pub use config::{
    AliasRule, ConfigError, DriftThresholds, GateThresholds, PipelineConfig, RelevanceMatching,
    TrustWeights,
};
pub use schema::{DocumentSchema, FieldSpec, NamedField, Shape};
