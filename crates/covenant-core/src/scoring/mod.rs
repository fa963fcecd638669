//! Advisory scoring: continuous trust estimates and insight lineage.
//!
//! Neither scorer fails. Absent or malformed input produces zero scores
//! and empty reports.

mod lineage;
mod trust;

pub use lineage::{LineageEnforcer, LineageReport, OrphanedInsight};
pub use trust::{FieldTrust, TrustScore, TrustScorer};
