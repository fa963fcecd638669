//! Regression fixtures: stored documents with declared outcomes, replayed
//! offline through the firewall and the document gates.

mod coverage;
mod loader;
mod replay;

pub use coverage::{classify, classify_message, CoverageReport, CoverageReporter};
pub use loader::{expand_placeholders, filler, table, Expectations, Fixture, FixtureError, FixtureLoader};
pub use replay::{flatten_blocks, ReplayResult, Replayer};
