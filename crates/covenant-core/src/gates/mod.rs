//! Quality gates.
//!
//! Each gate inspects one input and returns a result with a `pass` flag and
//! structured issues. Gates are advisory: they never return errors, and a
//! panic inside a gate is converted into a failed result carrying
//! `errorType: "exception"`.
//!
//! | Gate | Input | Passes when |
//! |------|-------|-------------|
//! | [`ResearchGate`] | topic → content map | score ≥ 40 and content is specific |
//! | [`SynthesisGate`] | canonical document | overall ≥ 40 (multi) / ≥ 60 (single) |
//! | [`PresentationGate`] | renderable block list | coverage, charts and availability hold |

pub mod patterns;
mod presentation;
mod research;
pub mod signals;
mod synthesis;

pub use presentation::{PresentationGate, PresentationResult, PRESENTATION_SECTIONS};
pub use research::{ResearchGate, ResearchMetrics, ResearchResult};
pub use synthesis::{MacroPadding, SynthesisGate, SynthesisResult};

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

/// `errorType` value for results produced by the panic guard.
pub const ERROR_TYPE_EXCEPTION: &str = "exception";

/// A gate result that can stand in for a gate that blew up.
pub trait GateOutcome: Sized {
    fn passed(&self) -> bool;

    /// A failed result describing an internal error.
    fn exception(message: String) -> Self;
}

/// A quality gate over a JSON input.
pub trait Gate {
    type Outcome: GateOutcome;

    fn name(&self) -> &'static str;

    /// Evaluate the input. Implementations may assume nothing about its shape.
    fn evaluate(&self, input: &Value) -> Self::Outcome;

    /// Evaluate with the panic guard in place.
    fn check(&self, input: &Value) -> Self::Outcome {
        run_guarded(self.name(), || self.evaluate(input))
    }
}

/// Run a gate body, turning a panic into an exception outcome.
pub fn run_guarded<T, F>(gate: &str, body: F) -> T
where
    T: GateOutcome,
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(outcome) => {
            tracing::info!(gate, pass = outcome.passed(), "Gate evaluated");
            outcome
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(gate, error = %message, "Gate raised an exception");
            T::exception(format!("{} gate failed internally: {}", gate, message))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Issue, IssueCode};

    #[derive(Debug)]
    struct Probe {
        pass: bool,
        error_type: Option<String>,
        failures: Vec<Issue>,
    }

    impl GateOutcome for Probe {
        fn passed(&self) -> bool {
            self.pass
        }

        fn exception(message: String) -> Self {
            Probe {
                pass: false,
                error_type: Some(ERROR_TYPE_EXCEPTION.to_string()),
                failures: vec![Issue::new(IssueCode::Exception, message)],
            }
        }
    }

    struct Exploding;

    impl Gate for Exploding {
        type Outcome = Probe;

        fn name(&self) -> &'static str {
            "exploding"
        }

        fn evaluate(&self, _input: &Value) -> Probe {
            panic!("boom")
        }
    }

    #[test]
    fn test_panic_becomes_exception_result() {
        let outcome = Exploding.check(&Value::Null);
        assert!(!outcome.pass);
        assert_eq!(outcome.error_type.as_deref(), Some("exception"));
        assert!(outcome.failures[0].message.contains("boom"));
    }

    #[test]
    fn test_guard_passes_through_normal_results() {
        let outcome = run_guarded("probe", || Probe {
            pass: true,
            error_type: None,
            failures: vec![],
        });
        assert!(outcome.pass);
        assert!(outcome.error_type.is_none());
    }
}
