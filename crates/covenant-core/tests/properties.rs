use covenant_core::firewall::{Coercer, Validator};
use covenant_core::gates::patterns;
use covenant_core::{BaselineManager, Firewall, PipelineConfig};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
        "[a-z]{1,6}\n\n[a-z]{1,6}".prop_map(Value::from),
        Just(json!("[Insert market size here]")),
    ]
}

fn nested_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "players",
        "keyInsights",
        "foundationalActs",
        "acts",
        "companies",
        "title",
        "headline",
        "evidence",
        "narrative",
        "chartData",
        "values",
        "overview",
        "_note",
        "extra",
    ])
    .prop_map(String::from)
}

fn root_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "policy",
        "market",
        "competitors",
        "depth",
        "summary",
        "executiveSummary",
        "keyInsights",
        "nextSteps",
        "implementation",
        "country",
        "industry",
        "isSingleCompany",
        "_trace",
        "appendix",
        "notes",
    ])
    .prop_map(String::from)
}

fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(nested_key(), inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(root_key(), json_value(), 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>()))
}

fn gate_results() -> impl Strategy<Value = Value> {
    let gate = (
        any::<bool>(),
        (0u32..=200).prop_map(|n| f64::from(n) / 2.0),
        prop::collection::vec("[a-z ]{1,16}", 0..4),
    )
        .prop_map(|(pass, score, failures)| json!({ "pass": pass, "overall": score, "failures": failures }));
    prop::collection::btree_map(
        prop::sample::select(vec!["research", "synthesis", "pptData"]).prop_map(String::from),
        gate,
        1..4,
    )
    .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>()))
}

/// Every non-null scalar under `value`.
fn leaves(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Null => {}
        Value::Array(items) => items.iter().for_each(|v| leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| leaves(v, out)),
        scalar => out.push(scalar.clone()),
    }
}

proptest! {
    #[test]
    fn validate_returns_a_result_for_any_input(document in prop_oneof![document(), json_value()]) {
        let config = PipelineConfig::default();
        let result = Validator::new(&config).validate(&document);
        prop_assert_eq!(result.valid, result.blocking_errors().next().is_none());
        if !document.is_object() {
            prop_assert!(!result.valid);
        }
    }

    #[test]
    fn coercion_is_idempotent(document in document()) {
        let config = PipelineConfig::default();
        let coercer = Coercer::new(&config);
        let once = coercer.coerce(&document);
        let twice = coercer.coerce(&once.document);
        prop_assert_eq!(twice.document, once.document);
        prop_assert!(twice.displaced.is_empty());
    }

    #[test]
    fn firewall_output_is_a_fixed_point(document in document()) {
        let firewall = Firewall::new(PipelineConfig::default());
        let first = firewall.run(&document);
        let second = firewall.run(&first.canonical);
        prop_assert_eq!(&second.canonical, &first.canonical);
        prop_assert!(second.quarantine.is_empty());
    }

    #[test]
    fn root_keys_are_kept_or_quarantined(document in document()) {
        let firewall = Firewall::new(PipelineConfig::default());
        let outcome = firewall.run(&document);
        let canonical = outcome.canonical.as_object().cloned().unwrap_or_default();

        for key in document.as_object().into_iter().flat_map(|m| m.keys()) {
            prop_assert!(
                canonical.contains_key(key) || outcome.quarantine.contains(key),
                "root key '{}' was lost",
                key
            );
        }
    }
}

proptest! {
    #[test]
    fn every_leaf_lands_in_canonical_or_quarantine(document in document()) {
        let outcome = Firewall::new(PipelineConfig::default()).run(&document);

        let mut kept = Vec::new();
        leaves(&outcome.canonical, &mut kept);
        for (_, entry) in outcome.quarantine.entries() {
            leaves(&entry.value, &mut kept);
        }

        let mut source = Vec::new();
        leaves(&document, &mut source);
        for leaf in source {
            if kept.contains(&leaf) {
                continue;
            }
            // A narrative string survives as its paragraphs.
            let text = leaf.as_str();
            prop_assert!(text.is_some(), "leaf {} was lost", leaf);
            let paragraphs = patterns::split_paragraphs(text.unwrap_or_default());
            prop_assert!(
                paragraphs.iter().all(|p| kept.contains(&Value::String(p.clone()))),
                "string leaf {:?} was lost",
                leaf
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fresh_gate_baseline_shows_no_drift(results in gate_results()) {
        let dir = tempfile::tempdir().unwrap();
        let manager = BaselineManager::new(dir.path(), PipelineConfig::default().drift);
        manager.create_gate_baseline("prop-run", &results).unwrap();

        let report = manager.compare_gates("prop-run", &results).unwrap();
        prop_assert!(report.baseline_found);
        prop_assert!(!report.has_drift);
        prop_assert_eq!(report.total_drift_items, 0);
    }
}
