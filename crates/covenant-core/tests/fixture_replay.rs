use std::path::PathBuf;

use covenant_core::{CoverageReporter, FixtureLoader, PipelineConfig, Replayer};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"))
}

#[test]
fn shipped_fixtures_meet_their_expectations() {
    let config = PipelineConfig::default();
    let loader = FixtureLoader::new(fixtures_dir(), &config);
    let replayer = Replayer::new(config.clone());

    let names = loader.list().unwrap();
    assert!(names.len() >= 8, "expected the shipped fixture set, found {:?}", names);

    for name in names {
        let fixture = loader.load(&name).unwrap();
        let result = replayer.replay(&fixture);
        assert!(
            result.as_expected(),
            "fixture '{}' missed expectations: {:?}",
            name,
            result.expectations_met
        );
    }
}

#[test]
fn complete_fixture_passes_every_gate() {
    let config = PipelineConfig::default();
    let loader = FixtureLoader::new(fixtures_dir(), &config);
    let fixture = loader.load("complete-multi").unwrap();

    let result = Replayer::new(config).replay(&fixture);
    assert!(result.schema.valid);
    assert!(result.synthesis.pass);
    assert!(result.ppt_data.pass);
}

#[test]
fn stress_fixture_is_expanded_on_load() {
    let config = PipelineConfig::default();
    let loader = FixtureLoader::new(fixtures_dir(), &config);
    let fixture = loader.load("stress-large").unwrap();

    let text = serde_json::to_string(&fixture.document).unwrap();
    assert!(!text.contains("{{FILLER:"));
    assert!(!text.contains("{{TABLE:"));
}

#[test]
fn coverage_over_shipped_fixtures() {
    let config = PipelineConfig::default();
    let loader = FixtureLoader::new(fixtures_dir(), &config);
    let replayer = Replayer::new(config);

    let report = CoverageReporter::new(&loader, &replayer).report().unwrap();
    assert!(report.load_errors.is_empty(), "{:?}", report.load_errors);
    assert_eq!(report.fixtures_replayed, loader.list().unwrap().len());
    assert_eq!(report.exercised.len() + report.unexercised.len(), report.class_counts.len());

    for class in ["missing-section", "wrong-type", "empty-data", "deep-nesting", "overflow-risk"] {
        assert!(report.exercised.iter().any(|c| c == class), "class '{}' not exercised", class);
    }
}
