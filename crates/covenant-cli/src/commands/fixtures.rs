use anyhow::{Context, Result};
use covenant_core::{CoverageReporter, FixtureLoader, Replayer};
use tracing::{info, warn};

use super::{Status, Workspace};
use crate::cli::ReplayArgs;
use crate::util::print_json;

pub fn replay(ws: &Workspace, args: ReplayArgs) -> Result<Status> {
    let loader = FixtureLoader::new(&ws.fixtures, &ws.config);
    let fixture = loader
        .load(&args.fixture)
        .with_context(|| format!("failed to load fixture '{}'", args.fixture))?;

    let result = Replayer::new(ws.config.clone()).replay(&fixture);
    if !result.as_expected() {
        warn!(fixture = %fixture.name, "fixture did not meet its expectations");
    }
    print_json(&result)?;
    Ok(Status::Ok)
}

pub fn coverage(ws: &Workspace) -> Result<Status> {
    let loader = FixtureLoader::new(&ws.fixtures, &ws.config);
    let replayer = Replayer::new(ws.config.clone());
    let report = CoverageReporter::new(&loader, &replayer)
        .report()
        .with_context(|| format!("failed to build coverage for {}", ws.fixtures.display()))?;

    info!(
        replayed = report.fixtures_replayed,
        unexercised = report.unexercised.len(),
        "coverage computed"
    );
    print_json(&report)?;
    Ok(Status::Ok)
}
