use anyhow::Result;
use covenant_core::{enforce, Firewall, Gate, ResearchGate};
use tracing::info;

use super::{Status, Workspace};
use crate::cli::{DocArgs, GatesArgs, ResearchArgs};
use crate::util::{print_json, read_json};

pub fn firewall(ws: &Workspace, args: DocArgs) -> Result<Status> {
    let document = read_json(&args.doc)?;
    info!(doc = %args.doc.display(), "firewall requested");

    let outcome = Firewall::new(ws.config.clone()).run(&document);
    print_json(&outcome)?;
    Ok(Status::Ok)
}

pub fn gates(ws: &Workspace, args: GatesArgs) -> Result<Status> {
    let document = read_json(&args.doc)?;
    info!(doc = %args.doc.display(), industry = ?args.industry, "gates requested");

    let report = enforce(&ws.config, &document, args.industry.as_deref());
    print_json(&report)?;
    Ok(Status::Ok)
}

pub fn research(ws: &Workspace, args: ResearchArgs) -> Result<Status> {
    let topics = read_json(&args.topics)?;
    let result = ResearchGate::new(&ws.config.gates).check(&topics);

    info!(score = result.score, pass = result.pass, "research gate evaluated");
    print_json(&result)?;
    Ok(Status::Ok)
}
