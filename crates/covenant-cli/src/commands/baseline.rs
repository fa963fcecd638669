use anyhow::{Context, Result};
use covenant_core::{BaselineKind, BaselineManager, StructuralCapture};
use serde_json::json;
use tracing::info;

use super::{Status, Workspace};
use crate::cli::{BaselineAction, BaselineArgs, CheckArgs, SnapshotArgs, StructuralAction, StructuralArgs};
use crate::util::{print_json, read_json};

fn manager(ws: &Workspace) -> BaselineManager {
    BaselineManager::new(&ws.baselines, ws.config.drift.clone())
}

pub fn baseline(ws: &Workspace, args: BaselineArgs) -> Result<Status> {
    let manager = manager(ws);

    match args.action {
        BaselineAction::Create { name, results } => {
            let payload = read_json(&results)?;
            let path = manager
                .create_gate_baseline(&name, &payload)
                .with_context(|| format!("failed to create gate baseline '{}'", name))?;
            print_json(&json!({ "created": path.display().to_string() }))?;
            Ok(Status::Ok)
        }
        BaselineAction::Compare { name, results } => {
            let payload = read_json(&results)?;
            let report = manager.compare_gates(&name, &payload)?;
            print_json(&report)?;
            Ok(if report.new_failures.is_empty() {
                Status::Ok
            } else {
                Status::DriftFailed
            })
        }
        BaselineAction::Delete { name, kind } => {
            let kind = BaselineKind::from(kind);
            let deleted = manager.delete(kind, &name)?;
            print_json(&json!({ "name": name, "kind": kind, "deleted": deleted }))?;
            Ok(Status::Ok)
        }
        BaselineAction::List { kind } => {
            let kind = BaselineKind::from(kind);
            print_json(&json!({ "kind": kind, "names": manager.list(kind)? }))?;
            Ok(Status::Ok)
        }
    }
}

pub fn structural(ws: &Workspace, args: StructuralArgs) -> Result<Status> {
    let manager = manager(ws);

    match args.action {
        StructuralAction::Capture(snapshot_args) => {
            let snapshot = capture(ws, &snapshot_args)?;
            if snapshot_args.dry_run {
                print_json(&snapshot)?;
                return Ok(Status::Ok);
            }
            let path = manager
                .create_structural_baseline(&snapshot_args.name, &snapshot)
                .with_context(|| format!("failed to create structural baseline '{}'", snapshot_args.name))?;
            print_json(&json!({ "created": path.display().to_string() }))?;
            Ok(Status::Ok)
        }
        StructuralAction::Compare(snapshot_args) => {
            let snapshot = capture(ws, &snapshot_args)?;
            let report = manager.compare_structural(&snapshot_args.name, &snapshot)?;
            print_json(&report)?;
            Ok(report.verdict.into())
        }
    }
}

pub fn check(ws: &Workspace, args: CheckArgs) -> Result<Status> {
    let gate_results = read_json(&args.gates)?;
    let template = read_json(&args.template)?;
    let document = read_json(&args.doc)?;
    let snapshot = StructuralCapture::new(&ws.config).capture(&template, &document);

    let report = manager(ws).check(&args.name, &gate_results, &snapshot)?;
    info!(name = %args.name, verdict = %report.verdict, "baseline check finished");
    print_json(&report)?;
    Ok(report.verdict.into())
}

fn capture(ws: &Workspace, args: &SnapshotArgs) -> Result<covenant_core::StructuralSnapshot> {
    let template = read_json(&args.template)?;
    let document = read_json(&args.doc)?;
    Ok(StructuralCapture::new(&ws.config).capture(&template, &document))
}
