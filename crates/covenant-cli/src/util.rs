use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use covenant_core::PipelineConfig;
use serde::Serialize;
use serde_json::Value;

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Pretty JSON on stdout; logs stay on stderr.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value).context("failed to serialize report")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data).context("failed to write report")?;
    stdout.write_all(b"\n").context("failed to write report")?;
    Ok(())
}
