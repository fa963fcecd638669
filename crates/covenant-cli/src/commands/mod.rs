pub mod baseline;
pub mod document;
pub mod fixtures;

use std::path::PathBuf;

use anyhow::Result;
use covenant_core::{PipelineConfig, Verdict};

use crate::cli::Cli;
use crate::util::load_config;

/// Shared state resolved from the global flags.
pub struct Workspace {
    pub config: PipelineConfig,
    pub baselines: PathBuf,
    pub fixtures: PathBuf,
}

impl Workspace {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            config: load_config(cli.config.as_deref())?,
            baselines: cli.baselines.clone(),
            fixtures: cli.fixtures.clone(),
        })
    }
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// A drift verdict was FAIL
    DriftFailed,
}

impl From<Verdict> for Status {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Fail => Status::DriftFailed,
            Verdict::Warn | Verdict::Pass => Status::Ok,
        }
    }
}
