mod cli;
mod commands;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{Status, Workspace};

fn main() {
    init_tracing();

    match run() {
        Ok(Status::Ok) => {}
        Ok(Status::DriftFailed) => std::process::exit(2),
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<Status> {
    let cli = Cli::parse();
    let ws = Workspace::from_cli(&cli)?;

    match cli.command {
        Commands::Firewall(args) => commands::document::firewall(&ws, args),
        Commands::Gates(args) => commands::document::gates(&ws, args),
        Commands::Research(args) => commands::document::research(&ws, args),
        Commands::Baseline(args) => commands::baseline::baseline(&ws, args),
        Commands::Structural(args) => commands::baseline::structural(&ws, args),
        Commands::Check(args) => commands::baseline::check(&ws, args),
        Commands::Replay(args) => commands::fixtures::replay(&ws, args),
        Commands::Coverage => commands::fixtures::coverage(&ws),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
