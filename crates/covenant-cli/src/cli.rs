use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use covenant_core::BaselineKind;

#[derive(Parser, Debug)]
#[command(
    name = "covenant",
    version,
    about = "Data contract enforcement for generated research documents"
)]
pub struct Cli {
    /// Pipeline configuration (YAML or JSON); built-in defaults when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "baselines")]
    pub baselines: PathBuf,

    #[arg(long, global = true, default_value = "fixtures")]
    pub fixtures: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, coerce and quarantine a document
    Firewall(DocArgs),
    /// Run scorers and document gates over a document
    Gates(GatesArgs),
    /// Score raw research topics before synthesis
    Research(ResearchArgs),
    /// Manage gate-result baselines
    Baseline(BaselineArgs),
    /// Capture and compare structural baselines
    Structural(StructuralArgs),
    /// Gate and structural drift against one baseline name
    Check(CheckArgs),
    /// Replay one stored fixture
    Replay(ReplayArgs),
    /// Failure-class coverage across all fixtures
    Coverage,
}

#[derive(Args, Debug, Clone)]
pub struct DocArgs {
    pub doc: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct GatesArgs {
    pub doc: PathBuf,

    /// Industry term for relevance scoring; read from the document when omitted
    #[arg(long)]
    pub industry: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ResearchArgs {
    /// JSON object mapping topic name to gathered content
    pub topics: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BaselineArgs {
    #[command(subcommand)]
    pub action: BaselineAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BaselineAction {
    /// Freeze a gate-result payload under a name
    Create { name: String, results: PathBuf },
    /// Compare a gate-result payload against a baseline
    Compare { name: String, results: PathBuf },
    Delete {
        name: String,
        #[arg(long, value_enum, default_value_t = KindArg::Gates)]
        kind: KindArg,
    },
    List {
        #[arg(long, value_enum, default_value_t = KindArg::Gates)]
        kind: KindArg,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StructuralArgs {
    #[command(subcommand)]
    pub action: StructuralAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum StructuralAction {
    /// Capture a snapshot and store it as a baseline
    Capture(SnapshotArgs),
    /// Capture a snapshot and compare it against a baseline
    Compare(SnapshotArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    pub name: String,

    /// Template description (canvas, elements, fonts, colors, patterns)
    #[arg(long)]
    pub template: PathBuf,

    /// Document under test
    #[arg(long)]
    pub doc: PathBuf,

    /// Print the snapshot without storing it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    pub name: String,

    #[arg(long)]
    pub gates: PathBuf,

    #[arg(long)]
    pub template: PathBuf,

    #[arg(long)]
    pub doc: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    pub fixture: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Gates,
    Structural,
}

impl From<KindArg> for BaselineKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Gates => BaselineKind::Gates,
            KindArg::Structural => BaselineKind::Structural,
        }
    }
}
