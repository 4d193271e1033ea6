use crate::assess::{run_analyze, run_classify, run_score, AnalyzeArgs, ClassifyArgs, ScoreArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crs_advisor::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "CRS Advisor",
    about = "Estimate Comprehensive Ranking System scores and list what is still missing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a stored profile file, optionally under what-if overrides
    Score(ScoreArgs),
    /// Show the requirement gap report for a stored profile file
    Analyze(AnalyzeArgs),
    /// Classify a CRS total into its band
    Classify(ClassifyArgs),
    /// Walk through sample applicants end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file of users to preload, keyed by user id; each entry holds
    /// `manual`, `blobs` and `documents`
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Analyze(args) => run_analyze(args),
        Command::Classify(args) => run_classify(args),
        Command::Demo(args) => run_demo(args),
    }
}
