use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use competition_cli::{render, replay, ReplayOptions, TextReportSink};
use tracing::info;

/// Rerun engine and ratio-limit maintenance for performance competitions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded scenario through the rerun loop
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Scenario JSON file
    #[arg(long)]
    scenario: PathBuf,

    /// Config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON limits file used as the annotation store (overrides limits_path)
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Hard cap on passes (overrides COMPETITION_MAX_RERUNS)
    #[arg(long)]
    max_reruns: Option<u32>,

    /// Widen limits from observed ratios and write them back
    #[arg(long, default_value_t = false)]
    update_annotations: bool,

    /// Print the full report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Replay(args) => {
            let options = ReplayOptions {
                scenario: args.scenario,
                config: args.config,
                limits: args.limits,
                max_reruns: args.max_reruns,
                update_annotations: args.update_annotations,
            };
            let report = replay(&options).await?;

            report.route_to(&TextReportSink::stderr());
            println!("{}", render(&report, args.json)?);
            info!(outcome = %report.outcome, passes = report.passes, "Replay finished");

            Ok(if report.outcome.is_failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
