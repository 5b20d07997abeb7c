//! Photolift - move photo assets from the legacy store to the target store.
//!
//! Usage:
//!   photolift --dry              preview, no writes
//!   photolift --run              migrate and rewrite references
//!   photolift --run --verbose    also log every migrated file

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use photolift_core::{MigrationConfig, Mode, Orchestrator, RunOptions, RunSummary};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "photolift")]
#[command(about = "Migrate photos from Firebase Storage to Cloudflare R2")]
#[command(group(ArgGroup::new("mode").required(true).args(["dry", "run"])))]
struct Args {
    /// Preview: classify and download, but upload and write nothing
    #[arg(long)]
    dry: bool,

    /// Execute: upload to the target store and rewrite references
    #[arg(long)]
    run: bool,

    /// Log every migrated file as it happens
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Records processed at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.dry {
            Mode::DryRun
        } else {
            Mode::Execute
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let help = matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            let _ = err.print();
            return if help {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }
    };

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match run(&args).await {
        Ok(summary) => {
            print_summary(&summary, args.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: &Args) -> Result<RunSummary> {
    let config = MigrationConfig::from_env()?;

    let options = RunOptions::new(args.mode())
        .with_verbose(args.verbose)
        .with_concurrency(args.concurrency as usize);
    info!(
        "Mode: {}, concurrency: {}, target: {}",
        options.mode, options.concurrency, config.target.public_base
    );

    let orchestrator = Orchestrator::from_config(&config, options)?;
    let summary = orchestrator.run().await?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary, json: bool) {
    // The summary is the tool's output, so it goes to stdout rather than the log
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to render summary: {}", e),
        }
        return;
    }
    println!("\n=== Migration Summary ===");
    print!("{}", summary);
    println!("Done.");
}
