//! verbump - keeps tracked software versions in sync with upstream releases
//!
//! Reads a configuration of repositories and tracked software, compares the
//! version recorded in each repository file with the latest upstream release
//! and opens a pull request when they differ.

use anyhow::Context;
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing::info;
use verbump::cli::CliArgs;
use verbump::config::Config;
use verbump::logging::init_tracing;
use verbump::orchestrator::Orchestrator;
use verbump::output::{create_formatter, OutputConfig};

/// Exit code when at least one entry failed
const EXIT_ENTRY_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(&args.config)?;

    if args.dry_run {
        config.settings.dry_run = true;
    }
    if let Some(concurrency) = args.concurrency {
        config.settings.concurrency = usize::try_from(concurrency)
            .context("--concurrency is out of range")?;
    }
    if let Some(name) = &args.software {
        config = config.select(name)?;
    }

    let token = config
        .settings
        .resolve_token(|var| std::env::var(var).ok())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        dry_run = config.settings.dry_run,
        entries = config.entry_count(),
        "starting run"
    );

    let orchestrator =
        Orchestrator::from_settings(&config.settings, &token)?.with_progress(args.show_progress());
    let summary = orchestrator.run_reconciliation(&config).await?;

    let mut output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    output_config.color = io::stdout().is_terminal();
    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    formatter.format(&summary, &mut stdout)?;
    stdout.flush()?;

    if summary.has_failures() {
        Ok(ExitCode::from(EXIT_ENTRY_FAILED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
