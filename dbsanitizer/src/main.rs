//! Database sanitization tool.
//!
//! Loads the sanitizer configuration, connects to the target database and
//! runs the sanitize and truncate passes after an explicit confirmation.
//!
//! # Security Guarantees
//! - No credentials stored or logged
//! - Nothing is modified before the operator confirms (or passes `--yes`)
//! - Foreign key checks are restored before the process exits normally

mod cli;
mod progress;
mod prompt;

use anyhow::{Context, bail};
use clap::Parser;
use cli::Cli;
use dbsanitizer_core::{
    Confirmation, FixedAnswer, Orchestrator, RunOutcome, RunReport, SanitizerConfig,
    adapters::create_adapter, engine::PlannedAction, error::redact_database_url,
    logging::init_logging,
};
use progress::BarProgress;
use prompt::PromptConfirmation;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    if !cli.info {
        warn!("To see which tables will be sanitized before changing anything, run with --info");
    }

    let file = SanitizerConfig::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let (registry, base) = file.into_parts()?;
    let run_config = cli.apply(base);

    let Some(database_url) = cli.database_url.as_deref() else {
        bail!("A database URL is required (--database-url or DATABASE_URL)");
    };

    info!("Target: {}", redact_database_url(database_url));
    let store = create_adapter(database_url).await.map_err(|e| {
        error!("Failed to create database adapter: {}", e);
        e
    })?;
    store.test_connection().await.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;
    info!("Connected to {} database", store.database_type());

    let mut confirmation: Box<dyn Confirmation> = if cli.yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(PromptConfirmation::stdio())
    };
    let mut progress = BarProgress::new(cli.global.quiet);

    let mut orchestrator = Orchestrator::new(store.as_ref(), &registry, run_config);
    let report = orchestrator
        .run(confirmation.as_mut(), &mut progress)
        .await?;

    print_report(&report, cli.global.quiet);
    Ok(())
}

fn print_report(report: &RunReport, quiet: bool) {
    if quiet {
        return;
    }

    if report.outcome == RunOutcome::InfoReport {
        println!("Target: {}", report.endpoint);
        for (action, heading) in [
            (PlannedAction::Sanitize, "Tables to sanitize:"),
            (PlannedAction::Truncate, "Tables to truncate:"),
        ] {
            println!("{}", heading);
            for table in report.planned.iter().filter(|t| t.action == action) {
                println!("  - {} ({} rows)", table.table_name, table.row_count);
            }
        }
    }

    for issue in report.skipped.iter().chain(&report.failed) {
        println!("  ! {}: {}", issue.reference, issue.reason);
    }

    println!("{}", report.summary());
}
