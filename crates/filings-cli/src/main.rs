//! Filings CLI binary.
//!
//! Reconciles the quarterly and annual records of one or more entities and
//! writes each result to `{ENTITY}_{N}_final_result.csv`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use filings::{
    DedupPolicy, EdgarRepository, EntityId, FilingError, ReconcileOptions, Reconciler, Result,
    Settings, export,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rows of each result logged before it is written.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "filings")]
#[command(about = "Gap-free quarterly and annual filing records from SEC EDGAR", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of most recent quarters to cover
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    number: u64,

    /// Ticker or CIK to process; repeat for several
    #[arg(long = "entity", default_value = "AAPL")]
    entities: Vec<EntityId>,

    /// Directory result files are written to (overrides BASE_PATH)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Drop records repeated across retrieval rounds
    #[arg(long)]
    dedup: bool,

    /// Supplemental retrievals in flight at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Deadline in seconds for each retrieval
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Log request-level detail
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn lookback(&self) -> Result<usize> {
        usize::try_from(self.number)
            .map_err(|_| FilingError::InvalidParameter(format!("lookback {} too large", self.number)))
    }

    fn options(&self) -> ReconcileOptions {
        ReconcileOptions::default()
            .with_max_concurrency(self.concurrency)
            .with_fetch_timeout(Duration::from_secs(self.timeout_secs))
            .with_dedup(if self.dedup {
                DedupPolicy::ByPeriod
            } else {
                DedupPolicy::Preserve
            })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let lookback = cli.lookback()?;
    let mut settings = Settings::from_env()?;
    if let Some(dir) = &cli.output_dir {
        settings = settings.with_output_dir(dir);
    }

    let repository = EdgarRepository::new(settings.edgar_config())?;
    let reconciler = Reconciler::with_options(repository, cli.options());

    for entity in &cli.entities {
        info!(entity = %entity, lookback, "Processing");
        let outcome = reconciler.reconcile(entity, lookback).await?;

        if !outcome.issues.is_empty() || !outcome.deficits.is_empty() {
            warn!(
                entity = %entity,
                issues = outcome.issues.len(),
                short_years = outcome.deficits.len(),
                "Result may be incomplete"
            );
        }

        let head = export::preview(&outcome.records, PREVIEW_ROWS)?;
        info!(entity = %entity, state = ?outcome.state, "Result preview\n{head}");

        let path = export::output_path(&settings.output_dir, entity, lookback);
        export::write_csv(&outcome.records, &path)?;
    }

    Ok(())
}
