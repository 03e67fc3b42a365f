use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use config::{IngestConfig, load_config_from_file};
use db::DBService;
use ingest::{BatchSummary, IngestPipeline, PipelineSettings, read_records};
use logs_store::{CsvFailureLog, FailureLog, FailureLogEntry};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "shipment-ingest",
    about = "Load shipment event timestamps from a CSV batch into the orders database"
)]
struct Args {
    /// JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    /// Overrides `input_path`.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Overrides `failure_log_path`.
    #[arg(long)]
    failure_log: Option<PathBuf>,
    /// Overrides `concurrency`.
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Args {
    fn apply(&self, mut config: IngestConfig) -> IngestConfig {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(failure_log) = &self.failure_log {
            config.failure_log_path = failure_log.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config
    }

    fn load_config(&self) -> anyhow::Result<IngestConfig> {
        let config = load_config_from_file(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))?;
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,shipment_ingest={level},ingest={level},db={level},config={level},logs_store={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();
}

/// Reads the batch, connects and runs it. Any error here is fatal to the run.
async fn execute<L>(config: &IngestConfig, failure_log: Arc<L>) -> anyhow::Result<BatchSummary>
where
    L: FailureLog,
{
    let settings = PipelineSettings::from_config(config)?;
    let records = read_records(&config.input_path, &config.columns).with_context(|| {
        format!("Failed to read input from {}", config.input_path.display())
    })?;

    let database_url = config.database.connection_url()?;
    let db = DBService::connect_with_retry(
        &database_url,
        config.max_connections(),
        &config.connect_retry.policy(),
    )
    .await
    .context("Failed to connect to database")?;

    let pipeline = IngestPipeline::new(Arc::new(db), failure_log, settings);
    let summary = pipeline.run(records, config.concurrency).await?;
    if summary.connection_lost {
        anyhow::bail!("Database connection lost during run ({summary})");
    }
    Ok(summary)
}

async fn finish<L: FailureLog + ?Sized>(
    failure_log: &L,
    outcome: anyhow::Result<BatchSummary>,
) -> ExitCode {
    let (entry, code) = match outcome {
        Ok(summary) => {
            tracing::info!(%summary, "Ingestion completed");
            (
                FailureLogEntry::info("Ingestion completed", summary.to_string()),
                ExitCode::SUCCESS,
            )
        }
        Err(err) => {
            tracing::error!("Ingestion failed: {err:#}");
            (
                FailureLogEntry::error(None, "Ingestion failed", format!("{err:#}")),
                ExitCode::FAILURE,
            )
        }
    };

    if let Err(err) = failure_log.log(entry).await {
        tracing::error!(error = %err, "Failed to write final failure log entry");
        return ExitCode::FAILURE;
    }
    code
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let failure_log = match CsvFailureLog::open(&config.failure_log_path) {
        Ok(log) => Arc::new(log),
        Err(err) => {
            tracing::error!(
                path = %config.failure_log_path.display(),
                error = %err,
                "Failed to open failure log"
            );
            return ExitCode::FAILURE;
        }
    };

    let outcome = execute(&config, failure_log.clone()).await;
    finish(failure_log.as_ref(), outcome).await
}
