//! Food Facts Import - load the Open Food Facts export into the product store

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use foodfacts_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::{error, info, warn};

use foodfacts_server::{
    config::DatabaseConfig,
    ingest::{ImportConfig, ImportPipeline, ImportReport},
    store::{MemoryProductStore, PgProductStore, ProductStore},
};

#[derive(Parser, Debug)]
#[command(name = "foodfacts-import")]
#[command(author, version, about = "Import the Open Food Facts product export")]
struct Cli {
    /// Export to download (gzip-compressed TSV)
    #[arg(long, env = "IMPORT_SOURCE_URL")]
    source_url: Option<String>,

    /// Records per upsert
    #[arg(long, env = "IMPORT_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory for the staged download
    #[arg(long, env = "IMPORT_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Parse and batch everything but write to memory only
    #[arg(long)]
    dry_run: bool,

    /// Write the import report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit non-zero when any batch failed to write
    #[arg(long)]
    fail_on_batch_error: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn import_config(&self) -> Result<ImportConfig> {
        let mut config = ImportConfig::from_env()?;
        if let Some(ref url) = self.source_url {
            config.source_url = url.clone();
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(ref dir) = self.download_dir {
            config.download_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }

    fn database_config(&self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::from_env()?;
        if let Some(ref url) = self.database_url {
            config.url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over these defaults
    let log_config = match LogConfig::builder()
        .level(log_level)
        .log_file_prefix("foodfacts-import")
        .filter_directives("sqlx=warn")
        .build()
        .merge_env()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run(&cli).await {
        Ok(report) if report.has_failures() && cli.fail_on_batch_error => {
            error!(
                failed_batches = report.failed_batches.len(),
                "Import finished with failed batches"
            );
            ExitCode::FAILURE
        },
        Ok(_) => {
            info!("Import complete");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!(error = %format!("{e:#}"), "Import failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: &Cli) -> Result<ImportReport> {
    let import_config = cli.import_config()?;

    let store: Arc<dyn ProductStore> = if cli.dry_run {
        info!("Dry run: records are kept in memory only");
        Arc::new(MemoryProductStore::new())
    } else {
        let db_config = cli.database_config()?;
        let store = PgProductStore::connect(&db_config)
            .await
            .context("Failed to connect to the product store")?;
        Arc::new(store)
    };

    info!(
        source_url = %import_config.source_url,
        batch_size = import_config.batch_size,
        "Starting import"
    );

    let result = match ImportPipeline::new(import_config, store.clone()) {
        Ok(pipeline) => pipeline.run().await,
        Err(e) => Err(e),
    };
    store.close().await;

    let report = result.context("Import aborted")?;
    report.log_summary();

    if let Some(ref path) = cli.report {
        match report.write_to(path) {
            Ok(()) => info!(path = %path.display(), "Report written"),
            Err(e) => warn!(path = %path.display(), error = %e, "Could not write report"),
        }
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flag_is_required() {
        let cli = Cli::try_parse_from(["foodfacts-import"]).unwrap();
        assert!(!cli.dry_run);
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "foodfacts-import",
            "--source-url",
            "http://localhost:9000/export.csv.gz",
            "--batch-size",
            "500",
            "--dry-run",
            "--report",
            "report.json",
            "--fail-on-batch-error",
        ])
        .unwrap();

        assert_eq!(cli.source_url.as_deref(), Some("http://localhost:9000/export.csv.gz"));
        assert_eq!(cli.batch_size, Some(500));
        assert!(cli.dry_run && cli.fail_on_batch_error);
        assert_eq!(cli.report, Some(PathBuf::from("report.json")));

        let config = cli.import_config().unwrap();
        assert_eq!(config.batch_size, 500);
    }
}
