//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{resolve_connection, RunConfig};
use crate::error::{Error, Result, ResultExt};
use crate::input::OperationReader;
use crate::store::{StoreConnection, TableStore};
use crate::types::RowOperation;
use crate::uploader::{BatchUploader, UploadStats};
use serde::Serialize;
use serde_json::json;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Upload { destination, input } => {
                self.upload(destination, input.as_deref()).await
            }
            Commands::Run { config } => self.run_config(config).await,
            Commands::Inspect { destination, limit } => self.inspect(destination, *limit).await,
        }
    }

    /// Open the store named by `--connection` (or the fallbacks)
    fn open_store(&self, configured: Option<&str>) -> Result<Arc<dyn TableStore>> {
        self.connection(configured)?.open()
    }

    fn connection(&self, configured: Option<&str>) -> Result<StoreConnection> {
        StoreConnection::parse(&resolve_connection(
            self.cli.connection.as_deref(),
            configured,
        )?)
    }

    async fn upload(&self, destination: &str, input: Option<&Path>) -> Result<()> {
        let store = self.open_store(None)?;

        let stats = match input {
            Some(path) => {
                upload_operations(store, destination, OperationReader::open(path)?).await?
            }
            None => {
                let reader = OperationReader::new(BufReader::new(std::io::stdin()));
                upload_operations(store, destination, reader).await?
            }
        };

        println!(
            "{}",
            serde_json::to_string(&json!({ "destination": destination, "stats": stats }))?
        );
        Ok(())
    }

    async fn run_config(&self, path: &Path) -> Result<()> {
        let config = RunConfig::load(path)
            .with_context(|| format!("Failed to load run config {}", path.display()))?;
        let store = self.open_store(config.connection.as_deref())?;

        let report = run_destinations(store, &config).await;
        println!("{}", serde_json::to_string(&report)?);

        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} of {} destinations failed",
                report.failed.len(),
                config.destinations.len()
            )))
        }
    }

    async fn inspect(&self, destination: &str, limit: Option<usize>) -> Result<()> {
        let connection = self.connection(None)?;
        if matches!(
            connection,
            StoreConnection::Memory | StoreConnection::DuckDbMemory
        ) {
            return Err(Error::config(
                "inspect needs a persistent store; in-memory stores start empty",
            ));
        }
        let store = connection.open()?;
        let rows = store.read_rows(destination).await?;

        for row in rows.iter().take(limit.unwrap_or(usize::MAX)) {
            println!("{}", serde_json::to_string(row)?);
        }
        Ok(())
    }
}

// ============================================================================
// Uploads
// ============================================================================

/// Outcome of one destination in a run
#[derive(Debug, Clone, Serialize)]
pub struct DestinationReport {
    pub destination: String,
    #[serde(flatten)]
    pub stats: UploadStats,
}

/// A destination that failed, with the error that stopped it
#[derive(Debug, Clone, Serialize)]
pub struct DestinationFailure {
    pub destination: String,
    pub error: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub succeeded: Vec<DestinationReport>,
    pub failed: Vec<DestinationFailure>,
}

/// Upload a stream of operations to one destination and drain it
///
/// Lines that fail to parse are logged and skipped; any other error stops the
/// upload.
pub async fn upload_operations<I>(
    store: Arc<dyn TableStore>,
    destination: &str,
    operations: I,
) -> Result<UploadStats>
where
    I: IntoIterator<Item = Result<RowOperation>>,
{
    let started = Instant::now();
    info!("Uploading operations to {}", destination);

    let uploader = BatchUploader::new(store, destination).await?;
    let mut skipped = 0usize;

    for op in operations {
        match op {
            Ok(op) => uploader.enqueue(op).await?,
            Err(e @ Error::InvalidInput { .. }) => {
                skipped += 1;
                error!(destination = %destination, "Skipping operation for {}: {}", destination, e);
            }
            Err(e) => return Err(e),
        }
    }

    let stats = uploader.close().await?;
    if skipped > 0 {
        warn!(
            destination = %destination,
            skipped,
            "Skipped {} unreadable operations for {}",
            skipped,
            destination
        );
    }
    info!(
        "Destination {} complete in {:?}",
        destination,
        started.elapsed()
    );
    Ok(stats)
}

/// Upload every configured destination; one failing does not stop the others
pub async fn run_destinations(store: Arc<dyn TableStore>, config: &RunConfig) -> RunReport {
    let mut report = RunReport::default();

    for destination in &config.destinations {
        let result = match OperationReader::open(&destination.input) {
            Ok(reader) => upload_operations(store.clone(), &destination.name, reader).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(stats) => report.succeeded.push(DestinationReport {
                destination: destination.name.clone(),
                stats,
            }),
            Err(e) => {
                error!(
                    destination = %destination.name,
                    "Failed to upload destination {}: {}",
                    destination.name,
                    e
                );
                report.failed.push(DestinationFailure {
                    destination: destination.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DestinationConfig;
    use crate::store::MemoryTableStore;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn line(row_key: &str) -> String {
        format!(r#"{{"partition_key": "Effectiveness", "row_key": "{row_key}", "fields": {{"Clean": 1}}}}"#)
    }

    #[tokio::test]
    async fn test_upload_operations_skips_bad_lines() {
        let store = Arc::new(MemoryTableStore::new());
        let input = [line("a"), "not json".to_string(), line("b")].join("\n");
        let reader = OperationReader::new(std::io::Cursor::new(input));

        let stats = upload_operations(store.clone(), "Effectiveness", reader)
            .await
            .unwrap();
        assert_eq!(stats.rows_submitted, 2);
        assert_eq!(store.read_rows("Effectiveness").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_destinations_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.jsonl");
        fs::write(&good, [line("a"), line("b"), line("c")].join("\n")).unwrap();

        let config = RunConfig {
            connection: None,
            destinations: vec![
                DestinationConfig {
                    name: "Missing".to_string(),
                    input: dir.path().join("missing.jsonl"),
                },
                DestinationConfig {
                    name: "Effectiveness".to_string(),
                    input: good,
                },
            ],
        };

        let store = Arc::new(MemoryTableStore::new());
        let report = run_destinations(store.clone(), &config).await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].destination, "Missing");
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.succeeded[0].stats.rows_submitted, 3);
        assert_eq!(store.read_rows("Effectiveness").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_inspect_rejects_in_memory_stores() {
        for connection in ["memory://", "duckdb://:memory:"] {
            let cli = Cli::try_parse_from([
                "table-batcher",
                "--connection",
                connection,
                "inspect",
                "--destination",
                "Effectiveness",
            ])
            .unwrap();

            let err = Runner::new(cli).run().await.unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "{connection}: {err}");
        }
    }

    #[tokio::test]
    async fn test_inspect_reads_duckdb_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hunt.duckdb");
        {
            let store = crate::store::DuckDbTableStore::open(&path).unwrap();
            store.create_table_if_not_exists("Effectiveness").await.unwrap();
        }

        let connection = format!("duckdb://{}", path.display());
        let cli = Cli::try_parse_from([
            "table-batcher",
            "--connection",
            connection.as_str(),
            "inspect",
            "--destination",
            "Effectiveness",
        ])
        .unwrap();
        Runner::new(cli).run().await.unwrap();
    }
}
