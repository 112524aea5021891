//! Connection descriptors
//!
//! Turns a connection string into an open [`TableStore`].

use super::duckdb_store::DuckDbTableStore;
use super::memory::MemoryTableStore;
use super::types::TableStore;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable consulted when no connection is configured
pub const CONNECTION_ENV_VAR: &str = "TABLE_STORE_CONNECTION";

/// A parsed store connection descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConnection {
    /// In-process store, lost when the process exits
    Memory,
    /// DuckDB database held in memory
    DuckDbMemory,
    /// DuckDB database file
    DuckDbFile(PathBuf),
}

impl StoreConnection {
    /// Parse a connection descriptor
    ///
    /// Supported formats:
    /// - `memory://` - in-process store
    /// - `duckdb://:memory:` - in-memory DuckDB
    /// - `duckdb://path/to/file.duckdb` - DuckDB file
    /// - `path/to/file.duckdb` or `path/to/file.db` - DuckDB file
    pub fn parse(descriptor: &str) -> Result<Self> {
        let descriptor = descriptor.trim();

        if descriptor == "memory://" {
            return Ok(Self::Memory);
        }

        if let Some(location) = descriptor.strip_prefix("duckdb://") {
            return match location {
                "" => Err(Error::config(format!(
                    "DuckDB connection has no database path: {descriptor}"
                ))),
                ":memory:" => Ok(Self::DuckDbMemory),
                path => Ok(Self::DuckDbFile(PathBuf::from(path))),
            };
        }

        if !descriptor.contains("://")
            && (descriptor.ends_with(".duckdb") || descriptor.ends_with(".db"))
        {
            return Ok(Self::DuckDbFile(PathBuf::from(descriptor)));
        }

        Err(Error::config(format!(
            "Unsupported store connection: {descriptor}"
        )))
    }

    /// Open the store this descriptor names
    pub fn open(&self) -> Result<Arc<dyn TableStore>> {
        let store: Arc<dyn TableStore> = match self {
            Self::Memory => Arc::new(MemoryTableStore::new()),
            Self::DuckDbMemory => Arc::new(DuckDbTableStore::open_in_memory()?),
            Self::DuckDbFile(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        Error::config(format!(
                            "Failed to create directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                Arc::new(DuckDbTableStore::open(path)?)
            }
        };
        Ok(store)
    }
}

/// Parse a descriptor and open the store in one step
pub fn open_store(descriptor: &str) -> Result<Arc<dyn TableStore>> {
    let connection = StoreConnection::parse(descriptor)?;
    tracing::debug!("Opening table store {:?}", connection);
    connection.open()
}
