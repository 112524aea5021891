//! DuckDB-backed table store
//!
//! Each table keeps one row per identity with the column values stored as a
//! JSON document. A batch runs inside a DuckDB transaction and is rolled back
//! when any operation fails.

use super::types::{check_transaction, validate_table_name, TableStore};
use crate::error::{Error, Result};
use crate::types::{FieldMap, RowOperation, UpsertMode};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Table store persisted in a DuckDB database
pub struct DuckDbTableStore {
    /// DuckDB connection
    conn: Mutex<Connection>,
    /// Database location (for logging)
    location: String,
}

impl DuckDbTableStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::store(format!(
                "Failed to open DuckDB database {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
        })
    }

    /// Database location
    pub fn location(&self) -> &str {
        &self.location
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::store("DuckDB connection lock poisoned"))
    }

    fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
        if Self::table_exists(conn, table)? {
            Ok(())
        } else {
            Err(Error::TableNotFound {
                table: table.to_string(),
            })
        }
    }
}

#[async_trait]
impl TableStore for DuckDbTableStore {
    fn name(&self) -> &str {
        "duckdb"
    }

    async fn create_table_if_not_exists(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        let conn = self.lock()?;

        // Table names are validated as plain alphanumerics, so quoting is enough
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                partition_key VARCHAR NOT NULL,
                row_key VARCHAR NOT NULL,
                fields VARCHAR NOT NULL,
                PRIMARY KEY (partition_key, row_key)
            );"
        ))
        .map_err(|e| Error::store(format!("Failed to create table {table}: {e}")))?;

        tracing::debug!("Ensured table {} exists in {}", table, self.location);
        Ok(())
    }

    async fn submit_transaction(&self, table: &str, operations: &[RowOperation]) -> Result<()> {
        check_transaction(operations)?;

        let mut conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO \"{table}\" (partition_key, row_key, fields) VALUES (?, ?, ?)"
            ))?;

            for (index, op) in operations.iter().enumerate() {
                let fields = serde_json::to_string(&op.fields)
                    .map_err(|e| Error::rejected(index, format!("Unencodable fields: {e}")))?;
                match op.mode {
                    UpsertMode::Replace => {
                        stmt.execute(params![op.partition_key, op.row_key, fields])
                            .map_err(|e| Error::rejected(index, e.to_string()))?;
                    }
                }
            }
        }
        tx.commit()
            .map_err(|e| Error::store(format!("Failed to commit transaction: {e}")))?;

        Ok(())
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<RowOperation>> {
        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT partition_key, row_key, fields FROM \"{table}\" ORDER BY partition_key, row_key"
        ))?;

        let raw: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;

        raw.into_iter()
            .map(|(partition_key, row_key, fields)| -> Result<RowOperation> {
                let fields: FieldMap = serde_json::from_str(&fields)?;
                Ok(RowOperation {
                    partition_key,
                    row_key,
                    fields,
                    mode: UpsertMode::Replace,
                })
            })
            .collect()
    }
}
