//! In-process table store
//!
//! Keeps tables in memory and follows the same transaction rules as the
//! DuckDB backend. Faults can be injected to exercise the uploader's recovery
//! paths without a real service.

use super::types::{check_transaction, validate_table_name, TableStore};
use crate::error::{Error, Result};
use crate::types::{RowIdentity, RowOperation};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

/// One call to `submit_transaction`, as the store saw it
#[derive(Debug, Clone)]
pub struct Submission {
    /// Target table
    pub table: String,
    /// Operations in submission order
    pub operations: Vec<RowOperation>,
    /// Whether the transaction was applied
    pub committed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Keyed by lower-cased table name
    tables: HashMap<String, BTreeMap<RowIdentity, RowOperation>>,
    submissions: Vec<Submission>,
    rejected_rows: HashSet<RowIdentity>,
    pending_failures: usize,
}

/// Table store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<MemoryState>,
}

impl MemoryTableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every transaction that contains `identity`, at its position
    pub async fn reject_row(&self, identity: RowIdentity) {
        self.state.lock().await.rejected_rows.insert(identity);
    }

    /// Fail the next `count` submissions with a transport error
    pub async fn fail_next_submissions(&self, count: usize) {
        self.state.lock().await.pending_failures = count;
    }

    /// Every submission attempt so far, committed or not
    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.lock().await.submissions.clone()
    }

    /// Only the submissions that were applied
    pub async fn committed_batches(&self) -> Vec<Vec<RowOperation>> {
        self.state
            .lock()
            .await
            .submissions
            .iter()
            .filter(|s| s.committed)
            .map(|s| s.operations.clone())
            .collect()
    }

    /// Check whether a table exists
    pub async fn has_table(&self, table: &str) -> bool {
        self.state
            .lock()
            .await
            .tables
            .contains_key(&table.to_ascii_lowercase())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_table_if_not_exists(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        self.state
            .lock()
            .await
            .tables
            .entry(table.to_ascii_lowercase())
            .or_default();
        Ok(())
    }

    async fn submit_transaction(&self, table: &str, operations: &[RowOperation]) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut submission = Submission {
            table: table.to_string(),
            operations: operations.to_vec(),
            committed: false,
        };

        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            state.submissions.push(submission);
            return Err(Error::store("connection reset by peer"));
        }

        let outcome = check_transaction(operations).and_then(|()| {
            match operations
                .iter()
                .position(|op| state.rejected_rows.contains(&op.identity()))
            {
                Some(index) => Err(Error::rejected(
                    index,
                    format!("operation for {} was refused", operations[index].identity()),
                )),
                None => Ok(()),
            }
        });

        let result = match outcome {
            Ok(()) => match state.tables.get_mut(&table.to_ascii_lowercase()) {
                Some(rows) => {
                    for op in operations {
                        rows.insert(op.identity(), op.clone());
                    }
                    submission.committed = true;
                    Ok(())
                }
                None => Err(Error::TableNotFound {
                    table: table.to_string(),
                }),
            },
            Err(e) => Err(e),
        };

        state.submissions.push(submission);
        result
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<RowOperation>> {
        let state = self.state.lock().await;
        let rows = state
            .tables
            .get(&table.to_ascii_lowercase())
            .ok_or_else(|| Error::TableNotFound {
                table: table.to_string(),
            })?;
        Ok(rows.values().cloned().collect())
    }
}
