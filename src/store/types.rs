//! Table store trait and the contract shared by every backend

use crate::error::{Error, Result};
use crate::types::{RowIdentity, RowOperation};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Maximum number of operations the store accepts in one transaction
pub const MAX_TRANSACTION_SIZE: usize = 100;

/// Maximum size of a partition key or row key in bytes
pub const MAX_KEY_BYTES: usize = 1024;

static TABLE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{2,62}$").unwrap());

// ============================================================================
// Table Store Trait
// ============================================================================

/// A transactional table store
///
/// `submit_transaction` is atomic: every operation in the batch is applied, or
/// none is. When a single operation makes the batch invalid the store answers
/// with [`Error::TransactionRejected`] carrying that operation's position; any
/// other error is a transport or fatal failure.
///
/// Table names are case-insensitive: `Effectiveness` and `effectiveness` are
/// the same table.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Short name of the backend, for logs
    fn name(&self) -> &str;

    /// Create the table unless it already exists
    async fn create_table_if_not_exists(&self, table: &str) -> Result<()>;

    /// Apply a batch of operations as one atomic transaction
    async fn submit_transaction(&self, table: &str, operations: &[RowOperation]) -> Result<()>;

    /// List the rows currently stored, ordered by identity
    async fn read_rows(&self, table: &str) -> Result<Vec<RowOperation>>;
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a table name
///
/// Names start with a letter, contain only ASCII letters and digits, are 3 to
/// 63 characters long, and are not the reserved name `tables`.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.eq_ignore_ascii_case("tables") {
        return Err(Error::invalid_table(name, "reserved name"));
    }
    if !TABLE_NAME_REGEX.is_match(name) {
        return Err(Error::invalid_table(
            name,
            "must start with a letter and contain 3-63 alphanumeric characters",
        ));
    }
    Ok(())
}

/// Validate a partition key or row key
pub fn validate_key(kind: &str, key: &str) -> std::result::Result<(), String> {
    if key.len() > MAX_KEY_BYTES {
        return Err(format!(
            "{kind} is {} bytes, limit is {MAX_KEY_BYTES}",
            key.len()
        ));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '#' | '?') || c.is_control())
    {
        return Err(format!("{kind} '{key}' contains disallowed character {c:?}"));
    }
    Ok(())
}

/// Check a batch against the store's transaction rules
///
/// Returns the first failing operation as a rejection, or a fatal error when
/// the batch is over the size ceiling.
pub fn check_transaction(operations: &[RowOperation]) -> Result<()> {
    if operations.len() > MAX_TRANSACTION_SIZE {
        return Err(Error::TransactionTooLarge {
            size: operations.len(),
            limit: MAX_TRANSACTION_SIZE,
        });
    }

    let mut seen: HashSet<RowIdentity> = HashSet::with_capacity(operations.len());
    for (index, op) in operations.iter().enumerate() {
        validate_key("PartitionKey", &op.partition_key).map_err(|m| Error::rejected(index, m))?;
        validate_key("RowKey", &op.row_key).map_err(|m| Error::rejected(index, m))?;

        if !seen.insert(op.identity()) {
            return Err(Error::rejected(
                index,
                format!(
                    "batch contains more than one operation for {}",
                    op.identity()
                ),
            ));
        }
    }
    Ok(())
}
