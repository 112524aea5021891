//! Table store module
//!
//! The transactional table store the uploader writes to.
//!
//! # Overview
//!
//! This module provides:
//! - `TableStore` - async trait for atomic batch writes
//! - `MemoryTableStore` - in-process store with fault injection
//! - `DuckDbTableStore` - DuckDB-backed persistent store
//! - `StoreConnection` - connection descriptor parsing

mod connection;
mod duckdb_store;
mod memory;
mod types;

pub use connection::{open_store, StoreConnection, CONNECTION_ENV_VAR};
pub use duckdb_store::DuckDbTableStore;
pub use memory::{MemoryTableStore, Submission};
pub use types::{
    check_transaction, validate_key, validate_table_name, TableStore, MAX_KEY_BYTES,
    MAX_TRANSACTION_SIZE,
};
