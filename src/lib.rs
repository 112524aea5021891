// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # table-batcher
//!
//! Queues upsert-style row operations and writes them to a transactional
//! table store in batches no larger than the store accepts.
//!
//! ## Features
//!
//! - **Bounded Batches**: Transactions never exceed the store's 100-operation ceiling
//! - **Identity Deferral**: Repeated row identities wait for a later batch
//! - **Partial Rejection Recovery**: A refused row is dropped, the rest retried
//! - **Concurrent Producers**: Any number of tasks may enqueue into one uploader
//! - **Pluggable Stores**: In-memory and DuckDB backends behind one trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use table_batcher::{BatchUploader, MemoryTableStore, Result, RowOperation};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(MemoryTableStore::new());
//!     let uploader = BatchUploader::new(store, "Effectiveness").await?;
//!
//!     uploader
//!         .enqueue(RowOperation::new("Effectiveness", "2024-01-01").with_field("Clean", 42))
//!         .await?;
//!
//!     // Drain whatever is still queued
//!     let stats = uploader.close().await?;
//!     println!("uploaded {} rows", stats.rows_submitted);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! producers ──enqueue──▶ pending queue ──flush──▶ TableStore::submit_transaction
//!                             ▲                          │
//!                             │   deferred identities    │ rejected at index i:
//!                             └──────────────────────────┤ drop i, requeue the rest
//!                                                        ▼
//!                                                  committed rows
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Row operations and field values
pub mod types;

/// Transactional table stores
pub mod store;

/// Batch uploader
pub mod uploader;

/// NDJSON operation input
pub mod input;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use store::{
    open_store, DuckDbTableStore, MemoryTableStore, StoreConnection, TableStore,
    MAX_TRANSACTION_SIZE,
};
pub use uploader::{BatchUploader, FlushSummary, RejectedRow, UploadStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
