//! Uploader module
//!
//! Batches row operations into store transactions.
//!
//! # Overview
//!
//! This module provides:
//! - `BatchUploader` - per-table queue with threshold and drain flushes
//! - `FlushSummary` - what a single flush did
//! - `UploadStats` - running totals for an uploader

mod batch;
mod types;

pub use batch::BatchUploader;
pub use types::{FlushSummary, RejectedRow, UploadStats};
