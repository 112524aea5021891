//! Reporting types for the batch uploader

use crate::types::RowIdentity;
use serde::Serialize;

/// A row the store refused and the uploader dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub partition_key: String,
    pub row_key: String,
    /// Error text reported by the store
    pub message: String,
}

impl RejectedRow {
    pub fn identity(&self) -> RowIdentity {
        RowIdentity::new(self.partition_key.clone(), self.row_key.clone())
    }
}

/// Outcome of a single flush
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushSummary {
    /// Operations committed by the store
    pub submitted: usize,
    /// Operations pushed back after a partial-batch rejection
    pub requeued: usize,
    /// Operations set aside because their identity was already in the batch
    pub deferred: usize,
    /// The operation dropped after a partial-batch rejection
    pub rejected: Option<RejectedRow>,
}

impl FlushSummary {
    /// Whether the flush sent anything to the store
    pub fn attempted(&self) -> bool {
        self.submitted > 0 || self.rejected.is_some()
    }
}

/// Running totals for one uploader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    /// Transactions the store committed
    pub batches_submitted: usize,
    /// Operations the store committed
    pub rows_submitted: usize,
    /// Operations dropped after a partial-batch rejection
    pub rows_rejected: usize,
    /// Times an operation was deferred for sharing an identity
    pub identity_deferrals: usize,
}

impl UploadStats {
    pub(crate) fn record(&mut self, summary: &FlushSummary) {
        if summary.submitted > 0 {
            self.batches_submitted += 1;
            self.rows_submitted += summary.submitted;
        }
        if summary.rejected.is_some() {
            self.rows_rejected += 1;
        }
        self.identity_deferrals += summary.deferred;
    }
}
