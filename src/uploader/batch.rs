//! Batch uploader
//!
//! Queues row operations for one table and writes them to the store in
//! transactions of at most [`MAX_TRANSACTION_SIZE`] operations.
//!
//! Two store rules shape each flush:
//! - a transaction may not hold two operations for the same identity, so a
//!   repeated identity is set aside and queued again after the flush;
//! - a transaction is atomic, so when the store names a failing operation that
//!   one is dropped and the rest of the batch is queued again.
//!
//! Repeated identities are served first come, first served. An identity that
//! keeps receiving new operations faster than flushes run can be deferred
//! indefinitely.

use super::types::{FlushSummary, RejectedRow, UploadStats};
use crate::error::{Error, Result};
use crate::store::{validate_table_name, TableStore, MAX_TRANSACTION_SIZE};
use crate::types::{RowIdentity, RowOperation};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Upload queue bound to one destination table
pub struct BatchUploader {
    /// Destination table name
    destination: String,
    /// Store the batches are written to
    store: Arc<dyn TableStore>,
    /// Operations per transaction, equal to the store's ceiling
    batch_size: usize,
    /// Operations waiting for a flush, in arrival order
    pending: Mutex<VecDeque<RowOperation>>,
    /// Held for the duration of a flush, so only one runs at a time
    flusher: Mutex<UploadStats>,
}

impl BatchUploader {
    /// Create an uploader for `destination`, creating the table if needed
    pub async fn new(store: Arc<dyn TableStore>, destination: impl Into<String>) -> Result<Self> {
        let destination = destination.into();
        validate_table_name(&destination)?;
        store.create_table_if_not_exists(&destination).await?;

        debug!(
            destination = %destination,
            store = store.name(),
            "Created batch uploader for {}",
            destination
        );

        Ok(Self {
            destination,
            store,
            batch_size: MAX_TRANSACTION_SIZE,
            pending: Mutex::new(VecDeque::new()),
            flusher: Mutex::new(UploadStats::default()),
        })
    }

    /// Destination table name
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Maximum operations per transaction
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of operations waiting for a flush
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Totals so far; waits for an in-flight flush to finish
    pub async fn stats(&self) -> UploadStats {
        *self.flusher.lock().await
    }

    /// Queue an operation, flushing once a full batch is waiting
    ///
    /// Identity conflicts and partial-batch rejections are handled inside the
    /// flush. Transport and other fatal store errors are returned.
    pub async fn enqueue(&self, op: RowOperation) -> Result<()> {
        let pending = {
            let mut queue = self.pending.lock().await;
            queue.push_back(op);
            queue.len()
        };

        if pending >= self.batch_size {
            let mut stats = self.flusher.lock().await;
            // Another producer may have flushed while we waited for the lock
            if self.pending_len().await >= self.batch_size {
                let summary = self.flush_locked().await?;
                stats.record(&summary);
            }
        }

        Ok(())
    }

    /// Run one flush regardless of how many operations are waiting
    pub async fn flush(&self) -> Result<FlushSummary> {
        let mut stats = self.flusher.lock().await;
        let summary = self.flush_locked().await?;
        stats.record(&summary);
        Ok(summary)
    }

    /// Flush until nothing is pending
    ///
    /// Must be called after the last `enqueue`; operations still queued when
    /// the uploader is dropped are lost. Calling it on an empty queue makes no
    /// store calls.
    pub async fn close(&self) -> Result<UploadStats> {
        let mut stats = self.flusher.lock().await;
        while self.pending_len().await > 0 {
            let summary = self.flush_locked().await?;
            stats.record(&summary);
        }

        info!(
            destination = %self.destination,
            rows = stats.rows_submitted,
            batches = stats.batches_submitted,
            rejected = stats.rows_rejected,
            "Finished uploading {} rows to {} in {} batches",
            stats.rows_submitted,
            self.destination,
            stats.batches_submitted
        );

        Ok(*stats)
    }

    /// Take up to one batch off the queue, setting aside repeated identities
    async fn drain_batch(&self) -> (Vec<RowOperation>, Vec<RowOperation>) {
        let mut queue = self.pending.lock().await;
        let mut batch = Vec::with_capacity(self.batch_size.min(queue.len()));
        let mut deferred = Vec::new();
        let mut identities: HashSet<RowIdentity> = HashSet::new();

        while batch.len() < self.batch_size {
            let Some(op) = queue.pop_front() else {
                break;
            };
            if identities.insert(op.identity()) {
                batch.push(op);
            } else {
                deferred.push(op);
            }
        }

        (batch, deferred)
    }

    /// One flush; the caller holds the `flusher` lock
    async fn flush_locked(&self) -> Result<FlushSummary> {
        let (batch, deferred) = self.drain_batch().await;
        let mut summary = FlushSummary {
            deferred: deferred.len(),
            ..FlushSummary::default()
        };

        if !deferred.is_empty() {
            debug!(
                destination = %self.destination,
                deferred = deferred.len(),
                "Deferring {} operations with identities already in this batch",
                deferred.len()
            );
        }

        if !batch.is_empty() {
            info!(
                destination = %self.destination,
                size = batch.len(),
                "Uploading batch to {} of size {}",
                self.destination,
                batch.len()
            );

            match self
                .store
                .submit_transaction(&self.destination, &batch)
                .await
            {
                Ok(()) => summary.submitted = batch.len(),
                Err(e) => match e.failed_index() {
                    Some(index) if index < batch.len() => {
                        let mut remaining = batch;
                        let failed = remaining.remove(index);
                        let message = e.to_string();

                        error!(
                            destination = %self.destination,
                            partition_key = %failed.partition_key,
                            row_key = %failed.row_key,
                            error = %message,
                            "Failed to insert batch transaction in {} with partition key {} row key {}: {}",
                            self.destination,
                            failed.partition_key,
                            failed.row_key,
                            message
                        );

                        summary.requeued = remaining.len();
                        summary.rejected = Some(RejectedRow {
                            partition_key: failed.partition_key,
                            row_key: failed.row_key,
                            message,
                        });
                        self.pending.lock().await.extend(remaining);
                    }
                    failed_index => {
                        let e = match failed_index {
                            Some(index) => Error::store(format!(
                                "Store named operation {index} as failing in a batch of {}: {e}",
                                batch.len()
                            )),
                            None => e,
                        };
                        self.restore(batch, deferred).await;
                        return Err(e);
                    }
                },
            }
        }

        if !deferred.is_empty() {
            self.pending.lock().await.extend(deferred);
        }

        Ok(summary)
    }

    /// Put a failed batch back at the head of the queue in its original order
    async fn restore(&self, batch: Vec<RowOperation>, deferred: Vec<RowOperation>) {
        warn!(
            destination = %self.destination,
            size = batch.len(),
            "Upload to {} failed, keeping {} operations queued",
            self.destination,
            batch.len() + deferred.len()
        );

        let mut queue = self.pending.lock().await;
        for op in batch.into_iter().rev() {
            queue.push_front(op);
        }
        queue.extend(deferred);
    }
}

impl Drop for BatchUploader {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().len();
        if pending > 0 {
            warn!(
                destination = %self.destination,
                pending,
                "Batch uploader for {} dropped with {} operations never uploaded",
                self.destination,
                pending
            );
        }
    }
}
