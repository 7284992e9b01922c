// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Buffered log chunk writes.

use tracing::warn;
use xci_core::NewLogChunk;
use xci_storage::BuildStore;

/// Collects log chunks and writes them to the store in groups.
///
/// Write failures are logged and the batch is dropped; log persistence
/// never fails a job.
pub struct LogBatcher<S> {
    store: S,
    capacity: usize,
    pending: Vec<NewLogChunk>,
}

impl<S: BuildStore> LogBatcher<S> {
    /// A capacity of 0 is treated as 1.
    pub fn new(store: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            store,
            capacity,
            pending: Vec::with_capacity(capacity),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a chunk, writing the batch once it is full.
    pub async fn push(&mut self, chunk: NewLogChunk) {
        self.pending.push(chunk);
        if self.pending.len() >= self.capacity {
            self.flush().await;
        }
    }

    pub async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.capacity));
        let count = batch.len();
        if let Err(e) = self.store.append_log_chunks(batch).await {
            warn!(count, error = %e, "dropping log chunks");
        }
    }
}

#[cfg(test)]
#[path = "log_batcher_tests.rs"]
mod tests;
