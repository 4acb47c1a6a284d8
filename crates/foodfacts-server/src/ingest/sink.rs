//! Batch upsert sink
//!
//! Buffers records and writes them through the [`ProductStore`] whenever
//! the buffer reaches the batch size, plus once more for the remainder.
//! A failed batch is logged and recorded; later batches still run.

use std::sync::Arc;

use tracing::{error, info};

use super::record::ProductRecord;
use super::report::FailedBatch;
use crate::store::ProductStore;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SinkSummary {
    pub records_written: u64,
    pub batches_written: u64,
    pub failed_batches: Vec<FailedBatch>,
}

pub struct BatchSink {
    store: Arc<dyn ProductStore>,
    batch_size: usize,
    buffer: Vec<ProductRecord>,
    first_line: u64,
    last_line: u64,
    next_index: u64,
    summary: SinkSummary,
}

impl BatchSink {
    pub fn new(store: Arc<dyn ProductStore>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            first_line: 0,
            last_line: 0,
            next_index: 0,
            summary: SinkSummary::default(),
        }
    }

    /// Buffer one record read from source line `line`.
    pub async fn push(&mut self, line: u64, record: ProductRecord) {
        if self.buffer.is_empty() {
            self.first_line = line;
        }
        self.last_line = line;
        self.buffer.push(record);

        if self.buffer.len() >= self.batch_size {
            self.flush().await;
        }
    }

    /// Write whatever is buffered. No-op when empty.
    pub async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let index = self.next_index;
        self.next_index += 1;

        match self.store.upsert_batch(&self.buffer).await {
            Ok(written) => {
                self.summary.records_written += written;
                self.summary.batches_written += 1;
                info!(
                    batch = index,
                    records = written,
                    processed = self.summary.records_written,
                    "Upserted batch"
                );
            },
            Err(e) => {
                error!(
                    batch = index,
                    first_line = self.first_line,
                    last_line = self.last_line,
                    records = self.buffer.len(),
                    error = %e,
                    "Batch upsert failed"
                );
                self.summary.failed_batches.push(FailedBatch {
                    index,
                    first_line: self.first_line,
                    last_line: self.last_line,
                    records: self.buffer.len(),
                    error: e.to_string(),
                });
            },
        }

        self.buffer.clear();
    }

    /// Flush the remainder and hand back the totals.
    pub async fn finish(mut self) -> SinkSummary {
        self.flush().await;
        self.summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryProductStore, SearchPage, StoreError, StoreResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Records every batch size and fails the batches listed in `fail`.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryProductStore,
        batches: Mutex<Vec<usize>>,
        fail: Vec<usize>,
    }

    #[async_trait]
    impl ProductStore for RecordingStore {
        async fn upsert_batch(&self, records: &[ProductRecord]) -> StoreResult<u64> {
            let index = {
                let mut batches = self.batches.lock().unwrap();
                batches.push(records.len());
                batches.len() - 1
            };
            if self.fail.contains(&index) {
                return Err(StoreError::unavailable("write rejected"));
            }
            self.inner.upsert_batch(records).await
        }

        async fn find_by_code(&self, code: &str) -> StoreResult<Option<Value>> {
            self.inner.find_by_code(code).await
        }

        async fn search(&self, text: &str, skip: u64, limit: u64) -> StoreResult<SearchPage> {
            self.inner.search(text, skip, limit).await
        }

        async fn health_check(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn close(&self) {}
    }

    async fn run(store: Arc<RecordingStore>, batch_size: usize, count: u64) -> SinkSummary {
        let mut sink = BatchSink::new(store, batch_size);
        for i in 0..count {
            sink.push(i + 2, ProductRecord::new(i.to_string())).await;
        }
        sink.finish().await
    }

    #[tokio::test]
    async fn test_flushes_full_batches_then_remainder() {
        let store = Arc::new(RecordingStore::default());
        let summary = run(store.clone(), 1000, 2500).await;

        assert_eq!(*store.batches.lock().unwrap(), vec![1000, 1000, 500]);
        assert_eq!(summary.records_written, 2500);
        assert_eq!(summary.batches_written, 3);
        assert!(summary.failed_batches.is_empty());
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_empty_batch() {
        let store = Arc::new(RecordingStore::default());
        let summary = run(store.clone(), 1000, 2000).await;

        assert_eq!(*store.batches.lock().unwrap(), vec![1000, 1000]);
        assert_eq!(summary.batches_written, 2);
    }

    #[tokio::test]
    async fn test_no_records_no_batches() {
        let store = Arc::new(RecordingStore::default());
        let summary = run(store.clone(), 1000, 0).await;

        assert!(store.batches.lock().unwrap().is_empty());
        assert_eq!(summary, SinkSummary::default());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let store = Arc::new(RecordingStore {
            fail: vec![1],
            ..Default::default()
        });
        let summary = run(store.clone(), 10, 25).await;

        assert_eq!(summary.batches_written, 2);
        assert_eq!(summary.records_written, 15);
        assert_eq!(
            summary.failed_batches,
            vec![FailedBatch {
                index: 1,
                first_line: 12,
                last_line: 21,
                records: 10,
                error: "Store unavailable: write rejected".to_string(),
            }]
        );
        assert!(store.find_by_code("24").await.unwrap().is_some());
        assert!(store.find_by_code("10").await.unwrap().is_none());
    }
}
