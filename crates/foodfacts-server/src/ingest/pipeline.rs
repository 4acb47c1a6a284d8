//! Import pipeline
//!
//! Download, then a single pass over the staged file: a blocking reader
//! thread decompresses and binds lines into a bounded channel, and this task
//! drains it into the [`BatchSink`] in line order.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, info, warn};

use super::config::ImportConfig;
use super::downloader::Downloader;
use super::reader::{open_gzip, ParsedLine, TsvRecordReader};
use super::report::ImportReport;
use super::sink::BatchSink;
use super::{ImportError, Result};
use crate::store::ProductStore;

/// Lines buffered between the reader thread and the writer
const CHANNEL_CAPACITY: usize = 4096;

pub struct ImportPipeline {
    config: ImportConfig,
    store: Arc<dyn ProductStore>,
}

impl ImportPipeline {
    pub fn new(config: ImportConfig, store: Arc<dyn ProductStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    /// Download the configured export and import it.
    #[tracing::instrument(skip(self), fields(source_url = %self.config.source_url))]
    pub async fn run(&self) -> Result<ImportReport> {
        let started = Instant::now();

        let downloader = Downloader::new(&self.config)?;
        let staged = downloader.download(&self.config.source_url).await?;

        let mut report = ImportReport::new(&self.config.source_url);
        self.import_file(staged.path(), &mut report).await?;

        if let Err(e) = staged.close() {
            warn!(error = %e, "Could not remove staged export");
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    /// Import an already staged gzip export into `report`.
    pub async fn import_file(&self, path: &Path, report: &mut ImportReport) -> Result<()> {
        let (tx, rx) = mpsc::channel::<ParsedLine>(CHANNEL_CAPACITY);
        let path = path.to_path_buf();

        let reader = tokio::task::spawn_blocking(move || -> Result<()> {
            let lines = TsvRecordReader::new(open_gzip(&path)?)?;
            info!(columns = lines.builder().known_columns(), "Header bound");
            for line in lines {
                if tx.blocking_send(line?).is_err() {
                    // Writer side is gone; nothing left to feed.
                    break;
                }
            }
            Ok(())
        });

        let mut lines = ReceiverStream::new(rx);
        let mut sink = BatchSink::new(self.store.clone(), self.config.batch_size);

        while let Some(parsed) = lines.next().await {
            report.lines_read += 1;
            match parsed.outcome {
                Ok(bound) => {
                    report.rejected_cells += bound.rejected_cells as u64;
                    sink.push(parsed.line, bound.record).await;
                },
                Err(e) => {
                    report.records_rejected += 1;
                    debug!(line = parsed.line, error = %e, "Rejected line");
                },
            }
        }

        let summary = sink.finish().await;
        report.records_written += summary.records_written;
        report.batches_written += summary.batches_written;
        report.failed_batches.extend(summary.failed_batches);

        reader
            .await
            .map_err(|e| ImportError::Reader(e.to_string()))??;

        Ok(())
    }
}
