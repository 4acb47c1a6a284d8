//! Import run report

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A batch whose upsert failed; its records were not written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedBatch {
    /// Zero-based batch number in the run
    pub index: u64,
    /// Source line of the first record in the batch
    pub first_line: u64,
    pub last_line: u64,
    pub records: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub source_url: String,
    /// Non-blank data lines after the header
    pub lines_read: u64,
    pub records_written: u64,
    /// Lines dropped before batching (empty `code`)
    pub records_rejected: u64,
    /// Cells nulled because they did not fit their field kind
    pub rejected_cells: u64,
    pub batches_written: u64,
    pub failed_batches: Vec<FailedBatch>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ImportReport {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_batches.is_empty()
    }

    /// Records that reached a batch whose upsert failed
    pub fn records_failed(&self) -> usize {
        self.failed_batches.iter().map(|b| b.records).sum()
    }

    pub fn log_summary(&self) {
        info!(
            source_url = %self.source_url,
            lines_read = self.lines_read,
            records_written = self.records_written,
            records_rejected = self.records_rejected,
            rejected_cells = self.rejected_cells,
            batches_written = self.batches_written,
            failed_batches = self.failed_batches.len(),
            duration_secs = self.duration.as_secs_f64(),
            "Import finished"
        );

        if self.has_failures() {
            warn!(
                failed_batches = self.failed_batches.len(),
                records_failed = self.records_failed(),
                "Some batches were not written"
            );
        }

        match serde_json::to_string(self) {
            Ok(json) => info!(report = %json, "Import report"),
            Err(e) => warn!(error = %e, "Could not serialize import report"),
        }
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
