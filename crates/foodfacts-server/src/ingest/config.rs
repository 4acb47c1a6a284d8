//! Import configuration

use std::path::PathBuf;
use std::time::Duration;

use foodfacts_common::env;
use serde::{Deserialize, Serialize};

use super::{ImportError, Result};

/// Open Food Facts full product export
pub const DEFAULT_SOURCE_URL: &str =
    "https://static.openfoodfacts.org/data/en.openfoodfacts.org.products.csv.gz";

/// Records per upsert statement
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Two bind parameters per row; PostgreSQL caps a statement at 65535.
pub const MAX_BATCH_SIZE: usize = 10_000;

pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub source_url: String,
    pub batch_size: usize,

    /// Where the compressed export is staged; system temp dir when unset
    pub download_dir: Option<PathBuf>,

    /// Whole-request timeout for the download
    pub timeout_secs: u64,

    /// Download attempts before giving up (transient failures only)
    pub max_attempts: u32,

    /// First retry delay, doubled after each failed attempt
    pub retry_backoff_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            download_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl ImportConfig {
    /// `IMPORT_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            source_url: env::string_or("IMPORT_SOURCE_URL", DEFAULT_SOURCE_URL),
            batch_size: env::parse_or("IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            download_dir: env::var("IMPORT_DOWNLOAD_DIR").map(PathBuf::from),
            timeout_secs: env::parse_or("IMPORT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            max_attempts: env::parse_or("IMPORT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            retry_backoff_ms: env::parse_or("IMPORT_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.source_url.starts_with("http://") || self.source_url.starts_with("https://")) {
            return Err(ImportError::config(format!(
                "source URL must be http(s), got '{}'",
                self.source_url
            )));
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ImportError::config(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.max_attempts == 0 {
            return Err(ImportError::config("max attempts must be at least 1"));
        }

        if self.timeout_secs == 0 {
            return Err(ImportError::config("timeout must be greater than 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
