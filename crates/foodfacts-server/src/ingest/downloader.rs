//! Export downloader
//!
//! Streams the response body into a [`NamedTempFile`], so the
//! compressed export never sits in memory. The file is deleted when the
//! [`DownloadedFile`] is dropped, whichever way the import ends.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::config::ImportConfig;
use super::{ImportError, Result};

/// A staged export; removed from disk on drop.
#[derive(Debug)]
pub struct DownloadedFile {
    file: NamedTempFile,
    bytes: u64,
}

impl DownloadedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Delete the file now, reporting any error.
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}

pub struct Downloader {
    client: Client,
    download_dir: PathBuf,
    max_attempts: u32,
    retry_backoff: Duration,
}

enum AttemptError {
    Transient(ImportError),
    Fatal(ImportError),
}

impl Downloader {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("foodfacts-import/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ImportError::Download {
                url: config.source_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            download_dir: config.download_dir.clone().unwrap_or_else(std::env::temp_dir),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Download `url`, retrying transport errors, 429 and 5xx answers with
    /// exponential backoff. Any other non-success status fails at once.
    pub async fn download(&self, url: &str) -> Result<DownloadedFile> {
        let mut attempt = 1;

        loop {
            match self.download_once(url).await {
                Ok(file) => {
                    info!(url, bytes = file.bytes, "Downloaded export");
                    return Ok(file);
                },
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(e)) if attempt >= self.max_attempts => return Err(e),
                Err(AttemptError::Transient(e)) => {
                    let backoff = self
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt - 1));
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Download attempt failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                },
            }
        }
    }

    async fn download_once(&self, url: &str) -> std::result::Result<DownloadedFile, AttemptError> {
        let transport = |source: reqwest::Error| {
            AttemptError::Transient(ImportError::Download {
                url: url.to_string(),
                source,
            })
        };
        let io = |e: std::io::Error| AttemptError::Fatal(ImportError::Io(e));

        info!(url, "Downloading export");
        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let error = ImportError::Acquisition {
                url: url.to_string(),
                status: status.as_u16(),
            };
            return Err(if is_transient(status) {
                AttemptError::Transient(error)
            } else {
                AttemptError::Fatal(error)
            });
        }

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(io)?;
        let staged = tempfile::Builder::new()
            .prefix("foodfacts-")
            .suffix(".csv.gz")
            .tempfile_in(&self.download_dir)
            .map_err(io)?;
        let mut out = tokio::fs::File::from_std(staged.as_file().try_clone().map_err(io)?);

        let mut bytes = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(transport)?;
            out.write_all(&chunk).await.map_err(io)?;
            bytes += chunk.len() as u64;
        }
        out.flush().await.map_err(io)?;

        Ok(DownloadedFile {
            file: staged,
            bytes,
        })
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
