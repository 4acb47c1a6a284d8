//! Open Food Facts product import
//!
//! The export is a gzip-compressed, tab-separated file with a header line.
//! An import runs in one pass:
//!
//! 1. [`downloader`] stages the compressed file in a temporary file
//! 2. [`reader`] decompresses and splits it on a blocking thread
//! 3. [`record`] binds each line to a typed [`ProductRecord`]
//! 4. [`sink`] upserts records in batches by `code`
//!
//! [`pipeline::ImportPipeline`] wires the steps and returns an
//! [`ImportReport`].

pub mod coerce;
pub mod config;
pub mod downloader;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod report;
pub mod schema;
pub mod sink;

pub use config::ImportConfig;
pub use pipeline::ImportPipeline;
pub use record::ProductRecord;
pub use report::{FailedBatch, ImportReport};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source {url} answered HTTP {status}")]
    Acquisition { url: String, status: u16 },

    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Source has no header line")]
    EmptySource,

    #[error("Invalid header: {0}")]
    Header(#[from] record::RecordError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid import configuration: {0}")]
    Config(String),

    #[error("Environment error: {0}")]
    Env(#[from] foodfacts_common::CommonError),

    #[error("Reader task failed: {0}")]
    Reader(String),
}

impl ImportError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
