//! Food Facts Server Library
//!
//! Import and serve Open Food Facts product data.
//!
//! # Overview
//!
//! - **Ingest**: download the gzip TSV export, bind each line to a typed
//!   product record and upsert records by barcode in batches
//! - **Store**: PostgreSQL (JSONB documents with a generated text-search
//!   vector) or in-memory, behind one [`store::ProductStore`] trait
//! - **API**: lookup by barcode and paginated full-text search
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extraction
//! - **SQLx**: PostgreSQL access and embedded migrations
//! - **Tower**: CORS, compression and request tracing middleware
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use foodfacts_server::{ingest::{ImportConfig, ImportPipeline}, store::MemoryProductStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryProductStore::new());
//!     let report = ImportPipeline::new(ImportConfig::default(), store)?.run().await?;
//!     report.log_summary();
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod store;

// Re-export commonly used types
pub use error::{ServerError, ServerResult};
