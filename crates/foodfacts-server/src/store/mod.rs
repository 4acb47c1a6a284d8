//! Product store
//!
//! The narrow interface the importer writes through and the API reads
//! through. [`PgProductStore`] is the production backend;
//! [`MemoryProductStore`] backs dry runs and tests.

mod memory;
mod postgres;

pub use memory::MemoryProductStore;
pub use postgres::PgProductStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::ingest::ProductRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document with its text relevance
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduct {
    pub document: Value,
    pub score: f64,
}

impl ScoredProduct {
    /// The document with its `score` field set.
    pub fn into_json(self) -> Value {
        let mut document = self.document;
        if let Value::Object(ref mut fields) = document {
            let score = serde_json::Number::from_f64(self.score).map_or(Value::Null, Value::Number);
            fields.insert("score".to_string(), score);
        }
        document
    }
}

/// One page of search results plus the size of the whole match set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub items: Vec<ScoredProduct>,
    pub total: u64,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert or fully replace each record by `code`. Returns the number of
    /// documents written.
    async fn upsert_batch(&self, records: &[ProductRecord]) -> StoreResult<u64>;

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Value>>;

    /// Matches in descending score order, ties broken by code.
    async fn search(&self, text: &str, skip: u64, limit: u64) -> StoreResult<SearchPage>;

    async fn health_check(&self) -> StoreResult<()>;

    /// Release the store's connections.
    async fn close(&self);
}

/// Drop earlier records that share a code with a later one, keeping order.
pub(crate) fn dedupe_last_wins(records: &[ProductRecord]) -> Vec<&ProductRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<&ProductRecord> = records
        .iter()
        .rev()
        .filter(|record| seen.insert(record.code()))
        .collect();
    unique.reverse();
    unique
}
