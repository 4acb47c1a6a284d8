//! In-memory product store
//!
//! Text matching follows the database's behaviour closely enough for tests
//! and dry runs: the query is lowercased and split into word tokens, a
//! document matches when any token appears in its searchable fields, and the
//! score is the number of distinct query tokens it contains.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{dedupe_last_wins, ProductStore, ScoredProduct, SearchPage, StoreResult};
use crate::ingest::{schema::SEARCHABLE_FIELDS, ProductRecord};

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn document_tokens(document: &Value) -> BTreeSet<String> {
    SEARCHABLE_FIELDS
        .iter()
        .filter_map(|field| document.get(field).and_then(Value::as_str))
        .flat_map(tokenize)
        .collect()
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn upsert_batch(&self, records: &[ProductRecord]) -> StoreResult<u64> {
        let unique = dedupe_last_wins(records);
        let mut documents = self.documents.write().await;
        for record in &unique {
            documents.insert(record.code().to_string(), record.to_document());
        }
        Ok(unique.len() as u64)
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Value>> {
        Ok(self.documents.read().await.get(code).cloned())
    }

    async fn search(&self, text: &str, skip: u64, limit: u64) -> StoreResult<SearchPage> {
        let query = tokenize(text);
        if query.is_empty() {
            return Ok(SearchPage::default());
        }

        let documents = self.documents.read().await;
        // BTreeMap iteration is in code order, so the stable sort keeps ties by code.
        let mut matches: Vec<(usize, &Value)> = documents
            .values()
            .filter_map(|document| {
                let tokens = document_tokens(document);
                let score = query.iter().filter(|t| tokens.contains(*t)).count();
                (score > 0).then_some((score, document))
            })
            .collect();
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(score, document)| ScoredProduct {
                document: document.clone(),
                score: score as f64,
            })
            .collect();

        Ok(SearchPage { items, total })
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}
