//! Test helpers for Food Facts integration tests
//!
//! - Gzip fixtures
//! - Store doubles that fail on demand
//! - Seeded in-memory stores

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use flate2::{write::GzEncoder, Compression};
use foodfacts_server::ingest::{record::FieldValue, ProductRecord};
use foodfacts_server::store::{
    MemoryProductStore, ProductStore, SearchPage, StoreError, StoreResult,
};
use serde_json::Value;

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).expect("fixture exists")
}

pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Header plus `count` products named "Granola bar N", codes `000`, `001`, ...
pub fn generated_export(count: usize) -> String {
    let mut body = String::from("code\tproduct_name\tbrands\tsugars_100g\n");
    for i in 0..count {
        body.push_str(&format!("{i:03}\tGranola bar {i}\tAcme\t{}\n", i % 40));
    }
    body
}

pub fn granola(code: &str) -> ProductRecord {
    ProductRecord::new(code)
        .with_field("product_name", FieldValue::Text("Granola bar".into()))
        .with_field("brands", FieldValue::Text("Acme".into()))
}

pub async fn seeded_store(records: &[ProductRecord]) -> MemoryProductStore {
    let store = MemoryProductStore::new();
    store.upsert_batch(records).await.expect("seed store");
    store
}

/// Memory store whose listed batch numbers (zero-based) fail to write.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryProductStore,
    pub fail_batches: Vec<usize>,
    pub calls: Mutex<usize>,
}

impl FlakyStore {
    pub fn failing(fail_batches: Vec<usize>) -> Self {
        Self {
            fail_batches,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProductStore for FlakyStore {
    async fn upsert_batch(&self, records: &[ProductRecord]) -> StoreResult<u64> {
        let call = {
            let mut calls = self.calls.lock().expect("lock");
            *calls += 1;
            *calls - 1
        };
        if self.fail_batches.contains(&call) {
            return Err(StoreError::unavailable("connection reset by peer"));
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

/// Store that fails every operation.
pub struct BrokenStore;

#[async_trait]
impl ProductStore for BrokenStore {
    async fn upsert_batch(&self, _records: &[ProductRecord]) -> StoreResult<u64> {
        Err(StoreError::unavailable("database is down"))
    }

    async fn find_by_code(&self, _code: &str) -> StoreResult<Option<Value>> {
        Err(StoreError::unavailable("database is down"))
    }

    async fn search(&self, _text: &str, _skip: u64, _limit: u64) -> StoreResult<SearchPage> {
        Err(StoreError::unavailable("database is down"))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::unavailable("database is down"))
    }

    async fn close(&self) {}
}
