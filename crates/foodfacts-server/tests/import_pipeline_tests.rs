//! End-to-end import tests
//!
//! A wiremock server plays the export host; the in-memory store stands in
//! for PostgreSQL.

use std::path::Path;
use std::sync::Arc;

use foodfacts_server::ingest::{ImportConfig, ImportError, ImportPipeline};
use foodfacts_server::store::{MemoryProductStore, ProductStore};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod helpers;

use helpers::{fixture, generated_export, gzip, FlakyStore};

// ============================================================================
// Helper Functions
// ============================================================================

async fn serve_export(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/products.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(body)))
        .mount(&server)
        .await;
    server
}

fn import_config(server: &MockServer, download_dir: &Path, batch_size: usize) -> ImportConfig {
    ImportConfig {
        source_url: format!("{}/data/products.csv.gz", server.uri()),
        batch_size,
        download_dir: Some(download_dir.to_path_buf()),
        retry_backoff_ms: 1,
        ..Default::default()
    }
}

fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_import_fixture() {
    let server = serve_export(&fixture("products.tsv")).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryProductStore::new());

    let report = ImportPipeline::new(import_config(&server, dir.path(), 1000), store.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.lines_read, 5);
    assert_eq!(report.records_rejected, 1);
    assert_eq!(report.records_written, 4);
    assert_eq!(report.batches_written, 1);
    assert_eq!(report.rejected_cells, 1);
    assert!(report.failed_batches.is_empty());
    assert_eq!(store.len().await, 4);
    assert_eq!(staged_files(dir.path()), 0);

    let crackers = store.find_by_code("0000000000017").await.unwrap().unwrap();
    assert_eq!(crackers["code"], "0000000000017");
    assert_eq!(crackers["product_name"], "Vitória crackers");
    assert_eq!(crackers["categories"], "en:snacks, en:crackers");
    assert_eq!(crackers["categories_tags"], json!(["en:snacks", "en:crackers"]));
    assert_eq!(crackers["brands_tags"], json!(["vitoria"]));
    assert_eq!(crackers["energy_kcal_100g"], json!(375));
    assert_eq!(crackers["saturated_fat_100g"], json!(2.1));
    assert_eq!(crackers["no_nutriments"], json!(false));
    assert_eq!(crackers["created_datetime"], "2018-06-15T10:38:00Z");
    assert!(crackers.get("nova_group").is_none());

    let nutella = store.find_by_code("3017620422003").await.unwrap().unwrap();
    assert_eq!(nutella["categories"], "Spreads, Sweet spreads");
    assert!(nutella.get("categories_tags").is_none());
    assert_eq!(nutella["brands_tags"], json!(["ferrero", "nutella"]));

    let cola = store.find_by_code("5449000000996").await.unwrap().unwrap();
    assert_eq!(cola["saturated_fat_100g"], json!(null));
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let server = serve_export(&fixture("products.tsv")).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryProductStore::new());
    let pipeline =
        ImportPipeline::new(import_config(&server, dir.path(), 2), store.clone()).unwrap();

    let first = pipeline.run().await.unwrap();
    let snapshot = store.find_by_code("7622210449283").await.unwrap();
    let second = pipeline.run().await.unwrap();

    assert_eq!(first.records_written, second.records_written);
    assert_eq!(store.len().await, 4);
    assert_eq!(store.find_by_code("7622210449283").await.unwrap(), snapshot);
}

#[tokio::test]
async fn test_batches_of_one_thousand() {
    let server = serve_export(&generated_export(2500)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryProductStore::new());

    let report = ImportPipeline::new(import_config(&server, dir.path(), 1000), store.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.lines_read, 2500);
    assert_eq!(report.batches_written, 3);
    assert_eq!(report.records_written, 2500);
    assert_eq!(store.len().await, 2500);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_import() {
    let server = serve_export(&generated_export(30)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FlakyStore::failing(vec![1]));

    let report = ImportPipeline::new(import_config(&server, dir.path(), 10), store.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.batches_written, 2);
    assert_eq!(report.records_written, 20);
    assert_eq!(report.failed_batches.len(), 1);

    let failed = &report.failed_batches[0];
    assert_eq!(failed.index, 1);
    assert_eq!(failed.records, 10);
    // Header is line 1, so codes 010..019 sit on lines 12..21
    assert_eq!((failed.first_line, failed.last_line), (12, 21));
    assert!(failed.error.contains("connection reset"));

    assert!(store.find_by_code("029").await.unwrap().is_some());
    assert!(store.find_by_code("015").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_export_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryProductStore::new());

    let err = ImportPipeline::new(import_config(&server, dir.path(), 1000), store.clone())
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Acquisition { status: 404, .. }));
    assert!(store.is_empty().await);
    assert_eq!(staged_files(dir.path()), 0);
}

#[tokio::test]
async fn test_corrupt_export_removes_staged_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not gzip at all".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryProductStore::new());

    let err = ImportPipeline::new(import_config(&server, dir.path(), 1000), store.clone())
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Io(_)));
    assert_eq!(staged_files(dir.path()), 0);
}
