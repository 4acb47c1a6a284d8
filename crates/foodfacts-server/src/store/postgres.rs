//! PostgreSQL product store
//!
//! Documents live in `products.document` (JSONB). Text search runs against
//! the generated `search_vector` column; query terms are OR-ed so a product
//! matches when any term does, and rows are ranked with `ts_rank`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{dedupe_last_wins, ProductStore, ScoredProduct, SearchPage, StoreResult};
use crate::config::DatabaseConfig;
use crate::db;
use crate::ingest::ProductRecord;

/// `plainto_tsquery` AND-s its terms; swapping the operator gives any-term matching.
const SEARCH_QUERY_CTE: &str = "WITH q AS (\
     SELECT replace(plainto_tsquery('english', $1)::text, ' & ', ' | ')::tsquery AS query\
     )";

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Open a pool and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = db::create_pool(config).await?;
        if let Err(e) = db::run_migrations(&pool).await {
            pool.close().await;
            return Err(e.into());
        }
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[tracing::instrument(skip(self, records), fields(records = records.len()))]
    async fn upsert_batch(&self, records: &[ProductRecord]) -> StoreResult<u64> {
        let unique = dedupe_last_wins(records);
        if unique.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO products (code, document) ");

        builder.push_values(unique.iter(), |mut b, record| {
            b.push_bind(record.code()).push_bind(record.to_document());
        });

        builder.push(
            " ON CONFLICT (code) DO UPDATE SET \
             document = EXCLUDED.document, \
             updated_at = NOW()",
        );

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Value>> {
        let document = sqlx::query_scalar::<_, Value>(
            "SELECT document FROM products WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, text: &str, skip: u64, limit: u64) -> StoreResult<SearchPage> {
        let total: i64 = sqlx::query_scalar(&format!(
            "{SEARCH_QUERY_CTE} \
             SELECT COUNT(*) FROM products p, q \
             WHERE p.search_vector @@ q.query"
        ))
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        if total == 0 {
            return Ok(SearchPage::default());
        }

        let rows: Vec<(Value, f64)> = sqlx::query_as(&format!(
            "{SEARCH_QUERY_CTE} \
             SELECT p.document, ts_rank(p.search_vector, q.query)::float8 AS score \
             FROM products p, q \
             WHERE p.search_vector @@ q.query \
             ORDER BY score DESC, p.code \
             LIMIT $2 OFFSET $3"
        ))
        .bind(text)
        .bind(to_i64(limit))
        .bind(to_i64(skip))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|(document, score)| ScoredProduct { document, score })
            .collect();

        Ok(SearchPage {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        db::health_check(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Database pool closed");
    }
}
