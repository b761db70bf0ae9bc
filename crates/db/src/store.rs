//! The recommendation table and its access trait. One row per SKU with a
//! nullable serialized recommendation list; rows for vanished products are
//! deleted rather than nulled.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::Row;
use thiserror::Error;
use tokio::sync::RwLock;

use reccy_core::config::is_valid_table_name;

use crate::DbPool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not connect to the recommendation store at `{url}`: {source}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("recommendation store query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("`{0}` is not a valid recommendation table name")]
    InvalidTableName(String),
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Loads the full remote state as a SKU → serialized payload mapping.
    /// A NULL payload reads as the empty string.
    async fn load_all(&self) -> Result<BTreeMap<String, String>, StoreError>;

    async fn upsert(&self, sku: &str, payload: &str) -> Result<(), StoreError>;

    async fn delete(&self, sku: &str) -> Result<(), StoreError>;
}

pub struct SqlRecommendationStore {
    pool: DbPool,
    table_name: String,
}

impl SqlRecommendationStore {
    /// Table names cannot be bound as SQL parameters, so the name is checked
    /// against a strict identifier shape before it ever reaches a query.
    pub fn new(pool: DbPool, table_name: &str) -> Result<Self, StoreError> {
        if !is_valid_table_name(table_name) {
            return Err(StoreError::InvalidTableName(table_name.to_owned()));
        }
        Ok(Self { pool, table_name: table_name.to_owned() })
    }
}

#[async_trait]
impl RecommendationStore for SqlRecommendationStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 sku TEXT NOT NULL PRIMARY KEY,
                 recommendations TEXT DEFAULT NULL
             )",
            self.table_name
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let rows =
            sqlx::query(&format!("SELECT sku, recommendations FROM {}", self.table_name))
                .fetch_all(&self.pool)
                .await?;

        let mut state = BTreeMap::new();
        for row in rows {
            let sku: String = row.try_get("sku")?;
            let payload: Option<String> = row.try_get("recommendations")?;
            state.insert(sku, payload.unwrap_or_default());
        }
        Ok(state)
    }

    async fn upsert(&self, sku: &str, payload: &str) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO {} (sku, recommendations) VALUES (?, ?)
             ON CONFLICT(sku) DO UPDATE SET recommendations = excluded.recommendations",
            self.table_name
        ))
        .bind(sku)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, sku: &str) -> Result<(), StoreError> {
        sqlx::query(&format!("DELETE FROM {} WHERE sku = ?", self.table_name))
            .bind(sku)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory double for tests and dry runs.
#[derive(Default)]
pub struct InMemoryRecommendationStore {
    state: RwLock<BTreeMap<String, String>>,
}

impl InMemoryRecommendationStore {
    pub fn with_state(state: BTreeMap<String, String>) -> Self {
        Self { state: RwLock::new(state) }
    }

    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self.state.read().await.clone())
    }

    async fn upsert(&self, sku: &str, payload: &str) -> Result<(), StoreError> {
        self.state.write().await.insert(sku.to_owned(), payload.to_owned());
        Ok(())
    }

    async fn delete(&self, sku: &str) -> Result<(), StoreError> {
        self.state.write().await.remove(sku);
        Ok(())
    }
}
