//! Durable key-value storage shared by the session store and the profile
//! and meal-plan records.
//!
//! Every record is read whole, mutated in memory and written back whole.
//! There are no partial updates and no transactions, so two concurrent
//! writers for the same key resolve as last-write-wins.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::StorageError;

/// Key-value storage handle injected into every store in the crate
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or overwrite the value stored under `key`
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing an absent key is a no-op
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage, used by tests and local runs without a database
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// PostgreSQL-backed storage over a single `bot_properties` table
#[derive(Debug, Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Open a connection pool to the configured database
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    info!(max_connections, "Connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<(), StorageError> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bot_properties (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM bot_properties WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO bot_properties (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(key, bytes = value.len(), "Property stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM bot_properties WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key, rows = result.rows_affected(), "Property deleted");
        Ok(())
    }
}
