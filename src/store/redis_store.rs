//! Redis hash-backed fact store shared by every engine and planner instance.

use crate::error::StoreError;
use crate::store::{FactSnapshot, FactStore};
use async_trait::async_trait;
use redis::AsyncCommands;

/// Fact base stored as a single Redis hash (`HSET` / `HGETALL`).
pub struct RedisFactStore {
    client: redis::Client,
    hash_key: String,
}

impl RedisFactStore {
    /// Create a store from a connection URL. Connections are opened lazily per call.
    pub fn new(connection_url: &str, hash_key: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            hash_key: hash_key.into(),
        })
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl FactStore for RedisFactStore {
    async fn write(&self, predicate: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(&self.hash_key, predicate, value)
            .await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<FactSnapshot, StoreError> {
        let mut conn = self.connection().await?;
        let snapshot: FactSnapshot = conn.hgetall(&self.hash_key).await?;
        Ok(snapshot)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
