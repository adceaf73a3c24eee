//! Fact Store
//!
//! Thin accessor over the shared fact base: a flat predicate -> string table with
//! last-writer-wins semantics and no versioning. The engine never caches it; every
//! read goes to the backing store.

pub mod memory;
pub mod persistence;
pub mod redis_store;

pub use memory::InMemoryFactStore;
pub use persistence::SledFactStore;
pub use redis_store::RedisFactStore;

use crate::error::StoreError;
use crate::types::fact_string;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Default name of the shared fact table.
pub const DEFAULT_FACT_BASE_KEY: &str = "fact-base";

/// Full fact base contents at one read.
pub type FactSnapshot = BTreeMap<String, String>;

/// Fact store interface
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Overwrite one predicate.
    async fn write(&self, predicate: &str, value: &str) -> Result<(), StoreError>;

    /// Read every predicate currently stored.
    async fn read_all(&self) -> Result<FactSnapshot, StoreError>;

    /// Flatten a JSON value with [`fact_string`] and write it.
    async fn write_value(&self, predicate: &str, value: &Value) -> Result<(), StoreError> {
        self.write(predicate, &fact_string(value)).await
    }

    /// Backend label for logs.
    fn backend_name(&self) -> &'static str;
}
