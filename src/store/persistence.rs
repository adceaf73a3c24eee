//! Sled-backed fact store for single-host deployments

use crate::error::StoreError;
use crate::store::{FactSnapshot, FactStore};
use async_trait::async_trait;
use std::path::Path;

/// Sled-based implementation of FactStore
///
/// The fact base lives in its own sled tree named after the fact base key, so a
/// database can host more than one fact base.
pub struct SledFactStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledFactStore {
    /// Open (or create) a sled database at `path` and use the tree `fact_base_key`.
    pub fn new<P: AsRef<Path>>(path: P, fact_base_key: &str) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db, fact_base_key)
    }

    /// Use an already opened database.
    pub fn from_db(db: sled::Db, fact_base_key: &str) -> Result<Self, StoreError> {
        let tree = db.open_tree(fact_base_key)?;
        Ok(Self { db, tree })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }
}

#[async_trait]
impl FactStore for SledFactStore {
    async fn write(&self, predicate: &str, value: &str) -> Result<(), StoreError> {
        self.tree.insert(predicate.as_bytes(), value.as_bytes())?;
        self.tree.flush_async().await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<FactSnapshot, StoreError> {
        let mut snapshot = FactSnapshot::new();
        for item in self.tree.iter() {
            let (key, value) = item?;
            let predicate = String::from_utf8(key.to_vec()).map_err(|e| {
                StoreError::InvalidData(format!("Predicate is not valid UTF-8: {}", e))
            })?;
            let value = String::from_utf8(value.to_vec()).map_err(|e| {
                StoreError::InvalidData(format!(
                    "Value of '{}' is not valid UTF-8: {}",
                    predicate, e
                ))
            })?;
            snapshot.insert(predicate, value);
        }
        Ok(snapshot)
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
