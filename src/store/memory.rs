//! In-process fact store for development and tests.

use crate::error::StoreError;
use crate::store::{FactSnapshot, FactStore};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Process-local fact base. Not shared across processes.
#[derive(Default)]
pub struct InMemoryFactStore {
    facts: RwLock<FactSnapshot>,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with initial facts.
    pub fn with_facts<I, K, V>(facts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let facts = facts
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            facts: RwLock::new(facts),
        }
    }

    pub fn get(&self, predicate: &str) -> Option<String> {
        self.facts.read().get(predicate).cloned()
    }

    pub fn len(&self) -> usize {
        self.facts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.read().is_empty()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    async fn write(&self, predicate: &str, value: &str) -> Result<(), StoreError> {
        self.facts
            .write()
            .insert(predicate.to_string(), value.to_string());
        Ok(())
    }

    async fn read_all(&self) -> Result<FactSnapshot, StoreError> {
        Ok(self.facts.read().clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
