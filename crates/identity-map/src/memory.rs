//! In-process mapping storage implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::MappingStore;
use crate::IdentityMapping;

/// `(domain, entity_name, source_id)`
type MappingKey = (String, String, i32);

/// In-memory implementation of MappingStore trait.
///
/// Clones, and stores derived with [`MemoryMappingStore::scoped`], share the
/// same rows.
#[derive(Debug, Clone)]
pub struct MemoryMappingStore {
    domain: String,
    rows: Arc<Mutex<BTreeMap<MappingKey, i32>>>,
}

impl MemoryMappingStore {
    /// Create an empty store for the given domain.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            rows: Arc::default(),
        }
    }

    /// A store over the same rows, scoped to another domain.
    pub fn scoped(&self, domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            rows: Arc::clone(&self.rows),
        }
    }

    fn key(&self, entity_name: &str, source_id: i32) -> MappingKey {
        (self.domain.clone(), entity_name.to_string(), source_id)
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn lookup(&self, entity_name: &str, source_id: i32) -> Result<Option<i32>> {
        let rows = self.rows.lock().await;
        Ok(rows.get(&self.key(entity_name, source_id)).copied())
    }

    async fn upsert(&self, entity_name: &str, source_id: i32, target_id: i32) -> Result<()> {
        let mut rows = self.rows.lock().await;
        rows.insert(self.key(entity_name, source_id), target_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<IdentityMapping>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|((domain, _, _), _)| *domain == self.domain)
            .map(|((domain, entity, source_id), target_id)| {
                IdentityMapping::new(entity.as_str(), *source_id, *target_id, domain.as_str())
            })
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        let mut rows = self.rows.lock().await;
        rows.retain(|(domain, _, _), _| *domain != self.domain);
        Ok(())
    }
}
