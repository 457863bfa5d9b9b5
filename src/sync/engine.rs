//! Entry point of a sync call.

use identity_map::MappingStore;
use sync_core::{EntityKind, EntityStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::error::SyncError;
use super::report::SyncReport;
use super::walker::GraphWalker;

/// Synchronizes one root entity and its relationship closure from `source`
/// into `target`, keeping `mappings` current.
pub struct SyncEngine<S, T, M> {
    source: S,
    target: T,
    mappings: M,
}

impl<S, T, M> SyncEngine<S, T, M>
where
    S: EntityStore,
    T: EntityStore,
    M: MappingStore,
{
    pub fn new(source: S, target: T, mappings: M) -> Self {
        Self {
            source,
            target,
            mappings,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn mappings(&self) -> &M {
        &self.mappings
    }

    /// Sync `source_id` of `entity_name`. Never fails: errors are reported
    /// with `status: error` and their top-level message.
    pub async fn sync(
        &self,
        entity_name: &str,
        source_id: i32,
        cancel: &CancellationToken,
    ) -> SyncReport {
        match self.try_sync(entity_name, source_id, cancel).await {
            Ok(report) => report,
            Err(e) => {
                error!("Sync of {entity_name} {source_id} failed: {}", e.chain());
                SyncReport::error(entity_name, source_id, e.to_string())
            }
        }
    }

    /// Same as [`SyncEngine::sync`], with failures returned as [`SyncError`].
    ///
    /// A missing root is not an error and yields a `not_found` report.
    pub async fn try_sync(
        &self,
        entity_name: &str,
        source_id: i32,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let kind = EntityKind::resolve(entity_name)?;
        let descriptor = kind.descriptor();
        descriptor.primary_key()?;

        let root = self
            .source
            .get(kind, source_id)
            .await
            .map_err(|e| SyncError::storage(descriptor.name, source_id, e))?;
        let Some(root) = root else {
            info!("{kind} {source_id} not found in source");
            return Ok(SyncReport::not_found(descriptor.name, source_id));
        };

        info!(
            "Syncing {kind} {source_id} in domain {}",
            self.mappings.domain()
        );
        let walker = GraphWalker::new(&self.source, &self.target, &self.mappings, cancel);
        let synced = walker.walk(root).await?;
        info!("Synced {kind} {source_id}: {} entities written", synced.len());

        Ok(SyncReport::ok(descriptor.name, source_id, synced))
    }
}
