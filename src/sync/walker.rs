//! Dependency-ordered traversal of an entity's relationship closure.
//!
//! Every node is upserted after the principals it references and before
//! the dependents that reference it. The only exception is a cycle made
//! purely of principal references, where the node closing the cycle is
//! written first and its reference falls back to the unresolved key.

use std::collections::{HashSet, VecDeque};

use futures::future::BoxFuture;
use identity_map::MappingStore;
use sync_core::{EntityKind, EntityRow, EntityStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::SyncError;
use super::report::SyncedEntity;
use super::upsert::Upserter;

/// State of one sync call. Never shared between calls.
#[derive(Default)]
struct Traversal {
    visited: HashSet<(EntityKind, i32)>,
    /// Nesting depth of principal resolution
    principal_depth: usize,
    /// Dependents found while resolving principals, expanded afterwards
    deferred: VecDeque<EntityRow>,
    synced: Vec<SyncedEntity>,
}

pub struct GraphWalker<'a, S, T, M> {
    source: &'a S,
    upserter: Upserter<'a, T, M>,
    cancel: &'a CancellationToken,
}

impl<'a, S, T, M> GraphWalker<'a, S, T, M>
where
    S: EntityStore,
    T: EntityStore,
    M: MappingStore,
{
    pub fn new(source: &'a S, target: &'a T, mappings: &'a M, cancel: &'a CancellationToken) -> Self {
        Self {
            source,
            upserter: Upserter::new(target, mappings),
            cancel,
        }
    }

    /// Sync `root` and everything reachable from it, returning the writes
    /// in the order they happened.
    pub async fn walk(&self, root: EntityRow) -> Result<Vec<SyncedEntity>, SyncError> {
        let mut traversal = Traversal::default();
        self.visit(root, &mut traversal).await?;
        while let Some(row) = traversal.deferred.pop_front() {
            self.visit(row, &mut traversal).await?;
        }
        Ok(traversal.synced)
    }

    fn visit<'b>(
        &'b self,
        row: EntityRow,
        traversal: &'b mut Traversal,
    ) -> BoxFuture<'b, Result<(), SyncError>> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let kind = row.kind();
            let key = row.key()?;
            if !traversal.visited.insert((kind, key)) {
                return Ok(());
            }
            debug!("Visiting {kind} {key}");

            let descriptor = kind.descriptor();

            traversal.principal_depth += 1;
            for edge in descriptor
                .relationships()
                .iter()
                .filter(|e| e.is_principal_reference())
            {
                let Some(principal_id) = row.get(edge.foreign_key).as_i32() else {
                    continue;
                };
                let principal = self
                    .source
                    .get(edge.target, principal_id)
                    .await
                    .map_err(|e| SyncError::storage(edge.target.name(), principal_id, e))?;
                match principal {
                    Some(principal) => self.visit(principal, traversal).await?,
                    None => warn!(
                        "{kind} {key} references missing {} {principal_id} in the source",
                        edge.target
                    ),
                }
            }
            traversal.principal_depth -= 1;

            let synced = self.upserter.upsert(&row).await?;
            traversal.synced.push(synced);

            let mut dependents = Vec::new();
            for edge in descriptor
                .relationships()
                .iter()
                .filter(|e| !e.is_principal_reference())
            {
                let found = self
                    .source
                    .find_dependents(edge.target, edge.foreign_key, key)
                    .await
                    .map_err(|e| SyncError::storage(kind.name(), key, e))?;
                dependents.extend(found);
            }

            if traversal.principal_depth > 0 {
                traversal.deferred.extend(dependents);
            } else {
                for dependent in dependents {
                    self.visit(dependent, traversal).await?;
                }
            }
            Ok(())
        })
    }
}
