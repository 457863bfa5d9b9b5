//! Graph-aware sync of one root entity.
//!
//! # Design Overview
//!
//! A call names an entity type and a source key. The engine:
//! 1. Resolves the type against the entity catalog
//! 2. Loads the root row from the source; a missing root ends the call with `not_found`
//! 3. Walks the relationship graph, principals before dependents, visiting each node once
//! 4. Writes every node into the target through the upsert engine, translating
//!    foreign keys through the identity mapping
//!
//! Re-running the same call converges: mapped rows are updated in place
//! instead of inserted again.
//!
//! # Upsert Decisions
//!
//! | Mapping | Target row              | Action              |
//! |---------|-------------------------|---------------------|
//! | yes     | found at mapped key     | `updated`           |
//! | yes     | missing                 | `updated` (re-created at mapped key) |
//! | no      | source key taken        | `inserted_identity` |
//! | no      | source key free         | `inserted_with_id`  |

mod engine;
mod error;
mod report;
mod upsert;
mod walker;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use report::{SyncAction, SyncReport, SyncStatus, SyncedEntity};
pub use upsert::{Upserter, UNRESOLVED_FOREIGN_KEY};
pub use walker::GraphWalker;
