//! HTTP surface over the sync engine.
//!
//! - `POST /sync/:entity/:id` - sync one root entity, responds with the report
//! - `POST /seed` - reset all stores and load the demo data
//! - `GET /health`
//!
//! Sync responses are always `200 OK`; the outcome is in the report's
//! `status` field.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use identity_map::MappingStore;
use serde_json::json;
use sync_core::EntityStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::seed::seed_demo_data;
use crate::sync::{SyncEngine, SyncReport};

pub struct AppState<S, T, M> {
    engine: Arc<SyncEngine<S, T, M>>,
    shutdown: CancellationToken,
}

impl<S, T, M> Clone for AppState<S, T, M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Build the router. Cancelling `shutdown` cancels in-flight syncs between nodes.
pub fn router<S, T, M>(engine: Arc<SyncEngine<S, T, M>>, shutdown: CancellationToken) -> Router
where
    S: EntityStore + 'static,
    T: EntityStore + 'static,
    M: MappingStore + 'static,
{
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/sync/:entity/:id", post(sync_entity::<S, T, M>))
        .route("/seed", post(seed::<S, T, M>))
        .with_state(AppState { engine, shutdown })
}

/// Serve until `shutdown` is cancelled.
pub async fn serve<S, T, M>(
    listener: TcpListener,
    engine: Arc<SyncEngine<S, T, M>>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    S: EntityStore + 'static,
    T: EntityStore + 'static,
    M: MappingStore + 'static,
{
    info!("Listening on {}", listener.local_addr()?);
    let app = router(engine, shutdown.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn sync_entity<S, T, M>(
    State(state): State<AppState<S, T, M>>,
    Path((entity, id)): Path<(String, i32)>,
) -> Response
where
    S: EntityStore + 'static,
    T: EntityStore + 'static,
    M: MappingStore + 'static,
{
    // Detached from the request so only `cancel` can stop the walk.
    let cancel = state.shutdown.child_token();
    let engine = state.engine.clone();
    let name = entity.clone();
    let task = tokio::spawn(async move { engine.sync(&name, id, &cancel).await });

    let report = match task.await {
        Ok(report) => report,
        Err(e) => {
            error!("Sync task for {entity} {id} failed: {e}");
            SyncReport::error(entity, id, "Sync task failed")
        }
    };
    Json(report).into_response()
}

async fn seed<S, T, M>(State(state): State<AppState<S, T, M>>) -> Response
where
    S: EntityStore + 'static,
    T: EntityStore + 'static,
    M: MappingStore + 'static,
{
    let engine = state.engine.clone();
    let task = tokio::spawn(async move {
        seed_demo_data(engine.source(), engine.target(), engine.mappings()).await
    });

    let seeded = task
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result);
    match seeded {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            error!("Seeding failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response()
        }
    }
}
