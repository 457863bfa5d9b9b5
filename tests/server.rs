//! HTTP surface tests against in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use graph_sync::server::router;
use graph_sync::{SeedSummary, SyncAction, SyncEngine, SyncReport, SyncStatus};
use identity_map::{IdentityMapping, MappingStore, MemoryMappingStore};
use rust_decimal::Decimal;
use sync_core::{EntityKind, EntityRow, EntityStore, MemoryStore};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn app(shutdown: CancellationToken) -> Router {
    let engine = SyncEngine::new(
        MemoryStore::new(),
        MemoryStore::new(),
        MemoryMappingStore::new("SalesDb"),
    );
    router(Arc::new(engine), shutdown)
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request(method, uri)).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health() {
    let app = app(CancellationToken::new());
    let (status, body) = call(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_seed_then_sync() {
    let app = app(CancellationToken::new());

    let (status, body) = call(&app, Method::POST, "/seed").await;
    assert_eq!(status, StatusCode::OK);
    let summary: SeedSummary = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary.mapping_rows, 9);

    let (status, body) = call(&app, Method::POST, "/sync/Customer/2").await;
    assert_eq!(status, StatusCode::OK);
    let report: SyncReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.status, SyncStatus::Ok);
    assert_eq!(report.entity, "Customer");
    assert!(!report.synced().is_empty());
}

#[tokio::test]
async fn test_sync_outcomes_are_reported_in_body() {
    let app = app(CancellationToken::new());

    let (status, body) = call(&app, Method::POST, "/sync/Customer/99999").await;
    assert_eq!(status, StatusCode::OK);
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["status"], "not_found");
    assert_eq!(report["sourceId"], 99999);

    let (_, body) = call(&app, Method::POST, "/sync/Bogus/1").await;
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["status"], "error");
    assert_eq!(report["message"], "Entity 'Bogus' not found in source model.");
}

#[tokio::test]
async fn test_shutdown_cancels_syncs() {
    let shutdown = CancellationToken::new();
    let app = app(shutdown.clone());
    call(&app, Method::POST, "/seed").await;

    shutdown.cancel();
    let (_, body) = call(&app, Method::POST, "/sync/Customer/1").await;
    let report: SyncReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.status, SyncStatus::Error);
    assert_eq!(report.message.as_deref(), Some("Sync cancelled"));
}

/// Mapping store that takes a while to persist each mapping.
struct SlowMappings {
    inner: MemoryMappingStore,
    delay: Duration,
}

#[async_trait]
impl MappingStore for SlowMappings {
    fn domain(&self) -> &str {
        self.inner.domain()
    }

    async fn lookup(&self, entity_name: &str, source_id: i32) -> Result<Option<i32>> {
        self.inner.lookup(entity_name, source_id).await
    }

    async fn upsert(&self, entity_name: &str, source_id: i32, target_id: i32) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert(entity_name, source_id, target_id).await
    }

    async fn list(&self) -> Result<Vec<IdentityMapping>> {
        self.inner.list().await
    }

    async fn reset(&self) -> Result<()> {
        self.inner.reset().await
    }
}

#[tokio::test]
async fn test_client_disconnect_does_not_interrupt_sync() {
    let source = MemoryStore::new();
    let product = EntityRow::new(EntityKind::Product)
        .with("id", 7)
        .with("sku", "SKU-007")
        .with("name", "Product 7")
        .with("price", Decimal::from(17));
    source.insert_with_key(&product).await.unwrap();

    let mappings = SlowMappings {
        inner: MemoryMappingStore::new("SalesDb"),
        delay: Duration::from_millis(200),
    };
    let engine = Arc::new(SyncEngine::new(source, MemoryStore::new(), mappings));
    let app = router(engine.clone(), CancellationToken::new());

    // Drop the request while the mapping write is in flight.
    let in_flight = tokio::spawn(app.clone().oneshot(request(Method::POST, "/sync/Product/7")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    in_flight.abort();
    assert!(in_flight.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(engine.target().count(EntityKind::Product).await.unwrap(), 1);
    assert_eq!(engine.mappings().lookup("Product", 7).await.unwrap(), Some(7));

    let (status, body) = call(&app, Method::POST, "/sync/Product/7").await;
    assert_eq!(status, StatusCode::OK);
    let report: SyncReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.status, SyncStatus::Ok);
    assert_eq!(report.synced()[0].action, SyncAction::Updated);
    assert_eq!(engine.target().count(EntityKind::Product).await.unwrap(), 1);
}
