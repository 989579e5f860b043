//! HTTP surface: the ingest endpoint, a scrape endpoint for the current
//! snapshot, and a health check.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use hyper::Server;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::batch::split_batch;
use crate::error::ExporterError;
use crate::mapper::map_record;
use crate::push::PushClient;
use crate::registry::{MetricSink, TenzirRegistry};
use crate::telemetry;

/// Shared server state. The registry is owned here and injected into the
/// request path; the push client is absent when no gateway is configured.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<TenzirRegistry>>,
    pub push: Option<Arc<PushClient>>,
    /// Serializes render+push across batches. Without it a later batch
    /// could render a newer snapshot and reach the gateway before an
    /// earlier one, reverting the gateway to the stale snapshot.
    pub push_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(push: Option<PushClient>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(TenzirRegistry::new())),
            push: push.map(Arc::new),
            push_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, TenzirRegistry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Per-batch response: `error` is 0 unless the batch itself failed
/// (parse or push); skipped records only show up in `records - matched`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestSummary {
    pub error: u8,
    pub records: usize,
    pub matched: usize,
}

impl IngestSummary {
    fn ok(records: usize, matched: usize) -> Self {
        Self { error: 0, records, matched }
    }

    fn failed(records: usize, matched: usize) -> Self {
        Self { error: 1, records, matched }
    }
}

/// Ingest one batch of concatenated telemetry records.
async fn ingest(State(state): State<AppState>, body: String) -> impl IntoResponse {
    telemetry::record_batch_received();

    let records = match split_batch(&body) {
        Ok(records) => records,
        Err(e) => {
            warn!("Rejecting batch: {}", e);
            telemetry::record_batch_parse_failure();
            return (StatusCode::BAD_REQUEST, Json(IngestSummary::failed(0, 0)));
        }
    };
    let total = records.len();

    // Map every record before touching the registry; a record either
    // contributes its full update list or nothing at all.
    let mut mapped = Vec::new();
    for record in &records {
        match map_record(record) {
            Ok(updates) => {
                telemetry::record_record_mapped();
                mapped.push(updates);
            }
            Err(ExporterError::UnrecognizedShape) => {
                telemetry::record_record_unrecognized();
                warn!(
                    "Skipping record matching no known shape (keys: {:?})",
                    record.keys().collect::<Vec<_>>()
                );
            }
            Err(ExporterError::MissingField { shape, field }) => {
                telemetry::record_record_missing_field();
                warn!("Skipping {} record with missing or invalid field '{}'", shape, field);
            }
            Err(e) => {
                telemetry::record_record_missing_field();
                warn!("Skipping record: {}", e);
            }
        }
    }
    let matched = mapped.len();

    // When a gateway is configured, render and push form one critical
    // section: the tokio mutex is fair, so batches reach the gateway in
    // the order they got here and a later snapshot cannot be overtaken
    // by an earlier, staler one. The std registry guard itself is never
    // held across the await.
    let push_guard = match &state.push {
        Some(_) => Some(state.push_lock.lock().await),
        None => None,
    };

    let snapshot = {
        let mut registry = state.lock_registry();
        for updates in mapped {
            for update in updates {
                registry.accept(update);
            }
        }
        state.push.as_ref().map(|_| registry.render())
    };

    if let (Some(push), Some(snapshot)) = (&state.push, snapshot) {
        if let Err(e) = push.push(snapshot).await {
            error!("Pushgateway push failed: {}", e);
            telemetry::record_push_failure();
            return (StatusCode::BAD_GATEWAY, Json(IngestSummary::failed(total, matched)));
        }
        telemetry::record_push_success();
    }
    drop(push_guard);

    info!("Batch processed: {} records, {} matched", total, matched);
    (StatusCode::OK, Json(IngestSummary::ok(total, matched)))
}

/// Current registry snapshot plus the exporter's own counters, in
/// Prometheus text format.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = state.lock_registry().render();
    if let Some(own) = telemetry::render_self_metrics() {
        body.push_str(&own);
    }
    ([("Content-Type", "text/plain; version=0.0.4")], body)
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tenzir-exporter",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/", post(ingest))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<(), hyper::Error> {
    let app = app_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 Tenzir exporter listening on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📈 Snapshot:     http://localhost:{port}/metrics");

    Server::bind(&addr).serve(app.into_make_service()).await
}
