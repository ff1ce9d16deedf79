use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use tarmac_core::types::{AircraftId, LeaseId, RequestResult};
use tarmac_core::{Broker, BrokerConfig, BrokerError};

use crate::handlers::*;

const MAX_BODY_BYTES: usize = 4 * 1024;

/// How long an expired lease is remembered, so a late perform still gets
/// `EXPIRED_TOKEN` rather than `404`.
const EXPIRED_RETENTION: Duration = Duration::from_secs(60);

pub struct ServerState {
    pub broker: Broker,
    /// Leases granted over HTTP, waiting to be performed
    pub leases: Mutex<HashMap<LeaseId, IssuedLease>>,
    pub api_key: Option<String>,
}

impl ServerState {
    pub fn new(broker: Broker, api_key: Option<String>) -> Self {
        Self {
            broker,
            leases: Mutex::new(HashMap::new()),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

pub type AppState = Arc<ServerState>;

pub async fn run(
    host: &str,
    port: u16,
    config: BrokerConfig,
    api_key: Option<String>,
) -> Result<(), String> {
    let broker = Broker::new(config).map_err(|e| e.to_string())?;
    let state: AppState = Arc::new(ServerState::new(broker, api_key));

    if state.api_key.is_some() {
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No TARMAC_API_KEY set — server is open (dev mode)");
    }

    let app = router(state);
    let addr = format!("{}:{}", host, port);
    tracing::info!("🛫 Tarmac broker starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health is always open (no auth)
        .route("/health", get(health))
        .route("/pool", get(pool))
        .route("/stats", get(stats))
        .route("/landings", post(request_landing))
        .route("/takeoffs", post(request_take_off))
        .route("/leases", get(list_leases))
        .route("/leases/{id}/perform", post(perform_lease))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Auth Middleware ────────────────────────────────────────────────────────

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (dev mode)
    let Some(expected_key) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token == expected_key {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("🚫 Unauthorized request to {}", request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

type JsonReply = (StatusCode, Json<serde_json::Value>);

fn bad_request(error: String) -> JsonReply {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "error": error })),
    )
}

fn broker_failure(error: BrokerError) -> JsonReply {
    tracing::error!("Broker fault: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "success": false, "error": error.to_string() })),
    )
}

/// Forgets leases that expired more than `EXPIRED_RETENTION` ago.
fn prune(leases: &mut HashMap<LeaseId, IssuedLease>) {
    let now = Instant::now();
    leases.retain(|_, lease| !lease.is_resolved() || now < lease.expires_at() + EXPIRED_RETENTION);
}

async fn grant<L: Into<IssuedLease>>(
    state: &ServerState,
    aircraft: &AircraftId,
    result: Result<RequestResult<L>, BrokerError>,
) -> JsonReply {
    match result {
        Ok(RequestResult::Proceed(lease)) => {
            let lease: IssuedLease = lease.into();
            let info = lease.info();
            tracing::info!(
                aircraft = %aircraft,
                lease_id = %info.id,
                kind = %info.kind,
                "Lease granted"
            );

            let mut leases = state.leases.lock().await;
            prune(&mut leases);
            leases.insert(lease.id().clone(), lease);

            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "success": true, "data": info })),
            )
        }
        Ok(RequestResult::Hold) => {
            tracing::info!(aircraft = %aircraft, "Request held");
            (
                StatusCode::CONFLICT,
                Json(serde_json::json!({ "success": false, "outcome": "HOLD" })),
            )
        }
        Err(e) => broker_failure(e),
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> JsonReply {
    let pool = match state.broker.snapshot() {
        Ok(pool) => pool,
        Err(e) => return broker_failure(e),
    };
    let mut leases = state.leases.lock().await;
    prune(&mut leases);

    (
        StatusCode::OK,
        Json(serde_json::json!(ApiResponse::ok(HealthResponse {
            status: "ok".to_string(),
            outstanding_leases: leases.values().filter(|l| !l.is_resolved()).count(),
            pool,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }))),
    )
}

async fn pool(State(state): State<AppState>) -> JsonReply {
    let view = state.broker.snapshot().and_then(|counts| {
        Ok(PoolResponse {
            counts,
            runways: state.broker.runways()?,
            parking_stands: state.broker.parking_stands()?,
        })
    });
    match view {
        Ok(view) => (StatusCode::OK, Json(serde_json::json!(ApiResponse::ok(view)))),
        Err(e) => broker_failure(e),
    }
}

async fn stats(State(state): State<AppState>) -> JsonReply {
    match state.broker.stats() {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(ApiResponse::ok(stats)))),
        Err(e) => broker_failure(e),
    }
}

async fn request_landing(
    State(state): State<AppState>,
    Json(req): Json<LeaseRequest>,
) -> JsonReply {
    if let Err(e) = req.validate() {
        return bad_request(e);
    }
    let aircraft = AircraftId::from(req.aircraft_id.trim());
    let result = state.broker.request_landing(&aircraft);
    grant(&state, &aircraft, result).await
}

async fn request_take_off(
    State(state): State<AppState>,
    Json(req): Json<LeaseRequest>,
) -> JsonReply {
    if let Err(e) = req.validate() {
        return bad_request(e);
    }
    let aircraft = AircraftId::from(req.aircraft_id.trim());
    let result = state.broker.request_take_off(&aircraft);
    grant(&state, &aircraft, result).await
}

async fn list_leases(State(state): State<AppState>) -> JsonReply {
    let mut leases = state.leases.lock().await;
    prune(&mut leases);
    let infos: Vec<_> = leases
        .values()
        .filter(|lease| !lease.is_resolved())
        .map(|lease| lease.info())
        .collect();
    (StatusCode::OK, Json(serde_json::json!(ApiResponse::ok(infos))))
}

async fn perform_lease(State(state): State<AppState>, Path(id): Path<String>) -> JsonReply {
    let lease_id = LeaseId::from(id);
    let Some(lease) = state.leases.lock().await.remove(&lease_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ApiResponse::<()>::err(format!(
                "Lease '{}' not found",
                lease_id
            )))),
        );
    };

    match lease.perform(&state.broker) {
        Ok(outcome) => {
            tracing::info!(lease_id = %lease_id, outcome = %outcome, "Lease performed");
            (
                StatusCode::OK,
                Json(serde_json::json!(ApiResponse::ok(PerformResponse {
                    lease_id,
                    outcome,
                }))),
            )
        }
        Err(e) => broker_failure(e),
    }
}
