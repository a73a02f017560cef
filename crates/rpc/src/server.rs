use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use nfid_registry::{NfidRegistry, RegistryError};
use serde::Serialize;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::nfid::{
    handle_associated, handle_burn, handle_check, handle_events, handle_find, handle_mint,
};

/// Default per-request deadline applied by the router.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NfidRegistry>,
    pub node_id: String,
    pub start_time: Instant,
    pub req_count: Arc<AtomicUsize>,
    pub metrics: Option<PrometheusHandle>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(registry: Arc<NfidRegistry>, node_id: impl Into<String>) -> Self {
        Self {
            registry,
            node_id: node_id.into(),
            start_time: Instant::now(),
            req_count: Arc::new(AtomicUsize::new(0)),
            metrics: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub(crate) fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    node_id: String,
    uptime_secs: u64,
    active_identities: usize,
    last_event_seq: u64,
    state_root: String,
    req_total: u64,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    node_id: String,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub(crate) fn new<S: Into<String>>(status: StatusCode, code: &'static str, message: S) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request<S: Into<String>>(code: &'static str, message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::InvalidAddress { .. } | RegistryError::ZeroIdentity => {
                StatusCode::BAD_REQUEST
            }
            RegistryError::NotMinted { .. } => StatusCode::NOT_FOUND,
            RegistryError::AlreadyMinted { .. } | RegistryError::Mismatch { .. } => {
                StatusCode::CONFLICT
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
            code: self.code,
        });
        (self.status, payload).into_response()
    }
}

/// Serve the RPC router on `addr` until `shutdown` resolves.
pub async fn start_server<F>(state: AppState, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(Arc::new(state));
    let listener = bind_listener(addr).await?;
    info!("NFID RPC listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("RPC server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind RPC listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind RPC listener on {addr}"))
    }
}

pub fn build_router(state: SharedState) -> Router {
    let timeout = state.request_timeout;

    Router::new()
        .route("/health", get(handle_health))
        .route("/version", get(handle_version))
        .route("/metrics", get(handle_metrics))
        .route("/nfid/mint", post(handle_mint))
        .route("/nfid/burn", post(handle_burn))
        .route("/nfid/:address", get(handle_find))
        .route("/nfid/:address/check", get(handle_check))
        .route("/nfid/:address/associated/:nfid", get(handle_associated))
        .route("/events", get(handle_events))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("RPC request timed out");
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "timeout", "request timed out")
    } else {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            format!("unhandled internal error: {err}"),
        )
    }
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let req_total = state.record_request();
    let registry = &state.registry;

    Json(HealthResponse {
        status: "ok",
        node_id: state.node_id.clone(),
        uptime_secs: state.uptime_seconds(),
        active_identities: registry.active_count(),
        last_event_seq: registry.last_event_seq(),
        state_root: hex::encode(registry.state_root()),
        req_total,
    })
}

async fn handle_version(State(state): State<SharedState>) -> Json<VersionResponse> {
    state.record_request();
    Json(VersionResponse {
        node_id: state.node_id.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let req_total = state.record_request();

    let body = if let Some(handle) = &state.metrics {
        handle.render()
    } else {
        let uptime = state.uptime_seconds();
        let active = state.registry.active_count();
        let last_seq = state.registry.last_event_seq();

        let mut metrics =
            "# HELP nfid_http_requests_total Total number of RPC requests handled\n".to_string();
        metrics.push_str("# TYPE nfid_http_requests_total counter\n");
        metrics.push_str(&format!("nfid_http_requests_total {req_total}\n"));
        metrics.push_str("# HELP nfid_uptime_seconds Uptime of the node in seconds\n");
        metrics.push_str("# TYPE nfid_uptime_seconds gauge\n");
        metrics.push_str(&format!("nfid_uptime_seconds {uptime}\n"));
        metrics.push_str("# HELP nfid_active_identities Addresses currently holding an NFID\n");
        metrics.push_str("# TYPE nfid_active_identities gauge\n");
        metrics.push_str(&format!("nfid_active_identities {active}\n"));
        metrics.push_str("# HELP nfid_last_event_seq Sequence number of the latest transition\n");
        metrics.push_str("# TYPE nfid_last_event_seq gauge\n");
        metrics.push_str(&format!("nfid_last_event_seq {last_seq}\n"));
        metrics
    };

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
