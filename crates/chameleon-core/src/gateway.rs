//! # Gateway Router
//!
//! The single public entry point. Every inbound request resolves its
//! path against the current namespace snapshot: hits are forwarded
//! verbatim to the active node's mutated path, misses go to the
//! deception layer and never reach any backend.
//!
//! ## Design
//!
//! The handler takes exactly one snapshot load per request, so the
//! mapping lookup and the active-node read can never interleave with a
//! mutation swap. Forwarding uses a bounded per-attempt timeout and a
//! small fixed number of transport-level retries; when those are
//! exhausted the client gets a generic upstream-unavailable response,
//! never the decoy. A real backend outage must remain distinguishable
//! in principle from an intrusion.
//!
//! ## Security Notes
//!
//! - The miss path never forwards anywhere; the hit path never serves
//!   the decoy.
//! - Hop-by-hop headers (`host`, `content-length`) are stripped before
//!   forwarding; everything else passes through untouched.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use chameleon_mutator::Method;
use chameleon_trap::DeceptionLayer;

use crate::config::GatewayConfig;
use crate::error::{ChameleonError, Result};
use crate::state::{RouterSnapshot, SharedRouterState};

/// Upper bound on a forwarded request body.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Current (mapping, active node) snapshot.
    router: Arc<SharedRouterState>,

    /// Deception layer for unmapped paths.
    trap: Arc<DeceptionLayer>,

    /// Forwarding client with the per-attempt timeout baked in.
    http: reqwest::Client,

    /// Transport-level retries after the first attempt.
    forward_retries: u32,
}

impl AppState {
    /// Builds the gateway state.
    ///
    /// # Errors
    ///
    /// Returns [`ChameleonError::HttpClient`] if the forwarding client
    /// cannot be constructed.
    pub fn new(
        router: Arc<SharedRouterState>,
        trap: Arc<DeceptionLayer>,
        config: &GatewayConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.forward_timeout_ms))
            .build()?;
        Ok(Self {
            router,
            trap,
            http,
            forward_retries: config.forward_retries,
        })
    }

    /// The deception layer, for status reporting.
    #[must_use]
    pub fn trap(&self) -> &Arc<DeceptionLayer> {
        &self.trap
    }
}

/// Builds the public router: every path, every supported method.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new().fallback(gateway_entry).with_state(state)
}

/// Binds the public address and serves until aborted.
///
/// # Errors
///
/// Returns [`ChameleonError::Bind`] if the address cannot be bound or
/// the server fails.
pub async fn serve(bind: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|source| ChameleonError::Bind {
            address: bind,
            source,
        })?;
    info!(address = %bind, "gateway listening");
    serve_on(listener, state).await
}

/// Serves on an already-bound listener (tests use ephemeral ports).
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let address = listener
        .local_addr()
        .unwrap_or_else(|_| "0.0.0.0:0".parse().expect("static address"));
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|source| ChameleonError::Bind { address, source })
}

/// Routes one inbound request per the current snapshot.
async fn gateway_entry(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let client_key = client_key_of(&req);

    let Some(method) = Method::parse(req.method().as_str()) else {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": "method not allowed" })),
        )
            .into_response();
    };

    // One load gives a consistent (mapping, active node) pair for the
    // whole request, even if a swap lands mid-flight.
    let snapshot = state.router.snapshot();

    let Some(route) = snapshot.mapping.route_for(&path) else {
        let decoy = state.trap.handle_miss(&client_key, &path).await;
        return (StatusCode::OK, Json(decoy)).into_response();
    };

    let public_path = route.public_path.clone();
    let headers = forwardable_headers(req.headers());
    let body = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "request body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "unreadable request body" })),
            )
                .into_response();
        }
    };

    debug!(
        canonical = %path,
        public = %public_path,
        node = %snapshot.active.name,
        "forwarding"
    );
    forward(
        &state,
        &snapshot,
        method,
        &public_path,
        query.as_deref(),
        headers,
        body,
    )
    .await
}

/// Forwards a mapped request to the active node, bounded retries.
async fn forward(
    state: &AppState,
    snapshot: &RouterSnapshot,
    method: Method,
    public_path: &str,
    query: Option<&str>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut url = format!("http://{}{}", snapshot.active.address, public_path);
    if let Some(q) = query {
        url.push('?');
        url.push_str(q);
    }

    for attempt in 0..=state.forward_retries {
        let request = state
            .http
            .request(reqwest_method(method), &url)
            .headers(headers.clone())
            .body(body.clone());

        match request.send().await {
            Ok(upstream) => return relay(upstream).await,
            Err(e) if attempt < state.forward_retries && is_transient(&e) => {
                warn!(
                    node = %snapshot.active.name,
                    attempt = attempt + 1,
                    error = %e,
                    "forward attempt failed, retrying"
                );
            }
            Err(e) => {
                warn!(node = %snapshot.active.name, error = %e, "active node unreachable");
                return upstream_unavailable();
            }
        }
    }
    upstream_unavailable()
}

/// Relays an upstream response verbatim (status, content type, body).
async fn relay(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    match upstream.bytes().await {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) => {
            warn!(error = %e, "upstream body read failed");
            upstream_unavailable()
        }
    }
}

/// The generic response for a mapped path whose backend is down.
///
/// Deliberately not the decoy: an outage and an intrusion must stay
/// distinguishable.
fn upstream_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "Node Sync Error" })),
    )
        .into_response()
}

/// Strips headers that must not be forwarded as-is.
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    out.remove(header::HOST);
    out.remove(header::CONTENT_LENGTH);
    out
}

/// Converts the wire method for the forwarding client.
fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// True for failures worth one more transport-level attempt.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout()
}

/// Client identity used for reputation scoring.
///
/// Prefers the first `X-Forwarded-For` hop, falls back to the socket
/// peer address.
fn client_key_of(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ci| ci.0.ip().to_string())
}
