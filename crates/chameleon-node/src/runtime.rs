//! # Node Runtime
//!
//! A backend replica: one axum server on a fixed internal address,
//! serving whichever routing table was most recently loaded. Loading a
//! new artifact swaps the table behind an `ArcSwap` while the server
//! keeps running, so re-pointing a node at a newer cycle involves no
//! socket churn, no task restart, and no window where the node serves
//! a mix of two cycles.
//!
//! ## Design
//!
//! The server is bound exactly once. Every request reads the current
//! table through one atomic load; in-flight requests holding the old
//! table finish against it and the old table is freed when the last
//! reference drops. A failed load leaves the previous table in place
//! (last-known-good) and reports the failure upward so the scheduler
//! skips rotation.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use chameleon_mutator::{Artifact, Method};

use crate::error::{NodeError, Result};
use crate::handlers::HandlerRegistry;
use crate::table::HandlerTable;

/// One backend replica with a hot-swappable routing table.
///
/// # Thread Safety
///
/// All methods take `&self`; the runtime is shared between the node's
/// server task and the mutation scheduler through an `Arc`.
pub struct NodeRuntime {
    /// Stable pool index of this node.
    id: usize,

    /// Human-readable replica name (e.g. `ALPHA`).
    name: String,

    /// Fixed internal address the node serves on.
    address: SocketAddr,

    /// Currently served routing table.
    table: ArcSwap<HandlerTable>,

    /// Cycle id of the table currently served. Zero before first load.
    loaded_cycle: AtomicU64,

    /// Handler implementations available to loaded artifacts.
    registry: HandlerRegistry,
}

impl NodeRuntime {
    /// Creates a runtime that has not loaded any cycle yet.
    #[must_use]
    pub fn new(id: usize, name: impl Into<String>, address: SocketAddr, registry: HandlerRegistry) -> Self {
        Self {
            id,
            name: name.into(),
            address,
            table: ArcSwap::from_pointee(HandlerTable::empty()),
            loaded_cycle: AtomicU64::new(0),
            registry,
        }
    }

    /// Stable pool index of this node.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Replica name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed internal address.
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    /// Cycle id of the currently served table (0 before first load).
    #[must_use]
    pub fn loaded_cycle_id(&self) -> u64 {
        self.loaded_cycle.load(Ordering::Acquire)
    }

    /// Loads an artifact, atomically replacing the served table.
    ///
    /// Repeated loads are supported and leak nothing: the previous
    /// table is dropped once the last in-flight request releases it.
    ///
    /// # Errors
    ///
    /// Any validation failure ([`NodeError::EmptyArtifact`],
    /// [`NodeError::UnknownHandler`], [`NodeError::DuplicatePublicPath`],
    /// [`NodeError::CycleRegression`]) leaves the last-known-good table
    /// serving and must cause the caller to skip rotation.
    pub fn load(&self, artifact: &Artifact) -> Result<u64> {
        let loaded = self.loaded_cycle_id();
        if artifact.cycle_id < loaded {
            return Err(NodeError::CycleRegression {
                loaded,
                offered: artifact.cycle_id,
            });
        }

        let table = match HandlerTable::build(artifact, &self.registry) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    node = %self.name,
                    cycle = artifact.cycle_id,
                    error = %e,
                    "artifact rejected, keeping last-known-good table"
                );
                return Err(e);
            }
        };

        let routes = table.len();
        self.table.store(Arc::new(table));
        self.loaded_cycle.store(artifact.cycle_id, Ordering::Release);

        info!(
            node = %self.name,
            cycle = artifact.cycle_id,
            routes,
            "artifact loaded"
        );
        Ok(artifact.cycle_id)
    }

    /// Builds the node's request router.
    ///
    /// Exposed separately from [`serve`](Self::serve) so tests can
    /// drive the router without a socket.
    #[must_use]
    pub fn router(self: Arc<Self>) -> Router {
        Router::new().fallback(dispatch).with_state(self)
    }

    /// Binds the node's fixed address and serves until aborted.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Bind`] if the address cannot be bound.
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.address)
            .await
            .map_err(|source| NodeError::Bind {
                address: self.address,
                source,
            })?;
        info!(node = %self.name, address = %self.address, "node listening");

        let address = self.address;
        let router = self.router();
        axum::serve(listener, router)
            .await
            .map_err(|source| NodeError::Bind { address, source })
    }

    /// Serves on an already-bound listener.
    ///
    /// Used when the caller wants an ephemeral port (tests) or needs
    /// the bound address before the server starts.
    pub async fn serve_on(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        let address = self.address;
        axum::serve(listener, self.router())
            .await
            .map_err(|source| NodeError::Bind { address, source })
    }
}

/// Resolves a request against the node's current table.
async fn dispatch(State(node): State<Arc<NodeRuntime>>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let method = Method::parse(req.method().as_str());

    let body = method.and_then(|m| node.table.load().dispatch(m, &path));
    match body {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => {
            debug!(node = %node.name, %path, "no route in current table");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not found" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_mutator::{NamespaceMutator, RouteTemplate};

    fn test_runtime() -> Arc<NodeRuntime> {
        Arc::new(NodeRuntime::new(
            0,
            "ALPHA",
            "127.0.0.1:0".parse().unwrap(),
            HandlerRegistry::builtin(),
        ))
    }

    fn artifact(cycle_id: u64) -> Artifact {
        let templates = vec![
            RouteTemplate::new(Method::Get, "/", "root"),
            RouteTemplate::new(Method::Get, "/api/balance", "api_balance"),
        ];
        NamespaceMutator::new()
            .mutate(&templates, cycle_id)
            .unwrap()
            .1
    }

    #[test]
    fn test_fresh_runtime_has_no_cycle() {
        let node = test_runtime();
        assert_eq!(node.loaded_cycle_id(), 0);
        assert!(node.table.load().is_empty());
    }

    #[test]
    fn test_load_updates_cycle_and_table() {
        let node = test_runtime();
        let cycle = node.load(&artifact(1)).unwrap();
        assert_eq!(cycle, 1);
        assert_eq!(node.loaded_cycle_id(), 1);
        assert_eq!(node.table.load().len(), 2);
    }

    #[test]
    fn test_reload_replaces_table() {
        let node = test_runtime();
        let first = artifact(1);
        let second = artifact(2);
        node.load(&first).unwrap();
        node.load(&second).unwrap();

        assert_eq!(node.loaded_cycle_id(), 2);
        let table = node.table.load();
        // Old cycle's public paths are gone after the swap.
        assert!(table
            .dispatch(Method::Get, &first.routes[1].public_path)
            .is_none());
        assert!(table
            .dispatch(Method::Get, &second.routes[1].public_path)
            .is_some());
    }

    #[test]
    fn test_failed_load_keeps_last_known_good() {
        let node = test_runtime();
        node.load(&artifact(1)).unwrap();

        let mut bad = artifact(2);
        bad.routes[0].handler_id = "missing".to_string();
        assert!(node.load(&bad).is_err());

        // Cycle and table are untouched.
        assert_eq!(node.loaded_cycle_id(), 1);
        assert!(node.table.load().dispatch(Method::Get, "/").is_some());
    }

    #[test]
    fn test_cycle_regression_rejected() {
        let node = test_runtime();
        node.load(&artifact(5)).unwrap();
        let result = node.load(&artifact(3));
        assert!(matches!(
            result,
            Err(NodeError::CycleRegression {
                loaded: 5,
                offered: 3
            })
        ));
        assert_eq!(node.loaded_cycle_id(), 5);
    }

    #[test]
    fn test_idempotent_same_cycle_reload() {
        let node = test_runtime();
        let a = artifact(4);
        node.load(&a).unwrap();
        node.load(&a).unwrap();
        assert_eq!(node.loaded_cycle_id(), 4);
    }
}
