//! Shared routing state between the gateway and the scheduler.
//!
//! The current namespace mapping and the active node pointer are the
//! only state the request path and the mutation path both touch. They
//! live together in one [`RouterSnapshot`] behind a single `ArcSwap`:
//! readers take one atomic load and get a consistent pair, the
//! scheduler replaces the whole snapshot in one atomic store. No
//! reader can ever observe mapping from cycle `n` combined with the
//! node pointer from cycle `n+1`.
//!
//! Superseded snapshots stay alive until the last in-flight request
//! drops its reference, so a swap mid-request is invisible to that
//! request.

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use chameleon_mutator::NamespaceMapping;

/// Address of the replica the gateway forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTarget {
    /// Replica name, for logs.
    pub name: String,

    /// Fixed internal address.
    pub address: SocketAddr,
}

/// One consistent view of (mapping, active node) for a single cycle.
#[derive(Debug, Clone)]
pub struct RouterSnapshot {
    /// Namespace mapping in effect.
    pub mapping: NamespaceMapping,

    /// Replica receiving traffic for this cycle.
    pub active: NodeTarget,
}

impl RouterSnapshot {
    /// Creates a snapshot; the cycle id is the mapping's.
    #[must_use]
    pub fn new(mapping: NamespaceMapping, active: NodeTarget) -> Self {
        Self { mapping, active }
    }

    /// Cycle this snapshot belongs to.
    #[must_use]
    pub fn cycle_id(&self) -> u64 {
        self.mapping.cycle_id
    }
}

/// The swap point between the mutation path and the request path.
///
/// # Thread Safety
///
/// Any number of readers call [`snapshot`](Self::snapshot)
/// concurrently with the scheduler's [`install`](Self::install); no
/// locks, one atomic pointer.
pub struct SharedRouterState {
    current: ArcSwap<RouterSnapshot>,
}

impl SharedRouterState {
    /// Creates the shared state with its first snapshot.
    ///
    /// The gateway never starts without a bootstrap cycle, so there is
    /// no "empty" state to represent.
    #[must_use]
    pub fn new(initial: RouterSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Returns the current snapshot.
    ///
    /// The returned `Arc` keeps the snapshot alive even if a swap
    /// happens while the request is still using it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RouterSnapshot> {
        self.current.load_full()
    }

    /// Atomically replaces the snapshot.
    ///
    /// Called only by the mutation scheduler, after the incoming
    /// cycle's artifact is confirmed loaded on the new active node.
    pub fn install(&self, next: RouterSnapshot) {
        let cycle = next.cycle_id();
        let node = next.active.name.clone();
        self.current.store(Arc::new(next));
        info!(cycle, node = %node, "router snapshot installed");
    }
}
