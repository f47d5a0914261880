//! Error types for the backend node runtime.

use std::net::SocketAddr;

use thiserror::Error;

use chameleon_mutator::Method;

/// Result type alias for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors that can occur while loading an artifact or running a node.
///
/// A load failure never disturbs the table currently being served; the
/// node keeps answering from its last-known-good state and the
/// scheduler skips rotation for the failed cycle.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The artifact contains no routes.
    #[error("artifact for cycle {cycle_id} contains no routes")]
    EmptyArtifact {
        /// Cycle the empty artifact was generated for.
        cycle_id: u64,
    },

    /// A route references a handler the node does not implement.
    #[error("route '{public_path}' references unknown handler '{handler_id}'")]
    UnknownHandler {
        /// Handler id that failed to resolve.
        handler_id: String,
        /// Public path of the offending route.
        public_path: String,
    },

    /// Two routes in one artifact claim the same public address.
    #[error("duplicate public route {method} {path} in artifact")]
    DuplicatePublicPath {
        /// Method of the duplicated route.
        method: Method,
        /// Duplicated public path.
        path: String,
    },

    /// The artifact belongs to an older cycle than the one loaded.
    #[error("refusing cycle regression: node has cycle {loaded}, artifact is cycle {offered}")]
    CycleRegression {
        /// Cycle currently loaded on the node.
        loaded: u64,
        /// Cycle id of the rejected artifact.
        offered: u64,
    },

    /// The replica pool is below the minimum usable size.
    #[error("node pool of {size} replicas is below the minimum of {min}")]
    PoolTooSmall {
        /// Configured pool size.
        size: usize,
        /// Minimum required replicas.
        min: usize,
    },

    /// The node could not bind its fixed internal address.
    #[error("failed to bind node address {address}: {source}")]
    Bind {
        /// Address that could not be bound.
        address: SocketAddr,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}
