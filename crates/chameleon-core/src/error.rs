//! Error types for the CHAMELEON core engine.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Core result type for engine operations.
pub type Result<T> = std::result::Result<T, ChameleonError>;

/// Errors raised by the engine, the scheduler, and the gateway setup.
///
/// Mutation-cycle failures never propagate into the request-serving
/// path; they abandon the cycle and the gateway keeps serving the
/// last-known-good mapping and active node.
#[derive(Debug, Error)]
pub enum ChameleonError {
    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying TOML failure.
        source: toml::de::Error,
    },

    /// Mutator error passthrough.
    #[error("mutator error: {0}")]
    Mutator(#[from] chameleon_mutator::MutatorError),

    /// Node error passthrough.
    #[error("node error: {0}")]
    Node(#[from] chameleon_node::NodeError),

    /// The standby load did not finish inside the allowed window.
    ///
    /// The cycle is abandoned so the next scheduled tick can run.
    #[error("standby load for cycle {cycle} timed out after {timeout_ms}ms")]
    LoadTimeout {
        /// Cycle that was being loaded.
        cycle: u64,
        /// Configured load timeout.
        timeout_ms: u64,
    },

    /// The standby reported a cycle other than the one just published.
    ///
    /// Rotation is refused; a node must never become active for a
    /// cycle it has not finished loading.
    #[error("standby loaded cycle {loaded}, expected {expected}; rotation refused")]
    LoadMismatch {
        /// Cycle the scheduler published.
        expected: u64,
        /// Cycle the standby actually reports.
        loaded: u64,
    },

    /// The load task died before reporting a result.
    #[error("standby load task failed: {0}")]
    LoadTask(String),

    /// The forwarding HTTP client could not be constructed.
    #[error("failed to build forwarding client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The gateway could not bind its public address.
    #[error("failed to bind gateway address {address}: {source}")]
    Bind {
        /// Address that could not be bound.
        address: SocketAddr,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}
