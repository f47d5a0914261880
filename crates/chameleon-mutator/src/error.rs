//! Error types for the Namespace Mutator.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mutator operations.
pub type Result<T> = std::result::Result<T, MutatorError>;

/// Errors that can occur while mutating or publishing a namespace.
///
/// A failed cycle is always recoverable: the previous mapping and
/// artifact remain in force and the scheduler retries at the next tick.
#[derive(Debug, Error)]
pub enum MutatorError {
    /// The canonical template set is unusable.
    ///
    /// Raised for an empty set, a missing root route, or duplicate
    /// canonical paths. The cycle never starts.
    #[error("invalid canonical route config: {0}")]
    Config(String),

    /// Suffix generation kept colliding with already-assigned paths.
    ///
    /// With a 36^6 suffix space this indicates a broken entropy source
    /// rather than bad luck; the cycle is aborted instead of accepting
    /// a duplicate public path.
    #[error("could not draw a unique suffix for '{canonical_path}' after {attempts} attempts")]
    SuffixExhausted {
        /// Canonical path that could not be assigned a unique suffix.
        canonical_path: String,
        /// Number of draws attempted.
        attempts: u32,
    },

    /// Durable publication failed.
    #[error("failed to publish {path}: {source}")]
    Publish {
        /// Destination path of the failed write.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Published state could not be read back.
    #[error("failed to read published state from {path}: {source}")]
    ReadBack {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Serialization of the mapping or artifact failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
