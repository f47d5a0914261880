//! Error types for the deception layer.

use thiserror::Error;

/// Result type alias for trap operations.
pub type Result<T> = std::result::Result<T, TrapError>;

/// Errors that can occur inside the deception layer.
///
/// None of these may ever surface to a client: the trap always answers
/// with the decoy payload, and scoring degrades before responding does.
#[derive(Debug, Error)]
pub enum TrapError {
    /// The reputation store could not be reached right now.
    ///
    /// The score update is skipped and the decoy is served anyway.
    #[error("reputation store momentarily unavailable, scoring skipped")]
    ReputationUnavailable,
}
