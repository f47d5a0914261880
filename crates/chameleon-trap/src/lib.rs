//! # Chameleon Deception Layer
//!
//! Reputation-driven deception for the CHAMELEON moving-target defense
//! gateway. Requests for addresses that fell out of the namespace on a
//! past mutation cycle land here instead of reaching any backend.
//!
//! ## Threat Coverage
//!
//! | Behavior | Countermeasure |
//! |----------|----------------|
//! | Replay of a captured URL | Decoy payload with success status |
//! | Endpoint enumeration | Per-client score plus adaptive delay |
//! | Outcome probing | Response identical for every miss |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chameleon_trap::{DeceptionLayer, TrapConfig, is_trap_response};
//!
//! # async fn demo() {
//! let trap = DeceptionLayer::new(TrapConfig::new());
//!
//! let decoy = trap.handle_miss("203.0.113.7", "/api/balance_stale").await;
//! let body = serde_json::to_value(&decoy).unwrap();
//! assert!(is_trap_response(&body));
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - The decoy is served on every miss, regardless of score; scores
//!   only shape latency.
//! - The trap marker is for out-of-band identification; callers are
//!   never told they were trapped.
//! - Scoring is fail-open toward answering: a momentarily unavailable
//!   ledger skips the update, never the response.

mod decoy;
mod error;
mod reputation;
mod trap;

pub use decoy::{is_trap_response, DecoyPayload, DecoyUserData, TRAP_MARKER};
pub use error::{Result, TrapError};
pub use reputation::{ReputationEntry, ReputationLedger};
pub use trap::{DeceptionLayer, TrapConfig};
