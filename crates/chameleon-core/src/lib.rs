//! # CHAMELEON Core
//!
//! Unified engine for the CHAMELEON moving-target defense gateway.
//! Orchestrates the Namespace Mutator, the backend node pool, and the
//! Deception Layer behind a single public HTTP entry point.
//!
//! ## Threat Coverage
//!
//! | Layer | Component | Threats Countered |
//! |-------|-----------|-------------------|
//! | Namespace | Mutator + Publisher | Endpoint enumeration, replay of learned paths |
//! | Routing | Gateway + shared snapshot | Stale forwarding, mapping/node skew |
//! | Deception | Trap + reputation ledger | Automated probing, stale-token replay |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CHAMELEON CORE                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │   requests ──> Gateway ──┬── hit ──> active NodeRuntime      │
//! │                  │       └── miss ─> DeceptionLayer          │
//! │                  │ reads                                     │
//! │                  ▼                                           │
//! │          SharedRouterState  (one ArcSwap snapshot)           │
//! │                  ▲                                           │
//! │                  │ installs                                  │
//! │          MutationScheduler ──> Mutator ──> Publisher ──┐     │
//! │                  │                                     │     │
//! │                  └──── loads standby node <────────────┘     │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chameleon_core::{Chameleon, ChameleonConfig};
//!
//! # async fn demo() -> chameleon_core::Result<()> {
//! let config = ChameleonConfig::load_file("config/chameleon.toml")?;
//! Chameleon::new(config)?.start().await
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - The request path and the mutation path share exactly one value,
//!   swapped atomically; neither ever blocks the other.
//! - A failed cycle is invisible to clients: the previous mapping and
//!   active node keep serving until a later cycle succeeds.
//! - The gateway never forwards an unmapped path and never answers a
//!   mapped path with the decoy.

mod config;
mod engine;
mod error;
mod gateway;
mod scheduler;
mod state;

pub use config::{
    ChameleonConfig, GatewayConfig, NodeEntry, RouteEntry, SchedulerConfig, StateConfig,
};
pub use engine::Chameleon;
pub use error::{ChameleonError, Result};
pub use gateway::{router, serve, serve_on, AppState};
pub use scheduler::{bootstrap_cycle, CyclePhase, MutationScheduler};
pub use state::{NodeTarget, RouterSnapshot, SharedRouterState};

// Re-export component types for convenience
pub use chameleon_mutator::{
    Artifact, ArtifactPublisher, Method, MutatedRoute, MutatorError, NamespaceMapping,
    NamespaceMutator, RouteTemplate, StatePaths,
};
pub use chameleon_node::{HandlerRegistry, NodeError, NodePool, NodeRole, NodeRuntime};
pub use chameleon_trap::{is_trap_response, DeceptionLayer, DecoyPayload, TrapConfig, TRAP_MARKER};
