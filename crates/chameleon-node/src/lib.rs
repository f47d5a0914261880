//! # Chameleon Node Runtime
//!
//! Backend replica runtime for the CHAMELEON moving-target defense
//! gateway: loads published artifacts into a running server, swaps the
//! routing table without restart, and keeps a small replica pool with
//! exactly one active node.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`HandlerRegistry`] | Stable handler logic, id-addressed |
//! | [`HandlerTable`] | Immutable per-cycle routing table |
//! | [`NodeRuntime`] | One replica: fixed address, hot table swap |
//! | [`NodePool`] | Replica ring with a single active pointer |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chameleon_mutator::{Method, NamespaceMutator, RouteTemplate};
//! use chameleon_node::{HandlerRegistry, NodeRuntime};
//!
//! let templates = vec![RouteTemplate::new(Method::Get, "/", "root")];
//! let (_, artifact) = NamespaceMutator::new().mutate(&templates, 1)?;
//!
//! let node = Arc::new(NodeRuntime::new(
//!     0,
//!     "ALPHA",
//!     "127.0.0.1:8001".parse().unwrap(),
//!     HandlerRegistry::builtin(),
//! ));
//! node.load(&artifact)?;
//! assert_eq!(node.loaded_cycle_id(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Security Notes
//!
//! - A node never serves a mix of two cycles: the table swap is one
//!   atomic store and in-flight requests finish on the table they
//!   started with.
//! - A rejected artifact leaves the last-known-good table serving.
//! - Nodes answer 404 on unknown paths; deception lives solely in the
//!   gateway, nodes are an internal surface.

mod error;
mod handlers;
mod pool;
mod runtime;
mod table;

pub use error::{NodeError, Result};
pub use handlers::{HandlerFn, HandlerRegistry};
pub use pool::{NodePool, NodeRole, MIN_POOL_SIZE};
pub use runtime::NodeRuntime;
pub use table::HandlerTable;
