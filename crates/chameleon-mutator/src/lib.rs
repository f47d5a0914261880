//! # Chameleon Namespace Mutator
//!
//! Endpoint namespace randomization for the CHAMELEON moving-target
//! defense gateway. Every mutation cycle this crate rebuilds the
//! externally visible route namespace and emits the loadable artifact
//! that backend nodes serve it from.
//!
//! ## Threat Model
//!
//! A reverse proxy with a static endpoint namespace lets an attacker:
//! - **Enumerate once, exploit forever**: any discovered path stays
//!   valid indefinitely.
//! - **Replay captured requests**: a recorded URL keeps working.
//!
//! Mutation bounds the useful lifetime of any learned address to one
//! cycle. The publisher guarantees that the mapping handed to the
//! gateway and the artifact handed to the nodes always describe the
//! same cycle.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`NamespaceMutator`] | `(templates, cycle_id)` to `(mapping, artifact)` |
//! | [`ArtifactPublisher`] | Atomic temp-then-rename publication |
//! | [`NamespaceMapping`] | Canonical to public path map, one per cycle |
//! | [`Artifact`] | Loadable namespace definition for backend nodes |
//!
//! ## Quick Start
//!
//! ```rust
//! use chameleon_mutator::{Method, NamespaceMutator, RouteTemplate};
//!
//! let templates = vec![
//!     RouteTemplate::new(Method::Get, "/", "root"),
//!     RouteTemplate::new(Method::Get, "/api/balance", "api_balance"),
//! ];
//!
//! let (mapping, artifact) = NamespaceMutator::new().mutate(&templates, 1)?;
//! assert_eq!(mapping.cycle_id, artifact.cycle_id);
//! # Ok::<(), chameleon_mutator::MutatorError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Suffixes are drawn from OS entropy over a 36-symbol alphabet.
//! - The reserved root route is never mutated (liveness probes).
//! - A failed cycle leaves the previously published state untouched.

mod error;
mod models;
mod mutator;
mod publisher;
pub mod suffix;

pub use error::{MutatorError, Result};
pub use models::{
    Artifact, Method, MutatedRoute, NamespaceMapping, RouteTemplate, RESERVED_ROOT,
    SUFFIX_ALPHABET, SUFFIX_LEN,
};
pub use mutator::NamespaceMutator;
pub use publisher::{ArtifactPublisher, StatePaths, ARTIFACT_FILE, MAPPING_FILE};
