//! # Core Data Models for the Namespace Mutator
//!
//! This module defines the types shared by the mutation engine, the
//! publisher, and every downstream consumer of a mutated namespace.
//! Each type is designed so that a namespace for one cycle is immutable
//! once built: consumers replace whole values, they never edit them.
//!
//! ## Threat Model
//!
//! The types in this module help defend against:
//!
//! - **Stale-route replay**: `MutatedRoute` binds every public path to a
//!   `cycle_id`, so a path learned in one cycle identifies itself as
//!   expired in the next.
//! - **Partial-state routing**: `NamespaceMapping` and `Artifact` are
//!   built and published as whole values, never field-by-field.
//! - **Probe stability**: the reserved root route is excluded from
//!   mutation so liveness checks never observe churn.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The reserved liveness path. Never mutated, identical in every cycle.
pub const RESERVED_ROOT: &str = "/";

/// Length of the random suffix appended to a mutated path.
///
/// Six characters over a 36-symbol alphabet give 36^6 (~2.2 billion)
/// possible suffixes per route, which makes intra-cycle collisions rare
/// and cross-cycle guessing impractical at the mutation cadence.
pub const SUFFIX_LEN: usize = 6;

/// Alphabet the suffix is drawn from (lowercase ASCII plus digits).
pub const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// HTTP methods accepted by the gateway and served by node handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl Method {
    /// Parses a method from its wire name.
    ///
    /// Returns `None` for methods outside the supported set.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical endpoint definition before mutation.
///
/// Templates come from configuration, are loaded once per mutator
/// invocation, and are never modified at runtime. The `handler_id`
/// names the backend logic a node binds to whatever public path the
/// mutator assigns this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTemplate {
    /// HTTP method the route answers to.
    pub method: Method,

    /// Stable logical path (e.g. `/admin/login`).
    pub canonical_path: String,

    /// Identifier of the handler logic serving this route.
    pub handler_id: String,
}

impl RouteTemplate {
    /// Creates a new template.
    pub fn new(
        method: Method,
        canonical_path: impl Into<String>,
        handler_id: impl Into<String>,
    ) -> Self {
        Self {
            method,
            canonical_path: canonical_path.into(),
            handler_id: handler_id.into(),
        }
    }

    /// Returns true if this is the reserved root template.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.canonical_path == RESERVED_ROOT
    }
}

/// One route of a mutated namespace, bound to the cycle that minted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedRoute {
    /// HTTP method, carried over from the template.
    pub method: Method,

    /// The stable logical path.
    pub canonical_path: String,

    /// The externally visible path for this cycle.
    pub public_path: String,

    /// Identifier of the handler logic serving this route.
    pub handler_id: String,

    /// Per-cycle alias of the handler, mirroring the path suffix.
    pub handler_alias: String,

    /// Mutation cycle this route belongs to.
    pub cycle_id: u64,
}

/// The canonical-to-public path mapping for one mutation cycle.
///
/// Exactly one mapping is current at any instant. A mapping is built by
/// the mutator, made durable by the publisher, and read by the gateway
/// until superseded; it is replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMapping {
    /// Strictly increasing mutation cycle identifier.
    pub cycle_id: u64,

    /// Routes keyed by canonical path.
    pub routes: BTreeMap<String, MutatedRoute>,
}

impl NamespaceMapping {
    /// Creates an empty mapping for the given cycle.
    #[must_use]
    pub fn new(cycle_id: u64) -> Self {
        Self {
            cycle_id,
            routes: BTreeMap::new(),
        }
    }

    /// Looks up the route for a canonical path.
    #[must_use]
    pub fn route_for(&self, canonical_path: &str) -> Option<&MutatedRoute> {
        self.routes.get(canonical_path)
    }

    /// Looks up the current public path for a canonical path.
    #[must_use]
    pub fn public_path_of(&self, canonical_path: &str) -> Option<&str> {
        self.routes
            .get(canonical_path)
            .map(|r| r.public_path.as_str())
    }

    /// Returns true if the canonical path exists in this mapping.
    #[must_use]
    pub fn contains(&self, canonical_path: &str) -> bool {
        self.routes.contains_key(canonical_path)
    }

    /// Number of routes in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the mapping holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// The loadable namespace definition for one cycle.
///
/// An artifact is the executable counterpart of a mapping: the list of
/// public routes a backend node must serve, each tied to a handler id.
/// It is owned by the publisher until handed to a loader and is
/// immutable once published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Mutation cycle this artifact was generated for.
    pub cycle_id: u64,

    /// Routes the node must expose, in template order.
    pub routes: Vec<MutatedRoute>,
}

impl Artifact {
    /// Number of routes in the artifact.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the artifact holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
