//! Immutable per-cycle routing table for a backend node.
//!
//! A `HandlerTable` is the executable form of one artifact: every
//! public route resolved to its handler function up front, so the
//! request path does a single map lookup with no registry access and
//! no locking. Tables are never edited; a node replaces the whole
//! table atomically when it loads a newer artifact.

use std::collections::HashMap;

use serde_json::Value;

use chameleon_mutator::{Artifact, Method};

use crate::error::{NodeError, Result};
use crate::handlers::{HandlerFn, HandlerRegistry};

/// Resolved routing table for one mutation cycle.
pub struct HandlerTable {
    /// Cycle the table was built from.
    cycle_id: u64,

    /// Routes keyed by method and public path.
    entries: HashMap<(Method, String), HandlerFn>,
}

impl HandlerTable {
    /// An empty table for a node that has not loaded any cycle yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cycle_id: 0,
            entries: HashMap::new(),
        }
    }

    /// Builds a table from an artifact, resolving every handler.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyArtifact`] for an artifact without
    /// routes, [`NodeError::UnknownHandler`] if a route references a
    /// handler id the registry cannot resolve, and
    /// [`NodeError::DuplicatePublicPath`] if two routes claim the same
    /// method and public path. On any error the caller keeps its
    /// previous table.
    pub fn build(artifact: &Artifact, registry: &HandlerRegistry) -> Result<Self> {
        if artifact.is_empty() {
            return Err(NodeError::EmptyArtifact {
                cycle_id: artifact.cycle_id,
            });
        }

        let mut entries = HashMap::with_capacity(artifact.len());
        for route in &artifact.routes {
            let handler = registry.resolve(&route.handler_id).ok_or_else(|| {
                NodeError::UnknownHandler {
                    handler_id: route.handler_id.clone(),
                    public_path: route.public_path.clone(),
                }
            })?;

            let key = (route.method, route.public_path.clone());
            if entries.insert(key, handler).is_some() {
                return Err(NodeError::DuplicatePublicPath {
                    method: route.method,
                    path: route.public_path.clone(),
                });
            }
        }

        Ok(Self {
            cycle_id: artifact.cycle_id,
            entries,
        })
    }

    /// Cycle this table serves.
    #[must_use]
    pub const fn cycle_id(&self) -> u64 {
        self.cycle_id
    }

    /// Number of routes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatches a request to the matching handler, if any.
    #[must_use]
    pub fn dispatch(&self, method: Method, path: &str) -> Option<Value> {
        self.entries
            .get(&(method, path.to_string()))
            .map(|handler| handler())
    }
}
