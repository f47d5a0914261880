//! Canonical handler logic served by backend nodes.
//!
//! Handlers carry the stable behavior of the protected service; the
//! mutator only rebinds the addresses they answer on. A handler is a
//! plain function producing a JSON body, registered under the id that
//! route templates reference.

use std::collections::BTreeMap;

use serde_json::{json, Value};

/// A handler producing the response body for one canonical route.
pub type HandlerFn = fn() -> Value;

/// Registry mapping handler ids to their implementations.
///
/// Built once at startup from the built-in set plus any custom
/// registrations, then treated as read-only. Artifact loading fails if
/// a route references an id missing here.
///
/// # Example
///
/// ```rust
/// use chameleon_node::HandlerRegistry;
///
/// let registry = HandlerRegistry::builtin();
/// assert!(registry.contains("root"));
/// assert!(registry.contains("api_balance"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, HandlerFn>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in target-app handlers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("root", handle_root);
        registry.register("admin_login", handle_admin_login);
        registry.register("api_balance", handle_api_balance);
        registry
    }

    /// Registers a handler under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, handler: HandlerFn) {
        self.handlers.insert(id.into(), handler);
    }

    /// Resolves a handler id.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<HandlerFn> {
        self.handlers.get(id).copied()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Liveness handler bound to the reserved root route.
fn handle_root() -> Value {
    json!({
        "service": "chameleon-target",
        "status": "ok",
    })
}

/// Admin login surface of the protected target app.
fn handle_admin_login() -> Value {
    json!({
        "page": "admin_login",
        "fields": ["username", "password"],
        "message": "Authentication required",
    })
}

/// Account balance endpoint of the protected target app.
fn handle_api_balance() -> Value {
    json!({
        "account": "0000-0001",
        "balance": 10250.75,
        "currency": "USD",
    })
}
