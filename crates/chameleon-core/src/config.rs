//! Configuration types for the CHAMELEON engine.
//!
//! Defaults mirror the reference deployment: gateway on port 8000, two
//! backend replicas on 8001/8002, a 25 second mutation interval, and
//! the built-in target-app route set. Every section can be overridden
//! from a TOML file; omitted sections keep their defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chameleon_mutator::{Method, RouteTemplate, StatePaths, RESERVED_ROOT};
use chameleon_node::MIN_POOL_SIZE;
use chameleon_trap::TrapConfig;

use crate::error::{ChameleonError, Result};

/// Top-level configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChameleonConfig {
    /// Public gateway settings.
    pub gateway: GatewayConfig,

    /// Mutation scheduler settings.
    pub scheduler: SchedulerConfig,

    /// Published-state locations.
    pub state: StateConfig,

    /// Deception layer tuning.
    pub trap: TrapConfig,

    /// Backend replica pool (fixed, not discovered).
    pub nodes: Vec<NodeEntry>,

    /// Canonical route templates.
    pub routes: Vec<RouteEntry>,
}

impl Default for ChameleonConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            scheduler: SchedulerConfig::default(),
            state: StateConfig::default(),
            trap: TrapConfig::default(),
            nodes: vec![
                NodeEntry {
                    name: "ALPHA".to_string(),
                    address: "127.0.0.1:8001".parse().expect("static address"),
                },
                NodeEntry {
                    name: "BETA".to_string(),
                    address: "127.0.0.1:8002".parse().expect("static address"),
                },
            ],
            routes: vec![
                RouteEntry::new(Method::Get, "/", "root"),
                RouteEntry::new(Method::Get, "/admin/login", "admin_login"),
                RouteEntry::new(Method::Get, "/api/balance", "api_balance"),
            ],
        }
    }
}

impl ChameleonConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ChameleonError::ConfigFile`] if the file cannot be
    /// read and [`ChameleonError::ConfigParse`] if it is not valid
    /// TOML for this schema. The result is not yet validated; call
    /// [`validate`](Self::validate) before building an engine.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ChameleonError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ChameleonError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks the configuration for structural problems.
    ///
    /// # Errors
    ///
    /// Returns [`ChameleonError::Config`] for an undersized node pool,
    /// duplicate node names or addresses, an empty route set, a
    /// missing root route, or duplicate canonical paths.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.len() < MIN_POOL_SIZE {
            return Err(ChameleonError::Config(format!(
                "need at least {MIN_POOL_SIZE} backend nodes, found {}",
                self.nodes.len()
            )));
        }

        let mut names = std::collections::BTreeSet::new();
        let mut addresses = std::collections::BTreeSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(ChameleonError::Config(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
            if !addresses.insert(node.address) {
                return Err(ChameleonError::Config(format!(
                    "duplicate node address {}",
                    node.address
                )));
            }
        }

        if self.routes.is_empty() {
            return Err(ChameleonError::Config("route set is empty".to_string()));
        }
        if !self.routes.iter().any(|r| r.path == RESERVED_ROOT) {
            return Err(ChameleonError::Config(
                "route set is missing the reserved root route".to_string(),
            ));
        }
        let mut paths = std::collections::BTreeSet::new();
        for route in &self.routes {
            if !paths.insert(route.path.as_str()) {
                return Err(ChameleonError::Config(format!(
                    "duplicate canonical path '{}'",
                    route.path
                )));
            }
        }

        if self.scheduler.load_timeout_ms >= self.scheduler.interval_secs.saturating_mul(1000) {
            return Err(ChameleonError::Config(
                "load timeout must be shorter than the mutation interval".to_string(),
            ));
        }

        Ok(())
    }

    /// The canonical templates handed to the mutator each cycle.
    #[must_use]
    pub fn templates(&self) -> Vec<RouteTemplate> {
        self.routes
            .iter()
            .map(|r| RouteTemplate::new(r.method, r.path.clone(), r.handler.clone()))
            .collect()
    }

    /// Authoritative published-state locations.
    #[must_use]
    pub fn state_paths(&self) -> StatePaths {
        StatePaths::in_dir(&self.state.dir)
    }
}

/// Public gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the gateway listens on.
    pub bind: SocketAddr,

    /// Per-attempt forwarding timeout in milliseconds.
    pub forward_timeout_ms: u64,

    /// Transport-level retries after the first forwarding attempt.
    pub forward_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".parse().expect("static address"),
            forward_timeout_ms: 5_000,
            forward_retries: 3,
        }
    }
}

/// Mutation scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between mutation cycles.
    pub interval_secs: u64,

    /// Milliseconds a standby load may take before the cycle is
    /// abandoned. Must stay below the interval so a stuck load never
    /// blocks the next tick.
    pub load_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 25,
            load_timeout_ms: 10_000,
        }
    }
}

/// Published-state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the authoritative artifact and mapping.
    pub dir: PathBuf,

    /// Optional best-effort mirror directory.
    pub mirror_dir: Option<PathBuf>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./chameleon_state"),
            mirror_dir: None,
        }
    }
}

/// One backend replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Replica name shown in logs and status output.
    pub name: String,

    /// Fixed internal address.
    pub address: SocketAddr,
}

/// One canonical route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// HTTP method.
    pub method: Method,

    /// Canonical path.
    pub path: String,

    /// Handler id implemented by the node runtime.
    pub handler: String,
}

impl RouteEntry {
    /// Creates a route entry.
    pub fn new(method: Method, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
        }
    }
}
