//! Backend replica pool with a single active pointer.
//!
//! The pool is a small fixed ring of replicas. Exactly one node is
//! active (receiving gateway traffic) at a time; the next node in the
//! ring is the standby that each mutation cycle loads before rotation.
//! Rotation advances the active pointer by one, so the former active
//! node becomes the next cycle's standby.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};
use crate::runtime::NodeRuntime;

/// Minimum number of replicas a pool needs for rotation.
pub const MIN_POOL_SIZE: usize = 2;

/// Role of a replica at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Receiving gateway traffic.
    Active,
    /// Being prepared with the next cycle's artifact.
    Standby,
}

/// Fixed ring of backend replicas with one active pointer.
///
/// # Thread Safety
///
/// The active pointer is a single atomic; readers take one load,
/// rotation is one store by the scheduler (the only writer).
pub struct NodePool {
    nodes: Vec<Arc<NodeRuntime>>,
    active: AtomicUsize,
}

impl NodePool {
    /// Creates a pool over the given replicas, node 0 active.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::PoolTooSmall`] for fewer than
    /// [`MIN_POOL_SIZE`] replicas.
    pub fn new(nodes: Vec<Arc<NodeRuntime>>) -> Result<Self> {
        if nodes.len() < MIN_POOL_SIZE {
            return Err(NodeError::PoolTooSmall {
                size: nodes.len(),
                min: MIN_POOL_SIZE,
            });
        }
        Ok(Self {
            nodes,
            active: AtomicUsize::new(0),
        })
    }

    /// Number of replicas in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the pool holds no replicas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All replicas, in ring order.
    #[must_use]
    pub fn nodes(&self) -> &[Arc<NodeRuntime>] {
        &self.nodes
    }

    /// Index of the currently active replica.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// The currently active replica.
    #[must_use]
    pub fn active(&self) -> Arc<NodeRuntime> {
        Arc::clone(&self.nodes[self.active_index()])
    }

    /// The replica next in the ring, prepared for the coming cycle.
    #[must_use]
    pub fn standby(&self) -> Arc<NodeRuntime> {
        let idx = (self.active_index() + 1) % self.nodes.len();
        Arc::clone(&self.nodes[idx])
    }

    /// Role of the replica at `index`.
    #[must_use]
    pub fn role_of(&self, index: usize) -> NodeRole {
        if index == self.active_index() {
            NodeRole::Active
        } else {
            NodeRole::Standby
        }
    }

    /// Advances the active pointer to the standby replica.
    ///
    /// Returns the newly active replica. Only the mutation scheduler
    /// calls this, after the standby has confirmed the new cycle.
    pub fn rotate(&self) -> Arc<NodeRuntime> {
        let next = (self.active_index() + 1) % self.nodes.len();
        self.active.store(next, Ordering::Release);
        Arc::clone(&self.nodes[next])
    }
}
