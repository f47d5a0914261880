//! # Mutation Scheduler
//!
//! The single background task driving the recurring mutation cycle.
//! Each cycle walks a fixed pipeline; any failed step abandons the
//! cycle, leaves the previous state fully in force, and retries at the
//! next tick.
//!
//! ## Cycle Pipeline
//!
//! ```text
//! IDLE -> MUTATING -> PUBLISHING -> LOADING_STANDBY -> SWAPPING -> IDLE
//!           |             |               |                |
//!           +-- abort: previous mapping/artifact stay in force --+
//! ```
//!
//! ## Ordering Guarantees
//!
//! Within a cycle, publish strictly precedes load and load strictly
//! precedes swap. The swap itself is one atomic snapshot install; no
//! request handler can observe a half-rotated state. Across cycles,
//! ids are strictly increasing and a node is never made active for a
//! cycle it has not confirmed loading.
//!
//! ## Tick Coalescing
//!
//! Only one cycle executes at a time. The interval timer skips missed
//! ticks, so a cycle that overruns absorbs the next tick instead of
//! queuing a second cycle. The standby load additionally runs under a
//! timeout shorter than the interval, so a stalled load abandons the
//! cycle rather than wedging the scheduler.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use chameleon_mutator::{ArtifactPublisher, NamespaceMutator, RouteTemplate};
use chameleon_node::NodePool;

use crate::config::SchedulerConfig;
use crate::error::{ChameleonError, Result};
use crate::state::{NodeTarget, RouterSnapshot, SharedRouterState};

/// Phase of the cycle currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Waiting for the interval timer.
    Idle,
    /// Building the next mapping and artifact.
    Mutating,
    /// Making the pair durable.
    Publishing,
    /// Applying the artifact to the standby replica.
    LoadingStandby,
    /// Installing the new snapshot and rotating the pool.
    Swapping,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Mutating => "mutating",
            Self::Publishing => "publishing",
            Self::LoadingStandby => "loading_standby",
            Self::Swapping => "swapping",
        };
        f.write_str(name)
    }
}

/// Runs the first cycle synchronously at startup.
///
/// Mutates cycle 1, publishes it, loads it onto the initial active
/// node, and returns the snapshot the gateway starts serving from.
/// The standby stays empty until the first scheduled cycle.
///
/// # Errors
///
/// Any step failing is fatal at startup; there is no previous state
/// to fall back to yet.
pub fn bootstrap_cycle(
    mutator: &NamespaceMutator,
    publisher: &ArtifactPublisher,
    pool: &NodePool,
    templates: &[RouteTemplate],
) -> Result<RouterSnapshot> {
    let (mapping, artifact) = mutator.mutate(templates, 1)?;
    publisher.publish(&artifact, &mapping)?;

    let published = publisher.load_artifact()?;
    let active = pool.active();
    active.load(&published)?;

    info!(node = %active.name(), "bootstrap cycle loaded");
    Ok(RouterSnapshot::new(
        mapping,
        NodeTarget {
            name: active.name().to_string(),
            address: active.address(),
        },
    ))
}

/// The recurring mutation task.
///
/// Owns the write side of the shared router state exclusively; every
/// other component only reads it.
pub struct MutationScheduler {
    mutator: NamespaceMutator,
    publisher: ArtifactPublisher,
    pool: Arc<NodePool>,
    shared: Arc<SharedRouterState>,
    templates: Vec<RouteTemplate>,
    interval: Duration,
    load_timeout: Duration,
    completed_cycle: AtomicU64,
    phase: Mutex<CyclePhase>,
}

impl MutationScheduler {
    /// Creates a scheduler resuming after `completed_cycle`.
    #[must_use]
    pub fn new(
        mutator: NamespaceMutator,
        publisher: ArtifactPublisher,
        pool: Arc<NodePool>,
        shared: Arc<SharedRouterState>,
        templates: Vec<RouteTemplate>,
        config: &SchedulerConfig,
        completed_cycle: u64,
    ) -> Self {
        Self {
            mutator,
            publisher,
            pool,
            shared,
            templates,
            interval: Duration::from_secs(config.interval_secs),
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            completed_cycle: AtomicU64::new(completed_cycle),
            phase: Mutex::new(CyclePhase::Idle),
        }
    }

    /// Last cycle that completed a swap.
    #[must_use]
    pub fn completed_cycle(&self) -> u64 {
        self.completed_cycle.load(Ordering::Acquire)
    }

    /// Phase the scheduler is in right now.
    #[must_use]
    pub fn phase(&self) -> CyclePhase {
        *self
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the recurring loop forever. Spawn this once.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the bootstrap cycle
        // already covered it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(cycle) => debug!(cycle, "mutation cycle complete"),
                Err(e) => {
                    warn!(error = %e, "mutation cycle abandoned, previous state remains live");
                }
            }
        }
    }

    /// Executes one full mutation cycle.
    ///
    /// # Errors
    ///
    /// Any pipeline step can fail; the error names the step and the
    /// previously installed snapshot keeps serving untouched.
    pub async fn run_cycle(&self) -> Result<u64> {
        let next = self.completed_cycle() + 1;
        let result = self.advance(next).await;
        self.set_phase(CyclePhase::Idle);
        result
    }

    async fn advance(&self, next: u64) -> Result<u64> {
        self.set_phase(CyclePhase::Mutating);
        let (mapping, artifact) = self.mutator.mutate(&self.templates, next)?;

        self.set_phase(CyclePhase::Publishing);
        self.publisher.publish(&artifact, &mapping)?;

        self.set_phase(CyclePhase::LoadingStandby);
        let publisher = self.publisher.clone();
        let node = self.pool.standby();
        let load = tokio::task::spawn_blocking(move || -> Result<u64> {
            let published = publisher.load_artifact()?;
            Ok(node.load(&published)?)
        });

        let loaded = match tokio::time::timeout(self.load_timeout, load).await {
            Ok(Ok(outcome)) => outcome?,
            Ok(Err(join)) => return Err(ChameleonError::LoadTask(join.to_string())),
            Err(_) => {
                return Err(ChameleonError::LoadTimeout {
                    cycle: next,
                    timeout_ms: self.load_timeout.as_millis() as u64,
                })
            }
        };

        // The standby must confirm exactly the cycle just published
        // before it can take traffic.
        if loaded != next {
            return Err(ChameleonError::LoadMismatch {
                expected: next,
                loaded,
            });
        }

        self.set_phase(CyclePhase::Swapping);
        let new_active = self.pool.rotate();
        self.shared.install(RouterSnapshot::new(
            mapping,
            NodeTarget {
                name: new_active.name().to_string(),
                address: new_active.address(),
            },
        ));
        self.completed_cycle.store(next, Ordering::Release);

        info!(cycle = next, node = %new_active.name(), "traffic re-routed");
        Ok(next)
    }

    fn set_phase(&self, next: CyclePhase) {
        let mut phase = self
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(from = %*phase, to = %next, "cycle phase");
        *phase = next;
    }
}
