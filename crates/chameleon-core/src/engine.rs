//! The unified CHAMELEON engine facade.
//!
//! Wires the subsystems together from one validated configuration:
//! builds the replica pool, runs the bootstrap cycle, then spawns the
//! node servers, the mutation scheduler, and finally the public
//! gateway.

use std::sync::Arc;

use tracing::{error, info};

use chameleon_mutator::{ArtifactPublisher, NamespaceMutator};
use chameleon_node::{HandlerRegistry, NodePool, NodeRuntime};
use chameleon_trap::DeceptionLayer;

use crate::config::ChameleonConfig;
use crate::error::Result;
use crate::gateway::{self, AppState};
use crate::scheduler::{bootstrap_cycle, MutationScheduler};
use crate::state::SharedRouterState;

/// The engine: everything behind one config.
///
/// # Example
///
/// ```rust,no_run
/// use chameleon_core::{Chameleon, ChameleonConfig};
///
/// # async fn demo() -> chameleon_core::Result<()> {
/// let engine = Chameleon::new(ChameleonConfig::default())?;
/// engine.start().await
/// # }
/// ```
pub struct Chameleon {
    config: ChameleonConfig,
}

impl Chameleon {
    /// Validates the configuration and builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChameleonError::Config`] for a structurally
    /// invalid configuration.
    pub fn new(config: ChameleonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &ChameleonConfig {
        &self.config
    }

    /// Boots every subsystem and serves until aborted.
    ///
    /// Startup order matters: the bootstrap cycle runs before any
    /// traffic is accepted, so the gateway never exists without a
    /// consistent snapshot to serve from.
    pub async fn start(&self) -> Result<()> {
        info!("booting CHAMELEON engine");

        let registry = HandlerRegistry::builtin();
        let nodes: Vec<Arc<NodeRuntime>> = self
            .config
            .nodes
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Arc::new(NodeRuntime::new(
                    i,
                    entry.name.clone(),
                    entry.address,
                    registry.clone(),
                ))
            })
            .collect();
        let pool = Arc::new(NodePool::new(nodes)?);

        let mutator = NamespaceMutator::new();
        let mut publisher = ArtifactPublisher::new(self.config.state_paths());
        if let Some(mirror) = &self.config.state.mirror_dir {
            publisher = publisher.with_mirror_dir(mirror);
        }
        let templates = self.config.templates();

        let snapshot = bootstrap_cycle(&mutator, &publisher, &pool, &templates)?;
        let shared = Arc::new(SharedRouterState::new(snapshot));

        for node in pool.nodes() {
            let node = Arc::clone(node);
            tokio::spawn(async move {
                if let Err(e) = node.serve().await {
                    error!(error = %e, "node server exited");
                }
            });
        }

        let scheduler = Arc::new(MutationScheduler::new(
            mutator,
            publisher,
            Arc::clone(&pool),
            Arc::clone(&shared),
            templates,
            &self.config.scheduler,
            1,
        ));
        tokio::spawn(Arc::clone(&scheduler).run());

        let trap = Arc::new(DeceptionLayer::new(self.config.trap));
        let state = AppState::new(shared, trap, &self.config.gateway)?;
        gateway::serve(self.config.gateway.bind, state).await
    }
}
