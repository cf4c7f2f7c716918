//! Daemon state definition.

use daemon_config_and_utils::{Config, Paths};
use quantum_core::{Dispatcher, Registry, SchedSource};
use std::sync::Arc;

/// Shared daemon state (thread-safe).
#[derive(Clone)]
pub struct DaemonState {
    pub config: Arc<Config>,
    pub paths: Arc<Paths>,
    /// Command dispatcher owning the quantum cell and the caller registry.
    pub dispatcher: Arc<Dispatcher>,
}

impl DaemonState {
    /// Build the daemon state from configuration.
    ///
    /// This is deliberately infallible and runs before any file or socket
    /// work, so the registry exists for the teardown report no matter how
    /// far startup gets.
    pub fn new(config: Config, paths: Paths, sched: Arc<dyn SchedSource>) -> Self {
        let registry = match config.registry_capacity {
            Some(limit) => Registry::with_capacity_limit(limit),
            None => Registry::new(),
        };
        let dispatcher = Arc::new(Dispatcher::with_registry(
            config.initial_quantum,
            registry,
            sched,
        ));

        Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            dispatcher,
        }
    }
}
