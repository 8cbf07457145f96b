//! Discovery consumers

use gridctl_core::domain::endpoint::Endpoint;
use gridctl_core::domain::target::ExecutionTarget;
use std::sync::{Mutex, PoisonError};

/// Receives discovery results
///
/// Called from concurrent query tasks, in no particular order across
/// endpoints.
pub trait DiscoveryConsumer: Send + Sync {
    /// One discovered execution target
    fn on_target(&self, target: &ExecutionTarget);

    /// An endpoint returned by a registry, before it is fed back into discovery
    fn on_endpoint(&self, _endpoint: &Endpoint) {}
}

/// Gathers every discovered target
#[derive(Debug, Default)]
pub struct TargetCollector {
    targets: Mutex<Vec<ExecutionTarget>>,
}

impl TargetCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets collected so far, in arrival order
    pub fn targets(&self) -> Vec<ExecutionTarget> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiscoveryConsumer for TargetCollector {
    fn on_target(&self, target: &ExecutionTarget) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.clone());
    }
}
