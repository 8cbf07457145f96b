//! Target brokers
//!
//! A broker orders discovered execution targets best-first for one job. It may
//! drop targets failing the job's hard constraints but never adds any.

pub mod random;
pub mod ranking;

use gridctl_core::domain::description::JobRequirements;
use gridctl_core::domain::target::ExecutionTarget;
use std::sync::Arc;

pub use random::RandomBroker;
pub use ranking::LoadBroker;

pub const DEFAULT_BROKER: &str = "Random";

/// Names accepted by [`broker_by_name`]
pub const BROKER_NAMES: [&str; 2] = ["Random", "Load"];

/// Ranking strategy for execution targets
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;

    /// Order `targets` best-first for a job with `requirements`
    ///
    /// # Returns
    /// A permutation of `targets`, or of a subset when constraints drop some
    fn sort_targets(
        &self,
        targets: Vec<ExecutionTarget>,
        requirements: &JobRequirements,
    ) -> Vec<ExecutionTarget>;
}

/// Look up a broker by name, ignoring ASCII case
pub fn broker_by_name(name: &str) -> Option<Arc<dyn Broker>> {
    if name.eq_ignore_ascii_case("Random") {
        Some(Arc::new(RandomBroker::new()))
    } else if name.eq_ignore_ascii_case("Load") {
        Some(Arc::new(LoadBroker))
    } else {
        None
    }
}

/// Whether `target` can run a job with `requirements`
///
/// Values a target does not publish are assumed sufficient.
pub fn satisfies(target: &ExecutionTarget, requirements: &JobRequirements) -> bool {
    let environments = requirements.application_environments.iter().all(|wanted| {
        target
            .application_environments
            .iter()
            .any(|installed| installed.eq_ignore_ascii_case(wanted))
    });

    let queue = match (&requirements.queue, &target.queue) {
        (Some(wanted), Some(offered)) => wanted == offered,
        _ => true,
    };

    let slots = fits(requirements.slots.map(u64::from), target.total_slots.map(u64::from));
    let memory = fits(requirements.main_memory_mb, target.max_main_memory_mb);
    let wall_time = fits(requirements.wall_time_secs, target.max_wall_time_secs);

    environments && queue && slots && memory && wall_time
}

fn fits(requested: Option<u64>, limit: Option<u64>) -> bool {
    match (requested, limit) {
        (Some(requested), Some(limit)) => requested <= limit,
        _ => true,
    }
}
