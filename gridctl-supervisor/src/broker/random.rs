//! Random broker

use gridctl_core::domain::description::JobRequirements;
use gridctl_core::domain::target::ExecutionTarget;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::{Mutex, PoisonError};

use crate::broker::Broker;

/// Unweighted shuffle, ignoring requirements
#[derive(Debug, Default)]
pub struct RandomBroker {
    seeded: Option<Mutex<StdRng>>,
}

impl RandomBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible ordering
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Broker for RandomBroker {
    fn name(&self) -> &str {
        "Random"
    }

    fn sort_targets(
        &self,
        mut targets: Vec<ExecutionTarget>,
        _requirements: &JobRequirements,
    ) -> Vec<ExecutionTarget> {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                targets.shuffle(&mut *rng);
            }
            None => targets.shuffle(&mut rand::thread_rng()),
        }
        targets
    }
}
