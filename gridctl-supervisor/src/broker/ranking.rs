//! Load based broker

use gridctl_core::domain::description::JobRequirements;
use gridctl_core::domain::target::ExecutionTarget;
use std::cmp::Ordering;

use crate::broker::{Broker, satisfies};

/// Drops targets failing hard constraints, then prefers free capacity and low load
///
/// Ordering keys, in turn:
/// 1. enough free slots published for the job
/// 2. load ascending, unknown load last
/// 3. domain name
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadBroker;

impl Broker for LoadBroker {
    fn name(&self) -> &str {
        "Load"
    }

    fn sort_targets(
        &self,
        targets: Vec<ExecutionTarget>,
        requirements: &JobRequirements,
    ) -> Vec<ExecutionTarget> {
        let needed = requirements.slots.unwrap_or(1);
        let mut ranked: Vec<ExecutionTarget> = targets
            .into_iter()
            .filter(|t| satisfies(t, requirements))
            .collect();

        ranked.sort_by(|a, b| {
            let a_fits = a.free_slots.is_some_and(|free| free >= needed);
            let b_fits = b.free_slots.is_some_and(|free| free >= needed);
            b_fits
                .cmp(&a_fits)
                .then_with(|| compare_load(a.load(), b.load()))
                .then_with(|| a.domain_name.cmp(&b.domain_name))
        });
        ranked
    }
}

fn compare_load(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
