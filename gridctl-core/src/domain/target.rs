//! Execution target domain types
//!
//! An execution target is a discovered candidate for job submission. Targets are
//! created fresh on every discovery round and never persisted.

use serde::{Deserialize, Serialize};
use url::Url;

/// A queue or service a job can be submitted to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTarget {
    /// Domain name of the computing service
    pub domain_name: String,

    /// Service name as published by the site
    pub service_name: String,

    /// Where submissions for this target are sent
    pub submission_endpoint: Url,

    /// Flavour of the submission interface (selects the submitter)
    pub flavour: String,

    pub queue: Option<String>,

    /// Installed application/runtime environments
    pub application_environments: Vec<String>,

    pub total_slots: Option<u32>,
    pub free_slots: Option<u32>,
    pub running_jobs: Option<u32>,
    pub waiting_jobs: Option<u32>,
    pub max_main_memory_mb: Option<u64>,
    pub max_wall_time_secs: Option<u64>,
}

impl ExecutionTarget {
    pub fn new(domain_name: impl Into<String>, flavour: impl Into<String>, submission_endpoint: Url) -> Self {
        let domain_name = domain_name.into();
        Self {
            service_name: domain_name.clone(),
            domain_name,
            submission_endpoint,
            flavour: flavour.into(),
            queue: None,
            application_environments: Vec::new(),
            total_slots: None,
            free_slots: None,
            running_jobs: None,
            waiting_jobs: None,
            max_main_memory_mb: None,
            max_wall_time_secs: None,
        }
    }

    /// Occupancy relative to the number of slots, `None` when unknown
    pub fn load(&self) -> Option<f64> {
        let total = self.total_slots.filter(|&t| t > 0)?;
        let busy = self.running_jobs.unwrap_or(0) + self.waiting_jobs.unwrap_or(0);
        if self.running_jobs.is_none() && self.waiting_jobs.is_none() {
            return None;
        }
        Some(f64::from(busy) / f64::from(total))
    }

    /// Checks whether this target is served by the same host as `endpoint`
    pub fn same_service_as(&self, endpoint: &Url) -> bool {
        match (self.submission_endpoint.host_str(), endpoint.host_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// Identity used to compare targets (endpoint plus queue)
    pub fn identity(&self) -> String {
        format!(
            "{}#{}",
            self.submission_endpoint.as_str().trim_end_matches('/'),
            self.queue.as_deref().unwrap_or_default()
        )
    }
}
