//! Resubmission workflow
//!
//! Replaces selected jobs with fresh submissions: discover targets once,
//! submit a replacement per candidate, record it, then cancel and (unless the
//! history is kept) clean and forget the predecessors.

use chrono::Utc;
use gridctl_client::{DescriptionParser, RegistryService, Submitter, TargetInfoService};
use gridctl_core::domain::description::DescriptionSet;
use gridctl_core::domain::endpoint::Endpoint;
use gridctl_core::domain::job::{Job, JobState, attr};
use gridctl_core::domain::target::ExecutionTarget;
use gridctl_core::dto::submission::SubmissionReceipt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};
use url::Url;

use crate::broker::Broker;
use crate::discovery::{DiscoveryOptions, ServiceDiscovery, TargetCollector};
use crate::error::JobError;
use crate::repository::JobStore;
use crate::service::outcome::{JobFailure, ResubmitReport, Resubmission};
use crate::service::supervisor::JobSupervisor;

/// Where a replacement may run relative to the original job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Any discovered target
    #[default]
    Any,
    /// Only the service that ran the original
    Same,
    /// Any service except the one that ran the original
    NotSame,
}

impl TargetMode {
    fn allows(self, target: &ExecutionTarget, original: &Job) -> bool {
        match self {
            TargetMode::Any => true,
            TargetMode::Same => target.same_service_as(&original.managing_endpoint),
            TargetMode::NotSame => !target.same_service_as(&original.managing_endpoint),
        }
    }
}

/// What to resubmit and how
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResubmitOptions {
    /// States of the jobs to resubmit, all when empty
    pub states: Vec<JobState>,
    pub mode: TargetMode,
    /// Keep cancelled predecessors instead of cleaning and forgetting them
    pub keep_history: bool,
}

/// Collaborators needed for new submissions
#[derive(Clone)]
pub struct SubmissionBackends {
    pub parser: Arc<dyn DescriptionParser>,
    /// Submitters keyed by upper-case flavour
    pub submitters: HashMap<String, Arc<dyn Submitter>>,
    pub broker: Arc<dyn Broker>,
    pub registry: Arc<dyn RegistryService>,
    pub target_info: Arc<dyn TargetInfoService>,
}

impl SubmissionBackends {
    pub fn new(
        parser: Arc<dyn DescriptionParser>,
        broker: Arc<dyn Broker>,
        registry: Arc<dyn RegistryService>,
        target_info: Arc<dyn TargetInfoService>,
    ) -> Self {
        Self {
            parser,
            submitters: HashMap::new(),
            broker,
            registry,
            target_info,
        }
    }

    /// Adds the submitter for its flavour
    pub fn with_submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitters
            .insert(submitter.flavour().to_ascii_uppercase(), submitter);
        self
    }

    fn submitter_for(&self, flavour: &str) -> Option<&Arc<dyn Submitter>> {
        self.submitters.get(&flavour.to_ascii_uppercase())
    }
}

impl JobSupervisor {
    /// Resubmit the jobs in `options.states`
    ///
    /// Every candidate is tried once. A replacement inherits the original's
    /// predecessor chain plus the original itself. New jobs are written to
    /// `store` before any predecessor is touched; predecessors that cannot be
    /// cancelled or cleaned stay in the job list.
    pub async fn resubmit(
        &mut self,
        store: &JobStore,
        backends: &SubmissionBackends,
        options: &ResubmitOptions,
    ) -> ResubmitReport {
        let span = self.span.clone();
        async {
            let mut report = ResubmitReport {
                not_found: self.not_found.clone(),
                ..Default::default()
            };

            let candidates: Vec<Job> = self
                .jobs
                .iter()
                .filter(|job| options.states.is_empty() || options.states.contains(&job.state))
                .cloned()
                .collect();
            if candidates.is_empty() {
                info!("No jobs to resubmit");
                return report;
            }

            let targets = self.discover_targets(backends, options.mode, &candidates).await;
            info!(targets = targets.len(), candidates = candidates.len(), "Resubmitting jobs");

            for original in &candidates {
                if self.is_interrupted() {
                    report
                        .not_resubmitted
                        .push(JobFailure::new(original.id.clone(), JobError::Aborted));
                    continue;
                }

                let eligible: Vec<ExecutionTarget> = targets
                    .iter()
                    .filter(|t| options.mode.allows(t, original))
                    .cloned()
                    .collect();

                match self.submit_replacement(original, eligible, backends).await {
                    Ok(new_job) => {
                        info!(original = %original.id, new = %new_job.id, "Job resubmitted");
                        report.resubmitted.push(Resubmission {
                            original: original.id.clone(),
                            new_job,
                        });
                    }
                    Err(error) => {
                        warn!(job = %original.id, "Resubmission failed: {}", error);
                        report
                            .not_resubmitted
                            .push(JobFailure::new(original.id.clone(), error));
                    }
                }
            }

            if report.resubmitted.is_empty() {
                return report;
            }

            let new_jobs: Vec<Job> = report.resubmitted.iter().map(|r| r.new_job.clone()).collect();
            if let Err(e) = store.upsert(&new_jobs).await {
                warn!("Failed to record resubmitted jobs: {}", e);
                report.store_errors.push(e);
            }
            self.jobs.extend(new_jobs);

            let predecessors: Vec<Url> = report.resubmitted.iter().map(|r| r.original.clone()).collect();
            let cancelled = self.cancel_by_ids(&predecessors).await;
            for failure in &cancelled.failed {
                warn!(job = %failure.id, "Killing the job failed, it will still appear in the job list: {}", failure.error);
            }
            report.not_cancelled = cancelled.failed;

            if options.keep_history {
                return report;
            }

            let cleaned = self.clean_by_ids(&cancelled.succeeded).await;
            report.not_cleaned = cleaned.failed;

            match store.remove(&cleaned.succeeded).await {
                Ok(removed) => debug!(removed, "Removed predecessors from job list"),
                Err(e) => {
                    warn!("Failed to remove predecessors from job list: {}", e);
                    report.store_errors.push(e);
                }
            }
            self.forget(&cleaned.succeeded);

            report
        }
        .instrument(span)
        .await
    }

    /// One discovery round over the configured services
    ///
    /// In `Same` mode the candidates' own services are probed as well.
    async fn discover_targets(
        &self,
        backends: &SubmissionBackends,
        mode: TargetMode,
        candidates: &[Job],
    ) -> Vec<ExecutionTarget> {
        let options = DiscoveryOptions::from_config(&self.config).with_span(self.span.clone());
        let discovery = ServiceDiscovery::new(
            Arc::clone(&backends.registry),
            Arc::clone(&backends.target_info),
            options,
        );
        let collector = Arc::new(TargetCollector::new());
        discovery.add_consumer(collector.clone());

        for service in &self.config.services {
            discovery.add_endpoint(service.clone());
        }
        if mode == TargetMode::Same {
            for job in candidates {
                let mut info = job.info_endpoint.clone();
                info.set_query(None);
                discovery.add_endpoint(Endpoint::computing_info(info));
            }
        }

        discovery.wait().await;
        collector.targets()
    }

    /// Submit one replacement, walking description variants and ranked targets
    async fn submit_replacement(
        &self,
        original: &Job,
        eligible: Vec<ExecutionTarget>,
        backends: &SubmissionBackends,
    ) -> Result<Job, JobError> {
        let document = original.description.as_deref().ok_or_else(|| {
            JobError::Submission("no job description recorded for this job".to_string())
        })?;
        let mut descriptions: DescriptionSet = backends
            .parser
            .parse(document)
            .map_err(|e| JobError::Submission(format!("cannot parse job description: {}", e)))?;

        let mut last_error = None;
        descriptions.use_original();

        loop {
            let description = descriptions.selected();
            let ranked = backends
                .broker
                .sort_targets(eligible.clone(), &description.requirements);
            debug!(
                job = %original.id,
                variant = descriptions.selected_index(),
                targets = ranked.len(),
                "Trying description variant"
            );

            for target in &ranked {
                let Some(submitter) = backends.submitter_for(&target.flavour) else {
                    debug!(target = %target.submission_endpoint, flavour = %target.flavour, "No submitter for flavour");
                    continue;
                };
                let submitted =
                    tokio::time::timeout(self.config.timeout, submitter.submit(description, target)).await;
                match submitted {
                    Ok(Ok(receipt)) => {
                        return Ok(replacement_job(original, &descriptions, target, receipt, document));
                    }
                    Ok(Err(e)) => {
                        debug!(target = %target.submission_endpoint, "Submission failed: {}", e);
                        last_error = Some(JobError::Submission(e.to_string()));
                    }
                    Err(_) => {
                        debug!(target = %target.submission_endpoint, "Submission timed out");
                        last_error = Some(JobError::Timeout(self.config.timeout));
                    }
                }
            }

            if !descriptions.use_next_alternative() {
                break;
            }
        }

        Err(last_error.unwrap_or_else(|| JobError::Submission("no suitable target found".to_string())))
    }
}

fn replacement_job(
    original: &Job,
    descriptions: &DescriptionSet,
    target: &ExecutionTarget,
    receipt: SubmissionReceipt,
    document: &str,
) -> Job {
    let description = descriptions.selected();
    let info_endpoint = receipt
        .info_endpoint
        .unwrap_or_else(|| target.submission_endpoint.clone());

    let mut job = Job::new(receipt.job_id, target.flavour.clone(), target.submission_endpoint.clone())
        .with_info_endpoint(info_endpoint);
    job.name = description.name.clone().or_else(|| original.name.clone());
    job.outputs = description.outputs.clone();
    job.description = Some(document.to_string());
    job.submitted_at = Some(Utc::now());
    job.set_attribute(attr::SESSION_DIRECTORY, vec![receipt.output_base.to_string()]);
    job.predecessor_ids = original.predecessor_ids.clone();
    job.add_predecessor(original.id.clone());
    job
}
