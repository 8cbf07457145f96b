//! Job Supervisor
//!
//! Owns the jobs of one invocation, partitions them by flavour and dispatches
//! bulk operations to the flavour controllers. Every per-job result is folded
//! into a [`BulkOutcome`]; nothing a single job does can abort its siblings.

use futures::future::join_all;
use gridctl_core::domain::job::{Job, JobState};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tracing::{Instrument, Span, debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::controller::{ControllerContext, ControllerRegistry, JobController};
use crate::error::JobError;
use crate::service::outcome::BulkOutcome;

/// Per-job operations run one job at a time
#[derive(Debug, Clone)]
enum Operation {
    Retrieve(PathBuf),
    Cancel,
    Clean { force: bool },
    CleanUnchecked,
}

/// How a per-job operation succeeded
enum Handled {
    Acted,
    /// Nothing had to be done on the service
    Unchanged,
}

/// Jobs of one flavour handed to one controller
struct FlavourGroup {
    flavour: String,
    positions: Vec<usize>,
    jobs: Vec<Job>,
}

/// Orchestrates bulk operations over a set of jobs
pub struct JobSupervisor {
    pub(crate) config: Config,
    controllers: ControllerRegistry,
    instances: HashMap<String, Arc<dyn JobController>>,
    pub(crate) jobs: Vec<Job>,
    pub(crate) not_found: Vec<String>,
    interrupted: Arc<AtomicBool>,
    pub(crate) span: Span,
}

impl JobSupervisor {
    /// Creates a supervisor owning `jobs` for this invocation
    pub fn new(config: Config, controllers: ControllerRegistry, jobs: Vec<Job>) -> Self {
        Self {
            config,
            controllers,
            instances: HashMap::new(),
            jobs,
            not_found: Vec::new(),
            interrupted: Arc::new(AtomicBool::new(false)),
            span: Span::none(),
        }
    }

    /// Requested ids or names without a record, reported by every operation
    pub fn with_missing(mut self, not_found: Vec<String>) -> Self {
        self.not_found = not_found;
        self
    }

    /// Runs operations and the controllers it creates inside `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    /// Whether the selection yielded any job at all
    pub fn jobs_found(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn not_found(&self) -> &[String] {
        &self.not_found
    }

    /// Flag that stops the supervisor before its next per-job operation
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub(crate) fn new_outcome(&self) -> BulkOutcome {
        BulkOutcome::with_not_found(self.not_found.clone())
    }

    /// Controller for `flavour`, created on first use
    pub(crate) fn controller_for(&mut self, flavour: &str) -> Result<Arc<dyn JobController>, JobError> {
        let key = flavour.to_ascii_uppercase();
        if let Some(controller) = self.instances.get(&key) {
            return Ok(Arc::clone(controller));
        }

        let context = ControllerContext::new(self.config.timeout).with_span(self.span.clone());
        let controller = self.controllers.create(flavour, &context).ok_or_else(|| {
            JobError::Configuration(format!("no job controller for flavour '{}'", flavour))
        })?;
        self.instances.insert(key, Arc::clone(&controller));
        Ok(controller)
    }

    // =============================================================================
    // Status
    // =============================================================================

    /// Refresh every job from its information service
    ///
    /// Flavour groups are queried concurrently, bounded by
    /// `max_parallel_queries`. A job missing from its service's report keeps
    /// its last known state and counts as refreshed.
    pub async fn update_job_information(&mut self) -> BulkOutcome {
        let span = self.span.clone();
        async {
            let mut outcome = self.new_outcome();

            let mut partition: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
            for (position, job) in self.jobs.iter().enumerate() {
                partition
                    .entry(job.flavour.to_ascii_uppercase())
                    .or_insert_with(|| (job.flavour.clone(), Vec::new()))
                    .1
                    .push(position);
            }

            let mut slots: Vec<Option<Job>> =
                std::mem::take(&mut self.jobs).into_iter().map(Some).collect();
            let mut runs = Vec::new();

            for (flavour, positions) in partition.into_values() {
                let controller = match self.controller_for(&flavour) {
                    Ok(controller) => controller,
                    Err(e) => {
                        warn!(flavour = %flavour, "{}", e);
                        for &position in &positions {
                            if let Some(job) = &slots[position] {
                                outcome.record(job.id.clone(), Err(e.clone()));
                            }
                        }
                        continue;
                    }
                };
                let jobs = positions.iter().filter_map(|&p| slots[p].take()).collect();
                runs.push((
                    controller,
                    FlavourGroup {
                        flavour,
                        positions,
                        jobs,
                    },
                ));
            }

            let permits = Semaphore::new(self.config.max_parallel_queries.max(1));
            let interrupted = &self.interrupted;
            let permits = &permits;
            let results = join_all(runs.into_iter().map(|(controller, mut group)| async move {
                if interrupted.load(Ordering::SeqCst) {
                    return (group, None);
                }
                let Ok(_permit) = permits.acquire().await else {
                    return (group, None);
                };
                debug!(flavour = %group.flavour, jobs = group.jobs.len(), "Refreshing flavour group");
                let failures = controller.update_job_information(&mut group.jobs).await;
                (group, Some(failures))
            }))
            .await;

            for (group, failures) in results {
                let failures: HashMap<Url, JobError> = match failures {
                    Some(failures) => failures.into_iter().collect(),
                    None => group.jobs.iter().map(|j| (j.id.clone(), JobError::Aborted)).collect(),
                };
                for (position, job) in group.positions.into_iter().zip(group.jobs) {
                    let result = match failures.get(&job.id) {
                        Some(e) => Err(e.clone()),
                        None => Ok(()),
                    };
                    outcome.record(job.id.clone(), result);
                    slots[position] = Some(job);
                }
            }

            self.jobs = slots.into_iter().flatten().collect();
            info!(
                refreshed = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                "Updated job information"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    // =============================================================================
    // Per-job operations
    // =============================================================================

    /// Download finished jobs in `states` (all finished jobs when empty) below `download_dir`
    pub async fn retrieve(&mut self, download_dir: &Path, states: &[JobState]) -> BulkOutcome {
        let selected = self.select_by_states(states);
        self.run_per_job(selected, Operation::Retrieve(download_dir.to_path_buf()))
            .await
    }

    /// Cancel jobs in `states` (all when empty); finished jobs need nothing
    pub async fn cancel(&mut self, states: &[JobState]) -> BulkOutcome {
        let selected = self.select_by_states(states);
        self.run_per_job(selected, Operation::Cancel).await
    }

    pub async fn cancel_by_ids(&mut self, ids: &[Url]) -> BulkOutcome {
        let (selected, missing) = self.select_by_ids(ids);
        let mut outcome = self.run_per_job(selected, Operation::Cancel).await;
        outcome.not_found.extend(missing);
        outcome
    }

    /// Clean finished jobs in `states` (all when empty)
    ///
    /// With `force`, a job the information system does not know (state
    /// `Unknown`) is dropped without contacting its service.
    pub async fn clean(&mut self, states: &[JobState], force: bool) -> BulkOutcome {
        let selected = self.select_by_states(states);
        self.run_per_job(selected, Operation::Clean { force }).await
    }

    /// Clean the given jobs regardless of their last known state
    pub async fn clean_by_ids(&mut self, ids: &[Url]) -> BulkOutcome {
        let (selected, missing) = self.select_by_ids(ids);
        let mut outcome = self.run_per_job(selected, Operation::CleanUnchecked).await;
        outcome.not_found.extend(missing);
        outcome
    }

    /// Location of a job's output stream ("stdout", "stderr", "gmlog")
    pub fn file_url(&mut self, id_or_name: &str, which: &str) -> Result<Url, JobError> {
        let job = self
            .jobs
            .iter()
            .find(|job| job.matches_id_or_name(id_or_name))
            .cloned()
            .ok_or_else(|| JobError::NotFound(id_or_name.to_string()))?;
        let controller = self.controller_for(&job.flavour)?;
        Ok(controller.file_url_for_job(&job, which))
    }

    /// Drop jobs from the in-memory set, e.g. after removing them from the job list
    pub fn forget(&mut self, ids: &[Url]) {
        let ids: HashSet<&Url> = ids.iter().collect();
        self.jobs.retain(|job| !ids.contains(&job.id));
    }

    fn select_by_states(&self, states: &[JobState]) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|job| states.is_empty() || states.contains(&job.state))
            .cloned()
            .collect()
    }

    fn select_by_ids(&self, ids: &[Url]) -> (Vec<Job>, Vec<String>) {
        let selected: Vec<Job> = self
            .jobs
            .iter()
            .filter(|job| ids.contains(&job.id))
            .cloned()
            .collect();
        let missing = ids
            .iter()
            .filter(|id| !selected.iter().any(|job| &job.id == *id))
            .map(|id| id.to_string())
            .collect();
        (selected, missing)
    }

    async fn run_per_job(&mut self, jobs: Vec<Job>, operation: Operation) -> BulkOutcome {
        let span = self.span.clone();
        async {
            let mut outcome = self.new_outcome();

            for job in jobs {
                if self.is_interrupted() {
                    outcome.record(job.id.clone(), Err(JobError::Aborted));
                    continue;
                }
                match self.run_one(&job, &operation).await {
                    Ok(Handled::Acted) => outcome.record(job.id.clone(), Ok(())),
                    Ok(Handled::Unchanged) => outcome.record_unchanged(job.id.clone()),
                    Err(e) => {
                        warn!(job = %job.id, "{:?} failed: {}", operation, e);
                        outcome.record(job.id.clone(), Err(e));
                    }
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_one(&mut self, job: &Job, operation: &Operation) -> Result<Handled, JobError> {
        match operation {
            Operation::Retrieve(dir) => {
                require_finished(job, "only finished jobs can be retrieved")?;
                self.controller_for(&job.flavour)?.retrieve_job(job, dir).await?;
            }
            Operation::Cancel => {
                if job.state.is_finished() {
                    debug!(job = %job.id, state = %job.state, "Job already finished, nothing to cancel");
                    return Ok(Handled::Unchanged);
                }
                self.controller_for(&job.flavour)?.cancel_job(job).await?;
            }
            Operation::Clean { force } => {
                if *force && job.state == JobState::Unknown {
                    debug!(job = %job.id, "Dropping job unknown to the information system");
                    return Ok(Handled::Unchanged);
                }
                require_finished(job, "only finished jobs can be cleaned")?;
                let result = self.controller_for(&job.flavour)?.clean_job(job, *force).await;
                match result {
                    Err(JobError::NotFound(_)) if *force => {}
                    other => other?,
                }
            }
            Operation::CleanUnchecked => {
                self.controller_for(&job.flavour)?.clean_job(job, false).await?;
            }
        }
        Ok(Handled::Acted)
    }
}

fn require_finished(job: &Job, reason: &str) -> Result<(), JobError> {
    if job.state.is_finished() {
        Ok(())
    } else {
        Err(JobError::InvalidState {
            state: job.state,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerRegistry;
    use crate::testing::{FakeController, job_on};
    use std::time::Duration;

    fn config() -> Config {
        Config::new(PathBuf::from("jobs.json")).with_timeout(Duration::from_secs(5))
    }

    fn setup(jobs: Vec<Job>, controllers: &[Arc<FakeController>]) -> JobSupervisor {
        let mut registry = ControllerRegistry::new();
        for controller in controllers {
            registry.register(controller.flavour(), FakeController::share(Arc::clone(controller)));
        }
        JobSupervisor::new(config(), registry, jobs)
    }

    #[tokio::test]
    async fn test_partition_keeps_every_job_once() {
        let jobs: Vec<Job> = (0..9)
            .map(|n| {
                let flavour = ["ARC0", "EMIES", "UNICORE"][n % 3];
                job_on(&format!("ce{}.example.org", n % 2), &n.to_string(), flavour, JobState::Running)
            })
            .collect();
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let emies = Arc::new(FakeController::new("EMIES"));
        let unicore = Arc::new(FakeController::new("UNICORE"));
        let mut supervisor = setup(jobs.clone(), &[arc0.clone(), emies.clone(), unicore.clone()]);

        let outcome = supervisor.update_job_information().await;

        assert_eq!(outcome.succeeded.len(), 9);
        assert_eq!(supervisor.jobs(), &jobs[..]);
        assert_eq!(arc0.refreshed().len(), 3);
        assert_eq!(emies.refreshed().len(), 3);
        assert_eq!(unicore.refreshed().len(), 3);
        let mut handled: Vec<Url> = [arc0.refreshed(), emies.refreshed(), unicore.refreshed()].concat();
        handled.sort();
        let mut expected: Vec<Url> = jobs.iter().map(|j| j.id.clone()).collect();
        expected.sort();
        assert_eq!(handled, expected);
    }

    #[tokio::test]
    async fn test_unknown_flavour_fails_only_its_jobs() {
        let known = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let orphan = job_on("ce.example.org", "2", "CREAM", JobState::Running);
        let arc0 = Arc::new(FakeController::new("ARC0").reporting(&known.id, JobState::Finished));
        let mut supervisor = setup(vec![known.clone(), orphan.clone()], &[arc0]);

        let outcome = supervisor.update_job_information().await;

        assert_eq!(outcome.succeeded, vec![known.id.clone()]);
        assert_eq!(outcome.failed.len(), 1);
        assert!(matches!(outcome.failed[0].error, JobError::Configuration(_)));
        assert_eq!(supervisor.jobs()[0].state, JobState::Finished);
        assert_eq!(supervisor.jobs()[1], orphan);
    }

    #[tokio::test]
    async fn test_cancel_skips_finished_and_isolates_failures() {
        let running = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let broken = job_on("ce.example.org", "2", "ARC0", JobState::Queuing);
        let done = job_on("ce.example.org", "3", "ARC0", JobState::Finished);
        let arc0 = Arc::new(FakeController::new("ARC0").failing(&broken.id));
        let mut supervisor = setup(vec![running.clone(), broken.clone(), done.clone()], &[arc0.clone()]);

        let outcome = supervisor.cancel(&[]).await;

        assert_eq!(outcome.succeeded, vec![running.id.clone(), done.id.clone()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, broken.id);
        assert_eq!(outcome.summary("killed"), "2 of 3 jobs were killed");
        assert_eq!(outcome.unchanged, vec![done.id.clone()]);
        assert_eq!(arc0.calls(), vec![format!("cancel {}", running.id), format!("cancel {}", broken.id)]);
    }

    #[tokio::test]
    async fn test_cleaning_after_cancel_leaves_finished_jobs_alone() {
        let running = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let done = job_on("ce.example.org", "3", "ARC0", JobState::Finished);
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let mut supervisor = setup(vec![running.clone(), done.clone()], &[arc0.clone()]);

        let cancelled = supervisor.cancel(&[]).await;
        assert_eq!(cancelled.acted_on(), vec![running.id.clone()]);
        let cleaned = supervisor.clean_by_ids(&cancelled.acted_on()).await;

        assert_eq!(cleaned.succeeded, vec![running.id.clone()]);
        assert_eq!(
            arc0.calls(),
            vec![format!("cancel {}", running.id), format!("clean {}", running.id)]
        );
    }

    #[tokio::test]
    async fn test_clean_requires_finished_unless_forced_unknown() {
        let running = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let unknown = job_on("ce.example.org", "2", "ARC0", JobState::Unknown);
        let done = job_on("ce.example.org", "3", "ARC0", JobState::Failed);
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let jobs = vec![running.clone(), unknown.clone(), done.clone()];

        let mut supervisor = setup(jobs.clone(), &[arc0.clone()]);
        let outcome = supervisor.clean(&[], false).await;
        assert_eq!(outcome.succeeded, vec![done.id.clone()]);
        assert!(matches!(outcome.failed[0].error, JobError::InvalidState { .. }));

        let mut supervisor = setup(jobs, &[arc0.clone()]);
        let forced = supervisor.clean(&[], true).await;
        assert_eq!(forced.succeeded, vec![unknown.id.clone(), done.id.clone()]);
        assert_eq!(forced.unchanged, vec![unknown.id.clone()]);
        assert_eq!(
            arc0.calls(),
            vec![format!("clean {}", done.id), format!("clean {}", done.id)]
        );
    }

    #[tokio::test]
    async fn test_clean_by_ids_skips_state_check() {
        let running = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let mut supervisor = setup(vec![running.clone()], &[arc0.clone()]);
        let ghost = Url::parse("gsiftp://ce.example.org:2811/jobs/404").unwrap();

        let outcome = supervisor.clean_by_ids(&[running.id.clone(), ghost.clone()]).await;

        assert_eq!(outcome.succeeded, vec![running.id.clone()]);
        assert_eq!(outcome.not_found, vec![ghost.to_string()]);
        assert_eq!(outcome.status(), crate::OperationStatus::PartialFailure);
    }

    #[tokio::test]
    async fn test_retrieve_only_finished() {
        let dir = tempfile::tempdir().unwrap();
        let running = job_on("ce.example.org", "1", "ARC0", JobState::Running);
        let done = job_on("ce.example.org", "2", "ARC0", JobState::Finished);
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let mut supervisor = setup(vec![running, done.clone()], &[arc0.clone()]);

        let outcome = supervisor.retrieve(dir.path(), &[]).await;

        assert_eq!(outcome.succeeded, vec![done.id.clone()]);
        assert_eq!(arc0.calls(), vec![format!("retrieve {}", done.id)]);
    }

    #[tokio::test]
    async fn test_interrupt_aborts_remaining_jobs() {
        let jobs: Vec<Job> = (1..=3)
            .map(|n| job_on("ce.example.org", &n.to_string(), "ARC0", JobState::Running))
            .collect();
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let mut supervisor = setup(jobs, &[arc0.clone()]);
        supervisor.interrupt_handle().store(true, Ordering::SeqCst);

        let outcome = supervisor.cancel(&[]).await;

        assert!(outcome.succeeded.is_empty());
        assert!(outcome.failed.iter().all(|f| f.error == JobError::Aborted));
        assert!(arc0.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_reported_in_outcomes() {
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let supervisor = setup(Vec::new(), &[arc0]).with_missing(vec!["lost-job".to_string()]);
        assert!(!supervisor.jobs_found());

        let mut supervisor = supervisor;
        let outcome = supervisor.update_job_information().await;
        assert_eq!(outcome.not_found, vec!["lost-job".to_string()]);
        assert_eq!(outcome.status(), crate::OperationStatus::Failure);
    }

    #[test]
    fn test_file_url_uses_job_controller() {
        let job = job_on("ce.example.org", "1", "ARC0", JobState::Finished).with_name("analysis");
        let arc0 = Arc::new(FakeController::new("ARC0"));
        let mut supervisor = setup(vec![job.clone()], &[arc0]);

        let url = supervisor.file_url("analysis", "stdout").unwrap();
        assert_eq!(url.as_str(), format!("{}/stdout", job.id));
        assert!(matches!(
            supervisor.file_url("nothing", "stdout"),
            Err(JobError::NotFound(_))
        ));
    }
}
