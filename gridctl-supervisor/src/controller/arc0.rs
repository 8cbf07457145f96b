//! ARC0 job controller
//!
//! Jobs of the classic NorduGrid interface: status comes from the LDAP
//! information system (one combined filter per information service), control
//! happens over a GridFTP-style command channel and files are listed and
//! downloaded from the job's session directory.

use async_trait::async_trait;
use gridctl_client::{ControlConnector, ControlSession, FileTransfer, InfoService};
use gridctl_core::domain::job::{Job, JobState, attr};
use gridctl_core::dto::status::StatusRecord;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, Span, debug, info, warn};
use url::Url;

use crate::controller::{ControllerContext, ControllerFactory, JobController};
use crate::error::JobError;

pub const FLAVOUR: &str = "ARC0";

const GLOBAL_ID: &str = "nordugrid-job-globalid";
const STATUS: &str = "nordugrid-job-status";
const JOB_NAME: &str = "nordugrid-job-jobname";
const STDOUT: &str = "nordugrid-job-stdout";
const STDERR: &str = "nordugrid-job-stderr";
const GMLOG: &str = "nordugrid-job-gmlog";

/// Information system attributes copied verbatim onto the job
const PASS_THROUGH: &[(&str, &str)] = &[
    ("nordugrid-job-globalowner", attr::OWNER),
    ("nordugrid-job-execcluster", attr::EXECUTION_CE),
    ("nordugrid-job-execqueue", attr::QUEUE),
    ("nordugrid-job-submissionui", attr::SUBMISSION_HOST),
    ("nordugrid-job-submissiontime", attr::SUBMISSION_TIME),
    ("nordugrid-job-clientsoftware", attr::SUBMISSION_CLIENT),
    ("Mds-validfrom", attr::CREATION_TIME),
    ("Mds-validto", attr::VALID_TO),
    ("nordugrid-job-completiontime", attr::END_TIME),
    ("nordugrid-job-sessiondirerasetime", attr::WORKING_AREA_ERASE_TIME),
    ("nordugrid-job-proxyexpirationtime", attr::PROXY_EXPIRATION_TIME),
    ("nordugrid-job-cpucount", attr::USED_SLOTS),
    ("nordugrid-job-usedcputime", attr::USED_CPU_TIME),
    ("nordugrid-job-usedwalltime", attr::USED_WALL_TIME),
    ("nordugrid-job-usedmem", attr::USED_MEMORY),
    ("nordugrid-job-reqcputime", attr::REQUESTED_CPU_TIME),
    ("nordugrid-job-reqwalltime", attr::REQUESTED_WALL_TIME),
    ("nordugrid-job-exitcode", attr::EXIT_CODE),
    ("nordugrid-job-rerunable", attr::RESTART_STATE),
    ("nordugrid-job-queuerank", attr::WAITING_POSITION),
    ("nordugrid-job-stdin", attr::STDIN),
    ("nordugrid-job-comment", attr::OTHER_MESSAGES),
    ("nordugrid-job-errors", attr::ERRORS),
    ("nordugrid-job-executionnodes", attr::EXECUTION_NODES),
    ("nordugrid-job-runtimeenvironment", attr::APPLICATION_ENVIRONMENTS),
];

/// Controller for ARC0 jobs
pub struct Arc0Controller {
    info: Arc<dyn InfoService>,
    control: Arc<dyn ControlConnector>,
    transfer: Arc<dyn FileTransfer>,
    timeout: Duration,
    span: Span,
}

impl Arc0Controller {
    pub fn new(
        info: Arc<dyn InfoService>,
        control: Arc<dyn ControlConnector>,
        transfer: Arc<dyn FileTransfer>,
        context: &ControllerContext,
    ) -> Self {
        Self {
            info,
            control,
            transfer,
            timeout: context.timeout,
            span: context.span.clone(),
        }
    }

    /// Factory for a [`ControllerRegistry`](crate::controller::ControllerRegistry)
    pub fn factory(
        info: Arc<dyn InfoService>,
        control: Arc<dyn ControlConnector>,
        transfer: Arc<dyn FileTransfer>,
    ) -> ControllerFactory {
        Arc::new(move |context: &ControllerContext| {
            Arc::new(Arc0Controller::new(
                Arc::clone(&info),
                Arc::clone(&control),
                Arc::clone(&transfer),
                context,
            )) as Arc<dyn JobController>
        })
    }

    /// Await a collaborator call within the configured timeout
    async fn bounded<T>(
        &self,
        call: impl Future<Output = gridctl_client::Result<T>>,
    ) -> Result<T, JobError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(JobError::from),
            Err(_) => Err(JobError::Timeout(self.timeout)),
        }
    }

    /// Connect, change to the job's parent directory, issue `<command> <id>`, disconnect
    ///
    /// A failing step skips the remaining ones. The session is always closed;
    /// a failed close only counts when everything else succeeded.
    async fn run_control_sequence(&self, job: &Job, command: &str) -> Result<(), JobError> {
        let (parent, id_number) = split_job_path(&job.id)?;

        let mut session = self.bounded(self.control.connect(&job.id)).await?;
        let outcome = self
            .issue_commands(
                session.as_mut(),
                &[format!("CWD {}", parent), format!("{} {}", command, id_number)],
            )
            .await;
        let closed = self.bounded(session.disconnect()).await;

        match (outcome, closed) {
            (Ok(()), closed) => closed,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                debug!(job = %job.id, "Disconnect after failure also failed: {}", close_err);
                Err(e)
            }
        }
    }

    async fn issue_commands(
        &self,
        session: &mut dyn ControlSession,
        commands: &[String],
    ) -> Result<(), JobError> {
        for command in commands {
            self.bounded(session.send_command(command)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobController for Arc0Controller {
    fn flavour(&self) -> &str {
        FLAVOUR
    }

    async fn update_job_information(&self, jobs: &mut [Job]) -> Vec<(Url, JobError)> {
        async {
            let mut failures = Vec::new();

            // One query per information service and search base
            let mut groups: BTreeMap<String, (Url, Vec<usize>)> = BTreeMap::new();
            for (position, job) in jobs.iter().enumerate() {
                let base = query_base(&job.info_endpoint);
                groups
                    .entry(base.as_str().to_string())
                    .or_insert_with(|| (base, Vec::new()))
                    .1
                    .push(position);
            }

            for (base, positions) in groups.into_values() {
                let filter = combined_filter(positions.iter().map(|&p| job_predicate(&jobs[p])));
                debug!(endpoint = %base, jobs = positions.len(), "Querying job status");

                let records = match self.bounded(self.info.query(&base, &filter)).await {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(endpoint = %base, "Status query failed: {}", e);
                        failures.extend(positions.iter().map(|&p| (jobs[p].id.clone(), e.clone())));
                        continue;
                    }
                };

                let by_id: HashMap<&str, &StatusRecord> = records
                    .iter()
                    .filter_map(|r| r.first(GLOBAL_ID).map(|id| (id.trim_end_matches('/'), r)))
                    .collect();

                for &position in &positions {
                    let job = &mut jobs[position];
                    match by_id.get(job.id.as_str().trim_end_matches('/')) {
                        Some(record) => apply_record(job, record),
                        None => debug!(job = %job.id, "Job not reported by information system yet"),
                    }
                }
            }

            failures
        }
        .instrument(self.span.clone())
        .await
    }

    async fn retrieve_job(&self, job: &Job, download_dir: &Path) -> Result<(), JobError> {
        async {
            let files = self.bounded(self.transfer.list_files(&job.id)).await?;
            let destination = download_dir.join(job.id_number());
            let mut failed = 0;

            for file in &files {
                let copied = match (child_url(&job.id, file), local_path(&destination, file)) {
                    (Some(source), Some(target)) => self.bounded(self.transfer.copy(&source, &target)).await,
                    _ => Err(JobError::Protocol(format!("invalid file name '{}'", file))),
                };
                if let Err(e) = copied {
                    warn!(job = %job.id, file = %file, "Failed to download: {}", e);
                    failed += 1;
                }
            }

            if failed > 0 {
                return Err(JobError::Transfer {
                    failed,
                    total: files.len(),
                });
            }

            info!(job = %job.id, files = files.len(), dir = %destination.display(), "Downloaded job");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    async fn clean_job(&self, job: &Job, force: bool) -> Result<(), JobError> {
        async {
            debug!(job = %job.id, force, "Cleaning job");
            self.run_control_sequence(job, "RMD").await
        }
        .instrument(self.span.clone())
        .await
    }

    async fn cancel_job(&self, job: &Job) -> Result<(), JobError> {
        async {
            debug!(job = %job.id, "Cancelling job");
            self.run_control_sequence(job, "DELE").await
        }
        .instrument(self.span.clone())
        .await
    }

    fn file_url_for_job(&self, job: &Job, which: &str) -> Url {
        match which {
            "stdout" => job
                .outputs
                .stdout
                .as_deref()
                .and_then(|name| child_url(&job.id, name))
                .unwrap_or_else(|| job.id.clone()),
            "stderr" => job
                .outputs
                .stderr
                .as_deref()
                .and_then(|name| child_url(&job.id, name))
                .unwrap_or_else(|| job.id.clone()),
            "gmlog" => gmlog_url(&job.id),
            _ => job.id.clone(),
        }
    }
}

// =============================================================================
// Status handling
// =============================================================================

/// Map an ARC0 status string onto the common state set
pub fn map_arc0_state(native: &str) -> JobState {
    let normalized = native.trim().to_ascii_uppercase().replace(' ', "");
    let normalized = normalized.strip_prefix("PENDING:").unwrap_or(&normalized);

    match normalized {
        "ACCEPTING" | "ACCEPTED" => JobState::Accepted,
        "PREPARING" | "PREPARED" => JobState::Preparing,
        "SUBMIT" | "SUBMITTING" => JobState::Submitting,
        "INLRMS:Q" => JobState::Queuing,
        "INLRMS:R" | "INLRMS:E" | "INLRMS:S" | "INLRMS:O" | "EXECUTED" => JobState::Running,
        "FINISHING" | "KILLING" | "CANCELING" => JobState::Finishing,
        "FINISHED" => JobState::Finished,
        "KILLED" => JobState::Killed,
        "FAILED" => JobState::Failed,
        "DELETED" => JobState::Deleted,
        _ => JobState::Unknown,
    }
}

/// Copy every field present in `record` onto `job`
fn apply_record(job: &mut Job, record: &StatusRecord) {
    if let Some(status) = record.first(STATUS) {
        job.native_state = Some(status.to_string());
        job.state = map_arc0_state(status);
    }
    if let Some(name) = record.first(JOB_NAME) {
        job.name = Some(name.to_string());
    }
    if let Some(stdout) = record.first(STDOUT) {
        job.outputs.stdout = Some(stdout.to_string());
    }
    if let Some(stderr) = record.first(STDERR) {
        job.outputs.stderr = Some(stderr.to_string());
    }
    if let Some(gmlog) = record.first(GMLOG) {
        job.outputs.log_dir = Some(gmlog.to_string());
    }

    for (source, key) in PASS_THROUGH {
        let values = record.all(source);
        if !values.is_empty() {
            job.set_attribute(key, values.to_vec());
        }
    }
}

/// The information endpoint without its query part
fn query_base(info_endpoint: &Url) -> Url {
    let mut base = info_endpoint.clone();
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Filter selecting one job
///
/// LDAP URLs carry their filter as the third `?` separated field
/// (`ldap://host/base?attrs?scope?filter`); without one the job is selected
/// by its global id.
fn job_predicate(job: &Job) -> String {
    job.info_endpoint
        .query()
        .and_then(|query| query.split('?').nth(2))
        .filter(|filter| !filter.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("({}={})", GLOBAL_ID, job.id))
}

fn combined_filter(predicates: impl Iterator<Item = String>) -> String {
    let mut filter = String::from("(|");
    for predicate in predicates {
        filter.push_str(&predicate);
    }
    filter.push(')');
    filter
}

// =============================================================================
// URL helpers
// =============================================================================

/// Split a job URL into its parent directory path and id number
fn split_job_path(id: &Url) -> Result<(String, String), JobError> {
    let path = id.path().trim_end_matches('/');
    match path.rsplit_once('/') {
        Some((parent, id_number)) if !id_number.is_empty() => {
            let parent = if parent.is_empty() { "/" } else { parent };
            Ok((parent.to_string(), id_number.to_string()))
        }
        _ => Err(JobError::Configuration(format!(
            "job id {} has no job directory",
            id
        ))),
    }
}

fn child_url(base: &Url, relative: &str) -> Option<Url> {
    let relative = relative.trim_start_matches('/');
    Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), relative)).ok()
}

/// `relative` below `destination`, or `None` if it would leave it
fn local_path(destination: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let inside = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    (inside && relative.components().next().is_some()).then(|| destination.join(relative))
}

/// `<scheme>://host/jobs/123` becomes `<scheme>://host/jobs/info/123/errors`
fn gmlog_url(id: &Url) -> Url {
    let path = id.path().trim_end_matches('/');
    let mut url = id.clone();
    if let Some(pos) = path.rfind('/') {
        url.set_path(&format!("{}/info{}/errors", &path[..pos], &path[pos..]));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingInfo, MemoryTransfer, ScriptedControl, job_on};

    fn controller(
        info: Arc<CountingInfo>,
        control: Arc<ScriptedControl>,
        transfer: Arc<MemoryTransfer>,
    ) -> Arc0Controller {
        Arc0Controller::new(info, control, transfer, &ControllerContext::new(Duration::from_secs(5)))
    }

    fn status(job: &Job, state: &str) -> StatusRecord {
        StatusRecord::new()
            .with(GLOBAL_ID, job.id.as_str())
            .with(STATUS, state)
    }

    #[tokio::test]
    async fn test_one_combined_query_per_host() {
        let mut jobs: Vec<Job> = (1..=5)
            .map(|n| job_on("h.example.org", &n.to_string(), FLAVOUR, JobState::Queuing))
            .collect();
        let info = Arc::new(CountingInfo::new(vec![
            status(&jobs[0], "FINISHED"),
            status(&jobs[2], "INLRMS:R"),
            status(&jobs[4], "FAILED"),
        ]));
        let arc0 = controller(
            Arc::clone(&info),
            Arc::new(ScriptedControl::new()),
            Arc::new(MemoryTransfer::new()),
        );

        let failures = arc0.update_job_information(&mut jobs).await;

        assert!(failures.is_empty());
        let calls = info.calls();
        assert_eq!(calls.len(), 1);
        let expected: String = jobs
            .iter()
            .map(|j| format!("(nordugrid-job-globalid={})", j.id))
            .collect();
        assert_eq!(calls[0].1, format!("(|{})", expected));

        let states: Vec<JobState> = jobs.iter().map(|j| j.state).collect();
        assert_eq!(
            states,
            vec![
                JobState::Finished,
                JobState::Queuing,
                JobState::Running,
                JobState::Queuing,
                JobState::Failed
            ]
        );
        assert_eq!(jobs[0].native_state.as_deref(), Some("FINISHED"));
        assert_eq!(jobs[1].native_state, None);
    }

    #[tokio::test]
    async fn test_failed_group_does_not_stop_other_hosts() {
        let mut jobs = vec![
            job_on("down.example.org", "1", FLAVOUR, JobState::Running),
            job_on("up.example.org", "2", FLAVOUR, JobState::Running),
        ];
        let info = Arc::new(
            CountingInfo::new(vec![status(&jobs[1], "FINISHED")]).failing_host("down.example.org"),
        );
        let arc0 = controller(
            Arc::clone(&info),
            Arc::new(ScriptedControl::new()),
            Arc::new(MemoryTransfer::new()),
        );

        let failures = arc0.update_job_information(&mut jobs).await;

        assert_eq!(info.calls().len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, jobs[0].id);
        assert_eq!(jobs[0].state, JobState::Running);
        assert_eq!(jobs[1].state, JobState::Finished);
    }

    #[tokio::test]
    async fn test_stalled_query_times_out_only_its_group() {
        let mut jobs = vec![
            job_on("slow.example.org", "1", FLAVOUR, JobState::Running),
            job_on("slow.example.org", "2", FLAVOUR, JobState::Queuing),
            job_on("up.example.org", "3", FLAVOUR, JobState::Running),
        ];
        let info = Arc::new(
            CountingInfo::new(vec![status(&jobs[2], "FINISHED")]).stalling_host("slow.example.org"),
        );
        let timeout = Duration::from_millis(50);
        let arc0 = Arc0Controller::new(
            info,
            Arc::new(ScriptedControl::new()),
            Arc::new(MemoryTransfer::new()),
            &ControllerContext::new(timeout),
        );

        let failures = arc0.update_job_information(&mut jobs).await;

        assert_eq!(
            failures,
            vec![
                (jobs[0].id.clone(), JobError::Timeout(timeout)),
                (jobs[1].id.clone(), JobError::Timeout(timeout)),
            ]
        );
        assert_eq!(jobs[0].state, JobState::Running);
        assert_eq!(jobs[2].state, JobState::Finished);
    }

    #[tokio::test]
    async fn test_absent_fields_are_kept() {
        let mut jobs = vec![job_on("h.example.org", "1", FLAVOUR, JobState::Running)];
        jobs[0].set_attribute(attr::QUEUE, vec!["long".to_string()]);
        let record = StatusRecord::new()
            .with(GLOBAL_ID, jobs[0].id.as_str())
            .with("nordugrid-job-exitcode", "0")
            .with("nordugrid-job-executionnodes", "n1")
            .with("nordugrid-job-executionnodes", "n2")
            .with(STDOUT, "out.txt");
        let arc0 = controller(
            Arc::new(CountingInfo::new(vec![record])),
            Arc::new(ScriptedControl::new()),
            Arc::new(MemoryTransfer::new()),
        );

        arc0.update_job_information(&mut jobs).await;

        let job = &jobs[0];
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.attribute(attr::QUEUE), Some("long"));
        assert_eq!(job.attribute(attr::EXIT_CODE), Some("0"));
        assert_eq!(job.attributes[attr::EXECUTION_NODES].len(), 2);
        assert_eq!(job.outputs.stdout.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_filter_from_info_endpoint() {
        let job = job_on("h.example.org", "7", FLAVOUR, JobState::Running).with_info_endpoint(
            Url::parse("ldap://h.example.org:2135/mds-vo-name=local,o=grid??sub?(nordugrid-job-globalid=x)")
                .unwrap(),
        );
        assert_eq!(job_predicate(&job), "(nordugrid-job-globalid=x)");
        assert_eq!(
            query_base(&job.info_endpoint).as_str(),
            "ldap://h.example.org:2135/mds-vo-name=local,o=grid"
        );
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_arc0_state("INLRMS:Q"), JobState::Queuing);
        assert_eq!(map_arc0_state("INLRMS: R"), JobState::Running);
        assert_eq!(map_arc0_state("PENDING:PREPARING"), JobState::Preparing);
        assert_eq!(map_arc0_state("finished"), JobState::Finished);
        assert_eq!(map_arc0_state("KILLING"), JobState::Finishing);
        assert_eq!(map_arc0_state("whatever"), JobState::Unknown);
    }

    #[tokio::test]
    async fn test_clean_issues_rmd_in_parent_directory() {
        let control = Arc::new(ScriptedControl::new());
        let arc0 = controller(
            Arc::new(CountingInfo::new(Vec::new())),
            Arc::clone(&control),
            Arc::new(MemoryTransfer::new()),
        );
        let job = job_on("h.example.org", "123", FLAVOUR, JobState::Finished);

        arc0.clean_job(&job, false).await.unwrap();
        arc0.cancel_job(&job).await.unwrap();

        assert_eq!(
            control.log(),
            vec!["CONNECT", "CWD /jobs", "RMD 123", "DISCONNECT", "CONNECT", "CWD /jobs", "DELE 123", "DISCONNECT"]
        );
    }

    #[tokio::test]
    async fn test_failed_command_still_disconnects() {
        let control = Arc::new(ScriptedControl::new().failing_on("CWD"));
        let arc0 = controller(
            Arc::new(CountingInfo::new(Vec::new())),
            Arc::clone(&control),
            Arc::new(MemoryTransfer::new()),
        );
        let job = job_on("h.example.org", "123", FLAVOUR, JobState::Finished);

        let err = arc0.clean_job(&job, false).await.unwrap_err();

        assert!(matches!(err, JobError::Protocol(_)));
        assert_eq!(control.log(), vec!["CONNECT", "CWD /jobs", "DISCONNECT"]);
    }

    #[tokio::test]
    async fn test_retrieve_attempts_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_on("h.example.org", "55", FLAVOUR, JobState::Finished);
        let transfer = Arc::new(
            MemoryTransfer::new()
                .with_file(&job.id, "out.txt", b"hello")
                .with_missing_file(&job.id, "lost.txt")
                .with_file(&job.id, "results/data.csv", b"1,2"),
        );
        let arc0 = controller(
            Arc::new(CountingInfo::new(Vec::new())),
            Arc::new(ScriptedControl::new()),
            transfer,
        );

        let err = arc0.retrieve_job(&job, dir.path()).await.unwrap_err();

        assert_eq!(err, JobError::Transfer { failed: 1, total: 3 });
        let base = dir.path().join("55");
        assert_eq!(std::fs::read(base.join("out.txt")).unwrap(), b"hello");
        assert_eq!(std::fs::read(base.join("results/data.csv")).unwrap(), b"1,2");
    }

    #[tokio::test]
    async fn test_retrieve_refuses_names_outside_job_directory() {
        let dir = tempfile::tempdir().unwrap();
        let download = dir.path().join("dl");
        let job = job_on("h.example.org", "55", FLAVOUR, JobState::Finished);
        let transfer = Arc::new(
            MemoryTransfer::new()
                .with_file(&job.id, "out.txt", b"hello")
                .with_file(&job.id, "../../escaped.txt", b"boom"),
        );
        let arc0 = controller(
            Arc::new(CountingInfo::new(Vec::new())),
            Arc::new(ScriptedControl::new()),
            transfer,
        );

        let err = arc0.retrieve_job(&job, &download).await.unwrap_err();

        assert_eq!(err, JobError::Transfer { failed: 1, total: 2 });
        assert_eq!(std::fs::read(download.join("55/out.txt")).unwrap(), b"hello");
        assert!(!dir.path().join("escaped.txt").exists());
        assert!(!download.join("escaped.txt").exists());
    }

    #[test]
    fn test_local_path_stays_below_destination() {
        let base = Path::new("/tmp/dl/55");
        assert_eq!(local_path(base, "results/data.csv"), Some(base.join("results/data.csv")));
        assert_eq!(local_path(base, "../../x"), None);
        assert_eq!(local_path(base, "a/../../x"), None);
        assert_eq!(local_path(base, "/etc/passwd"), None);
        assert_eq!(local_path(base, ""), None);
    }

    #[test]
    fn test_file_urls() {
        let arc0 = controller(
            Arc::new(CountingInfo::new(Vec::new())),
            Arc::new(ScriptedControl::new()),
            Arc::new(MemoryTransfer::new()),
        );
        let mut job = job_on("h.example.org", "123", FLAVOUR, JobState::Finished);
        job.outputs.stdout = Some("out.txt".to_string());

        assert_eq!(
            arc0.file_url_for_job(&job, "stdout").as_str(),
            "gsiftp://h.example.org:2811/jobs/123/out.txt"
        );
        assert_eq!(arc0.file_url_for_job(&job, "stderr"), job.id);
        assert_eq!(
            arc0.file_url_for_job(&job, "gmlog").as_str(),
            "gsiftp://h.example.org:2811/jobs/info/123/errors"
        );
        assert_eq!(arc0.file_url_for_job(&job, "session"), job.id);
    }
}
