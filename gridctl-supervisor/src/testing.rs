//! In-memory collaborators shared by the unit tests

use async_trait::async_trait;
use gridctl_client::{
    ClientError, ControlConnector, ControlSession, DescriptionParser, FileTransfer, InfoService,
    RegistryService, Submitter, TargetInfoService,
};
use gridctl_core::domain::description::{DescriptionSet, JobDescription};
use gridctl_core::domain::endpoint::Endpoint;
use gridctl_core::domain::job::{Job, JobState};
use gridctl_core::domain::target::ExecutionTarget;
use gridctl_core::dto::status::StatusRecord;
use gridctl_core::dto::submission::SubmissionReceipt;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

use crate::controller::{ControllerFactory, JobController};
use crate::error::JobError;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// An ARC0-style job `gsiftp://<host>:2811/jobs/<num>`
pub fn job_on(host: &str, num: &str, flavour: &str, state: JobState) -> Job {
    Job::new(
        url(&format!("gsiftp://{}:2811/jobs/{}", host, num)),
        flavour,
        url(&format!("gsiftp://{}:2811/jobs", host)),
    )
    .with_info_endpoint(url(&format!("ldap://{}:2135/mds-vo-name=local,o=grid", host)))
    .with_state(state)
}

pub fn target_on(host: &str) -> ExecutionTarget {
    ExecutionTarget::new(host, "ARC0", url(&format!("gsiftp://{}:2811/jobs", host)))
}

// =============================================================================
// Client fakes
// =============================================================================

/// Information service answering every query with the same records
pub struct CountingInfo {
    records: Vec<StatusRecord>,
    failing_hosts: HashSet<String>,
    stalling_hosts: HashSet<String>,
    calls: Mutex<Vec<(Url, String)>>,
}

impl CountingInfo {
    pub fn new(records: Vec<StatusRecord>) -> Self {
        Self {
            records,
            failing_hosts: HashSet::new(),
            stalling_hosts: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_host(mut self, host: &str) -> Self {
        self.failing_hosts.insert(host.to_string());
        self
    }

    /// Queries to `host` never answer
    pub fn stalling_host(mut self, host: &str) -> Self {
        self.stalling_hosts.insert(host.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(Url, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl InfoService for CountingInfo {
    async fn query(&self, endpoint: &Url, filter: &str) -> gridctl_client::Result<Vec<StatusRecord>> {
        lock(&self.calls).push((endpoint.clone(), filter.to_string()));
        let host = endpoint.host_str().unwrap_or_default();
        if self.stalling_hosts.contains(host) {
            std::future::pending::<()>().await;
        }
        if self.failing_hosts.contains(host) {
            return Err(ClientError::Protocol("connection refused".to_string()));
        }
        Ok(self.records.clone())
    }
}

/// Control channel recording every command
#[derive(Default)]
pub struct ScriptedControl {
    log: Arc<Mutex<Vec<String>>>,
    failing_prefix: Option<String>,
}

impl ScriptedControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` get an error reply
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.failing_prefix = Some(prefix.to_string());
        self
    }

    pub fn log(&self) -> Vec<String> {
        lock(&self.log).clone()
    }
}

struct ScriptedSession {
    log: Arc<Mutex<Vec<String>>>,
    failing_prefix: Option<String>,
}

#[async_trait]
impl ControlConnector for ScriptedControl {
    async fn connect(&self, _url: &Url) -> gridctl_client::Result<Box<dyn ControlSession>> {
        lock(&self.log).push("CONNECT".to_string());
        Ok(Box::new(ScriptedSession {
            log: Arc::clone(&self.log),
            failing_prefix: self.failing_prefix.clone(),
        }))
    }
}

#[async_trait]
impl ControlSession for ScriptedSession {
    async fn send_command(&mut self, command: &str) -> gridctl_client::Result<String> {
        lock(&self.log).push(command.to_string());
        match &self.failing_prefix {
            Some(prefix) if command.starts_with(prefix.as_str()) => {
                Err(ClientError::Protocol(format!("550 {} failed", command)))
            }
            _ => Ok("250 OK".to_string()),
        }
    }

    async fn disconnect(&mut self) -> gridctl_client::Result<()> {
        lock(&self.log).push("DISCONNECT".to_string());
        Ok(())
    }
}

/// Remote files keyed by full URL; `None` is listed but cannot be copied
#[derive(Default)]
pub struct MemoryTransfer {
    files: BTreeMap<String, Option<Vec<u8>>>,
}

impl MemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, base: &Url, relative: &str, content: &[u8]) -> Self {
        self.files.insert(Self::key(base, relative), Some(content.to_vec()));
        self
    }

    pub fn with_missing_file(mut self, base: &Url, relative: &str) -> Self {
        self.files.insert(Self::key(base, relative), None);
        self
    }

    fn key(base: &Url, relative: &str) -> String {
        format!("{}/{}", base.as_str().trim_end_matches('/'), relative)
    }

    fn content(&self, source: &Url) -> gridctl_client::Result<Vec<u8>> {
        match self.files.get(source.as_str()) {
            Some(Some(content)) => Ok(content.clone()),
            _ => Err(ClientError::NotFound(source.to_string())),
        }
    }
}

#[async_trait]
impl FileTransfer for MemoryTransfer {
    async fn list_files(&self, dir: &Url) -> gridctl_client::Result<Vec<String>> {
        let prefix = format!("{}/", dir.as_str().trim_end_matches('/'));
        Ok(self
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(str::to_string)
            .collect())
    }

    async fn copy(&self, source: &Url, destination: &Path) -> gridctl_client::Result<()> {
        let content = self.content(source)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, content).await?;
        Ok(())
    }

    async fn fetch(&self, source: &Url) -> gridctl_client::Result<Vec<u8>> {
        self.content(source)
    }
}

/// Registry with fixed answers; unknown registries list nothing
#[derive(Default)]
pub struct StaticRegistry {
    entries: HashMap<String, Vec<Endpoint>>,
    queries: AtomicUsize,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, registry: &Endpoint, endpoints: Vec<Endpoint>) -> Self {
        self.entries.insert(registry.identity(), endpoints);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryService for StaticRegistry {
    async fn query_endpoints(&self, registry: &Endpoint) -> gridctl_client::Result<Vec<Endpoint>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.get(&registry.identity()).cloned().unwrap_or_default())
    }
}

/// Computing services with fixed targets; unknown endpoints fail
#[derive(Default)]
pub struct StaticTargets {
    entries: HashMap<String, Vec<ExecutionTarget>>,
    stalling: HashSet<String>,
    queries: AtomicUsize,
}

impl StaticTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &Endpoint, targets: Vec<ExecutionTarget>) -> Self {
        self.entries.insert(endpoint.identity(), targets);
        self
    }

    /// Queries to `endpoint` never answer
    pub fn stalling(mut self, endpoint: &Endpoint) -> Self {
        self.stalling.insert(endpoint.identity());
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetInfoService for StaticTargets {
    async fn query_targets(&self, endpoint: &Endpoint) -> gridctl_client::Result<Vec<ExecutionTarget>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.stalling.contains(&endpoint.identity()) {
            std::future::pending::<()>().await;
        }
        self.entries
            .get(&endpoint.identity())
            .cloned()
            .ok_or_else(|| ClientError::NotFound(endpoint.to_string()))
    }
}

/// Submitter numbering its jobs `<endpoint>/new-<n>`
pub struct FakeSubmitter {
    flavour: String,
    failing_hosts: HashSet<String>,
    stalling_hosts: HashSet<String>,
    submissions: AtomicUsize,
}

impl FakeSubmitter {
    pub fn new(flavour: &str) -> Self {
        Self {
            flavour: flavour.to_string(),
            failing_hosts: HashSet::new(),
            stalling_hosts: HashSet::new(),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn failing_host(mut self, host: &str) -> Self {
        self.failing_hosts.insert(host.to_string());
        self
    }

    /// Submissions to `host` never answer
    pub fn stalling_host(mut self, host: &str) -> Self {
        self.stalling_hosts.insert(host.to_string());
        self
    }

    /// Successful submissions so far
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Submitter for FakeSubmitter {
    fn flavour(&self) -> &str {
        &self.flavour
    }

    async fn submit(
        &self,
        _description: &JobDescription,
        target: &ExecutionTarget,
    ) -> gridctl_client::Result<SubmissionReceipt> {
        let endpoint = &target.submission_endpoint;
        if endpoint.host_str().is_some_and(|h| self.stalling_hosts.contains(h)) {
            std::future::pending::<()>().await;
        }
        if endpoint.host_str().is_some_and(|h| self.failing_hosts.contains(h)) {
            return Err(ClientError::api_error(503, "service unavailable"));
        }
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = Url::parse(&format!("{}/new-{}", endpoint.as_str().trim_end_matches('/'), n))
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        Ok(SubmissionReceipt {
            output_base: job_id.clone(),
            job_id,
            info_endpoint: None,
        })
    }
}

/// Parser returning either the document itself or a fixed set of variants
#[derive(Default)]
pub struct FakeParser {
    variants: Option<Vec<JobDescription>>,
}

impl FakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variants(variants: Vec<JobDescription>) -> Self {
        Self {
            variants: Some(variants),
        }
    }
}

impl DescriptionParser for FakeParser {
    fn parse(&self, document: &str) -> gridctl_client::Result<DescriptionSet> {
        match &self.variants {
            None => Ok(DescriptionSet::new(JobDescription {
                document: document.to_string(),
                ..Default::default()
            })),
            Some(variants) => {
                let mut variants = variants.iter().cloned();
                let original = variants
                    .next()
                    .ok_or_else(|| ClientError::ParseError("empty description".to_string()))?;
                Ok(DescriptionSet::with_alternatives(original, variants))
            }
        }
    }
}

// =============================================================================
// Controller fake
// =============================================================================

/// Controller recording its calls
pub struct FakeController {
    flavour: String,
    reports: HashMap<Url, JobState>,
    failing: HashSet<Url>,
    refreshed: Mutex<Vec<Url>>,
    calls: Mutex<Vec<String>>,
}

impl FakeController {
    pub fn new(flavour: &str) -> Self {
        Self {
            flavour: flavour.to_string(),
            reports: HashMap::new(),
            failing: HashSet::new(),
            refreshed: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reports `state` for `id` on every status refresh
    pub fn reporting(mut self, id: &Url, state: JobState) -> Self {
        self.reports.insert(id.clone(), state);
        self
    }

    /// Cancel, clean and retrieve fail for `id`
    pub fn failing(mut self, id: &Url) -> Self {
        self.failing.insert(id.clone());
        self
    }

    pub fn flavour(&self) -> &str {
        &self.flavour
    }

    pub fn refreshed(&self) -> Vec<Url> {
        lock(&self.refreshed).clone()
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Factory creating a fresh controller per invocation
    pub fn factory(flavour: &str) -> ControllerFactory {
        let flavour = flavour.to_string();
        Arc::new(move |_| Arc::new(FakeController::new(&flavour)) as Arc<dyn JobController>)
    }

    /// Factory handing out `controller` itself
    pub fn share(controller: Arc<FakeController>) -> ControllerFactory {
        Arc::new(move |_| Arc::clone(&controller) as Arc<dyn JobController>)
    }

    fn record(&self, verb: &str, job: &Job) -> Result<(), JobError> {
        lock(&self.calls).push(format!("{} {}", verb, job.id));
        if self.failing.contains(&job.id) {
            return Err(JobError::Protocol(format!("{} refused", verb)));
        }
        Ok(())
    }
}

#[async_trait]
impl JobController for FakeController {
    fn flavour(&self) -> &str {
        &self.flavour
    }

    async fn update_job_information(&self, jobs: &mut [Job]) -> Vec<(Url, JobError)> {
        for job in jobs.iter_mut() {
            lock(&self.refreshed).push(job.id.clone());
            if let Some(state) = self.reports.get(&job.id) {
                job.state = *state;
            }
        }
        Vec::new()
    }

    async fn retrieve_job(&self, job: &Job, _download_dir: &Path) -> Result<(), JobError> {
        self.record("retrieve", job)
    }

    async fn clean_job(&self, job: &Job, _force: bool) -> Result<(), JobError> {
        self.record("clean", job)
    }

    async fn cancel_job(&self, job: &Job) -> Result<(), JobError> {
        self.record("cancel", job)
    }

    fn file_url_for_job(&self, job: &Job, which: &str) -> Url {
        Url::parse(&format!("{}/{}", job.id, which)).unwrap_or_else(|_| job.id.clone())
    }
}
