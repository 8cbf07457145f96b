//! Job Controller plugins
//!
//! A controller owns the jobs of one backend flavour for the duration of a
//! call and performs the flavour specific status, retrieval, cleaning and
//! cancellation exchanges through the collaborator clients.
//!
//! Controllers never persist anything and never fail a whole batch: every
//! operation reports per job.

pub mod arc0;
pub mod registry;

use async_trait::async_trait;
use gridctl_core::domain::job::Job;
use std::path::Path;
use std::time::Duration;
use tracing::Span;
use url::Url;

use crate::error::JobError;

pub use arc0::Arc0Controller;
pub use registry::{ControllerFactory, ControllerRegistry};

/// What a controller gets at construction
#[derive(Debug, Clone)]
pub struct ControllerContext {
    /// Bound for every network call the controller makes
    pub timeout: Duration,
    /// Span the controller logs under
    pub span: Span,
}

impl ControllerContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Flavour specific job operations
#[async_trait]
pub trait JobController: Send + Sync {
    /// Flavour served by this controller
    fn flavour(&self) -> &str;

    /// Refresh the given jobs from their information services
    ///
    /// Updates jobs in place with whatever the services report; fields absent
    /// from a report are left untouched, and a job missing from a report keeps
    /// its last known state.
    ///
    /// # Returns
    /// Jobs whose status could not be queried, with the reason
    async fn update_job_information(&self, jobs: &mut [Job]) -> Vec<(Url, JobError)>;

    /// Download the job's files below `download_dir`
    ///
    /// Attempts every file even after a failure.
    async fn retrieve_job(&self, job: &Job, download_dir: &Path) -> Result<(), JobError>;

    /// Remove the job's remote working area
    async fn clean_job(&self, job: &Job, force: bool) -> Result<(), JobError>;

    /// Cancel an active job
    async fn cancel_job(&self, job: &Job) -> Result<(), JobError>;

    /// Location of a well-known output stream ("stdout", "stderr", "gmlog")
    ///
    /// Unrecognised names resolve to the job's own URL.
    fn file_url_for_job(&self, job: &Job, which: &str) -> Url;
}
