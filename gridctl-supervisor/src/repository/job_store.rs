//! Job Store
//!
//! Handles all access to the job list file. The file is a JSON document
//! `{ "version": 1, "jobs": [...] }` in submission order.
//!
//! Readers never lock: every writer replaces the file through a rename, so a
//! reader sees either the old or the new content. Writers serialise on
//! [`FileLock`] and hold it only for the read-modify-write of the file.

use gridctl_core::domain::job::{Job, JobState};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Instrument, Span, debug, info};
use url::Url;

use crate::error::StoreError;
use crate::repository::lock::FileLock;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct JobListFile {
    version: u32,
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Which records a load returns
///
/// A job is selected when all of these hold:
/// - it matches one of `ids_or_names`, or that list is empty and either `all`
///   is set or `include_endpoints` is non-empty
/// - `states` is empty or contains its state
/// - `include_endpoints` is empty or one of them matches its managing endpoint
/// - none of `exclude_endpoints` matches its managing endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSelection {
    pub ids_or_names: Vec<String>,
    pub all: bool,
    pub states: Vec<JobState>,
    pub include_endpoints: Vec<String>,
    pub exclude_endpoints: Vec<String>,
}

impl JobSelection {
    /// Every job in the list
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    /// Jobs with the given ids or names
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids_or_names: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_states(mut self, states: impl IntoIterator<Item = JobState>) -> Self {
        self.states.extend(states);
        self
    }

    pub fn with_endpoint(mut self, pattern: impl Into<String>) -> Self {
        self.include_endpoints.push(pattern.into());
        self
    }

    pub fn without_endpoint(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_endpoints.push(pattern.into());
        self
    }

    /// Whether nothing at all would be selected
    pub fn is_empty(&self) -> bool {
        self.ids_or_names.is_empty() && !self.all && self.include_endpoints.is_empty()
    }

    pub fn matches(&self, job: &Job) -> bool {
        let by_id = if self.ids_or_names.is_empty() {
            self.all || !self.include_endpoints.is_empty()
        } else {
            self.ids_or_names.iter().any(|needle| job.matches_id_or_name(needle))
        };

        by_id
            && (self.states.is_empty() || self.states.contains(&job.state))
            && (self.include_endpoints.is_empty()
                || self.include_endpoints.iter().any(|p| job.endpoint_matches(p)))
            && !self.exclude_endpoints.iter().any(|p| job.endpoint_matches(p))
    }
}

/// Result of a selective load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedJobs {
    /// Selected jobs in file order
    pub jobs: Vec<Job>,
    /// Requested ids or names without any record
    pub not_found: Vec<String>,
}

/// The job list file
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
    lock_timeout: Duration,
    span: Span,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            lock_timeout,
            span: Span::none(),
        }
    }

    /// Runs store operations inside `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =============================================================================
    // Reads
    // =============================================================================

    /// Load the jobs matching `selection`
    ///
    /// A missing file is an empty list. Requested ids or names matching no
    /// record at all are reported in `not_found`; a record filtered out by
    /// state or endpoint is not "not found".
    pub async fn load(&self, selection: &JobSelection) -> Result<LoadedJobs, StoreError> {
        let all = self.load_all().await?;

        let not_found = selection
            .ids_or_names
            .iter()
            .filter(|needle| !all.iter().any(|job| job.matches_id_or_name(needle)))
            .cloned()
            .collect();

        let jobs = all.into_iter().filter(|job| selection.matches(job)).collect();

        Ok(LoadedJobs { jobs, not_found })
    }

    /// Load every job in the list
    pub async fn load_all(&self) -> Result<Vec<Job>, StoreError> {
        self.read_file().instrument(self.span.clone()).await
    }

    // =============================================================================
    // Writes
    // =============================================================================

    /// Replace the whole list with `jobs`
    pub async fn save(&self, jobs: &[Job]) -> Result<(), StoreError> {
        async {
            let _lock = self.lock().await?;
            self.write_file(jobs).await?;
            info!(path = %self.path.display(), count = jobs.len(), "Saved job list");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Insert or replace jobs by id
    ///
    /// Existing records keep their position, new ones are appended in the
    /// given order.
    pub async fn upsert(&self, jobs: &[Job]) -> Result<(), StoreError> {
        if jobs.is_empty() {
            return Ok(());
        }

        async {
            let _lock = self.lock().await?;
            let mut current = self.read_file().await?;

            for job in jobs {
                match current.iter_mut().find(|existing| existing.id == job.id) {
                    Some(existing) => *existing = job.clone(),
                    None => current.push(job.clone()),
                }
            }

            self.write_file(&current).await?;
            debug!(path = %self.path.display(), count = jobs.len(), "Upserted jobs");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Replace jobs that are still in the list, by id
    ///
    /// Ids no longer in the list were removed by another invocation and stay
    /// removed.
    ///
    /// # Returns
    /// The number of records replaced
    pub async fn update(&self, jobs: &[Job]) -> Result<usize, StoreError> {
        if jobs.is_empty() {
            return Ok(0);
        }

        async {
            let _lock = self.lock().await?;
            let mut current = self.read_file().await?;
            let by_id: HashMap<&Url, &Job> = jobs.iter().map(|job| (&job.id, job)).collect();

            let mut replaced = 0;
            for existing in current.iter_mut() {
                if let Some(job) = by_id.get(&existing.id) {
                    *existing = (*job).clone();
                    replaced += 1;
                }
            }

            if replaced > 0 {
                self.write_file(&current).await?;
            }
            debug!(path = %self.path.display(), replaced, skipped = jobs.len() - replaced, "Updated jobs");
            Ok(replaced)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Remove exactly the jobs with the given ids
    ///
    /// # Returns
    /// The number of records removed
    pub async fn remove(&self, ids: &[Url]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        async {
            let _lock = self.lock().await?;
            let mut current = self.read_file().await?;
            let doomed: HashSet<&Url> = ids.iter().collect();

            let before = current.len();
            current.retain(|job| !doomed.contains(&job.id));
            let removed = before - current.len();

            if removed > 0 {
                self.write_file(&current).await?;
            }
            debug!(path = %self.path.display(), removed, "Removed jobs");
            Ok(removed)
        }
        .instrument(self.span.clone())
        .await
    }

    // =============================================================================
    // File handling
    // =============================================================================

    async fn lock(&self) -> Result<FileLock, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        FileLock::acquire(&self.path, self.lock_timeout).await
    }

    async fn read_file(&self) -> Result<Vec<Job>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let file: JobListFile =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if file.version != FORMAT_VERSION {
            return Err(StoreError::Version {
                path: self.path.clone(),
                found: file.version,
            });
        }

        Ok(file.jobs)
    }

    /// Write through a uniquely named temporary file renamed over the target
    async fn write_file(&self, jobs: &[Job]) -> Result<(), StoreError> {
        let file = JobListFile {
            version: FORMAT_VERSION,
            jobs: jobs.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(StoreError::Serialize)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jobs".to_string());
        let tmp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }
        Ok(())
    }
}
