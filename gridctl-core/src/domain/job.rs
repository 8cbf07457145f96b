//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Well-known keys of [`Job::attributes`]
///
/// Backends copy their status fields verbatim under these keys. The supervisor
/// only reads them for display and filtering.
pub mod attr {
    pub const OWNER: &str = "owner";
    pub const EXECUTION_CE: &str = "execution-ce";
    pub const QUEUE: &str = "queue";
    pub const SUBMISSION_HOST: &str = "submission-host";
    pub const SUBMISSION_TIME: &str = "submission-time";
    pub const SUBMISSION_CLIENT: &str = "submission-client";
    pub const CREATION_TIME: &str = "creation-time";
    pub const VALID_TO: &str = "valid-to";
    pub const END_TIME: &str = "end-time";
    pub const WORKING_AREA_ERASE_TIME: &str = "working-area-erase-time";
    pub const PROXY_EXPIRATION_TIME: &str = "proxy-expiration-time";
    pub const USED_SLOTS: &str = "used-slots";
    pub const USED_CPU_TIME: &str = "used-cpu-time";
    pub const USED_WALL_TIME: &str = "used-wall-time";
    pub const USED_MEMORY: &str = "used-memory";
    pub const REQUESTED_CPU_TIME: &str = "requested-cpu-time";
    pub const REQUESTED_WALL_TIME: &str = "requested-wall-time";
    pub const EXIT_CODE: &str = "exit-code";
    pub const RESTART_STATE: &str = "restart-state";
    pub const WAITING_POSITION: &str = "waiting-position";
    pub const STDIN: &str = "stdin";
    pub const OTHER_MESSAGES: &str = "other-messages";
    pub const ERRORS: &str = "errors";
    pub const EXECUTION_NODES: &str = "execution-nodes";
    pub const APPLICATION_ENVIRONMENTS: &str = "application-environments";
    /// Base URL of the job's session directory, as returned on submission
    pub const SESSION_DIRECTORY: &str = "session-directory";
}

/// A grid job as known to the client
///
/// Structure shared between the job store (persists), the backend plugins
/// (refresh from status reports) and the supervisor (orchestrates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier at its managing service
    pub id: Url,

    /// Human readable job name from the job description
    #[serde(default)]
    pub name: Option<String>,

    /// Backend flavour owning this job (e.g. "ARC0")
    pub flavour: String,

    /// Service accepting control operations for this job
    pub managing_endpoint: Url,

    /// Service queried for status, possibly carrying a query filter
    pub info_endpoint: Url,

    /// Last reported state
    pub state: JobState,

    /// State string exactly as reported by the backend
    #[serde(default)]
    pub native_state: Option<String>,

    /// Jobs this one replaces, most recent last
    #[serde(default)]
    pub predecessor_ids: Vec<Url>,

    /// Locations of the well-known output streams
    #[serde(default)]
    pub outputs: JobOutputs,

    /// Job description document the job was submitted with
    #[serde(default)]
    pub description: Option<String>,

    /// When this client submitted the job
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Opaque values copied from backend status reports
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

/// Names of the job's output streams, relative to its session directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutputs {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub log_dir: Option<String>,
}

impl Job {
    /// Creates a job in `Accepted` state whose info endpoint is its managing endpoint
    pub fn new(id: Url, flavour: impl Into<String>, managing_endpoint: Url) -> Self {
        Self {
            id,
            name: None,
            flavour: flavour.into(),
            info_endpoint: managing_endpoint.clone(),
            managing_endpoint,
            state: JobState::Accepted,
            native_state: None,
            predecessor_ids: Vec::new(),
            outputs: JobOutputs::default(),
            description: None,
            submitted_at: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_info_endpoint(mut self, info_endpoint: Url) -> Self {
        self.info_endpoint = info_endpoint;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    /// Records `id` as the most recent predecessor
    ///
    /// Returns `false` without touching the chain if `id` is already part of it.
    pub fn add_predecessor(&mut self, id: Url) -> bool {
        if self.predecessor_ids.contains(&id) {
            return false;
        }
        self.predecessor_ids.push(id);
        true
    }

    /// Checks whether `needle` names this job, either by id or by job name
    pub fn matches_id_or_name(&self, needle: &str) -> bool {
        self.id.as_str() == needle
            || self.id.as_str().trim_end_matches('/') == needle.trim_end_matches('/')
            || self.name.as_deref() == Some(needle)
    }

    /// Checks whether the managing endpoint matches a user supplied pattern
    ///
    /// A pattern matches on the full URL (ignoring a trailing slash) or on the
    /// bare host name.
    pub fn endpoint_matches(&self, pattern: &str) -> bool {
        let pattern = pattern.trim_end_matches('/');
        self.managing_endpoint.as_str().trim_end_matches('/') == pattern
            || self.managing_endpoint.host_str() == Some(pattern)
    }

    /// First value of a pass-through attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Replaces a pass-through attribute with the given values
    pub fn set_attribute(&mut self, key: &str, values: Vec<String>) {
        self.attributes.insert(key.to_string(), values);
    }

    /// Last path segment of the job id, used as a local directory name
    pub fn id_number(&self) -> &str {
        self.id
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Job state, normalised across backend flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobState {
    Accepted,
    Preparing,
    Submitting,
    Queuing,
    Running,
    Finishing,
    Finished,
    Killed,
    Failed,
    Deleted,
    Unknown,
}

impl JobState {
    pub const ALL: [JobState; 11] = [
        JobState::Accepted,
        JobState::Preparing,
        JobState::Submitting,
        JobState::Queuing,
        JobState::Running,
        JobState::Finishing,
        JobState::Finished,
        JobState::Killed,
        JobState::Failed,
        JobState::Deleted,
        JobState::Unknown,
    ];

    /// The job will not change state anymore on its own
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            JobState::Finished | JobState::Killed | JobState::Failed | JobState::Deleted
        )
    }

    /// Finished, or in a state from which no further progress is known
    pub fn is_terminal(self) -> bool {
        self.is_finished() || self == JobState::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Accepted => "Accepted",
            JobState::Preparing => "Preparing",
            JobState::Submitting => "Submitting",
            JobState::Queuing => "Queuing",
            JobState::Running => "Running",
            JobState::Finishing => "Finishing",
            JobState::Finished => "Finished",
            JobState::Killed => "Killed",
            JobState::Failed => "Failed",
            JobState::Deleted => "Deleted",
            JobState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown job state '{}'", s))
    }
}
