//! Error taxonomy of the supervisor
//!
//! Per-job problems are [`JobError`]s and end up in an outcome's failure list.
//! Only job list I/O and invocation-wide configuration problems surface as
//! [`SupervisorError`].

use gridctl_client::ClientError;
use gridctl_core::domain::job::JobState;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why an operation failed for one job
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JobError {
    /// No record matches the requested id or name
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A status or control exchange failed mid-sequence
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No plugin or client for the job's flavour or endpoint
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Some files of a job could not be downloaded
    #[error("{failed} of {total} files could not be transferred")]
    Transfer { failed: usize, total: usize },

    /// The job is not in a state allowing the operation
    #[error("job is {state}: {reason}")]
    InvalidState { state: JobState, reason: String },

    /// Skipped after an operator interrupt
    #[error("aborted by operator")]
    Aborted,

    #[error("submission failed: {0}")]
    Submission(String),
}

impl JobError {
    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::Timeout(_) | JobError::Protocol(_) | JobError::Transfer { .. } | JobError::Aborted
        )
    }
}

impl From<ClientError> for JobError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Timeout(d) => JobError::Timeout(d),
            ClientError::Unsupported(msg) => JobError::Configuration(msg),
            e if e.is_not_found() => JobError::NotFound(e.to_string()),
            e => JobError::Protocol(e.to_string()),
        }
    }
}

/// Failures of the job list file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not lock {} within {waited:?}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("failed to create lock file {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed job list {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode job list: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("unsupported job list version {found} in {}", path.display())]
    Version { path: PathBuf, found: u32 },
}

impl StoreError {
    /// Operator guidance when the local job list may be out of date
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            StoreError::LockTimeout { .. } | StoreError::Lock { .. } => Some(
                "the job list is locked by another process; jobs changed on the remote side may be missing locally, check the reported job ids and re-run once the lock is released",
            ),
            StoreError::Write { .. } | StoreError::Serialize(_) => Some(
                "the job list was not updated; jobs changed on the remote side may be missing locally, check the reported job ids before retrying",
            ),
            _ => None,
        }
    }
}

/// Errors spanning a whole invocation
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
