//! Outcome accounting for bulk operations

use gridctl_core::domain::job::Job;
use url::Url;

use crate::error::{JobError, StoreError};

/// Overall result of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationStatus {
    Success,
    PartialFailure,
    Failure,
}

impl OperationStatus {
    /// Process exit code: 0 success, 2 partial failure, 1 failure
    pub fn exit_code(self) -> u8 {
        match self {
            OperationStatus::Success => 0,
            OperationStatus::PartialFailure => 2,
            OperationStatus::Failure => 1,
        }
    }

    /// The worse of two statuses
    pub fn combine(self, other: OperationStatus) -> OperationStatus {
        self.max(other)
    }
}

/// One job an operation failed for
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub id: Url,
    pub error: JobError,
}

impl JobFailure {
    pub fn new(id: Url, error: JobError) -> Self {
        Self { id, error }
    }
}

/// Per-job results of a bulk operation
///
/// `succeeded` and `failed` are disjoint; `not_found` lists requested ids or
/// names that had no record. `unchanged` is the subset of `succeeded` that
/// needed no remote action, such as cancelling an already finished job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub succeeded: Vec<Url>,
    pub failed: Vec<JobFailure>,
    pub not_found: Vec<String>,
    pub unchanged: Vec<Url>,
}

impl BulkOutcome {
    pub fn with_not_found(not_found: Vec<String>) -> Self {
        Self {
            not_found,
            ..Default::default()
        }
    }

    pub fn record(&mut self, id: Url, result: Result<(), JobError>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(error) => self.failed.push(JobFailure::new(id, error)),
        }
    }

    /// Count a job as handled without having touched its service
    pub fn record_unchanged(&mut self, id: Url) {
        self.succeeded.push(id.clone());
        self.unchanged.push(id);
    }

    /// Succeeded jobs the operation actually acted on
    pub fn acted_on(&self) -> Vec<Url> {
        self.succeeded
            .iter()
            .filter(|id| !self.unchanged.contains(id))
            .cloned()
            .collect()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.not_found.len()
    }

    /// "X of Y jobs were <verb>"
    pub fn summary(&self, verb: &str) -> String {
        format!("{} of {} jobs were {}", self.succeeded.len(), self.total(), verb)
    }

    pub fn status(&self) -> OperationStatus {
        if self.failed.is_empty() && self.not_found.is_empty() {
            OperationStatus::Success
        } else if self.succeeded.is_empty() {
            OperationStatus::Failure
        } else {
            OperationStatus::PartialFailure
        }
    }
}

/// A successful replacement submission
#[derive(Debug, Clone, PartialEq)]
pub struct Resubmission {
    /// Job that was replaced
    pub original: Url,
    /// The replacement, with `original` as its latest predecessor
    pub new_job: Job,
}

/// Results of a resubmission run
#[derive(Debug, Default)]
pub struct ResubmitReport {
    pub resubmitted: Vec<Resubmission>,
    pub not_resubmitted: Vec<JobFailure>,
    /// Predecessors that could not be cancelled; they stay in the job list
    pub not_cancelled: Vec<JobFailure>,
    /// Predecessors that could not be cleaned; they stay in the job list
    pub not_cleaned: Vec<JobFailure>,
    pub not_found: Vec<String>,
    /// Job list updates that failed; the local list may be stale
    pub store_errors: Vec<StoreError>,
}

impl ResubmitReport {
    /// Jobs considered for resubmission
    pub fn candidates(&self) -> usize {
        self.resubmitted.len() + self.not_resubmitted.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} jobs were resubmitted",
            self.resubmitted.len(),
            self.candidates() + self.not_found.len()
        )
    }

    /// Success needs at least one resubmission and an updated job list
    ///
    /// Leftover predecessors and unresubmitted jobs make it a partial failure.
    pub fn status(&self) -> OperationStatus {
        if self.resubmitted.is_empty() || !self.store_errors.is_empty() {
            OperationStatus::Failure
        } else if self.not_resubmitted.is_empty()
            && self.not_cancelled.is_empty()
            && self.not_cleaned.is_empty()
            && self.not_found.is_empty()
        {
            OperationStatus::Success
        } else {
            OperationStatus::PartialFailure
        }
    }
}
