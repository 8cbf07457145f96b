//! Gridctl Supervisor
//!
//! The job lifecycle orchestration core.
//!
//! Architecture:
//! - Repository: the job list file, read and written under an exclusive lock
//! - Discovery: merges registry walks and direct target probes into one stream
//! - Broker: orders discovered execution targets for a job
//! - Controller: one plugin per backend flavour (status, retrieve, clean, cancel)
//! - Service: the supervisor's bulk operations and the resubmission workflow
//!
//! Protocol work is delegated to the collaborator traits of `gridctl-client`.

pub mod broker;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{JobError, StoreError, SupervisorError};
pub use repository::{JobSelection, JobStore, LoadedJobs};
pub use service::{
    BulkOutcome, JobFailure, JobSupervisor, OperationStatus, ResubmitOptions, ResubmitReport,
    SubmissionBackends, TargetMode,
};
