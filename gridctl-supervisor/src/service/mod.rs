//! Service Module
//!
//! Business logic layer of the supervisor: bulk job operations over the
//! flavour controllers and the resubmission workflow.

pub mod outcome;
pub mod resubmit;
pub mod supervisor;

// Re-export for convenience
pub use outcome::{BulkOutcome, JobFailure, OperationStatus, ResubmitReport, Resubmission};
pub use resubmit::{ResubmitOptions, SubmissionBackends, TargetMode};
pub use supervisor::JobSupervisor;
