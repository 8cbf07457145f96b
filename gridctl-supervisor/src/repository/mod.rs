//! Repository Module
//!
//! Persistence layer of the supervisor: the job list file shared by every
//! gridctl process of a user.

pub mod job_store;
pub mod lock;

// Re-export for convenience
pub use job_store::{JobSelection, JobStore, LoadedJobs};
pub use lock::FileLock;
