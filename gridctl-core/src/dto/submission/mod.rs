//! Submission DTOs

use serde::{Deserialize, Serialize};
use url::Url;

/// What a submitter reports back for an accepted job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Identifier of the new job at its managing service
    pub job_id: Url,

    /// Base location of the job's output files
    pub output_base: Url,

    /// Status lookup endpoint, when it differs from the submission endpoint
    pub info_endpoint: Option<Url>,
}
