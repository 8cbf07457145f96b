//! Submission and description parsing contracts

use async_trait::async_trait;
use gridctl_core::domain::description::{DescriptionSet, JobDescription};
use gridctl_core::domain::target::ExecutionTarget;
use gridctl_core::dto::submission::SubmissionReceipt;

use crate::error::Result;

/// Submits job descriptions for one flavour
///
/// Payload construction (description translation) happens inside the
/// implementation.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Flavour this submitter serves, e.g. "ARC0"
    fn flavour(&self) -> &str;

    async fn submit(
        &self,
        description: &JobDescription,
        target: &ExecutionTarget,
    ) -> Result<SubmissionReceipt>;
}

/// Parses a job description document into its variants
pub trait DescriptionParser: Send + Sync {
    fn parse(&self, document: &str) -> Result<DescriptionSet>;
}
