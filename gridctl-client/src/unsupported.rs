//! Placeholder collaborator for services without a configured client

use async_trait::async_trait;
use gridctl_core::domain::description::{DescriptionSet, JobDescription};
use gridctl_core::domain::endpoint::Endpoint;
use gridctl_core::domain::target::ExecutionTarget;
use gridctl_core::dto::status::StatusRecord;
use gridctl_core::dto::submission::SubmissionReceipt;
use std::path::Path;
use url::Url;

use crate::control::{ControlConnector, ControlSession};
use crate::discovery::{RegistryService, TargetInfoService};
use crate::error::{ClientError, Result};
use crate::info::InfoService;
use crate::submit::{DescriptionParser, Submitter};
use crate::transfer::FileTransfer;

/// Collaborator that fails every call with [`ClientError::Unsupported`]
///
/// Stands in for protocol clients that are not linked into a build, so that
/// operations depending on them fail per job instead of at startup.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    what: String,
}

impl Unconfigured {
    pub fn new(what: impl Into<String>) -> Self {
        Self { what: what.into() }
    }

    fn error(&self) -> ClientError {
        ClientError::Unsupported(format!("no {} client is configured", self.what))
    }
}

#[async_trait]
impl InfoService for Unconfigured {
    async fn query(&self, _endpoint: &Url, _filter: &str) -> Result<Vec<StatusRecord>> {
        Err(self.error())
    }
}

#[async_trait]
impl ControlConnector for Unconfigured {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn ControlSession>> {
        Err(self.error())
    }
}

#[async_trait]
impl FileTransfer for Unconfigured {
    async fn list_files(&self, _dir: &Url) -> Result<Vec<String>> {
        Err(self.error())
    }

    async fn copy(&self, _source: &Url, _destination: &Path) -> Result<()> {
        Err(self.error())
    }

    async fn fetch(&self, _source: &Url) -> Result<Vec<u8>> {
        Err(self.error())
    }
}

#[async_trait]
impl Submitter for Unconfigured {
    fn flavour(&self) -> &str {
        &self.what
    }

    async fn submit(
        &self,
        _description: &JobDescription,
        _target: &ExecutionTarget,
    ) -> Result<SubmissionReceipt> {
        Err(self.error())
    }
}

impl DescriptionParser for Unconfigured {
    fn parse(&self, _document: &str) -> Result<DescriptionSet> {
        Err(self.error())
    }
}

#[async_trait]
impl RegistryService for Unconfigured {
    async fn query_endpoints(&self, _registry: &Endpoint) -> Result<Vec<Endpoint>> {
        Err(self.error())
    }
}

#[async_trait]
impl TargetInfoService for Unconfigured {
    async fn query_targets(&self, _endpoint: &Endpoint) -> Result<Vec<ExecutionTarget>> {
        Err(self.error())
    }
}
