//! Service discovery contracts

use async_trait::async_trait;
use gridctl_core::domain::endpoint::Endpoint;
use gridctl_core::domain::target::ExecutionTarget;

use crate::error::Result;

/// Lists the endpoints a registry knows about
#[async_trait]
pub trait RegistryService: Send + Sync {
    async fn query_endpoints(&self, registry: &Endpoint) -> Result<Vec<Endpoint>>;
}

/// Describes the execution targets behind a computing information endpoint
#[async_trait]
pub trait TargetInfoService: Send + Sync {
    async fn query_targets(&self, endpoint: &Endpoint) -> Result<Vec<ExecutionTarget>>;
}
