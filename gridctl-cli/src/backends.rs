//! Collaborator wiring
//!
//! Builds the controller registry and submission backends for one invocation.
//! Job files travel over HTTP(S); LDAP, GridFTP control, submission and
//! description parsing have no client in this build and fail per job with an
//! "unsupported" error.

use anyhow::{Result, anyhow};
use gridctl_client::{
    ControlConnector, DescriptionParser, FileTransfer, HttpTransfer, InfoService, RegistryService,
    TargetInfoService, Unconfigured,
};
use gridctl_supervisor::broker::broker_by_name;
use gridctl_supervisor::controller::{Arc0Controller, ControllerRegistry, arc0};
use gridctl_supervisor::{Config, SubmissionBackends};
use std::sync::Arc;

/// File transfer shared by controllers and `cat`
pub fn transfer() -> Arc<dyn FileTransfer> {
    Arc::new(HttpTransfer::new())
}

/// Controllers for every flavour this build can handle
pub fn controllers(transfer: Arc<dyn FileTransfer>) -> ControllerRegistry {
    let info: Arc<dyn InfoService> = Arc::new(Unconfigured::new("LDAP information system"));
    let control: Arc<dyn ControlConnector> = Arc::new(Unconfigured::new("GridFTP control"));

    ControllerRegistry::new().with(arc0::FLAVOUR, Arc0Controller::factory(info, control, transfer))
}

/// Collaborators for resubmission, using the broker named in `config`
pub fn submission(config: &Config) -> Result<SubmissionBackends> {
    let broker = broker_by_name(&config.broker)
        .ok_or_else(|| anyhow!("Unknown broker '{}'", config.broker))?;
    let parser: Arc<dyn DescriptionParser> = Arc::new(Unconfigured::new("job description parser"));
    let registry: Arc<dyn RegistryService> = Arc::new(Unconfigured::new("registry"));
    let target_info: Arc<dyn TargetInfoService> = Arc::new(Unconfigured::new("computing information"));

    Ok(SubmissionBackends::new(parser, broker, registry, target_info)
        .with_submitter(Arc::new(Unconfigured::new(arc0::FLAVOUR))))
}
