//! Control channel contract
//!
//! Job control for some flavours happens over a stateful command channel
//! (FTP-style): connect, issue commands relative to a working directory, then
//! disconnect. Sessions are owned by the caller for the duration of one
//! operation.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Opens control sessions to job management services
#[async_trait]
pub trait ControlConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn ControlSession>>;
}

/// An open control session
#[async_trait]
pub trait ControlSession: Send {
    /// Send one command line, e.g. `CWD /jobs` or `RMD 12345`
    ///
    /// # Returns
    /// The service reply text on success
    async fn send_command(&mut self, command: &str) -> Result<String>;

    /// Close the session
    async fn disconnect(&mut self) -> Result<()>;
}
