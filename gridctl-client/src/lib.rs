//! Gridctl Collaborator Clients
//!
//! Narrow contracts for the services the job supervisor talks to, and the
//! implementations that ship with gridctl.
//!
//! Each protocol concern is one async trait:
//! - [`InfoService`]: bulk status queries
//! - [`ControlConnector`] / [`ControlSession`]: FTP-style job control
//! - [`FileTransfer`]: listing and downloading job files
//! - [`Submitter`] / [`DescriptionParser`]: job submission
//! - [`RegistryService`] / [`TargetInfoService`]: service discovery
//!
//! # Example
//!
//! ```no_run
//! use gridctl_client::{FileTransfer, HttpTransfer};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transfer = HttpTransfer::new();
//!     let dir = Url::parse("https://ce.example.org:443/arex/1234")?;
//!
//!     for file in transfer.list_files(&dir).await? {
//!         println!("{}", file);
//!     }
//!     Ok(())
//! }
//! ```

pub mod control;
pub mod discovery;
pub mod error;
pub mod info;
pub mod submit;
pub mod transfer;
pub mod unsupported;

// Re-export commonly used types
pub use control::{ControlConnector, ControlSession};
pub use discovery::{RegistryService, TargetInfoService};
pub use error::{ClientError, Result};
pub use info::InfoService;
pub use submit::{DescriptionParser, Submitter};
pub use transfer::{FileTransfer, HttpTransfer};
pub use unsupported::Unconfigured;
