//! Service endpoint domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// What a service endpoint can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Describes execution targets directly
    ComputingInfo,

    /// Index of further endpoints
    Registry,

    /// Accepts new jobs
    JobSubmission,

    /// Accepts control operations on existing jobs
    JobManagement,
}

/// A service URL together with its advertised capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: Url,
    pub capabilities: BTreeSet<Capability>,
    /// Interface name reported by a registry (e.g. "org.nordugrid.ldapng")
    pub interface_name: Option<String>,
}

impl Endpoint {
    pub fn new(url: Url, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            url,
            capabilities: capabilities.into_iter().collect(),
            interface_name: None,
        }
    }

    /// Endpoint describing execution targets directly
    pub fn computing_info(url: Url) -> Self {
        Self::new(url, [Capability::ComputingInfo])
    }

    /// Endpoint listing further endpoints
    pub fn registry(url: Url) -> Self {
        Self::new(url, [Capability::Registry])
    }

    pub fn with_interface(mut self, interface_name: impl Into<String>) -> Self {
        self.interface_name = Some(interface_name.into());
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Stable identity used to deduplicate endpoints across discovery rounds
    pub fn identity(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_ascii_lowercase()
    }

    /// Checks whether the endpoint matches a user supplied pattern (URL or host)
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.trim_end_matches('/');
        self.url.as_str().trim_end_matches('/') == pattern || self.url.host_str() == Some(pattern)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
