//! Supervisor configuration
//!
//! Defines the per-invocation parameters: where the job list lives, how long
//! network calls and the job list lock may take, which broker ranks targets and
//! which services discovery starts from.

use gridctl_core::domain::endpoint::Endpoint;
use std::path::PathBuf;
use std::time::Duration;

use crate::broker;
use crate::error::SupervisorError;

/// Default bound for a single network call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Job list file
    pub job_list: PathBuf,

    /// Bound for every status query, control sequence, transfer and submission
    pub timeout: Duration,

    /// How long writers wait for the job list lock
    pub lock_timeout: Duration,

    /// Name of the broker ranking targets on resubmission
    pub broker: String,

    /// Services discovery starts from
    pub services: Vec<Endpoint>,

    /// Endpoint patterns (URL or host) that are never queried
    pub rejected_services: Vec<String>,

    /// Upper bound on concurrent queries and flavour groups
    pub max_parallel_queries: usize,
}

impl Config {
    /// Creates a configuration with defaults for the given job list
    pub fn new(job_list: PathBuf) -> Self {
        Self {
            job_list,
            timeout: DEFAULT_TIMEOUT,
            lock_timeout: Duration::from_secs(10),
            broker: broker::DEFAULT_BROKER.to_string(),
            services: Vec::new(),
            rejected_services: Vec::new(),
            max_parallel_queries: 8,
        }
    }

    /// `$HOME/.gridctl/jobs.json`, or a relative `jobs.json` without a home directory
    pub fn default_job_list() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".gridctl").join("jobs.json"))
            .unwrap_or_else(|| PathBuf::from("jobs.json"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = broker.into();
        self
    }

    /// Adds a service discovery starts from
    pub fn with_service(mut self, endpoint: Endpoint) -> Self {
        self.services.push(endpoint);
        self
    }

    /// Adds a service pattern that must never be queried
    pub fn with_rejected_service(mut self, pattern: impl Into<String>) -> Self {
        self.rejected_services.push(pattern.into());
        self
    }

    pub fn with_max_parallel_queries(mut self, max: usize) -> Self {
        self.max_parallel_queries = max;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.job_list.as_os_str().is_empty() {
            return Err(SupervisorError::Configuration(
                "job list path cannot be empty".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(SupervisorError::Configuration(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_parallel_queries == 0 {
            return Err(SupervisorError::Configuration(
                "max_parallel_queries must be greater than 0".to_string(),
            ));
        }

        if broker::broker_by_name(&self.broker).is_none() {
            return Err(SupervisorError::Configuration(format!(
                "unknown broker '{}' (available: {})",
                self.broker,
                broker::BROKER_NAMES.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::default_job_list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.broker, "Random");
        assert!(config.job_list.ends_with("jobs.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new(PathBuf::from("jobs.json"));
        assert!(config.validate().is_ok());

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config.timeout = DEFAULT_TIMEOUT;
        config.broker = "Fastest".to_string();
        assert!(config.validate().is_err());

        config.broker = "load".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = Config::new(PathBuf::from("jobs.json"))
            .with_timeout(Duration::from_secs(5))
            .with_rejected_service("bad.example.org")
            .with_max_parallel_queries(2);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.rejected_services, vec!["bad.example.org".to_string()]);
        assert_eq!(config.max_parallel_queries, 2);
    }
}
