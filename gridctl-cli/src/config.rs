//! Configuration module
//!
//! Global command-line options and their translation into the supervisor
//! configuration. Every option has an environment fallback.

use anyhow::{Context, Result};
use clap::Args;
use gridctl_supervisor::Config;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Job list file [default: ~/.gridctl/jobs.json]
    #[arg(short = 'j', long = "joblist", env = "GRIDCTL_JOBLIST", global = true)]
    pub job_list: Option<PathBuf>,

    /// Timeout in seconds for every network call
    #[arg(short, long, env = "GRIDCTL_TIMEOUT", default_value_t = 20, global = true)]
    pub timeout: u64,

    /// Seconds to wait for the job list lock
    #[arg(long, env = "GRIDCTL_LOCK_TIMEOUT", default_value_t = 10, global = true)]
    pub lock_timeout: u64,

    /// Log level (error, warn, info, debug, trace) or a full filter directive
    #[arg(short, long = "debug", env = "GRIDCTL_LOG", global = true)]
    pub log_level: Option<String>,

    /// Services that must never be contacted (URL or host name)
    #[arg(long = "reject", value_name = "ENDPOINT", global = true)]
    pub rejected: Vec<String>,
}

impl GlobalArgs {
    /// Build the supervisor configuration
    ///
    /// # Returns
    /// A validated configuration
    pub fn to_config(&self) -> Result<Config> {
        let job_list = self
            .job_list
            .clone()
            .unwrap_or_else(Config::default_job_list);

        let mut config = Config::new(job_list)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_lock_timeout(Duration::from_secs(self.lock_timeout));
        for pattern in &self.rejected {
            config = config.with_rejected_service(pattern.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Filter directive for the log subscriber
    pub fn log_filter(&self) -> String {
        match self.log_level.as_deref() {
            Some(level) if level.contains('=') => level.to_string(),
            Some(level) => format!("gridctl={level},gridctl_supervisor={level},gridctl_client={level}"),
            None => "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            job_list: Some(PathBuf::from("/tmp/jobs.json")),
            timeout: 5,
            lock_timeout: 2,
            log_level: None,
            rejected: vec!["bad.example.org".to_string()],
        }
    }

    #[test]
    fn test_to_config() {
        let config = args().to_config().unwrap();
        assert_eq!(config.job_list, PathBuf::from("/tmp/jobs.json"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.lock_timeout, Duration::from_secs(2));
        assert_eq!(config.rejected_services, vec!["bad.example.org".to_string()]);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut args = args();
        args.timeout = 0;
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_log_filter() {
        let mut args = args();
        assert_eq!(args.log_filter(), "warn");

        args.log_level = Some("debug".to_string());
        assert!(args.log_filter().starts_with("gridctl=debug"));

        args.log_level = Some("gridctl_supervisor=trace".to_string());
        assert_eq!(args.log_filter(), "gridctl_supervisor=trace");
    }
}
