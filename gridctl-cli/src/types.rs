//! Common types used across CLI modules

use anyhow::{Context, Result, bail};
use clap::Args;
use gridctl_core::domain::job::JobState;
use gridctl_supervisor::JobSelection;
use std::path::PathBuf;

/// Job selection flags shared by the bulk commands
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Job ids or job names
    #[arg(value_name = "JOB")]
    pub jobs: Vec<String>,

    /// Select every job in the job list
    #[arg(short, long)]
    pub all: bool,

    /// Only jobs in this state (repeatable)
    #[arg(short, long = "status", value_name = "STATE", value_parser = parse_state)]
    pub states: Vec<JobState>,

    /// Only jobs on this service; prefix with '-' to exclude it (repeatable)
    #[arg(short, long = "cluster", value_name = "[-]ENDPOINT", allow_hyphen_values = true)]
    pub clusters: Vec<String>,

    /// Read job ids from a file, one per line
    #[arg(short = 'i', long = "jobids-from-file", value_name = "FILE")]
    pub ids_file: Option<PathBuf>,
}

impl SelectionArgs {
    /// Build the job list selection
    ///
    /// # Errors
    /// Returns an error if the id file cannot be read or nothing was selected
    pub fn to_selection(&self) -> Result<JobSelection> {
        let mut ids = self.jobs.clone();
        if let Some(path) = &self.ids_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read job ids from {}", path.display()))?;
            ids.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string),
            );
        }

        let mut selection = JobSelection::ids(ids).with_states(self.states.iter().copied());
        selection.all = self.all;
        for cluster in &self.clusters {
            selection = match cluster.strip_prefix('-') {
                Some(excluded) => selection.without_endpoint(excluded),
                None => selection.with_endpoint(cluster.as_str()),
            };
        }

        if selection.is_empty() {
            bail!("No jobs given: name jobs, use --all, or select by --cluster");
        }
        Ok(selection)
    }
}

/// Parse a job state name, ignoring case
pub fn parse_state(s: &str) -> Result<JobState, String> {
    s.parse()
}
