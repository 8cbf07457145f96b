//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cat;
mod clean;
mod get;
mod kill;
mod resub;
mod stat;

pub use cat::CatArgs;
pub use clean::CleanArgs;
pub use get::GetArgs;
pub use kill::KillArgs;
pub use resub::ResubArgs;
pub use stat::StatArgs;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gridctl_supervisor::{Config, JobSelection, JobStore, JobSupervisor, OperationStatus};
use std::sync::atomic::Ordering;
use tracing::{Span, info, warn};

use crate::backends;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Refresh and show job status
    Stat(StatArgs),
    /// Download the results of finished jobs
    Get(GetArgs),
    /// Cancel active jobs
    Kill(KillArgs),
    /// Remove finished jobs from their services
    Clean(CleanArgs),
    /// Submit selected jobs again and replace the originals
    Resub(ResubArgs),
    /// Print an output stream of a job
    Cat(CatArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The supervisor configuration
///
/// # Returns
/// How the operation went across all selected jobs
pub async fn handle_command(command: Commands, config: Config) -> Result<OperationStatus> {
    match command {
        Commands::Stat(args) => stat::run(args, &config).await,
        Commands::Get(args) => get::run(args, &config).await,
        Commands::Kill(args) => kill::run(args, &config).await,
        Commands::Clean(args) => clean::run(args, &config).await,
        Commands::Resub(args) => resub::run(args, config).await,
        Commands::Cat(args) => cat::run(args, &config).await,
    }
}

/// Load the selected jobs and put them under a supervisor
///
/// Ctrl-C stops the supervisor before its next per-job operation.
pub(crate) async fn open(config: &Config, selection: &JobSelection) -> Result<(JobStore, JobSupervisor)> {
    let span = Span::current();
    let store = JobStore::new(&config.job_list, config.lock_timeout).with_span(span.clone());
    let loaded = store
        .load(selection)
        .await
        .with_context(|| format!("Failed to read job list {}", config.job_list.display()))?;
    info!(jobs = loaded.jobs.len(), missing = loaded.not_found.len(), "Loaded job list");

    let supervisor = JobSupervisor::new(
        config.clone(),
        backends::controllers(backends::transfer()),
        loaded.jobs,
    )
    .with_missing(loaded.not_found)
    .with_span(span);

    let interrupted = supervisor.interrupt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current job");
            interrupted.store(true, Ordering::SeqCst);
        }
    });

    Ok((store, supervisor))
}

/// Print a notice when the selection matched no job and no unknown id
///
/// # Returns
/// `true` when there is nothing to do
pub(crate) fn nothing_selected(supervisor: &JobSupervisor) -> bool {
    let empty = !supervisor.jobs_found() && supervisor.not_found().is_empty();
    if empty {
        println!("{}", "No jobs selected.".yellow());
    }
    empty
}

/// Write refreshed records back, warning instead of failing
///
/// Only records still in the job list are replaced.
pub(crate) async fn persist(store: &JobStore, supervisor: &JobSupervisor) {
    if let Err(e) = store.update(supervisor.jobs()).await {
        warn!("Failed to update the job list, it may be stale: {}", e);
        if let Some(hint) = e.recovery_hint() {
            warn!("{}", hint);
        }
    }
}

/// Remove jobs from the job list after a successful remote clean
///
/// # Returns
/// `Failure` when the job list could not be updated
pub(crate) async fn remove_cleaned(
    store: &JobStore,
    supervisor: &mut JobSupervisor,
    cleaned: &[url::Url],
) -> OperationStatus {
    match store.remove(cleaned).await {
        Ok(_) => {
            supervisor.forget(cleaned);
            OperationStatus::Success
        }
        Err(e) => {
            warn!("Failed to remove cleaned jobs from the job list: {}", e);
            if let Some(hint) = e.recovery_hint() {
                warn!("{}", hint);
            }
            OperationStatus::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectionArgs;
    use gridctl_core::domain::job::{Job, JobState};
    use gridctl_supervisor::controller::ControllerRegistry;
    use std::time::Duration;
    use url::Url;

    fn job(host: &str) -> Job {
        Job::new(
            Url::parse(&format!("gsiftp://{}:2811/jobs/1", host)).unwrap(),
            "ARC0",
            Url::parse(&format!("gsiftp://{}:2811/jobs", host)).unwrap(),
        )
        .with_state(JobState::Finished)
    }

    fn elsewhere() -> SelectionArgs {
        SelectionArgs {
            clusters: vec!["ce2.example.org".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_selected_unless_ids_were_missing() {
        let config = Config::new("jobs.json".into());
        let empty = JobSupervisor::new(config.clone(), ControllerRegistry::new(), Vec::new());
        assert!(nothing_selected(&empty));

        let missing = JobSupervisor::new(config.clone(), ControllerRegistry::new(), Vec::new())
            .with_missing(vec!["ghost".to_string()]);
        assert!(!nothing_selected(&missing));

        let one = JobSupervisor::new(config, ControllerRegistry::new(), vec![job("ce1.example.org")]);
        assert!(!nothing_selected(&one));
    }

    #[tokio::test]
    async fn test_empty_selection_leaves_job_list_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("jobs.json")).with_lock_timeout(Duration::from_millis(200));
        let store = JobStore::new(&config.job_list, config.lock_timeout);
        let jobs = vec![job("ce1.example.org")];
        store.save(&jobs).await.unwrap();

        let kill = KillArgs {
            selection: elsewhere(),
            keep: false,
        };
        assert_eq!(kill::run(kill, &config).await.unwrap(), OperationStatus::Success);

        let get = GetArgs {
            selection: elsewhere(),
            download_dir: dir.path().join("dl"),
            keep: false,
        };
        assert_eq!(get::run(get, &config).await.unwrap(), OperationStatus::Success);

        let clean = CleanArgs {
            selection: elsewhere(),
            force: true,
        };
        assert_eq!(clean::run(clean, &config).await.unwrap(), OperationStatus::Success);

        assert_eq!(store.load_all().await.unwrap(), jobs);
        assert!(!dir.path().join("dl").exists());
    }
}
