//! `kill`: cancel active jobs, then clean them up

use anyhow::Result;
use clap::Args;
use gridctl_supervisor::{Config, OperationStatus};

use crate::commands::{nothing_selected, open, persist, remove_cleaned};
use crate::output::print_outcome;
use crate::types::SelectionArgs;

#[derive(Debug, Args)]
pub struct KillArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Keep the cancelled jobs on their services and in the job list
    #[arg(short, long)]
    pub keep: bool,
}

pub async fn run(args: KillArgs, config: &Config) -> Result<OperationStatus> {
    let (store, mut supervisor) = open(config, &args.selection.to_selection()?).await?;
    if nothing_selected(&supervisor) {
        return Ok(OperationStatus::Success);
    }

    supervisor.update_job_information().await;
    persist(&store, &supervisor).await;

    let cancelled = supervisor.cancel(&[]).await;
    print_outcome(&cancelled, "killed");
    let mut status = cancelled.status();

    // Finished jobs were not killed; their results stay on the service
    let killed = cancelled.acted_on();
    if !args.keep && !killed.is_empty() {
        let cleaned = supervisor.clean_by_ids(&killed).await;
        if !cleaned.failed.is_empty() {
            print_outcome(&cleaned, "cleaned");
        }
        status = status
            .combine(cleaned.status())
            .combine(remove_cleaned(&store, &mut supervisor, &cleaned.succeeded).await);
    }

    Ok(status)
}
