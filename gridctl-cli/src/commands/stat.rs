//! `stat`: refresh and show job status

use anyhow::Result;
use clap::Args;
use gridctl_supervisor::{Config, OperationStatus};

use crate::commands::{nothing_selected, open, persist};
use crate::output::{print_job, print_outcome};
use crate::types::SelectionArgs;

#[derive(Debug, Args)]
pub struct StatArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Show every known attribute
    #[arg(short, long)]
    pub long: bool,
}

pub async fn run(args: StatArgs, config: &Config) -> Result<OperationStatus> {
    let (store, mut supervisor) = open(config, &args.selection.to_selection()?).await?;
    if nothing_selected(&supervisor) {
        return Ok(OperationStatus::Success);
    }

    let outcome = supervisor.update_job_information().await;
    persist(&store, &supervisor).await;

    for job in supervisor.jobs() {
        print_job(job, args.long);
    }
    print_outcome(&outcome, "queried");

    Ok(outcome.status())
}
