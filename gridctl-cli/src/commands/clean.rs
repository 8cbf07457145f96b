//! `clean`: remove finished jobs from their services and the job list

use anyhow::Result;
use clap::Args;
use gridctl_supervisor::{Config, OperationStatus};

use crate::commands::{nothing_selected, open, persist, remove_cleaned};
use crate::output::print_outcome;
use crate::types::SelectionArgs;

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also drop jobs the information system no longer knows
    #[arg(short, long)]
    pub force: bool,
}

pub async fn run(args: CleanArgs, config: &Config) -> Result<OperationStatus> {
    let (store, mut supervisor) = open(config, &args.selection.to_selection()?).await?;
    if nothing_selected(&supervisor) {
        return Ok(OperationStatus::Success);
    }

    supervisor.update_job_information().await;
    persist(&store, &supervisor).await;

    let cleaned = supervisor.clean(&[], args.force).await;
    print_outcome(&cleaned, "cleaned");

    let removed = remove_cleaned(&store, &mut supervisor, &cleaned.succeeded).await;
    Ok(cleaned.status().combine(removed))
}
