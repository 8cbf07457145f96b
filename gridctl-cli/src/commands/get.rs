//! `get`: download finished jobs, then clean them up

use anyhow::Result;
use clap::Args;
use gridctl_supervisor::{Config, OperationStatus};
use std::path::PathBuf;

use crate::commands::{nothing_selected, open, persist, remove_cleaned};
use crate::output::print_outcome;
use crate::types::SelectionArgs;

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Directory receiving one subdirectory per job
    #[arg(short = 'D', long = "dir", default_value = ".")]
    pub download_dir: PathBuf,

    /// Keep the jobs on their services and in the job list
    #[arg(short, long)]
    pub keep: bool,
}

pub async fn run(args: GetArgs, config: &Config) -> Result<OperationStatus> {
    let (store, mut supervisor) = open(config, &args.selection.to_selection()?).await?;
    if nothing_selected(&supervisor) {
        return Ok(OperationStatus::Success);
    }

    let refreshed = supervisor.update_job_information().await;
    persist(&store, &supervisor).await;
    if !refreshed.failed.is_empty() {
        print_outcome(&refreshed, "queried");
    }

    let retrieved = supervisor.retrieve(&args.download_dir, &[]).await;
    print_outcome(&retrieved, "downloaded");
    let mut status = retrieved.status();

    if !args.keep && !retrieved.succeeded.is_empty() {
        let cleaned = supervisor.clean_by_ids(&retrieved.succeeded).await;
        if !cleaned.failed.is_empty() {
            print_outcome(&cleaned, "cleaned");
        }
        status = status
            .combine(cleaned.status())
            .combine(remove_cleaned(&store, &mut supervisor, &cleaned.succeeded).await);
    }

    Ok(status)
}
