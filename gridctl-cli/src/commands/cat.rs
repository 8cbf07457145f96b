//! `cat`: print an output stream of a job

use anyhow::{Context, Result, anyhow};
use clap::{Args, ValueEnum};
use gridctl_supervisor::{Config, JobSelection, OperationStatus};
use std::io::Write;
use tracing::debug;

use crate::backends;
use crate::commands::{open, persist};

/// Output streams a job exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stream {
    Stdout,
    Stderr,
    Gmlog,
}

impl Stream {
    fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
            Stream::Gmlog => "gmlog",
        }
    }
}

#[derive(Debug, Args)]
pub struct CatArgs {
    /// Job id or job name
    pub job: String,

    /// Which stream to print
    #[arg(long = "file", value_enum, default_value_t = Stream::Stdout)]
    pub stream: Stream,
}

pub async fn run(args: CatArgs, config: &Config) -> Result<OperationStatus> {
    let (store, mut supervisor) = open(config, &JobSelection::ids([args.job.clone()])).await?;
    if !supervisor.jobs_found() {
        return Err(anyhow!("Job '{}' is not in the job list", args.job));
    }

    // Output file names are only known after a status refresh
    supervisor.update_job_information().await;
    persist(&store, &supervisor).await;

    let url = supervisor.file_url(&args.job, args.stream.as_str())?;
    debug!(url = %url, "Fetching job output");

    let transfer = backends::transfer();
    let content = tokio::time::timeout(config.timeout, transfer.fetch(&url))
        .await
        .map_err(|_| anyhow!("Fetching {} timed out after {:?}", url, config.timeout))?
        .with_context(|| format!("Failed to fetch {}", url))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;

    Ok(OperationStatus::Success)
}
