//! `resub`: submit selected jobs again and replace the originals

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use gridctl_core::domain::endpoint::Endpoint;
use gridctl_supervisor::{Config, OperationStatus, ResubmitOptions, ResubmitReport, TargetMode};
use std::path::{Path, PathBuf};
use url::Url;

use crate::backends;
use crate::commands::{nothing_selected, open, persist};
use crate::output::{print_outcome, print_resubmit_report};
use crate::types::SelectionArgs;

#[derive(Debug, Args)]
pub struct ResubArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Only submit to the service that ran the original job
    #[arg(long, conflicts_with = "not_same")]
    pub same: bool,

    /// Never submit to the service that ran the original job
    #[arg(long)]
    pub not_same: bool,

    /// Keep the replaced jobs on their services and in the job list
    #[arg(short, long)]
    pub keep: bool,

    /// Broker ranking the candidate targets (Random, Load)
    #[arg(short, long, env = "GRIDCTL_BROKER")]
    pub broker: Option<String>,

    /// Computing information endpoint to discover targets from (repeatable)
    #[arg(long = "computing", value_name = "URL")]
    pub computing: Vec<Url>,

    /// Registry to discover computing services from (repeatable)
    #[arg(long = "index", value_name = "URL")]
    pub index: Vec<Url>,

    /// Append the ids of the new jobs to this file
    #[arg(short = 'o', long = "jobids-to-file", value_name = "FILE")]
    pub ids_out: Option<PathBuf>,
}

impl ResubArgs {
    fn mode(&self) -> TargetMode {
        match (self.same, self.not_same) {
            (true, _) => TargetMode::Same,
            (false, true) => TargetMode::NotSame,
            (false, false) => TargetMode::Any,
        }
    }

    /// The invocation configuration plus this command's broker and services
    fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(broker) = &self.broker {
            config = config.with_broker(broker.clone());
        }
        for url in &self.computing {
            config = config.with_service(Endpoint::computing_info(url.clone()));
        }
        for url in &self.index {
            config = config.with_service(Endpoint::registry(url.clone()));
        }
        config.validate().context("Invalid resubmission options")?;
        Ok(config)
    }
}

pub async fn run(args: ResubArgs, config: Config) -> Result<OperationStatus> {
    let config = args.apply(config)?;
    let backends = backends::submission(&config)?;
    let (store, mut supervisor) = open(&config, &args.selection.to_selection()?).await?;
    if nothing_selected(&supervisor) {
        return Ok(OperationStatus::Success);
    }

    let refreshed = supervisor.update_job_information().await;
    persist(&store, &supervisor).await;
    if !refreshed.failed.is_empty() {
        print_outcome(&refreshed, "queried");
    }
    if config.services.is_empty() && args.mode() != TargetMode::Same {
        println!("{}", "No services given: use --computing or --index.".yellow());
    }

    let options = ResubmitOptions {
        states: args.selection.states.clone(),
        mode: args.mode(),
        keep_history: args.keep,
    };
    let report = supervisor.resubmit(&store, &backends, &options).await;
    print_resubmit_report(&report);

    let mut status = report.status();
    if let Some(path) = &args.ids_out {
        if let Err(e) = append_ids(path, &report).await {
            eprintln!("{} {:#}", "✗".red(), e);
            status = status.combine(OperationStatus::PartialFailure);
        }
    }
    Ok(status)
}

async fn append_ids(path: &Path, report: &ResubmitReport) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for resubmission in &report.resubmitted {
        file.write_all(format!("{}\n", resubmission.new_job.id).as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
