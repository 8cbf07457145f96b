//! Terminal output
//!
//! Job listings and operation summaries. Everything goes to stdout; logs go to
//! stderr through the tracing subscriber.

use colored::*;
use gridctl_core::domain::job::{Job, JobState, attr};
use gridctl_supervisor::{BulkOutcome, JobFailure, OperationStatus, ResubmitReport};

/// Attributes shown by `stat --long`, with their labels
const LONG_ATTRIBUTES: &[(&str, &str)] = &[
    (attr::OWNER, "Owner"),
    (attr::QUEUE, "Queue"),
    (attr::EXECUTION_CE, "Execution CE"),
    (attr::SUBMISSION_TIME, "Submitted"),
    (attr::END_TIME, "Ended"),
    (attr::WORKING_AREA_ERASE_TIME, "Erase time"),
    (attr::USED_CPU_TIME, "CPU time"),
    (attr::USED_WALL_TIME, "Wall time"),
    (attr::USED_MEMORY, "Memory"),
    (attr::EXIT_CODE, "Exit code"),
    (attr::WAITING_POSITION, "Waiting pos"),
    (attr::ERRORS, "Errors"),
];

/// Print one job, optionally with its pass-through attributes
pub fn print_job(job: &Job, long: bool) {
    let name = job.name.as_deref().unwrap_or("(unnamed)");
    println!("{} {}", "Job:".bold(), job.id.as_str().cyan());
    println!("  Name:     {}", name);
    match &job.native_state {
        Some(native) => println!("  State:    {} ({})", colorize_state(job.state), native.dimmed()),
        None => println!("  State:    {}", colorize_state(job.state)),
    }

    if long {
        println!("  Flavour:  {}", job.flavour);
        println!("  Service:  {}", job.managing_endpoint.as_str().dimmed());
        if let Some(submitted) = job.submitted_at {
            println!("  Local submission: {}", submitted.format("%Y-%m-%d %H:%M:%S"));
        }
        for (key, label) in LONG_ATTRIBUTES {
            if let Some(values) = job.attributes.get(*key).filter(|v| !v.is_empty()) {
                println!("  {:<12} {}", format!("{}:", label), values.join(", "));
            }
        }
        if !job.predecessor_ids.is_empty() {
            println!("  Replaces:");
            for predecessor in &job.predecessor_ids {
                println!("    {}", predecessor.as_str().dimmed());
            }
        }
    }
    println!();
}

/// Print "X of Y jobs were <verb>" plus every failure
pub fn print_outcome(outcome: &BulkOutcome, verb: &str) {
    print_failures(&outcome.failed, &outcome.not_found);
    print_summary(&outcome.summary(verb), outcome.status());
}

pub fn print_resubmit_report(report: &ResubmitReport) {
    for resubmission in &report.resubmitted {
        println!(
            "{} {} {} {}",
            "▸".cyan(),
            resubmission.original.as_str().dimmed(),
            "→".dimmed(),
            resubmission.new_job.id
        );
    }
    print_failures(&report.not_resubmitted, &report.not_found);

    if !report.not_cancelled.is_empty() {
        println!("{}", "Jobs that could not be killed (still in the job list):".yellow());
        print_failures(&report.not_cancelled, &[]);
    }
    if !report.not_cleaned.is_empty() {
        println!("{}", "Jobs that could not be cleaned (still in the job list):".yellow());
        print_failures(&report.not_cleaned, &[]);
    }
    for error in &report.store_errors {
        println!("{} {}", "✗".red(), error);
        if let Some(hint) = error.recovery_hint() {
            println!("  {}", hint.dimmed());
        }
    }

    print_summary(&report.summary(), report.status());
}

fn print_failures(failed: &[JobFailure], not_found: &[String]) {
    for failure in failed {
        println!("{} {}: {}", "✗".red(), failure.id, failure.error);
    }
    for missing in not_found {
        println!("{} {}: {}", "✗".red(), missing, "job not found in job list".dimmed());
    }
}

fn print_summary(summary: &str, status: OperationStatus) {
    let line = match status {
        OperationStatus::Success => summary.green(),
        OperationStatus::PartialFailure => summary.yellow(),
        OperationStatus::Failure => summary.red(),
    };
    println!("{}", line.bold());
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> ColoredString {
    let text = state.as_str();
    match state {
        JobState::Accepted | JobState::Preparing | JobState::Submitting | JobState::Queuing => {
            text.yellow()
        }
        JobState::Running | JobState::Finishing => text.cyan(),
        JobState::Finished => text.green(),
        JobState::Failed | JobState::Killed => text.red(),
        JobState::Deleted | JobState::Unknown => text.dimmed(),
    }
}
