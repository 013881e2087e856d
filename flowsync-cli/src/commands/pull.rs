//! `flowsync pull`: download server workflows into the workflow directory.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use flowsync_sync::{Interrupt, PullOutcome, PullSummary, SyncOrchestrator, WriteResult};

use super::GlobalArgs;

/// Arguments for `flowsync pull`.
#[derive(Args, Debug)]
pub struct PullArgs {}

impl PullArgs {
    pub fn run(self, global: &GlobalArgs, interrupt: Interrupt) -> Result<ExitCode> {
        let (client, local) = global.connect()?;
        println!("Pulling from {} into {}", client.base_url(), local.dir().display());

        let summary = SyncOrchestrator::new(&client, &local)
            .with_interrupt(interrupt)
            .run_pull()
            .context("pull failed")?;

        print_pull(&summary);
        Ok(pull_exit_code(&summary))
    }
}

pub(crate) fn print_pull(summary: &PullSummary) {
    for outcome in &summary.outcomes {
        match outcome {
            PullOutcome::Saved {
                name,
                write: WriteResult::Written { path },
                ..
            } => println!("  {}  {name} → {}", "✎".green(), path.display()),
            PullOutcome::Saved { name, write, .. } => {
                println!("  ·  {name} → {}", write.path().display())
            }
            PullOutcome::SkippedArchived { name } => {
                println!("  {}  {name} (archived)", "-".bright_black())
            }
            PullOutcome::Failed(failure) => println!(
                "  {}  {}: {}",
                "✗".red().bold(),
                failure.subject,
                failure.message
            ),
        }
    }

    if summary.interrupted {
        println!("{}", "Pull interrupted.".yellow());
    }

    let marker = if summary.errors == 0 {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{marker} pull: {} synced ({} written), {} archived skipped, {} errors",
        summary.synced,
        summary.written(),
        summary.skipped,
        summary.errors
    );
}

/// Nonzero when interrupted, or when nothing could be synced although the
/// server had workflows to offer.
pub(crate) fn pull_exit_code(summary: &PullSummary) -> ExitCode {
    if summary.interrupted || (summary.synced == 0 && summary.errors > 0) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
