//! `flowsync push`: upload new and modified local workflows.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use flowsync_sync::{Interrupt, PushOutcome, PushSummary, SyncOrchestrator};

use super::GlobalArgs;

/// Arguments for `flowsync push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Only push workflows with these names (display name or file identity).
    pub names: Vec<String>,

    /// Push matched workflows even when they are unchanged.
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be pushed without contacting the server for writes.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl PushArgs {
    pub fn run(self, global: &GlobalArgs, interrupt: Interrupt) -> Result<ExitCode> {
        let (client, local) = global.connect()?;
        let selection = (!self.names.is_empty()).then_some(self.names.as_slice());

        let summary = SyncOrchestrator::new(&client, &local)
            .with_interrupt(interrupt)
            .run_push(selection, self.dry_run, self.force)
            .context("push failed")?;

        print_push(&summary);
        Ok(if summary.interrupted {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

pub(crate) fn print_push(summary: &PushSummary) {
    let prefix = if summary.dry_run { "[dry-run] " } else { "" };

    for wanted in &summary.unmatched_selection {
        println!("  {}  no local workflow named '{wanted}'", "?".yellow());
    }

    for outcome in &summary.outcomes {
        match outcome {
            PushOutcome::Created { identity, id } => {
                let id = id.as_ref().map(|id| format!(" (id {id})")).unwrap_or_default();
                println!("  {}  created {identity}{id}", "+".green())
            }
            PushOutcome::WouldCreate { identity } => println!("  ~  would create {identity}"),
            PushOutcome::Updated { identity, id } => {
                println!("  {}  updated {identity} (id {id})", "✎".green())
            }
            PushOutcome::WouldUpdate { identity, id } => {
                println!("  ~  would update {identity} (id {id})")
            }
            PushOutcome::Unchanged { .. } => {}
            PushOutcome::Failed(failure) => println!(
                "  {}  {}: {}",
                "✗".red().bold(),
                failure.subject,
                failure.message
            ),
        }
    }

    if !summary.remote_only.is_empty() {
        println!(
            "  {} workflow(s) exist only on the server; run `flowsync pull` to fetch them.",
            summary.remote_only.len()
        );
    }
    if summary.interrupted {
        println!("{}", "Push interrupted.".yellow());
    }

    let marker = if summary.errors == 0 {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{prefix}{marker} push: {} created, {} updated, {} unchanged, {} errors",
        summary.created, summary.updated, summary.unchanged, summary.errors
    );
}
