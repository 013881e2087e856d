//! `flowsync status`: where each workflow lives and whether it differs.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use flowsync_core::Identity;
use flowsync_sync::{Interrupt, StatusReport, SyncOrchestrator};

use super::GlobalArgs;

/// Arguments for `flowsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Fetch matched workflows and compare their content.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs, interrupt: Interrupt) -> Result<ExitCode> {
        let (client, local) = global.connect()?;

        let report = SyncOrchestrator::new(&client, &local)
            .with_interrupt(interrupt)
            .run_status(self.verbose)
            .context("status failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
        } else {
            print_table(&report);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "workflow")]
    workflow: String,
    #[tabled(rename = "state")]
    state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LocalOnly,
    RemoteOnly,
    Matched,
    InSync,
    Modified,
}

impl State {
    fn label(self) -> &'static str {
        match self {
            State::LocalOnly => "LOCAL ONLY",
            State::RemoteOnly => "REMOTE ONLY",
            State::Matched => "MATCHED",
            State::InSync => "IN SYNC",
            State::Modified => "MODIFIED",
        }
    }

    fn indicator(self) -> String {
        match self {
            State::LocalOnly => "■".cyan().bold().to_string(),
            State::RemoteOnly => "■".magenta().bold().to_string(),
            State::Matched => "■".bright_black().bold().to_string(),
            State::InSync => "■".green().bold().to_string(),
            State::Modified => "■".yellow().bold().to_string(),
        }
    }
}

fn state_of(report: &StatusReport, identity: &Identity) -> State {
    if report.local_only.contains(identity) {
        State::LocalOnly
    } else if report.remote_only.contains(identity) {
        State::RemoteOnly
    } else if report.modified.contains(identity) {
        State::Modified
    } else if report.in_sync.contains(identity) {
        State::InSync
    } else {
        State::Matched
    }
}

fn print_table(report: &StatusReport) {
    println!(
        "flowsync v{} | {} local | {} remote | {} archived",
        env!("CARGO_PKG_VERSION"),
        report.local_count,
        report.remote_count,
        report.archived_count,
    );

    let mut identities: Vec<&Identity> = report
        .local_only
        .iter()
        .chain(report.remote_only.iter())
        .chain(report.matched.iter())
        .collect();
    identities.sort();

    if identities.is_empty() {
        println!("No workflows locally or on the server.");
    } else {
        let separator = "■".repeat(48).bright_black().to_string();
        println!("{separator}");
        let mut legend = vec![State::LocalOnly, State::RemoteOnly];
        if report.compared {
            legend.extend([State::InSync, State::Modified]);
        } else {
            legend.push(State::Matched);
        }
        let legend: Vec<String> = legend
            .into_iter()
            .map(|s| format!("{} {}", s.indicator(), s.label()))
            .collect();
        println!("Indicators: {}", legend.join("  "));
        println!("{separator}");

        let rows: Vec<StatusTableRow> = identities
            .into_iter()
            .map(|identity| {
                let state = state_of(report, identity);
                StatusTableRow {
                    workflow: identity.to_string(),
                    state: format!("{} {}", state.indicator(), state.label()),
                }
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for failure in &report.errors {
        println!("  {}  {}: {}", "✗".red().bold(), failure.subject, failure.message);
    }

    if !report.local_only.is_empty() || !report.modified.is_empty() {
        println!("Run 'flowsync push' to upload local changes.");
    }
    if !report.remote_only.is_empty() {
        println!("Run 'flowsync pull' to fetch server-only workflows.");
    }
    if !report.compared && !report.matched.is_empty() {
        println!("Use --verbose to compare matched workflows by content.");
    }
}
