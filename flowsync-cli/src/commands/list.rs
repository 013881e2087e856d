//! `flowsync list`: local files, or the server inventory with `--remote`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use flowsync_core::{normalize, RemoteWorkflowStore};

use super::GlobalArgs;

/// Arguments for `flowsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// List the server inventory instead of the workflow directory.
    #[arg(long)]
    pub remote: bool,
}

#[derive(Tabled)]
struct LocalRow {
    #[tabled(rename = "identity")]
    identity: String,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "name")]
    name: String,
}

#[derive(Tabled)]
struct RemoteRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "identity")]
    identity: String,
    #[tabled(rename = "active")]
    active: String,
    #[tabled(rename = "archived")]
    archived: String,
    #[tabled(rename = "updated")]
    updated: String,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        if self.remote {
            list_remote(global)
        } else {
            list_local(global)
        }
    }
}

fn list_local(global: &GlobalArgs) -> Result<ExitCode> {
    let local = global.offline_store()?;
    let entries = local
        .list()
        .with_context(|| format!("failed to read {}", local.dir().display()))?;

    if entries.is_empty() {
        println!("No workflow files in {}.", local.dir().display());
        return Ok(ExitCode::SUCCESS);
    }

    let rows: Vec<LocalRow> = entries
        .iter()
        .map(|entry| LocalRow {
            identity: entry.identity.to_string(),
            file: entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            name: match local.read_entry(entry) {
                Ok(doc) => doc.name,
                Err(_) => "(unreadable)".red().to_string(),
            },
        })
        .collect();

    println!("{} workflow file(s) in {}", rows.len(), local.dir().display());
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(ExitCode::SUCCESS)
}

fn list_remote(global: &GlobalArgs) -> Result<ExitCode> {
    let (client, _) = global.connect()?;
    let mut summaries = client
        .list_workflows()
        .context("failed to list server workflows")?;
    summaries.sort_by(|a, b| a.name.cmp(&b.name));

    if summaries.is_empty() {
        println!("No workflows on {}.", client.base_url());
        return Ok(ExitCode::SUCCESS);
    }

    let flag = |on: bool| if on { "yes".to_string() } else { String::new() };
    let rows: Vec<RemoteRow> = summaries
        .iter()
        .map(|s| RemoteRow {
            id: s.id.to_string(),
            name: s.name.clone(),
            identity: normalize(&s.name).to_string(),
            active: flag(s.active),
            archived: flag(s.is_archived),
            updated: s.updated_at.clone().unwrap_or_default(),
        })
        .collect();

    println!("{} workflow(s) on {}", rows.len(), client.base_url());
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(ExitCode::SUCCESS)
}
