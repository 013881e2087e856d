//! `flowsync diff <name>`: unified diff between the server and the local file.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use flowsync_sync::SyncOrchestrator;

use super::GlobalArgs;

/// Arguments for `flowsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Workflow display name or file identity.
    pub name: String,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let (client, local) = global.connect()?;

        let result = SyncOrchestrator::new(&client, &local)
            .diff(&self.name)
            .with_context(|| format!("diff failed for '{}'", self.name))?;

        if !result.remote_exists {
            println!("'{}' exists only locally.", result.identity);
        } else if !result.local_exists {
            println!("'{}' exists only on the server.", result.identity);
        }

        if result.unified_diff.is_empty() {
            println!("No differences for '{}'.", result.identity);
            return Ok(ExitCode::SUCCESS);
        }

        print!("{}", result.unified_diff);
        if !result.unified_diff.ends_with('\n') {
            println!();
        }

        Ok(ExitCode::SUCCESS)
    }
}
