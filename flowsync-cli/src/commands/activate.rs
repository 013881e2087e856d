//! `flowsync activate <name>` / `flowsync deactivate <name>`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use flowsync_sync::SyncOrchestrator;

use super::GlobalArgs;

/// Arguments for `flowsync activate` and `flowsync deactivate`.
#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Workflow display name or file identity.
    pub name: String,
}

impl ActivateArgs {
    pub fn run(self, global: &GlobalArgs, active: bool) -> Result<ExitCode> {
        let (client, local) = global.connect()?;
        let verb = if active { "activate" } else { "deactivate" };

        let result = SyncOrchestrator::new(&client, &local)
            .set_active(&self.name, active)
            .with_context(|| format!("{verb} failed for '{}'", self.name))?;

        let state = if active { "active" } else { "inactive" };
        if result.changed {
            println!(
                "{}  {} (id {}) is now {state}",
                "✓".green(),
                result.identity,
                result.id
            );
        } else {
            println!("·  {} (id {}) is already {state}", result.identity, result.id);
        }
        Ok(ExitCode::SUCCESS)
    }
}
