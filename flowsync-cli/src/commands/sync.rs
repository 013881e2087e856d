//! `flowsync sync`: pull, then push.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use flowsync_sync::{Interrupt, SyncOrchestrator};

use super::{
    pull::{print_pull, pull_exit_code},
    push::print_push,
    GlobalArgs,
};

/// Arguments for `flowsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Push matched workflows even when they are unchanged.
    #[arg(short, long)]
    pub force: bool,

    /// Pull for real, but only report what the push phase would send.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Stop after the pull phase.
    #[arg(long)]
    pub no_push: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs, interrupt: Interrupt) -> Result<ExitCode> {
        let (client, local) = global.connect()?;
        println!("Syncing {} with {}", local.dir().display(), client.base_url());

        let summary = SyncOrchestrator::new(&client, &local)
            .with_interrupt(interrupt)
            .run_sync(self.dry_run, self.force, self.no_push)
            .context("sync failed")?;

        print_pull(&summary.pull);
        let mut code = pull_exit_code(&summary.pull);
        if let Some(push) = &summary.push {
            print_push(push);
            if push.interrupted {
                code = ExitCode::FAILURE;
            }
        }
        Ok(code)
    }
}
