//! flowsync: keep a directory of n8n workflow JSON files in sync with a server.
//!
//! # Usage
//!
//! ```text
//! flowsync [--dir <path>] [--config <path>] pull
//! flowsync push [names...] [--force] [--dry-run]
//! flowsync status [--verbose] [--json]
//! flowsync sync [--force] [--dry-run] [--no-push]
//! flowsync diff <name>
//! flowsync list [--remote]
//! flowsync activate <name>
//! flowsync deactivate <name>
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    activate::ActivateArgs, diff::DiffArgs, list::ListArgs, pull::PullArgs, push::PushArgs,
    status::StatusArgs, sync::SyncArgs, GlobalArgs,
};
use flowsync_sync::Interrupt;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "flowsync",
    version,
    about = "Bidirectional sync between n8n workflows and local JSON files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download every non-archived workflow into the workflow directory.
    Pull(PullArgs),

    /// Upload new and modified local workflows to the server.
    Push(PushArgs),

    /// Show which workflows exist where and which differ.
    Status(StatusArgs),

    /// Pull, then push local changes.
    Sync(SyncArgs),

    /// Show a unified diff between the server copy and the local file.
    Diff(DiffArgs),

    /// List local workflow files, or the server inventory with --remote.
    List(ListArgs),

    /// Turn on the triggers of a server workflow.
    Activate(ActivateArgs),

    /// Turn off the triggers of a server workflow.
    Deactivate(ActivateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let interrupt = install_interrupt_handler();

    match cli.command {
        Commands::Pull(args) => args.run(&cli.global, interrupt),
        Commands::Push(args) => args.run(&cli.global, interrupt),
        Commands::Status(args) => args.run(&cli.global, interrupt),
        Commands::Sync(args) => args.run(&cli.global, interrupt),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::List(args) => args.run(&cli.global),
        Commands::Activate(args) => args.run(&cli.global, true),
        Commands::Deactivate(args) => args.run(&cli.global, false),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Flag the running batch on the first Ctrl-C; abort on the second.
fn install_interrupt_handler() -> Interrupt {
    let interrupt = Interrupt::new();
    let flag = interrupt.clone();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("warning: Ctrl-C handling unavailable: {e}");
            return interrupt;
        }
    };

    std::thread::spawn(move || {
        runtime.block_on(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("interrupt received; finishing the current workflow (Ctrl-C again to abort)");
            flag.trigger();

            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });

    interrupt
}
