//! Subcommand implementations and the context they share.

pub mod activate;
pub mod diff;
pub mod list;
pub mod pull;
pub mod push;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use flowsync_core::config::{self, Settings};
use flowsync_remote::N8nClient;
use flowsync_sync::LocalFileStore;

/// Default workflow directory, relative to the working directory.
pub const DEFAULT_WORKFLOWS_DIR: &str = "workflows";

/// Options accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Workflow directory [default: ./workflows, or `workflows_dir` from the config].
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Config file [default: ./config/config.json, then ./config/config.yaml].
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    fn root(&self) -> Result<PathBuf> {
        std::env::current_dir().context("could not determine working directory")
    }

    /// Resolve connection settings. Fails before any network call.
    pub fn settings(&self) -> Result<Settings> {
        let root = self.root()?;
        config::load(&root, self.config.as_deref())
            .context("failed to load configuration (set N8N_URL and N8N_API_KEY or create config/config.json)")
    }

    /// Settings, HTTP client and local store for commands that talk to the server.
    pub fn connect(&self) -> Result<(N8nClient, LocalFileStore)> {
        let settings = self.settings()?;
        let local = LocalFileStore::new(self.workflows_dir(settings.workflows_dir.as_deref())?);
        let client = N8nClient::from_settings(&settings);
        Ok((client, local))
    }

    /// Local store for offline commands. Only the config file's
    /// `workflows_dir` is consulted; credentials are not required.
    pub fn offline_store(&self) -> Result<LocalFileStore> {
        let root = self.root()?;
        let file = match self.config.as_deref() {
            Some(path) => Some(config::load_file(path).context("failed to load configuration")?),
            None => config::load_default_file_at(&root).context("failed to load configuration")?,
        };
        let configured = file.and_then(|f| f.workflows_dir);
        Ok(LocalFileStore::new(self.workflows_dir(configured.as_deref())?))
    }

    fn workflows_dir(&self, configured: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let root = self.root()?;
        Ok(match configured {
            Some(dir) => root.join(dir),
            None => root.join(DEFAULT_WORKFLOWS_DIR),
        })
    }
}
