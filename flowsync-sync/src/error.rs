//! Error types for flowsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use flowsync_core::{Identity, RemoteError};

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A local workflow file is not valid workflow JSON.
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The remote store refused or failed a request.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Several workflows normalize to the same identity.
    #[error("naming collision on '{identity}': {}", names.join(", "))]
    NamingCollision {
        identity: Identity,
        names: Vec<String>,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error while writing a workflow file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No workflow matches the requested name where one was required.
    #[error("no workflow named '{name}'")]
    NotFound { name: String },

    /// The batch was stopped by an interrupt.
    #[error("interrupted")]
    Interrupted,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
