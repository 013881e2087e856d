//! Error types for flowsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading a config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file exists but is not valid JSON/YAML for the expected shape.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// Only an encrypted config is present; decryption is not supported.
    #[error("only an encrypted config was found at {path}; provide a plaintext config or N8N_URL/N8N_API_KEY")]
    Encrypted { path: PathBuf },

    /// A required setting is absent from both the file and the environment.
    #[error("missing setting '{0}' (config file or environment)")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
