//! Connection settings for the n8n server.
//!
//! # Sources (highest precedence first)
//!
//! 1. `N8N_URL` / `N8N_API_KEY` environment variables
//! 2. an explicit `--config <path>` file
//! 3. `<root>/config/config.json`, then `<root>/config/config.yaml`
//!
//! Files are parsed with serde_yaml, which also accepts plain JSON:
//!
//! ```text
//! { "n8n": { "url": "https://n8n.example.com", "api_key": "..." } }
//! ```
//!
//! Path-taking `_at` variants exist so tests
//! never depend on the process working directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const URL_ENV: &str = "N8N_URL";
pub const API_KEY_ENV: &str = "N8N_API_KEY";

/// Encrypted config written by older tooling; detected, never decrypted.
pub const ENCRYPTED_CONFIG: &str = "config.encrypted";

/// Raw file contents; every field optional so env vars can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub n8n: N8nSection,
    #[serde(default)]
    pub workflows_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct N8nSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Validated settings needed to talk to the server.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL without trailing slash, e.g. `https://n8n.example.com`.
    pub url: String,
    pub api_key: String,
    pub workflows_dir: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("workflows_dir", &self.workflows_dir)
            .finish()
    }
}

/// `<root>/config/`
pub fn config_dir_at(root: &Path) -> PathBuf {
    root.join("config")
}

/// Candidate config files under `root`, in lookup order.
pub fn default_paths_at(root: &Path) -> [PathBuf; 2] {
    let dir = config_dir_at(root);
    [dir.join("config.json"), dir.join("config.yaml")]
}

/// Parse a config file that must exist.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the first default config file under `root`, if any exists.
pub fn load_default_file_at(root: &Path) -> Result<Option<FileConfig>, ConfigError> {
    for candidate in default_paths_at(root) {
        if candidate.exists() {
            return load_file(&candidate).map(Some);
        }
    }
    Ok(None)
}

/// Merge file values with environment overrides and validate the result.
///
/// `env` is injected so callers (and tests) decide where variables come from.
pub fn resolve(
    file: Option<FileConfig>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let file = file.unwrap_or_default();
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let url = non_empty(env(URL_ENV))
        .or_else(|| non_empty(file.n8n.url.clone()))
        .ok_or(ConfigError::Missing("n8n.url"))?;
    let api_key = non_empty(env(API_KEY_ENV))
        .or_else(|| non_empty(file.n8n.api_key.clone()))
        .ok_or(ConfigError::Missing("n8n.api_key"))?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            field: "n8n.url",
            reason: format!("'{url}' must start with http:// or https://"),
        });
    }

    Ok(Settings {
        url: url.trim_end_matches('/').to_string(),
        api_key,
        workflows_dir: file.workflows_dir,
    })
}

/// Load settings rooted at `root`, honouring an explicit config path and the
/// supplied environment lookup.
pub fn load_at(
    root: &Path,
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let file = match explicit {
        Some(path) => Some(load_file(path)?),
        None => load_default_file_at(root)?,
    };
    let had_file = file.is_some();

    match resolve(file, env) {
        Err(ConfigError::Missing(field)) if !had_file => {
            let encrypted = config_dir_at(root).join(ENCRYPTED_CONFIG);
            if encrypted.exists() {
                Err(ConfigError::Encrypted { path: encrypted })
            } else {
                Err(ConfigError::Missing(field))
            }
        }
        other => other,
    }
}

/// `load_at` convenience wrapper reading the process environment.
pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    load_at(root, explicit, |key| std::env::var(key).ok())
}
