//! flowsync core library: workflow types, normalization, canonical form,
//! the remote store seam and configuration.
//!
//! - [`types`]: newtypes and workflow documents
//! - [`naming`]: name → identity normalization
//! - [`canonical`]: volatile-field stripping and semantic equality
//! - [`store`]: [`RemoteWorkflowStore`] and [`RemoteError`]
//! - [`config`]: server settings from file + environment

pub mod canonical;
pub mod config;
pub mod error;
pub mod naming;
pub mod store;
pub mod types;

pub use canonical::{canonicalize, equal};
pub use config::Settings;
pub use error::ConfigError;
pub use naming::normalize;
pub use store::{RemoteError, RemoteWorkflowStore};
pub use types::{Identity, SharedRecord, WorkflowDocument, WorkflowId, WorkflowSummary};
