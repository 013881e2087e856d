//! # flowsync-remote
//!
//! HTTP implementation of [`flowsync_core::RemoteWorkflowStore`] for the n8n
//! public REST API (`/api/v1/workflows`).

pub mod client;

pub use client::N8nClient;
