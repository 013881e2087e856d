//! # flowsync-sync
//!
//! Local workflow directory, reconciliation planning and the
//! pull / push / status / sync passes.
//!
//! Build a [`SyncOrchestrator`] over any [`flowsync_core::RemoteWorkflowStore`]
//! and a [`LocalFileStore`], then call one of its `run_*` methods.

pub mod diff;
pub mod error;
pub mod inventory;
pub mod local;
pub mod orchestrator;
pub mod plan;

pub use error::SyncError;
pub use inventory::{LocalInventory, RemoteInventory};
pub use local::{LocalEntry, LocalFileStore, WriteResult};
pub use orchestrator::{
    Activation, Failure, Interrupt, PullOutcome, PullSummary, PushOutcome, PushSummary, StatusReport,
    SyncOrchestrator, SyncSummary, WorkflowDiff,
};
pub use plan::{partition_identities, plan, IdentityPartition, ReconciliationPlan};
