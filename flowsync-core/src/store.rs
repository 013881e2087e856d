//! The remote workflow store seam.
//!
//! The sync logic only talks to the server through [`RemoteWorkflowStore`];
//! `flowsync-remote` provides the HTTP implementation and tests provide
//! in-memory fakes.

use thiserror::Error;

use crate::types::{WorkflowDocument, WorkflowId, WorkflowSummary};

/// Failures reported by a [`RemoteWorkflowStore`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be decoded.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The request was refused locally because it violates the store contract.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Read/write access to the server-side workflow inventory.
pub trait RemoteWorkflowStore {
    /// Every workflow the server knows about, archived ones included, in no
    /// particular order.
    fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, RemoteError>;

    /// Full document for `id`.
    fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowDocument, RemoteError>;

    /// Create a new workflow. `doc.id` must be `None`.
    fn create_workflow(&self, doc: &WorkflowDocument) -> Result<WorkflowDocument, RemoteError>;

    /// Replace the workflow `id`. `doc.id`, when set, must equal `id`.
    fn update_workflow(
        &self,
        id: &WorkflowId,
        doc: &WorkflowDocument,
    ) -> Result<WorkflowDocument, RemoteError>;

    /// Turn the triggers of workflow `id` on or off.
    fn set_active(&self, id: &WorkflowId, active: bool) -> Result<WorkflowDocument, RemoteError>;
}

impl<T: RemoteWorkflowStore + ?Sized> RemoteWorkflowStore for &T {
    fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, RemoteError> {
        (**self).list_workflows()
    }

    fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowDocument, RemoteError> {
        (**self).get_workflow(id)
    }

    fn create_workflow(&self, doc: &WorkflowDocument) -> Result<WorkflowDocument, RemoteError> {
        (**self).create_workflow(doc)
    }

    fn update_workflow(
        &self,
        id: &WorkflowId,
        doc: &WorkflowDocument,
    ) -> Result<WorkflowDocument, RemoteError> {
        (**self).update_workflow(id, doc)
    }

    fn set_active(&self, id: &WorkflowId, active: bool) -> Result<WorkflowDocument, RemoteError> {
        (**self).set_active(id, active)
    }
}

/// Check the create/update preconditions shared by every implementation.
pub fn check_write_contract(
    target: Option<&WorkflowId>,
    doc: &WorkflowDocument,
) -> Result<(), RemoteError> {
    match (target, doc.id.as_ref()) {
        (None, Some(id)) => Err(RemoteError::Rejected(format!(
            "create payload for '{}' still carries id {id}",
            doc.name
        ))),
        (Some(target), Some(id)) if target != id => Err(RemoteError::Rejected(format!(
            "update of {target} carries mismatched id {id}"
        ))),
        _ => Ok(()),
    }
}
