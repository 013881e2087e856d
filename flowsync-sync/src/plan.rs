//! Reconciliation planning between the local directory and the server.
//!
//! Planning is pure: callers fetch and key both inventories first, the
//! planner only classifies identities.

use std::collections::{BTreeMap, BTreeSet};

use flowsync_core::{canonicalize, equal, Identity, WorkflowDocument};

/// Presence-only split of two identity sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPartition {
    pub local_only: BTreeSet<Identity>,
    pub remote_only: BTreeSet<Identity>,
    pub both: BTreeSet<Identity>,
}

/// Classify identities by where they exist.
pub fn partition_identities<'a>(
    local: impl IntoIterator<Item = &'a Identity>,
    remote: impl IntoIterator<Item = &'a Identity>,
) -> IdentityPartition {
    let local: BTreeSet<Identity> = local.into_iter().cloned().collect();
    let remote: BTreeSet<Identity> = remote.into_iter().cloned().collect();

    IdentityPartition {
        local_only: local.difference(&remote).cloned().collect(),
        remote_only: remote.difference(&local).cloned().collect(),
        both: local.intersection(&remote).cloned().collect(),
    }
}

/// Per-identity intended action.
///
/// `create_remote`, `update_remote`, `unchanged` and `pull_candidates` are
/// pairwise disjoint and cover every local identity plus every non-archived
/// remote identity. `archived` lists remote identities that were dropped
/// before classification; it is informational and may overlap the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub create_remote: BTreeSet<Identity>,
    pub update_remote: BTreeSet<Identity>,
    pub unchanged: BTreeSet<Identity>,
    pub pull_candidates: BTreeSet<Identity>,
    pub archived: BTreeSet<Identity>,
}

impl ReconciliationPlan {
    /// Force policy: push every matched workflow, changed or not.
    pub fn with_force(mut self) -> Self {
        let unchanged = std::mem::take(&mut self.unchanged);
        self.update_remote.extend(unchanged);
        self
    }
}

/// Build the plan for `local` against `remote`.
///
/// Both sides are canonicalized before comparison, so callers may pass raw
/// documents. Archived remote workflows never match a local one.
pub fn plan(
    local: &BTreeMap<Identity, WorkflowDocument>,
    remote: &BTreeMap<Identity, WorkflowDocument>,
) -> ReconciliationPlan {
    let mut result = ReconciliationPlan::default();

    let live_remote: BTreeMap<&Identity, &WorkflowDocument> = remote
        .iter()
        .filter(|(identity, doc)| {
            if doc.archived() {
                result.archived.insert((*identity).clone());
                false
            } else {
                true
            }
        })
        .collect();

    let partition = partition_identities(local.keys(), live_remote.keys().copied());
    result.create_remote = partition.local_only;
    result.pull_candidates = partition.remote_only;

    for identity in partition.both {
        let l = canonicalize(&local[&identity]);
        let r = canonicalize(live_remote[&identity]);
        if equal(&l, &r) {
            result.unchanged.insert(identity);
        } else {
            result.update_remote.insert(identity);
        }
    }

    result
}
