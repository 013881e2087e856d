//! Pull / push / status / sync passes.
//!
//! Every pass processes one workflow at a time in identity order. Failures
//! scoped to a single workflow become an outcome in the returned summary;
//! only inventory-level failures (listing the server, reading the workflow
//! directory) are returned as `Err`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use flowsync_core::{
    canonicalize, naming::normalize, Identity, RemoteWorkflowStore, WorkflowDocument, WorkflowId,
};

use crate::error::SyncError;
use crate::inventory::{file_name, LocalInventory, RemoteInventory};
use crate::local::{LocalFileStore, WriteResult};
use crate::plan::{partition_identities, plan};

// ---------------------------------------------------------------------------
// Interrupt
// ---------------------------------------------------------------------------

/// Shared stop flag, checked before each workflow is started.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A workflow-scoped failure, already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Identity, file name or display name of the affected workflow.
    pub subject: String,
    pub message: String,
}

impl Failure {
    fn new(subject: impl Into<String>, err: &SyncError) -> Self {
        Self {
            subject: subject.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Saved {
        identity: Identity,
        name: String,
        write: WriteResult,
    },
    SkippedArchived {
        name: String,
    },
    Failed(Failure),
}

/// Result of [`SyncOrchestrator::run_pull`].
#[derive(Debug, Clone, Default)]
pub struct PullSummary {
    /// Workflows materialized on disk (written or already identical).
    pub synced: usize,
    /// Archived workflows left alone.
    pub skipped: usize,
    pub errors: usize,
    pub interrupted: bool,
    pub outcomes: Vec<PullOutcome>,
}

impl PullSummary {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    PullOutcome::Saved {
                        write: WriteResult::Written { .. },
                        ..
                    }
                )
            })
            .count()
    }

    fn fail(&mut self, failure: Failure) {
        tracing::warn!("{}: {}", failure.subject, failure.message);
        self.errors += 1;
        self.outcomes.push(PullOutcome::Failed(failure));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Created {
        identity: Identity,
        id: Option<WorkflowId>,
    },
    WouldCreate {
        identity: Identity,
    },
    Updated {
        identity: Identity,
        id: WorkflowId,
    },
    WouldUpdate {
        identity: Identity,
        id: WorkflowId,
    },
    Unchanged {
        identity: Identity,
    },
    Failed(Failure),
}

/// Result of [`SyncOrchestrator::run_push`].
///
/// In dry-run mode `created` / `updated` count the planned writes.
#[derive(Debug, Clone, Default)]
pub struct PushSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
    pub dry_run: bool,
    pub interrupted: bool,
    /// Remote workflows with no local file (pull candidates).
    pub remote_only: BTreeSet<Identity>,
    /// Selection entries that matched no local workflow.
    pub unmatched_selection: Vec<String>,
    pub outcomes: Vec<PushOutcome>,
}

impl PushSummary {
    fn record(&mut self, outcome: PushOutcome) {
        match &outcome {
            PushOutcome::Created { .. } | PushOutcome::WouldCreate { .. } => self.created += 1,
            PushOutcome::Updated { .. } | PushOutcome::WouldUpdate { .. } => self.updated += 1,
            PushOutcome::Unchanged { .. } => self.unchanged += 1,
            PushOutcome::Failed(failure) => {
                tracing::warn!("{}: {}", failure.subject, failure.message);
                self.errors += 1;
            }
        }
        self.outcomes.push(outcome);
    }
}

/// Result of [`SyncOrchestrator::run_status`]. Nothing is written anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub local_count: usize,
    /// Non-archived remote workflows.
    pub remote_count: usize,
    pub archived_count: usize,
    /// Ready to push as new workflows.
    pub local_only: BTreeSet<Identity>,
    /// Ready to pull.
    pub remote_only: BTreeSet<Identity>,
    /// Present on both sides.
    pub matched: BTreeSet<Identity>,
    /// `true` when matched workflows were compared by content.
    pub compared: bool,
    pub in_sync: BTreeSet<Identity>,
    pub modified: BTreeSet<Identity>,
    pub errors: Vec<Failure>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.local_only.is_empty()
            && self.remote_only.is_empty()
            && self.modified.is_empty()
            && self.errors.is_empty()
    }
}

/// Result of [`SyncOrchestrator::run_sync`].
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub pull: PullSummary,
    /// `None` when the push phase was disabled or the pull was interrupted.
    pub push: Option<PushSummary>,
}

/// Unified diff between the server copy and the local file of one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDiff {
    pub identity: Identity,
    pub local_exists: bool,
    pub remote_exists: bool,
    /// Empty when both canonical renderings are identical.
    pub unified_diff: String,
}

/// Result of [`SyncOrchestrator::set_active`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub identity: Identity,
    pub id: WorkflowId,
    pub active: bool,
    /// `false` when the workflow was already in the requested state.
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives sync passes against an injected remote store and local directory.
pub struct SyncOrchestrator<'a, R: RemoteWorkflowStore + ?Sized> {
    remote: &'a R,
    local: &'a LocalFileStore,
    interrupt: Interrupt,
}

impl<'a, R: RemoteWorkflowStore + ?Sized> SyncOrchestrator<'a, R> {
    pub fn new(remote: &'a R, local: &'a LocalFileStore) -> Self {
        Self {
            remote,
            local,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn remote_inventory(&self) -> Result<RemoteInventory, SyncError> {
        let summaries = self.remote.list_workflows()?;
        tracing::debug!("remote inventory: {} workflows", summaries.len());
        Ok(RemoteInventory::from_summaries(summaries))
    }

    fn local_inventory(&self) -> Result<LocalInventory, SyncError> {
        Ok(LocalInventory::from_entries(self.local.list()?))
    }

    fn fetch_canonical(&self, id: &WorkflowId) -> Result<WorkflowDocument, SyncError> {
        Ok(canonicalize(&self.remote.get_workflow(id)?))
    }

    // -----------------------------------------------------------------------
    // pull
    // -----------------------------------------------------------------------

    /// Materialize every non-archived remote workflow as
    /// `<identity>.json`. Stale local files are left in place.
    pub fn run_pull(&self) -> Result<PullSummary, SyncError> {
        let inventory = self.remote_inventory()?;
        self.local.ensure_dir()?;

        let mut summary = PullSummary::default();

        for archived in &inventory.archived {
            tracing::info!("skipping archived: {}", archived.name);
            summary.skipped += 1;
            summary.outcomes.push(PullOutcome::SkippedArchived {
                name: archived.name.clone(),
            });
        }
        for name in &inventory.invalid {
            summary.fail(Failure {
                subject: name.clone(),
                message: "name has no usable characters for a file name".to_string(),
            });
        }
        for (identity, names) in &inventory.collisions {
            let err = SyncError::NamingCollision {
                identity: identity.clone(),
                names: names.clone(),
            };
            summary.fail(Failure::new(identity.as_str(), &err));
        }

        for (identity, remote) in &inventory.live {
            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let saved = self
                .fetch_canonical(&remote.id)
                .and_then(|doc| self.local.write(identity, &doc, false));
            match saved {
                Ok(write) => {
                    summary.synced += 1;
                    summary.outcomes.push(PullOutcome::Saved {
                        identity: identity.clone(),
                        name: remote.name.clone(),
                        write,
                    });
                }
                Err(err) => summary.fail(Failure::new(identity.as_str(), &err)),
            }
        }

        tracing::info!(
            "pull: {} synced, {} skipped, {} errors",
            summary.synced,
            summary.skipped,
            summary.errors
        );
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // push
    // -----------------------------------------------------------------------

    /// Push local workflows to the server.
    ///
    /// `selection` restricts the pass to workflows whose display name,
    /// identity or file name matches one of the entries.
    pub fn run_push(
        &self,
        selection: Option<&[String]>,
        dry_run: bool,
        force: bool,
    ) -> Result<PushSummary, SyncError> {
        let local_inventory = self.local_inventory()?;
        let remote_inventory = self.remote_inventory()?;

        let mut summary = PushSummary {
            dry_run,
            ..Default::default()
        };

        // Unselected files are dropped before any failure is counted.
        let mut selection = selection.map(Selection::new);

        for name in &local_inventory.invalid {
            if !selected(&mut selection, "", &[name.as_str()]) {
                continue;
            }
            summary.record(PushOutcome::Failed(Failure {
                subject: name.clone(),
                message: "file name has no usable characters for an identity".to_string(),
            }));
        }
        for (identity, files) in &local_inventory.collisions {
            let files_ref: Vec<&str> = files.iter().map(String::as_str).collect();
            if !selected(&mut selection, identity.as_str(), &files_ref) {
                continue;
            }
            let err = SyncError::NamingCollision {
                identity: identity.clone(),
                names: files.clone(),
            };
            summary.record(PushOutcome::Failed(Failure::new(identity.as_str(), &err)));
        }

        // Read local documents.
        let mut local_docs: BTreeMap<Identity, WorkflowDocument> = BTreeMap::new();
        for (identity, entry) in &local_inventory.entries {
            let file = file_name(entry);
            match self.local.read_entry(entry) {
                Ok(doc) => {
                    let names = [doc.name.as_str(), file.as_str()];
                    if !selected(&mut selection, identity.as_str(), &names) {
                        continue;
                    }
                    if normalize(&doc.name) != *identity {
                        tracing::warn!(
                            "{}: workflow name '{}' does not match the file name",
                            entry.path.display(),
                            doc.name
                        );
                    }
                    local_docs.insert(identity.clone(), doc);
                }
                Err(err) => {
                    if !selected(&mut selection, identity.as_str(), &[file.as_str()]) {
                        continue;
                    }
                    summary.record(PushOutcome::Failed(Failure::new(identity.as_str(), &err)))
                }
            }
        }

        if let Some(selection) = selection {
            for wanted in selection.unmatched() {
                tracing::warn!("no local workflow matches '{wanted}'");
                summary.unmatched_selection.push(wanted.clone());
            }
        }

        let presence = partition_identities(local_docs.keys(), remote_inventory.live.keys());
        summary.remote_only = presence.remote_only;

        // A remote collision makes the target ambiguous: neither create nor update.
        for identity in local_docs.keys().cloned().collect::<Vec<_>>() {
            if let Some(names) = remote_inventory.collisions.get(&identity) {
                local_docs.remove(&identity);
                let err = SyncError::NamingCollision {
                    identity: identity.clone(),
                    names: names.clone(),
                };
                summary.record(PushOutcome::Failed(Failure::new(identity.as_str(), &err)));
            }
        }

        // Fetch full remote documents for matched identities.
        let mut remote_docs: BTreeMap<Identity, WorkflowDocument> = BTreeMap::new();
        for identity in &presence.both {
            if !local_docs.contains_key(identity) {
                continue;
            }
            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                return Ok(summary);
            }
            let remote_id = &remote_inventory.live[identity].id;
            match self.fetch_canonical(remote_id) {
                Ok(doc) => {
                    remote_docs.insert(identity.clone(), doc);
                }
                Err(err) => {
                    // Without the remote copy this would look like a create.
                    local_docs.remove(identity);
                    summary.record(PushOutcome::Failed(Failure::new(identity.as_str(), &err)));
                }
            }
        }

        let mut reconciliation = plan(&local_docs, &remote_docs);
        if force {
            reconciliation = reconciliation.with_force();
        }

        for (identity, local_doc) in &local_docs {
            if reconciliation.unchanged.contains(identity) {
                tracing::debug!("unchanged: {identity}");
                summary.record(PushOutcome::Unchanged {
                    identity: identity.clone(),
                });
                continue;
            }

            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let outcome = if reconciliation.create_remote.contains(identity) {
                self.apply_create(identity, local_doc, dry_run)
            } else {
                let remote_id = remote_inventory.live[identity].id.clone();
                self.apply_update(identity, &remote_id, local_doc, dry_run)
            };
            summary.record(outcome);
        }

        tracing::info!(
            "push: {} created, {} updated, {} unchanged, {} errors",
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.errors
        );
        Ok(summary)
    }

    fn apply_create(&self, identity: &Identity, doc: &WorkflowDocument, dry_run: bool) -> PushOutcome {
        if dry_run {
            tracing::info!("[dry-run] would create: {identity}");
            return PushOutcome::WouldCreate {
                identity: identity.clone(),
            };
        }

        let mut payload = canonicalize(doc);
        payload.id = None;
        match self.remote.create_workflow(&payload) {
            Ok(created) => PushOutcome::Created {
                identity: identity.clone(),
                id: created.id,
            },
            Err(err) => PushOutcome::Failed(Failure::new(identity.as_str(), &SyncError::from(err))),
        }
    }

    fn apply_update(
        &self,
        identity: &Identity,
        remote_id: &WorkflowId,
        doc: &WorkflowDocument,
        dry_run: bool,
    ) -> PushOutcome {
        if dry_run {
            tracing::info!("[dry-run] would update: {identity} ({remote_id})");
            return PushOutcome::WouldUpdate {
                identity: identity.clone(),
                id: remote_id.clone(),
            };
        }

        let mut payload = canonicalize(doc);
        payload.id = Some(remote_id.clone());
        match self.remote.update_workflow(remote_id, &payload) {
            Ok(_) => PushOutcome::Updated {
                identity: identity.clone(),
                id: remote_id.clone(),
            },
            Err(err) => PushOutcome::Failed(Failure::new(identity.as_str(), &SyncError::from(err))),
        }
    }

    // -----------------------------------------------------------------------
    // status
    // -----------------------------------------------------------------------

    /// Report where local and remote inventories differ.
    ///
    /// With `verbose`, matched workflows are fetched and compared by content.
    pub fn run_status(&self, verbose: bool) -> Result<StatusReport, SyncError> {
        let local_inventory = self.local_inventory()?;
        let remote_inventory = self.remote_inventory()?;

        let mut errors = Vec::new();
        for name in &local_inventory.invalid {
            errors.push(Failure {
                subject: name.clone(),
                message: "file name has no usable characters for an identity".to_string(),
            });
        }
        for name in &remote_inventory.invalid {
            errors.push(Failure {
                subject: name.clone(),
                message: "name has no usable characters for a file name".to_string(),
            });
        }
        for (identity, files) in &local_inventory.collisions {
            let err = SyncError::NamingCollision {
                identity: identity.clone(),
                names: files.clone(),
            };
            errors.push(Failure::new(identity.as_str(), &err));
        }
        for (identity, names) in &remote_inventory.collisions {
            let err = SyncError::NamingCollision {
                identity: identity.clone(),
                names: names.clone(),
            };
            errors.push(Failure::new(identity.as_str(), &err));
        }

        let presence =
            partition_identities(local_inventory.entries.keys(), remote_inventory.live.keys());

        let mut report = StatusReport {
            generated_at: Utc::now(),
            local_count: local_inventory.entries.len(),
            remote_count: remote_inventory.live.len(),
            archived_count: remote_inventory.archived.len(),
            local_only: presence.local_only,
            remote_only: presence.remote_only,
            matched: presence.both,
            compared: verbose,
            in_sync: BTreeSet::new(),
            modified: BTreeSet::new(),
            errors,
        };

        if verbose {
            let mut local_docs = BTreeMap::new();
            let mut remote_docs = BTreeMap::new();
            for identity in &report.matched {
                if self.interrupt.is_triggered() {
                    return Err(SyncError::Interrupted);
                }
                let pair = self
                    .local
                    .read_entry(&local_inventory.entries[identity])
                    .and_then(|l| {
                        let r = self.fetch_canonical(&remote_inventory.live[identity].id)?;
                        Ok((l, r))
                    });
                match pair {
                    Ok((l, r)) => {
                        local_docs.insert(identity.clone(), l);
                        remote_docs.insert(identity.clone(), r);
                    }
                    Err(err) => report.errors.push(Failure::new(identity.as_str(), &err)),
                }
            }
            let compared = plan(&local_docs, &remote_docs);
            report.in_sync = compared.unchanged;
            report.modified = compared.update_remote;
        }

        Ok(report)
    }

    // -----------------------------------------------------------------------
    // sync
    // -----------------------------------------------------------------------

    /// Pull, then push unless `no_push`. `dry_run` and `force` apply to the
    /// push phase.
    pub fn run_sync(&self, dry_run: bool, force: bool, no_push: bool) -> Result<SyncSummary, SyncError> {
        let pull = self.run_pull()?;
        if no_push || pull.interrupted {
            return Ok(SyncSummary { pull, push: None });
        }
        let push = self.run_push(None, dry_run, force)?;
        Ok(SyncSummary {
            pull,
            push: Some(push),
        })
    }

    // -----------------------------------------------------------------------
    // diff
    // -----------------------------------------------------------------------

    /// Diff the canonical server copy of `name` against its local file.
    pub fn diff(&self, name: &str) -> Result<WorkflowDiff, SyncError> {
        let identity = normalize(name);

        let local_inventory = self.local_inventory()?;
        let inventory = self.remote_inventory()?;
        if let Some(names) = local_inventory
            .collisions
            .get(&identity)
            .or_else(|| inventory.collisions.get(&identity))
        {
            return Err(SyncError::NamingCollision {
                identity,
                names: names.clone(),
            });
        }

        let local_doc = match local_inventory.entries.get(&identity) {
            Some(entry) => Some(canonicalize(&self.local.read_entry(entry)?)),
            None => None,
        };
        let remote_doc = match inventory.live.get(&identity) {
            Some(summary) => Some(self.fetch_canonical(&summary.id)?),
            None => None,
        };

        if local_doc.is_none() && remote_doc.is_none() {
            return Err(SyncError::NotFound {
                name: name.to_string(),
            });
        }

        let rendered_remote = render_optional(remote_doc.as_ref())?;
        let rendered_local = render_optional(local_doc.as_ref())?;
        let file_name = identity.file_name();
        let unified_diff = crate::diff::unified(
            &rendered_remote,
            &rendered_local,
            &format!("a/remote/{file_name}"),
            &format!("b/local/{file_name}"),
        );

        Ok(WorkflowDiff {
            identity,
            local_exists: local_doc.is_some(),
            remote_exists: remote_doc.is_some(),
            unified_diff,
        })
    }

    // -----------------------------------------------------------------------
    // activate / deactivate
    // -----------------------------------------------------------------------

    /// Switch the server workflow named `name` on or off. Local files are
    /// not touched.
    pub fn set_active(&self, name: &str, active: bool) -> Result<Activation, SyncError> {
        let identity = normalize(name);
        let inventory = self.remote_inventory()?;
        if let Some(names) = inventory.collisions.get(&identity) {
            return Err(SyncError::NamingCollision {
                identity,
                names: names.clone(),
            });
        }
        let summary = inventory.live.get(&identity).ok_or_else(|| SyncError::NotFound {
            name: name.to_string(),
        })?;

        let changed = summary.active != active;
        if changed {
            self.remote.set_active(&summary.id, active)?;
        } else {
            let state = if active { "active" } else { "inactive" };
            tracing::info!("{identity} is already {state}");
        }

        Ok(Activation {
            id: summary.id.clone(),
            identity,
            active,
            changed,
        })
    }
}

// ---------------------------------------------------------------------------
// Push selection
// ---------------------------------------------------------------------------

/// Names given to `push`. An entry matches a workflow by identity, display
/// name, or file name with or without the `.json` extension.
struct Selection<'s> {
    wanted: &'s [String],
    hits: Vec<bool>,
}

impl<'s> Selection<'s> {
    fn new(wanted: &'s [String]) -> Self {
        Self {
            wanted,
            hits: vec![false; wanted.len()],
        }
    }

    /// Whether any entry matches; every matching entry is marked as used.
    fn admits(&mut self, identity: &str, names: &[&str]) -> bool {
        let mut keep = false;
        for (wanted, hit) in self.wanted.iter().zip(self.hits.iter_mut()) {
            let by_identity = !identity.is_empty() && normalize(wanted).as_str() == identity;
            let by_name = names.iter().any(|name| {
                *name == wanted.as_str() || name.strip_suffix(".json") == Some(wanted.as_str())
            });
            if by_identity || by_name {
                *hit = true;
                keep = true;
            }
        }
        keep
    }

    fn unmatched(self) -> impl Iterator<Item = &'s String> {
        self.wanted
            .iter()
            .zip(self.hits)
            .filter_map(|(wanted, hit)| (!hit).then_some(wanted))
    }
}

/// No selection admits everything.
fn selected(selection: &mut Option<Selection<'_>>, identity: &str, names: &[&str]) -> bool {
    selection
        .as_mut()
        .map_or(true, |selection| selection.admits(identity, names))
}

fn render_optional(doc: Option<&WorkflowDocument>) -> Result<String, SyncError> {
    match doc {
        Some(doc) => crate::local::render(doc),
        None => Ok(String::new()),
    }
}
