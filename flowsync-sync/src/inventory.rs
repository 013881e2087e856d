//! Keying both inventories by identity, with collision detection.

use std::collections::BTreeMap;

use flowsync_core::{naming::normalize, Identity, WorkflowSummary};

use crate::local::LocalEntry;

/// Remote listing keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct RemoteInventory {
    /// Non-archived workflows with a unique identity.
    pub live: BTreeMap<Identity, WorkflowSummary>,
    /// Archived workflows, excluded from every pass.
    pub archived: Vec<WorkflowSummary>,
    /// Identities claimed by more than one non-archived workflow.
    pub collisions: BTreeMap<Identity, Vec<String>>,
    /// Names that normalize to an empty identity.
    pub invalid: Vec<String>,
}

impl RemoteInventory {
    pub fn from_summaries(summaries: Vec<WorkflowSummary>) -> Self {
        let mut inventory = RemoteInventory::default();
        let mut grouped: BTreeMap<Identity, Vec<WorkflowSummary>> = BTreeMap::new();

        for summary in summaries {
            if summary.is_archived {
                inventory.archived.push(summary);
                continue;
            }
            let identity = normalize(&summary.name);
            if identity.as_str().is_empty() {
                inventory.invalid.push(summary.name);
                continue;
            }
            grouped.entry(identity).or_default().push(summary);
        }

        for (identity, mut group) in grouped {
            if group.len() == 1 {
                if let Some(summary) = group.pop() {
                    inventory.live.insert(identity, summary);
                }
            } else {
                let mut names: Vec<String> = group.into_iter().map(|s| s.name).collect();
                names.sort();
                inventory.collisions.insert(identity, names);
            }
        }

        inventory
    }
}

/// Local directory listing keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct LocalInventory {
    pub entries: BTreeMap<Identity, LocalEntry>,
    /// Identities claimed by more than one file (e.g. `My Flow.json` and
    /// `my-flow.json`); values are file names.
    pub collisions: BTreeMap<Identity, Vec<String>>,
    /// File names whose stem normalizes to an empty identity.
    pub invalid: Vec<String>,
}

impl LocalInventory {
    pub fn from_entries(entries: Vec<LocalEntry>) -> Self {
        let mut inventory = LocalInventory::default();
        let mut grouped: BTreeMap<Identity, Vec<LocalEntry>> = BTreeMap::new();

        for entry in entries {
            if entry.identity.as_str().is_empty() {
                inventory.invalid.push(file_name(&entry));
                continue;
            }
            grouped.entry(entry.identity.clone()).or_default().push(entry);
        }

        for (identity, mut group) in grouped {
            if group.len() == 1 {
                if let Some(entry) = group.pop() {
                    inventory.entries.insert(identity, entry);
                }
            } else {
                let names = group.iter().map(file_name).collect();
                inventory.collisions.insert(identity, names);
            }
        }

        inventory
    }
}

pub(crate) fn file_name(entry: &LocalEntry) -> String {
    entry
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.path.display().to_string())
}
