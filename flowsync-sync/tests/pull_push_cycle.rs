use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde_json::json;
use tempfile::TempDir;

use flowsync_core::store::check_write_contract;
use flowsync_core::{
    Identity, RemoteError, RemoteWorkflowStore, WorkflowDocument, WorkflowId, WorkflowSummary,
};
use flowsync_sync::{
    Interrupt, LocalFileStore, PullOutcome, PushOutcome, SyncError, SyncOrchestrator, WriteResult,
};

// ---------------------------------------------------------------------------
// In-memory server
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeServer {
    docs: RefCell<BTreeMap<WorkflowId, WorkflowDocument>>,
    calls: RefCell<Vec<String>>,
    failing_gets: BTreeSet<WorkflowId>,
    /// Display names whose create or update is refused.
    failing_writes: BTreeSet<String>,
}

impl FakeServer {
    fn with(docs: Vec<WorkflowDocument>) -> Self {
        let server = FakeServer::default();
        for doc in docs {
            let id = doc.id.clone().expect("seeded docs carry an id");
            server.docs.borrow_mut().insert(id, doc);
        }
        server
    }

    fn failing_get(mut self, id: &str) -> Self {
        self.failing_gets.insert(WorkflowId::from(id));
        self
    }

    fn failing_write(mut self, name: &str) -> Self {
        self.failing_writes.insert(name.to_string());
        self
    }

    fn refuse_write(&self, doc: &WorkflowDocument) -> Result<(), RemoteError> {
        if self.failing_writes.contains(&doc.name) {
            return Err(RemoteError::Status {
                status: 400,
                url: "/workflows".into(),
                message: "request/body must NOT have additional properties".into(),
            });
        }
        Ok(())
    }

    fn writes(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("create") || c.starts_with("update"))
            .cloned()
            .collect()
    }
}

impl RemoteWorkflowStore for FakeServer {
    fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, RemoteError> {
        self.calls.borrow_mut().push("list".into());
        Ok(self
            .docs
            .borrow()
            .iter()
            .map(|(id, doc)| WorkflowSummary {
                id: id.clone(),
                name: doc.name.clone(),
                active: doc.active.unwrap_or(false),
                is_archived: doc.archived(),
                updated_at: None,
            })
            .collect())
    }

    fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowDocument, RemoteError> {
        self.calls.borrow_mut().push(format!("get {id}"));
        if self.failing_gets.contains(id) {
            return Err(RemoteError::Status {
                status: 500,
                url: format!("/workflows/{id}"),
                message: "boom".into(),
            });
        }
        let mut doc = self.docs.borrow().get(id).cloned().ok_or(RemoteError::Status {
            status: 404,
            url: format!("/workflows/{id}"),
            message: "Not Found".into(),
        })?;
        // Server-side churn that must never reach disk or a comparison.
        doc.version_counter = Some(json!(7));
        doc.static_data = Some(json!({"node:Trigger": {"lastTimeChecked": "2026-01-01"}}));
        Ok(doc)
    }

    fn create_workflow(&self, doc: &WorkflowDocument) -> Result<WorkflowDocument, RemoteError> {
        check_write_contract(None, doc)?;
        let id = WorkflowId::from(format!("new-{}", self.docs.borrow().len() + 1));
        self.calls.borrow_mut().push(format!("create {}", doc.name));
        self.refuse_write(doc)?;
        let mut stored = doc.clone();
        stored.id = Some(id.clone());
        self.docs.borrow_mut().insert(id, stored.clone());
        Ok(stored)
    }

    fn update_workflow(
        &self,
        id: &WorkflowId,
        doc: &WorkflowDocument,
    ) -> Result<WorkflowDocument, RemoteError> {
        check_write_contract(Some(id), doc)?;
        self.calls.borrow_mut().push(format!("update {id}"));
        self.refuse_write(doc)?;
        let mut stored = doc.clone();
        stored.id = Some(id.clone());
        self.docs.borrow_mut().insert(id.clone(), stored.clone());
        Ok(stored)
    }

    fn set_active(&self, id: &WorkflowId, active: bool) -> Result<WorkflowDocument, RemoteError> {
        let verb = if active { "activate" } else { "deactivate" };
        self.calls.borrow_mut().push(format!("{verb} {id}"));
        let mut docs = self.docs.borrow_mut();
        let doc = docs.get_mut(id).ok_or(RemoteError::Status {
            status: 404,
            url: format!("/workflows/{id}/{verb}"),
            message: "Not Found".into(),
        })?;
        doc.active = Some(active);
        Ok(doc.clone())
    }
}

fn workflow(id: &str, name: &str, marker: i64) -> WorkflowDocument {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "nodes": [{"name": "Trigger", "type": "n8n-nodes-base.manualTrigger", "parameters": {"v": marker}}],
        "connections": {},
        "settings": {"executionOrder": "v1"}
    }))
    .expect("workflow json")
}

fn archived(id: &str, name: &str) -> WorkflowDocument {
    let mut doc = workflow(id, name, 0);
    doc.is_archived = Some(true);
    doc
}

fn ids(names: &[&str]) -> BTreeSet<Identity> {
    names.iter().map(|n| Identity::from(*n)).collect()
}

// ---------------------------------------------------------------------------
// pull
// ---------------------------------------------------------------------------

#[test]
fn pull_writes_one_file_per_live_workflow() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path().join("workflows"));
    let server = FakeServer::with(vec![
        workflow("1", "n8n - error trigger", 1),
        workflow("2", "(AI) Gmail - triage of labels", 2),
        archived("3", "Old Report"),
    ]);

    let summary = SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    assert_eq!(summary.synced, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 0);
    assert!(local.path_for(&Identity::from("n8n-error-trigger")).exists());
    assert!(local
        .path_for(&Identity::from("ai-gmail-triage-of-labels"))
        .exists());
    assert!(!local.path_for(&Identity::from("old-report")).exists());
    assert!(!server.calls.borrow().contains(&"get 3".to_string()));
}

#[test]
fn pulled_files_carry_no_volatile_fields() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Flow", 1)]);

    SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    let text = fs::read_to_string(dir.path().join("flow.json")).expect("read");
    assert!(!text.contains("versionCounter"), "{text}");
    assert!(!text.contains("lastTimeChecked"), "{text}");
    assert!(text.contains("\"executionOrder\": \"v1\""), "{text}");
}

#[test]
fn second_pull_leaves_files_untouched() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Flow", 1)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);

    orchestrator.run_pull().expect("first pull");
    let second = orchestrator.run_pull().expect("second pull");

    assert_eq!(second.synced, 1);
    assert_eq!(second.written(), 0);
    assert!(matches!(
        &second.outcomes[0],
        PullOutcome::Saved {
            write: WriteResult::Unchanged { .. },
            ..
        }
    ));
}

#[test]
fn pull_keeps_stale_local_files() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("deleted-upstream.json"), "{}").expect("seed");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Flow", 1)]);

    SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    assert!(dir.path().join("deleted-upstream.json").exists());
}

#[test]
fn pull_skips_colliding_names() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![
        workflow("1", "Gmail Triage", 1),
        workflow("2", "gmail_triage", 2),
        workflow("3", "Other", 3),
    ]);

    let summary = SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    assert_eq!(summary.synced, 1);
    assert_eq!(summary.errors, 1);
    assert!(!dir.path().join("gmail-triage.json").exists());
    let failure = summary
        .outcomes
        .iter()
        .find_map(|o| match o {
            PullOutcome::Failed(f) => Some(f),
            _ => None,
        })
        .expect("collision failure");
    assert!(failure.message.contains("Gmail Triage"), "{}", failure.message);
}

#[test]
fn pull_continues_past_a_failed_fetch() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server =
        FakeServer::with(vec![workflow("1", "Alpha", 1), workflow("2", "Beta", 2)]).failing_get("1");

    let summary = SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    assert_eq!(summary.synced, 1);
    assert_eq!(summary.errors, 1);
    assert!(dir.path().join("beta.json").exists());
}

#[test]
fn interrupted_pull_stops_before_next_workflow() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    let interrupt = Interrupt::new();
    interrupt.trigger();

    let summary = SyncOrchestrator::new(&server, &local)
        .with_interrupt(interrupt)
        .run_pull()
        .expect("pull");

    assert!(summary.interrupted);
    assert_eq!(summary.synced, 0);
    assert!(!dir.path().join("alpha.json").exists());
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

#[test]
fn push_right_after_pull_sends_nothing() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1), workflow("2", "Beta", 2)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);

    orchestrator.run_pull().expect("pull");
    let summary = orchestrator.run_push(None, false, false).expect("push");

    assert_eq!(summary.unchanged, 2);
    assert_eq!(summary.created + summary.updated, 0);
    assert!(server.writes().is_empty(), "{:?}", server.writes());
}

#[test]
fn push_creates_new_local_workflows_without_id() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let mut doc = workflow("stale-id", "Brand New", 1);
    doc.id = None;
    local
        .write(&Identity::from("brand-new"), &doc, false)
        .expect("seed");
    let server = FakeServer::default();

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.created, 1);
    assert_eq!(server.writes(), vec!["create Brand New".to_string()]);
}

#[test]
fn push_create_strips_a_leftover_local_id() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    local
        .write(&Identity::from("copied"), &workflow("99", "Copied", 1), false)
        .expect("seed");
    let server = FakeServer::default();

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.created, 1, "{:?}", summary.outcomes);
    assert_eq!(summary.errors, 0);
}

#[test]
fn push_updates_modified_workflows_by_remote_id() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1), workflow("2", "Beta", 2)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");

    local
        .write(&Identity::from("beta"), &workflow("2", "Beta", 20), false)
        .expect("edit");
    let summary = orchestrator.run_push(None, false, false).expect("push");

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(server.writes(), vec!["update 2".to_string()]);
    assert!(summary.outcomes.contains(&PushOutcome::Updated {
        identity: Identity::from("beta"),
        id: WorkflowId::from("2"),
    }));
}

#[test]
fn dry_run_push_counts_but_does_not_write() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");
    local
        .write(&Identity::from("alpha"), &workflow("1", "Alpha", 5), false)
        .expect("edit");
    let mut fresh = workflow("x", "Fresh", 1);
    fresh.id = None;
    local
        .write(&Identity::from("fresh"), &fresh, false)
        .expect("seed");

    let summary = orchestrator.run_push(None, true, false).expect("push");

    assert!(summary.dry_run);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert!(server.writes().is_empty());
}

#[test]
fn force_push_updates_unchanged_workflows() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");

    let summary = orchestrator.run_push(None, false, true).expect("push");

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(server.writes(), vec!["update 1".to_string()]);
}

#[test]
fn push_selection_matches_name_or_identity() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    for (identity, name) in [("alpha", "Alpha"), ("beta", "Beta"), ("gamma", "Gamma")] {
        let mut doc = workflow("x", name, 1);
        doc.id = None;
        local
            .write(&Identity::from(identity), &doc, false)
            .expect("seed");
    }
    let server = FakeServer::default();
    let selection = vec!["Alpha".to_string(), "gamma".to_string(), "Delta".to_string()];

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(Some(&selection), false, false)
        .expect("push");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.unmatched_selection, vec!["Delta".to_string()]);
    assert_eq!(
        server.writes(),
        vec!["create Alpha".to_string(), "create Gamma".to_string()]
    );
}

#[test]
fn failed_remote_fetch_never_becomes_a_create() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    SyncOrchestrator::new(&server, &local)
        .run_pull()
        .expect("pull");

    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]).failing_get("1");
    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.created, 0);
    assert!(server.writes().is_empty());
}

#[test]
fn push_reports_remote_only_workflows() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Only Upstream", 1)]);

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.remote_only, ids(&["only-upstream"]));
    assert!(server.writes().is_empty());
}

#[test]
fn malformed_local_file_is_reported_and_skipped() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("seed");
    let local = LocalFileStore::new(dir.path());
    let mut ok = workflow("x", "Fine", 1);
    ok.id = None;
    local.write(&Identity::from("fine"), &ok, false).expect("seed");
    let server = FakeServer::default();

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.created, 1);
}

#[test]
fn archived_remote_twin_does_not_block_create() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let mut doc = workflow("x", "Report", 1);
    doc.id = None;
    local
        .write(&Identity::from("report"), &doc, false)
        .expect("seed");
    let server = FakeServer::with(vec![archived("9", "Report")]);

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.created, 1);
    assert_eq!(server.writes(), vec!["create Report".to_string()]);
}

#[test]
fn selected_push_ignores_problems_in_unselected_files() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("seed");
    fs::write(dir.path().join("().json"), r#"{"name": "()"}"#).expect("seed");
    let flow = json!({"name": "My Flow", "nodes": [], "connections": {}}).to_string();
    fs::write(dir.path().join("My Flow.json"), &flow).expect("seed");
    fs::write(dir.path().join("my-flow.json"), &flow).expect("seed");
    let local = LocalFileStore::new(dir.path());
    let mut alpha = workflow("x", "Alpha", 1);
    alpha.id = None;
    local.write(&Identity::from("alpha"), &alpha, false).expect("seed");
    let server = FakeServer::default();
    let selection = vec!["Alpha".to_string()];

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(Some(&selection), false, false)
        .expect("push");

    assert_eq!(summary.errors, 0);
    assert_eq!(summary.created, 1);
    assert!(summary.unmatched_selection.is_empty());
    assert_eq!(server.writes(), vec!["create Alpha".to_string()]);
}

#[test]
fn selected_push_reports_problems_in_selected_files() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("seed");
    let flow = json!({"name": "My Flow", "nodes": [], "connections": {}}).to_string();
    fs::write(dir.path().join("My Flow.json"), &flow).expect("seed");
    fs::write(dir.path().join("my-flow.json"), &flow).expect("seed");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::default();
    let selection = vec!["broken.json".to_string(), "My Flow".to_string()];

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(Some(&selection), false, false)
        .expect("push");

    assert_eq!(summary.errors, 2);
    assert_eq!(summary.created, 0);
    assert!(summary.unmatched_selection.is_empty());
    assert!(server.writes().is_empty());
}

#[test]
fn failed_update_does_not_stop_the_batch() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1), workflow("2", "Beta", 2)])
        .failing_write("Alpha");
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");
    local
        .write(&Identity::from("alpha"), &workflow("1", "Alpha", 11), false)
        .expect("edit");
    local
        .write(&Identity::from("beta"), &workflow("2", "Beta", 22), false)
        .expect("edit");

    let summary = orchestrator.run_push(None, false, false).expect("push");

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(
        server.writes(),
        vec!["update 1".to_string(), "update 2".to_string()]
    );
    assert!(summary.outcomes.iter().any(|o| matches!(
        o,
        PushOutcome::Failed(f) if f.subject == "alpha" && f.message.contains("HTTP 400")
    )));
}

#[test]
fn failed_create_does_not_stop_the_batch() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    for (identity, name) in [("alpha", "Alpha"), ("beta", "Beta")] {
        let mut doc = workflow("x", name, 1);
        doc.id = None;
        local
            .write(&Identity::from(identity), &doc, false)
            .expect("seed");
    }
    let server = FakeServer::default().failing_write("Alpha");

    let summary = SyncOrchestrator::new(&server, &local)
        .run_push(None, false, false)
        .expect("push");

    assert_eq!(summary.created, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(
        server.writes(),
        vec!["create Alpha".to_string(), "create Beta".to_string()]
    );
}

// ---------------------------------------------------------------------------
// status / sync / diff
// ---------------------------------------------------------------------------

#[test]
fn status_partitions_and_compares() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![
        workflow("1", "Same", 1),
        workflow("2", "Changed", 2),
        workflow("3", "Upstream", 3),
    ]);
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");
    fs::remove_file(dir.path().join("upstream.json")).expect("rm");
    local
        .write(&Identity::from("changed"), &workflow("2", "Changed", 22), false)
        .expect("edit");
    let mut mine = workflow("x", "Mine", 1);
    mine.id = None;
    local.write(&Identity::from("mine"), &mine, false).expect("seed");

    let quick = orchestrator.run_status(false).expect("status");
    assert_eq!(quick.local_only, ids(&["mine"]));
    assert_eq!(quick.remote_only, ids(&["upstream"]));
    assert_eq!(quick.matched, ids(&["changed", "same"]));
    assert!(!quick.compared);
    assert!(quick.modified.is_empty());

    let full = orchestrator.run_status(true).expect("status -v");
    assert_eq!(full.in_sync, ids(&["same"]));
    assert_eq!(full.modified, ids(&["changed"]));
    assert!(!full.is_clean());
    assert!(server.writes().is_empty());
}

#[test]
fn status_reports_names_without_an_identity() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("().json"), r#"{"name": "()"}"#).expect("seed");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "!!!", 1), workflow("2", "Fine", 2)]);

    let report = SyncOrchestrator::new(&server, &local)
        .run_status(false)
        .expect("status");

    let subjects: Vec<&str> = report.errors.iter().map(|f| f.subject.as_str()).collect();
    assert_eq!(subjects, vec!["().json", "!!!"]);
    assert_eq!(report.remote_only, ids(&["fine"]));
    assert!(!report.is_clean());
}

#[test]
fn sync_without_push_only_pulls() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    let mut extra = workflow("x", "Local Only", 1);
    extra.id = None;
    local
        .write(&Identity::from("local-only"), &extra, false)
        .expect("seed");

    let summary = SyncOrchestrator::new(&server, &local)
        .run_sync(false, false, true)
        .expect("sync");

    assert_eq!(summary.pull.synced, 1);
    assert!(summary.push.is_none());
    assert!(server.writes().is_empty());
}

#[test]
fn sync_pulls_then_pushes_local_additions() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Alpha", 1)]);
    let mut extra = workflow("x", "Local Only", 1);
    extra.id = None;
    local
        .write(&Identity::from("local-only"), &extra, false)
        .expect("seed");

    let summary = SyncOrchestrator::new(&server, &local)
        .run_sync(false, false, false)
        .expect("sync");

    let push = summary.push.expect("push phase");
    assert_eq!(push.created, 1);
    assert_eq!(push.unchanged, 1);
    assert_eq!(server.writes(), vec!["create Local Only".to_string()]);
}

#[test]
fn diff_is_empty_after_pull_and_shows_local_edits() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "My Flow", 1)]);
    let orchestrator = SyncOrchestrator::new(&server, &local);
    orchestrator.run_pull().expect("pull");

    let clean = orchestrator.diff("My Flow").expect("diff");
    assert!(clean.unified_diff.is_empty(), "{}", clean.unified_diff);

    local
        .write(&Identity::from("my-flow"), &workflow("1", "My Flow", 2), false)
        .expect("edit");
    let edited = orchestrator.diff("my-flow").expect("diff");
    assert!(edited.local_exists && edited.remote_exists);
    assert!(edited
        .unified_diff
        .contains("--- a/remote/my-flow.json"));
    assert!(edited.unified_diff.contains("+++ b/local/my-flow.json"));
    assert!(edited.unified_diff.contains("\"v\": 2"));
}

#[test]
fn diff_of_unknown_workflow_is_not_found() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::default();

    let err = SyncOrchestrator::new(&server, &local)
        .diff("ghost")
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }), "{err:?}");
}

// ---------------------------------------------------------------------------
// activate / deactivate
// ---------------------------------------------------------------------------

#[test]
fn activate_switches_by_display_name() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Nightly Report", 1)]);

    let result = SyncOrchestrator::new(&server, &local)
        .set_active("Nightly Report", true)
        .expect("activate");

    assert!(result.changed);
    assert_eq!(result.identity, Identity::from("nightly-report"));
    assert_eq!(result.id, WorkflowId::from("1"));
    assert!(server.calls.borrow().contains(&"activate 1".to_string()));
    assert_eq!(server.docs.borrow()[&WorkflowId::from("1")].active, Some(true));
    assert!(!dir.path().join("nightly-report.json").exists());
}

#[test]
fn deactivate_of_inactive_workflow_sends_nothing() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![workflow("1", "Nightly Report", 1)]);

    let result = SyncOrchestrator::new(&server, &local)
        .set_active("nightly-report", false)
        .expect("deactivate");

    assert!(!result.changed);
    assert!(!server.calls.borrow().iter().any(|c| c.starts_with("deactivate")));
}

#[test]
fn activate_refuses_ambiguous_or_missing_names() {
    let dir = TempDir::new().expect("tmp");
    let local = LocalFileStore::new(dir.path());
    let server = FakeServer::with(vec![
        workflow("1", "Report", 1),
        workflow("2", "report", 2),
        archived("3", "Old"),
    ]);
    let orchestrator = SyncOrchestrator::new(&server, &local);

    let err = orchestrator.set_active("Report", true).expect_err("collision");
    assert!(matches!(err, SyncError::NamingCollision { .. }), "got {err:?}");

    let err = orchestrator.set_active("Old", true).expect_err("archived");
    assert!(matches!(err, SyncError::NotFound { .. }), "got {err:?}");

    assert!(!server.calls.borrow().iter().any(|c| c.starts_with("activate")));
}
