//! Blocking n8n public-API client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flowsync_core::{
    config::Settings,
    store::{check_write_contract, RemoteError, RemoteWorkflowStore},
    types::{WorkflowDocument, WorkflowId, WorkflowSummary},
};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Largest page size the public API accepts for workflow listings.
pub const PAGE_LIMIT: u32 = 250;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    data: Vec<WorkflowSummary>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Body sent on create/update. The public API rejects read-only properties
/// (`id`, `active`, `shared`, `versionId`, ...), so only writable ones go out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WritePayload<'a> {
    name: &'a str,
    nodes: &'a [Value],
    connections: &'a Map<String, Value>,
    settings: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    static_data: Option<&'a Value>,
}

impl<'a> WritePayload<'a> {
    fn from_document(doc: &'a WorkflowDocument) -> Self {
        Self {
            name: &doc.name,
            nodes: &doc.nodes,
            connections: &doc.connections,
            settings: doc
                .extra
                .get("settings")
                .filter(|v| v.is_object())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            static_data: doc.static_data.as_ref().filter(|v| !v.is_null()),
        }
    }
}

/// [`RemoteWorkflowStore`] backed by `<base>/api/v1/workflows`.
pub struct N8nClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl N8nClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.url.clone(), settings.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn workflows_url(&self) -> String {
        format!("{}/api/v1/workflows", self.base_url)
    }

    fn workflow_url(&self, id: &WorkflowId) -> String {
        format!("{}/api/v1/workflows/{}", self.base_url, id)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set(API_KEY_HEADER, &self.api_key)
            .set("Accept", "application/json")
    }

    fn decode<T: for<'de> Deserialize<'de>>(
        url: &str,
        response: ureq::Response,
    ) -> Result<T, RemoteError> {
        response.into_json::<T>().map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        doc: &WorkflowDocument,
    ) -> Result<WorkflowDocument, RemoteError> {
        let payload = WritePayload::from_document(doc);
        let response = self
            .request(method, url)
            .send_json(&payload)
            .map_err(|e| map_error(url, e))?;
        Self::decode(url, response)
    }
}

impl RemoteWorkflowStore for N8nClient {
    fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, RemoteError> {
        let url = self.workflows_url();
        let limit = PAGE_LIMIT.to_string();
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self.request("GET", &url).query("limit", &limit);
            if let Some(c) = cursor.as_deref() {
                request = request.query("cursor", c);
            }
            let response = request.call().map_err(|e| map_error(&url, e))?;
            let page: ListPage = Self::decode(&url, response)?;
            tracing::debug!("listed {} workflows from {}", page.data.len(), url);
            all.extend(page.data);

            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                Some(next) => {
                    tracing::warn!("server repeated pagination cursor {next}; stopping");
                    break;
                }
                None => break,
            }
        }

        Ok(all)
    }

    fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowDocument, RemoteError> {
        let url = self.workflow_url(id);
        let response = self
            .request("GET", &url)
            .call()
            .map_err(|e| map_error(&url, e))?;
        Self::decode(&url, response)
    }

    fn create_workflow(&self, doc: &WorkflowDocument) -> Result<WorkflowDocument, RemoteError> {
        check_write_contract(None, doc)?;
        let url = self.workflows_url();
        let created = self.send("POST", &url, doc)?;
        tracing::info!("created workflow '{}' ({:?})", doc.name, created.id);
        Ok(created)
    }

    fn update_workflow(
        &self,
        id: &WorkflowId,
        doc: &WorkflowDocument,
    ) -> Result<WorkflowDocument, RemoteError> {
        check_write_contract(Some(id), doc)?;
        let url = self.workflow_url(id);
        let updated = self.send("PUT", &url, doc)?;
        tracing::info!("updated workflow '{}' ({id})", doc.name);
        Ok(updated)
    }

    fn set_active(&self, id: &WorkflowId, active: bool) -> Result<WorkflowDocument, RemoteError> {
        let action = if active { "activate" } else { "deactivate" };
        let url = format!("{}/{action}", self.workflow_url(id));
        let response = self
            .request("POST", &url)
            .call()
            .map_err(|e| map_error(&url, e))?;
        tracing::info!("{action}d workflow {id}");
        Self::decode(&url, response)
    }
}

fn map_error(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            RemoteError::Status {
                status,
                url: url.to_string(),
                message: error_message(&body),
            }
        }
        ureq::Error::Transport(t) => RemoteError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

/// Pull `message` out of a JSON error body, or flatten the raw text onto a
/// single bounded line.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
    let text = from_json.unwrap_or_else(|| body.to_string());
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return "empty response body".to_string();
    }
    if flat.chars().count() > MAX_ERROR_CHARS {
        let truncated: String = flat.chars().take(MAX_ERROR_CHARS).collect();
        return format!("{truncated}…");
    }
    flat
}
