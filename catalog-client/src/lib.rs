//! `seedcull-catalog-client` — HTTP clients for the upstream catalog
//! managers.
//!
//! Each catalog exposes a download queue keyed by content hash and a
//! delete-by-id endpoint used for blacklisting. The client implements
//! [`CatalogClient`] from `seedcull-core`; every request carries the
//! `X-Api-Key` credential and runs under a bounded timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use seedcull_core::catalog::{CatalogClient, CatalogError, CatalogKind, QueueEntry};
use serde::Deserialize;
use url::Url;

/// Bound on any single catalog request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Page size requested from the queue endpoint; the upstream default is far
/// too small to see the whole queue.
const QUEUE_PAGE_SIZE: u32 = 1000;

/// HTTP client for one catalog manager.
pub struct HttpCatalog {
    kind: CatalogKind,
    http: reqwest::Client,
    base: String,
    api_key: String,
}

/// Queue endpoints are paged on newer servers and a bare array on older
/// ones; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueueBody {
    Paged { records: Vec<QueueRecord> },
    Flat(Vec<QueueRecord>),
}

impl QueueBody {
    fn into_records(self) -> Vec<QueueRecord> {
        match self {
            QueueBody::Paged { records } => records,
            QueueBody::Flat(records) => records,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueRecord {
    id: i64,
    #[serde(default)]
    download_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl HttpCatalog {
    /// Build a client for `kind` at `endpoint` with the given API key.
    pub fn new(kind: CatalogKind, endpoint: &str, api_key: &str) -> Result<HttpCatalog, CatalogError> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| CatalogError::Config(format!("bad endpoint {endpoint:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::Config(format!(
                "unsupported endpoint scheme {:?}",
                parsed.scheme()
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        Ok(HttpCatalog {
            kind,
            http,
            base: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// API version prefix; Lidarr never shipped a v3 queue API.
    fn api_version(&self) -> &'static str {
        match self.kind {
            CatalogKind::Sonarr | CatalogKind::Radarr => "v3",
            CatalogKind::Lidarr => "v1",
        }
    }

    fn queue_url(&self) -> String {
        format!("{}/api/{}/queue", self.base, self.api_version())
    }

    fn delete_url(&self, id: &str) -> String {
        format!("{}/api/{}/queue/{id}", self.base, self.api_version())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn queue(&self) -> Result<HashMap<String, QueueEntry>, CatalogError> {
        let response = self
            .http
            .get(self.queue_url())
            .query(&[("page", "1".to_string()), ("pageSize", QUEUE_PAGE_SIZE.to_string())])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: QueueBody = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;

        let mut queue = HashMap::new();
        for record in body.into_records() {
            // Entries without a download hash (e.g. usenet grabs) cannot be
            // matched against the pool and are skipped.
            let Some(hash) = record.download_id else {
                continue;
            };
            queue.insert(
                hash.to_uppercase(),
                QueueEntry {
                    id: record.id.to_string(),
                    title: record.title,
                },
            );
        }
        tracing::debug!("{} queue has {} matchable entries", self.kind, queue.len());
        Ok(queue)
    }

    async fn delete_queue_item(&self, id: &str) -> Result<serde_json::Value, CatalogError> {
        let response = self
            .http
            .delete(self.delete_url(id))
            .query(&[("removeFromClient", "false"), ("blocklist", "true")])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // Delete responses are frequently empty; report the status instead.
        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "status": status.as_u16() })))
    }
}
