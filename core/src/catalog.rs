//! Upstream catalog manager seam.
//!
//! A catalog manager is an external media-library service with a download
//! queue keyed by content hash. Blacklisting deletes a queue entry so the
//! item will not be re-grabbed, paired with local removal by the engine.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The three recognized catalog managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Sonarr,
    Radarr,
    Lidarr,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [CatalogKind::Sonarr, CatalogKind::Radarr, CatalogKind::Lidarr];

    /// Map a classifier label to its catalog. Labels outside the recognized
    /// set get no catalog and are removed locally only.
    pub fn from_label(label: &str) -> Option<CatalogKind> {
        match label {
            "tv-sonarr" => Some(CatalogKind::Sonarr),
            "radarr" => Some(CatalogKind::Radarr),
            "lidarr" => Some(CatalogKind::Lidarr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Sonarr => "sonarr",
            CatalogKind::Radarr => "radarr",
            CatalogKind::Lidarr => "lidarr",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a catalog's download queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Opaque queue-item identifier used for deletion.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Errors from a catalog manager client.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog misconfigured: {0}")]
    Config(String),

    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("catalog response not understood: {0}")]
    Decode(String),
}

/// Client for one catalog manager's queue API.
///
/// Implementations must bound every request with a timeout of their own; the
/// engine additionally bounds the pass-start queue fan-out.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Current download queue as a map from upper-cased content hash to
    /// queue entry.
    async fn queue(&self) -> Result<HashMap<String, QueueEntry>, CatalogError>;

    /// Delete one queue item by its opaque identifier, returning the raw
    /// response body for observability.
    async fn delete_queue_item(&self, id: &str) -> Result<serde_json::Value, CatalogError>;
}
