//! Seams to the host torrent inventory and the disk-space probe.

use async_trait::async_trait;

use crate::snapshot::TorrentSnapshot;

/// Errors from the host inventory.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("torrent not found: {id}")]
    NotFound { id: String },

    #[error("inventory call failed: {0}")]
    Backend(String),
}

/// The host torrent manager.
///
/// Implementations must bound every call with a timeout; the engine treats
/// any error as "skip this resource for this pass", never as fatal.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Enumerate every resident torrent id.
    async fn list_ids(&self) -> Result<Vec<String>, InventoryError>;

    /// Capture a consistent snapshot of one torrent. Individual status
    /// fields that could not be read are mapped to `None` in the snapshot
    /// rather than failing the whole call.
    async fn snapshot(&self, id: &str) -> Result<TorrentSnapshot, InventoryError>;

    /// Remove a torrent, optionally deleting its payload. Removing an id
    /// that is already gone must succeed.
    async fn remove(&self, id: &str, delete_data: bool) -> Result<(), InventoryError>;

    /// Pause a torrent.
    async fn pause(&self, id: &str) -> Result<(), InventoryError>;
}

/// Free-space probe for the payload volume.
#[async_trait]
pub trait DiskProbe: Send + Sync {
    /// Free space in GiB, or `None` when the probe failed. The engine
    /// treats a failed probe as "headroom unknown" and keeps sweeping.
    async fn free_space_gib(&self) -> Option<f64>;
}
