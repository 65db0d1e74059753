//! Per-torrent ignore flags set by operator action.

/// Durable id → ignore-flag mapping, consulted every pass.
///
/// The flag is created by explicit operator action and deleted by the engine
/// when the torrent leaves the pool. Implementations persist mutations
/// immediately; a crash between an action and its flush may re-process an
/// already-removed torrent, which the idempotent removal path tolerates.
pub trait IgnoreFlags: Send + Sync {
    /// Whether the operator flagged this torrent as exempt. Missing entries
    /// default to `false`.
    fn is_ignored(&self, id: &str) -> bool;

    /// Drop the entry for a removed torrent. Forgetting an id with no entry
    /// is a no-op, not an error.
    fn forget(&self, id: &str);
}
