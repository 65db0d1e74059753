//! Durable policy and ignore-state documents.
//!
//! ## Layout
//!
//! ```text
//! ~/.local/share/seedcull/
//!   config.json   RetentionConfig
//!   ignore.json   map torrent id -> ignore flag
//! ```
//!
//! Both documents are re-written immediately after every mutation, through a
//! `.tmp` sibling + rename so a crash never leaves a half-written file. A
//! crash between an engine action and its flush can re-process an
//! already-removed torrent; removal is idempotent so that is tolerated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use seedcull_core::config::RetentionConfig;
use seedcull_core::ignore::IgnoreFlags;

const CONFIG_FILE: &str = "config.json";
const IGNORE_FILE: &str = "ignore.json";

/// Errors from the state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("could not determine platform data directory")]
    NoDataDir,
}

/// File-backed store for the two durable documents.
pub struct StateStore {
    base_dir: PathBuf,
}

impl StateStore {
    /// Create a store at the platform data directory.
    pub fn new() -> Result<StateStore, StoreError> {
        let base_dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?.join("seedcull");
        StateStore::with_base_dir(base_dir)
    }

    /// Create a store with a custom base directory (for testing).
    pub fn with_base_dir(base_dir: PathBuf) -> Result<StateStore, StoreError> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(StateStore { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Atomically write `data` to `path` via a `.tmp` sibling.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load the policy document; a store that has never been written yields
    /// the default policy.
    pub fn load_config(&self) -> Result<RetentionConfig, StoreError> {
        let path = self.base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(RetentionConfig::default());
        }
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub fn save_config(&self, cfg: &RetentionConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(cfg)?;
        self.atomic_write(&self.base_dir.join(CONFIG_FILE), json.as_bytes())
    }

    pub fn load_ignore(&self) -> Result<HashMap<String, bool>, StoreError> {
        let path = self.base_dir.join(IGNORE_FILE);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub fn save_ignore(&self, entries: &HashMap<String, bool>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        self.atomic_write(&self.base_dir.join(IGNORE_FILE), json.as_bytes())
    }
}

/// In-memory view of the ignore document, flushed on every mutation.
///
/// Implements the engine's [`IgnoreFlags`] seam; the engine forgets entries
/// for removed torrents, the operator surface reads and sets flags.
pub struct IgnoreLedger {
    store: Arc<StateStore>,
    entries: Mutex<HashMap<String, bool>>,
}

impl IgnoreLedger {
    pub fn load(store: Arc<StateStore>) -> Result<IgnoreLedger, StoreError> {
        let entries = store.load_ignore()?;
        Ok(IgnoreLedger {
            store,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current flag for each id; missing entries read as `false`.
    pub fn flags(&self, ids: &[String]) -> Vec<bool> {
        let entries = self.lock();
        ids.iter()
            .map(|id| entries.get(id).copied().unwrap_or(false))
            .collect()
    }

    /// Set the flag for each id and flush immediately.
    pub fn set(&self, ids: &[String], ignore: bool) -> Result<(), StoreError> {
        let snapshot = {
            let mut entries = self.lock();
            for id in ids {
                entries.insert(id.clone(), ignore);
            }
            entries.clone()
        };
        self.store.save_ignore(&snapshot)
    }
}

impl IgnoreFlags for IgnoreLedger {
    fn is_ignored(&self, id: &str) -> bool {
        self.lock().get(id).copied().unwrap_or(false)
    }

    fn forget(&self, id: &str) {
        let snapshot = {
            let mut entries = self.lock();
            if entries.remove(id).is_none() {
                // Nothing stored for this torrent; no flush needed.
                return;
            }
            entries.clone()
        };
        if let Err(e) = self.store.save_ignore(&snapshot) {
            tracing::warn!("could not persist ignore state after dropping {id}: {e}");
        }
    }
}
