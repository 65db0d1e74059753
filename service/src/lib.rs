//! `seedcull-service` — scheduler, durable state, and operator IPC for the
//! retention engine.
//!
//! Listens on a Unix domain socket (newline-delimited JSON-RPC-lite) and
//! drives periodic decision passes. The torrent inventory and disk probe are
//! supplied by the embedding host; the catalog clients are built here from
//! the policy document.

pub mod ipc;
pub mod manager;
pub mod persistence;
pub mod protocol;
pub mod scheduler;

use std::sync::Arc;

use seedcull_catalog_client::HttpCatalog;
use seedcull_core::catalog::CatalogKind;
use seedcull_core::config::RetentionConfig;
use seedcull_core::engine::CatalogSet;

/// Protocol version for the operator IPC.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Default socket filename.
pub const SOCKET_FILENAME: &str = "seedcull.sock";

/// Get the default socket path using XDG_RUNTIME_DIR.
///
/// Falls back to `/tmp/seedcull-<username>.sock` if XDG_RUNTIME_DIR is not
/// set.
pub fn default_socket_path() -> std::path::PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        std::path::PathBuf::from(runtime_dir).join(SOCKET_FILENAME)
    } else {
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
        std::path::PathBuf::from(format!("/tmp/seedcull-{user}.sock"))
    }
}

/// Build the catalog client set from the policy document.
///
/// A catalog that is enabled but missing its endpoint or credential is
/// disabled on its own with a warning; nothing else is affected.
pub fn build_catalogs(cfg: &RetentionConfig) -> CatalogSet {
    let mut set = CatalogSet::new();
    for kind in CatalogKind::ALL {
        let catalog = cfg.catalog(kind);
        if !catalog.enabled {
            continue;
        }
        let (Some(endpoint), Some(api_key)) =
            (catalog.endpoint.as_deref(), catalog.api_key.as_deref())
        else {
            tracing::warn!("{kind} enabled but endpoint or api key missing, disabling it");
            continue;
        };
        match HttpCatalog::new(kind, endpoint, api_key) {
            Ok(client) => set.insert(kind, Arc::new(client)),
            Err(e) => tracing::warn!("{kind} client not built: {e}"),
        }
    }
    set
}


#[cfg(test)]
mod tests {
    use super::*;
    use seedcull_core::config::CatalogConfig;

    #[test]
    fn catalogs_missing_credentials_are_skipped() {
        let mut cfg = RetentionConfig::default();
        cfg.sonarr = CatalogConfig {
            enabled: true,
            endpoint: Some("http://sonarr.local:8989".to_string()),
            api_key: None,
        };
        cfg.radarr = CatalogConfig {
            enabled: true,
            endpoint: Some("http://radarr.local:7878".to_string()),
            api_key: Some("key".to_string()),
        };
        let set = build_catalogs(&cfg);
        assert!(set.get(CatalogKind::Sonarr).is_none());
        assert!(set.get(CatalogKind::Radarr).is_some());
        assert!(set.get(CatalogKind::Lidarr).is_none());
    }

    #[test]
    fn disabled_catalogs_are_not_built() {
        let mut cfg = RetentionConfig::default();
        cfg.lidarr = CatalogConfig {
            enabled: false,
            endpoint: Some("http://lidarr.local:8686".to_string()),
            api_key: Some("key".to_string()),
        };
        let set = build_catalogs(&cfg);
        assert!(set.get(CatalogKind::Lidarr).is_none());
    }
}
