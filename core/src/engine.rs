//! The decision pass: exemption, budget accounting, and action dispatch.
//!
//! A pass is sequential and run-to-completion; concurrent triggers (timer
//! tick vs. manual run) serialize on an internal gate so the budget is never
//! double-counted and no torrent sees duplicate removals. The only parallel
//! work is the catalog queue fan-out at pass start, bounded per catalog and
//! degraded to an empty queue on failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::budget;
use crate::catalog::{CatalogClient, CatalogKind, QueueEntry};
use crate::config::RetentionConfig;
use crate::exempt;
use crate::ignore::IgnoreFlags;
use crate::inventory::{DiskProbe, Inventory};
use crate::rules;
use crate::snapshot::TorrentSnapshot;

/// Upper bound on each catalog's queue lookup during the pass-start fan-out.
pub const QUEUE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on one free-space probe.
pub const DISK_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The catalog clients wired in at construction, keyed by kind.
#[derive(Default)]
pub struct CatalogSet {
    clients: HashMap<CatalogKind, Arc<dyn CatalogClient>>,
}

impl CatalogSet {
    pub fn new() -> CatalogSet {
        CatalogSet::default()
    }

    pub fn insert(&mut self, kind: CatalogKind, client: Arc<dyn CatalogClient>) {
        self.clients.insert(kind, client);
    }

    pub fn get(&self, kind: CatalogKind) -> Option<&Arc<dyn CatalogClient>> {
        self.clients.get(&kind)
    }
}

/// Queues fetched once at pass start. A catalog that failed or timed out
/// simply has no entries here.
#[derive(Debug, Default)]
pub struct CatalogQueues {
    queues: HashMap<CatalogKind, HashMap<String, QueueEntry>>,
}

impl CatalogQueues {
    fn insert(&mut self, kind: CatalogKind, queue: HashMap<String, QueueEntry>) {
        self.queues.insert(kind, queue);
    }

    fn lookup(&self, kind: CatalogKind, hash: &str) -> Option<&QueueEntry> {
        self.queues.get(&kind).and_then(|q| q.get(hash))
    }

    fn total_len(&self) -> usize {
        self.queues.values().map(HashMap::len).sum()
    }
}

/// What one pass (or one bulk blacklist run) actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub pool_size: usize,
    pub eligible: usize,
    pub excluded: usize,
    /// Size of the action set the dispatcher walked.
    pub examined: usize,
    pub removed: Vec<String>,
    pub paused: Vec<String>,
    pub blacklisted: usize,
}

/// The retention engine. Holds the collaborator seams and serializes passes.
pub struct RetentionEngine {
    inventory: Arc<dyn Inventory>,
    disk: Arc<dyn DiskProbe>,
    catalogs: CatalogSet,
    ignore: Arc<dyn IgnoreFlags>,
    /// True when a label classifier is wired in; label exemptions and label
    /// rules are inert without one.
    labels_active: bool,
    /// Serializes passes and bulk blacklists; a manual trigger landing
    /// mid-pass waits instead of interleaving.
    pass_gate: Mutex<()>,
}

impl RetentionEngine {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        disk: Arc<dyn DiskProbe>,
        catalogs: CatalogSet,
        ignore: Arc<dyn IgnoreFlags>,
        labels_active: bool,
    ) -> RetentionEngine {
        RetentionEngine {
            inventory,
            disk,
            catalogs,
            ignore,
            labels_active,
            pass_gate: Mutex::new(()),
        }
    }

    /// Run one full decision pass against a config snapshot.
    ///
    /// Never fails: every collaborator error degrades to a skip or an empty
    /// result and is logged. The caller aborts before getting here only when
    /// the configuration snapshot itself could not be read.
    pub async fn run_pass(&self, cfg: &RetentionConfig) -> PassReport {
        let _pass = self.pass_gate.lock().await;
        self.sweep(cfg).await
    }

    /// Bulk blacklist-then-remove over an explicit id list; returns how many
    /// queue entries were actually deleted upstream.
    pub async fn blacklist(&self, ids: &[String], cfg: &RetentionConfig) -> usize {
        let _pass = self.pass_gate.lock().await;
        let queues = self.fetch_queues(cfg).await;
        if queues.total_len() == 0 {
            tracing::warn!("no entries in any catalog queue");
            return 0;
        }

        let mut report = PassReport::default();
        for id in ids {
            let snap = match self.inventory.snapshot(id).await {
                Ok(snap) => snap,
                Err(e) => {
                    tracing::warn!("skipping blacklist of {id}: {e}");
                    continue;
                }
            };
            let Some(kind) = snap.label.as_label().and_then(CatalogKind::from_label) else {
                tracing::info!("no recognized catalog label for {}", snap.name);
                continue;
            };
            if !cfg.catalog(kind).enabled || self.catalogs.get(kind).is_none() {
                tracing::info!("blacklisting not enabled for {kind}");
                continue;
            }
            self.blacklist_then_remove(kind, &snap, &queues, cfg, &mut report)
                .await;
        }
        report.blacklisted
    }

    async fn sweep(&self, cfg: &RetentionConfig) -> PassReport {
        let mut report = PassReport::default();

        // Negative max means unlimited seeds are allowed; nothing to do.
        if cfg.max_seeds < 0 {
            tracing::debug!("max_seeds is negative, pool is unlimited");
            return report;
        }

        let ids = match self.inventory.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("could not enumerate pool: {e}");
                return report;
            }
        };
        report.pool_size = ids.len();
        tracing::info!("pool size: {}", ids.len());
        if ids.len() <= cfg.max_seeds as usize {
            return report;
        }

        let queues = self.fetch_queues(cfg).await;

        let mut pool = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.inventory.snapshot(id).await {
                Ok(snap) => pool.push(snap),
                Err(e) => tracing::warn!("skipping {id}: snapshot failed: {e}"),
            }
        }

        let partition = exempt::partition(
            pool,
            |id| self.ignore.is_ignored(id),
            cfg,
            self.labels_active,
        );
        report.eligible = partition.eligible.len();
        report.excluded = partition.excluded.len();
        tracing::info!(
            "eligible: {}, exempt: {}",
            partition.eligible.len(),
            partition.excluded.len()
        );

        let action_set = budget::plan(cfg, partition.eligible, report.excluded);
        report.examined = action_set.len();

        for snap in &action_set {
            if self.space_satisfied(cfg).await {
                tracing::info!("free space above threshold, stopping sweep");
                break;
            }
            if !cfg.enabled {
                tracing::debug!("engine disabled, leaving {} alone", snap.name);
                continue;
            }
            let (Some(seed_hours), Some(_ratio)) = (snap.seeding_hours(), snap.ratio) else {
                tracing::warn!("status fields unavailable for {}, skipping", snap.name);
                continue;
            };

            let resolved = rules::resolve(cfg, snap, self.labels_active);
            if let Some(cause) = &resolved.label_error {
                tracing::debug!("label rules skipped for {}: {cause}", snap.name);
            }
            let has_override = resolved.is_override();
            let remove_cond = if has_override {
                rules::evaluate_override(&resolved.rules, snap)
            } else {
                rules::general_condition(cfg, snap)
            };
            // Override rules double as the finished-torrent removal gate.
            let seed_remove_cond = has_override && remove_cond;

            if !snap.finished {
                if remove_cond {
                    if cfg.pause_torrents && !snap.paused {
                        self.pause(snap, &mut report).await;
                    }
                    if cfg.remove {
                        let catalog = snap
                            .label
                            .as_label()
                            .and_then(CatalogKind::from_label)
                            .filter(|kind| {
                                cfg.catalog(*kind).enabled && self.catalogs.get(*kind).is_some()
                            });
                        match catalog {
                            Some(kind) => {
                                self.blacklist_then_remove(kind, snap, &queues, cfg, &mut report)
                                    .await;
                            }
                            None => self.remove_local(snap, cfg, &mut report).await,
                        }
                    }
                }
            } else if !has_override || seed_remove_cond {
                if seed_hours > cfg.seedtime_limit {
                    tracing::info!(
                        "removing finished {}: seed time {seed_hours:.1} h over {:.1} h",
                        snap.name,
                        cfg.seedtime_limit
                    );
                    self.remove_local(snap, cfg, &mut report).await;
                } else if seed_hours > cfg.seedtime_pause && cfg.pause_torrents && !snap.paused {
                    tracing::info!(
                        "pausing finished {}: seed time {seed_hours:.1} h over {:.1} h",
                        snap.name,
                        cfg.seedtime_pause
                    );
                    self.pause(snap, &mut report).await;
                }
            }
        }

        report
    }

    /// Fan out queue lookups to every enabled catalog, each under its own
    /// timeout. A failed or timed-out lookup degrades to an empty queue.
    async fn fetch_queues(&self, cfg: &RetentionConfig) -> CatalogQueues {
        let fetches = CatalogKind::ALL.into_iter().filter_map(|kind| {
            if !cfg.catalog(kind).enabled {
                return None;
            }
            let client = Arc::clone(self.catalogs.get(kind)?);
            Some(async move {
                match tokio::time::timeout(QUEUE_FETCH_TIMEOUT, client.queue()).await {
                    Ok(Ok(queue)) => (kind, queue),
                    Ok(Err(e)) => {
                        tracing::warn!("{kind} queue lookup failed, treating as empty: {e}");
                        (kind, HashMap::new())
                    }
                    Err(_) => {
                        tracing::warn!("{kind} queue lookup timed out, treating as empty");
                        (kind, HashMap::new())
                    }
                }
            })
        });

        let mut queues = CatalogQueues::default();
        for (kind, queue) in futures::future::join_all(fetches).await {
            tracing::debug!("{kind} queue size: {}", queue.len());
            queues.insert(kind, queue);
        }
        queues
    }

    /// Whether the free-space gate says the sweep can stop.
    ///
    /// A disabled check (negative threshold) never stops the sweep, and an
    /// unreadable probe counts as "headroom unknown", not as sufficient.
    async fn space_satisfied(&self, cfg: &RetentionConfig) -> bool {
        if cfg.hdd_space < 0.0 {
            return false;
        }
        match tokio::time::timeout(DISK_PROBE_TIMEOUT, self.disk.free_space_gib()).await {
            Ok(Some(free)) => {
                tracing::debug!("free space: {free:.1}/{:.1} GiB", cfg.hdd_space);
                free > cfg.hdd_space
            }
            Ok(None) => false,
            Err(_) => {
                tracing::warn!("disk probe timed out");
                false
            }
        }
    }

    /// Delete the queue entry matching the torrent's hash (when present),
    /// then remove locally either way. Returns the catalog's delete response
    /// when one was obtained.
    async fn blacklist_then_remove(
        &self,
        kind: CatalogKind,
        snap: &TorrentSnapshot,
        queues: &CatalogQueues,
        cfg: &RetentionConfig,
        report: &mut PassReport,
    ) -> Option<serde_json::Value> {
        let hash = snap.info_hash.to_uppercase();
        let response = match (queues.lookup(kind, &hash), self.catalogs.get(kind)) {
            (Some(entry), Some(client)) => match client.delete_queue_item(&entry.id).await {
                Ok(resp) => {
                    tracing::info!("blacklisted {} in {kind} (queue item {})", snap.name, entry.id);
                    report.blacklisted += 1;
                    Some(resp)
                }
                Err(e) => {
                    tracing::warn!("{kind} queue delete for {} failed: {e}", snap.name);
                    None
                }
            },
            _ => {
                tracing::warn!("{} not in {kind} queue ({hash}), removing locally only", snap.name);
                None
            }
        };
        self.remove_local(snap, cfg, report).await;
        response
    }

    async fn remove_local(
        &self,
        snap: &TorrentSnapshot,
        cfg: &RetentionConfig,
        report: &mut PassReport,
    ) {
        let delete_data = if snap.finished {
            cfg.seed_remove_data
        } else {
            cfg.remove_data
        };
        match self.inventory.remove(&snap.id, delete_data).await {
            Ok(()) => {
                tracing::info!(
                    "removed {} {} payload data",
                    snap.name,
                    if delete_data { "with" } else { "without" }
                );
                self.ignore.forget(&snap.id);
                report.removed.push(snap.id.clone());
            }
            Err(e) => tracing::warn!("could not remove {}: {e}", snap.name),
        }
    }

    async fn pause(&self, snap: &TorrentSnapshot, report: &mut PassReport) {
        match self.inventory.pause(&snap.id).await {
            Ok(()) => {
                tracing::info!("paused {}", snap.name);
                report.paused.push(snap.id.clone());
            }
            Err(e) => tracing::warn!("could not pause {}: {e}", snap.name),
        }
    }
}
