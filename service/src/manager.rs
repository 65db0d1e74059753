//! The operator-facing service handle.
//!
//! Wraps the engine, the durable state store, and the scheduler behind the
//! operations exposed over IPC. Configuration writes persist immediately and
//! restart the timer; a pass in flight keeps the snapshot it started with.

use std::sync::Arc;
use std::time::Duration;

use seedcull_core::config::RetentionConfig;
use seedcull_core::engine::{PassReport, RetentionEngine};
use seedcull_core::metrics::Metric;
use tokio::sync::Mutex;

use crate::persistence::{IgnoreLedger, StateStore, StoreError};
use crate::protocol::MetricInfo;
use crate::scheduler::{STARTUP_DELAY, Scheduler};

/// Errors surfaced to the operator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}

/// One service instance: engine + durable state + timer.
pub struct RetentionService {
    store: Arc<StateStore>,
    ignore: Arc<IgnoreLedger>,
    engine: Arc<RetentionEngine>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl RetentionService {
    pub fn new(
        store: Arc<StateStore>,
        ignore: Arc<IgnoreLedger>,
        engine: Arc<RetentionEngine>,
    ) -> RetentionService {
        RetentionService {
            store,
            ignore,
            engine,
            scheduler: Mutex::new(None),
        }
    }

    /// Start the periodic timer (idempotent). The first pass waits out the
    /// startup delay so the host inventory can populate.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let cfg = self.store.load_config()?;
        let mut slot = self.scheduler.lock().await;
        if slot.is_none() {
            *slot = Some(Scheduler::spawn(
                Arc::clone(&self.engine),
                Arc::clone(&self.store),
                cfg.interval,
                STARTUP_DELAY,
            ));
            tracing::info!("scheduler started, interval {} h", cfg.interval);
        }
        Ok(())
    }

    /// Stop the timer; an in-flight pass finishes first.
    pub async fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.lock().await.take() {
            scheduler.stop().await;
            tracing::info!("scheduler stopped");
        }
    }

    pub fn get_config(&self) -> Result<RetentionConfig, ServiceError> {
        Ok(self.store.load_config()?)
    }

    /// Replace the policy document and restart the timer so a changed
    /// interval takes effect; the restarted timer fires immediately.
    pub async fn set_config(&self, cfg: RetentionConfig) -> Result<(), ServiceError> {
        self.store.save_config(&cfg)?;
        let mut slot = self.scheduler.lock().await;
        if let Some(scheduler) = slot.take() {
            scheduler.stop().await;
            *slot = Some(Scheduler::spawn(
                Arc::clone(&self.engine),
                Arc::clone(&self.store),
                cfg.interval,
                Duration::ZERO,
            ));
            tracing::info!("scheduler restarted, interval {} h", cfg.interval);
        }
        Ok(())
    }

    /// The static metric-name catalog for UI rule pickers.
    pub fn metric_catalog() -> Vec<MetricInfo> {
        Metric::catalog()
            .into_iter()
            .map(|(name, label)| MetricInfo {
                name: name.to_string(),
                label: label.to_string(),
            })
            .collect()
    }

    pub fn get_ignore(&self, ids: &[String]) -> Vec<bool> {
        self.ignore.flags(ids)
    }

    pub fn set_ignore(&self, ids: &[String], ignore: bool) -> Result<(), ServiceError> {
        tracing::debug!("setting {} torrent(s) to ignore={ignore}", ids.len());
        Ok(self.ignore.set(ids, ignore)?)
    }

    /// Run a decision pass now, serialized against the timer. Only a config
    /// read failure aborts, before any side effect.
    pub async fn run_pass(&self) -> Result<PassReport, ServiceError> {
        let cfg = self.store.load_config()?;
        Ok(self.engine.run_pass(&cfg).await)
    }

    /// Bulk blacklist-then-remove over explicit ids.
    pub async fn blacklist(&self, ids: &[String]) -> Result<usize, ServiceError> {
        let cfg = self.store.load_config()?;
        Ok(self.engine.blacklist(ids, &cfg).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingInventory, NullDisk};
    use pretty_assertions::assert_eq;
    use seedcull_core::engine::CatalogSet;

    struct Fixture {
        inventory: Arc<CountingInventory>,
        store: Arc<StateStore>,
        service: RetentionService,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().to_path_buf();
        std::mem::forget(tmp);
        let store = Arc::new(StateStore::with_base_dir(path).unwrap());
        let ignore = Arc::new(IgnoreLedger::load(Arc::clone(&store)).unwrap());
        let inventory = Arc::new(CountingInventory::default());
        let engine = Arc::new(RetentionEngine::new(
            Arc::clone(&inventory) as _,
            Arc::new(NullDisk),
            CatalogSet::new(),
            Arc::clone(&ignore) as _,
            false,
        ));
        let service = RetentionService::new(Arc::clone(&store), ignore, engine);
        Fixture {
            inventory,
            store,
            service,
        }
    }

    #[tokio::test]
    async fn config_set_persists_for_the_next_read() {
        let f = fixture();
        let mut cfg = RetentionConfig::default();
        cfg.max_seeds = 99;
        f.service.set_config(cfg.clone()).await.unwrap();
        assert_eq!(f.service.get_config().unwrap(), cfg);
    }

    #[tokio::test(start_paused = true)]
    async fn config_set_restarts_a_running_scheduler_immediately() {
        let f = fixture();
        f.service.start().await.unwrap();

        // Not yet past the startup delay: no pass has run.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.inventory.passes(), 0);

        // A restarted timer fires without the startup delay.
        f.service.set_config(RetentionConfig::default()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.inventory.passes(), 1);

        f.service.shutdown().await;
    }

    #[tokio::test]
    async fn ignore_flags_round_trip() {
        let f = fixture();
        f.service
            .set_ignore(&["a".to_string(), "b".to_string()], true)
            .unwrap();
        assert_eq!(
            f.service
                .get_ignore(&["a".to_string(), "b".to_string(), "c".to_string()]),
            vec![true, true, false]
        );

        f.service.set_ignore(&["a".to_string()], false).unwrap();
        assert_eq!(f.service.get_ignore(&["a".to_string()]), vec![false]);
    }

    #[tokio::test]
    async fn metric_catalog_is_static() {
        let catalog = RetentionService::metric_catalog();
        assert_eq!(catalog.len(), 7);
        assert!(
            catalog
                .iter()
                .any(|m| m.name == "func_ratio" && m.label == "Ratio")
        );
    }

    #[tokio::test]
    async fn unreadable_config_aborts_the_pass_before_any_side_effect() {
        let f = fixture();
        std::fs::write(f.store.base_dir().join("config.json"), "{not json").unwrap();

        let result = f.service.run_pass().await;
        assert!(matches!(result, Err(ServiceError::Store(_))));
        assert_eq!(f.inventory.passes(), 0, "engine ran despite config error");
    }

    #[tokio::test]
    async fn manual_pass_runs_the_engine() {
        let f = fixture();
        let report = f.service.run_pass().await.unwrap();
        assert_eq!(report.pool_size, 0);
        assert_eq!(f.inventory.passes(), 1);
    }
}
