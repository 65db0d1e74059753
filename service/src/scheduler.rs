//! Periodic pass driver.
//!
//! One tokio task sleeps, reads a fresh config snapshot, and runs a pass.
//! The first pass is deliberately delayed after startup so the host
//! inventory has time to populate. Stopping cancels only the sleeps: an
//! in-flight pass always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use seedcull_core::engine::RetentionEngine;
use tokio_util::sync::CancellationToken;

use crate::persistence::StateStore;

/// Delay before the first scheduled pass after process start.
pub const STARTUP_DELAY: Duration = Duration::from_secs(5);

/// Handle to a running timer task.
pub struct Scheduler {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the timer loop with a period of `interval_hours` (fractional
    /// allowed, clamped to at least one second).
    pub fn spawn(
        engine: Arc<RetentionEngine>,
        store: Arc<StateStore>,
        interval_hours: f64,
        startup_delay: Duration,
    ) -> Scheduler {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let period = Duration::from_secs_f64((interval_hours * 3600.0).max(1.0));

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(startup_delay) => {}
            }
            loop {
                // The config snapshot is read per pass so operator changes
                // apply on the next tick; only the interval itself needs a
                // scheduler restart.
                match store.load_config() {
                    Ok(cfg) => {
                        let report = engine.run_pass(&cfg).await;
                        tracing::info!(
                            "pass done: {} removed, {} paused, {} blacklisted",
                            report.removed.len(),
                            report.paused.len(),
                            report.blacklisted
                        );
                    }
                    Err(e) => {
                        tracing::error!("skipping scheduled pass, could not read config: {e}");
                    }
                }
                tokio::select! {
                    _ = task_token.cancelled() => return,
                    _ = tokio::time::sleep(period) => {}
                }
            }
        });

        Scheduler { token, handle }
    }

    /// Stop the timer, letting any in-flight pass finish first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("scheduler task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::IgnoreLedger;
    use crate::testutil::{CountingInventory, NullDisk};
    use seedcull_core::engine::CatalogSet;

    fn fixture() -> (Arc<CountingInventory>, Arc<RetentionEngine>, Arc<StateStore>) {
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
            ignore,
            false,
        ));
        (inventory, engine, store)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_first_pass_after_startup_delay_then_periodically() {
        let (inventory, engine, store) = fixture();
        let scheduler = Scheduler::spawn(engine, store, 1.0, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(inventory.passes(), 0, "pass ran before the startup delay");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(inventory.passes(), 1);

        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert_eq!(inventory.passes(), 2);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_pass_runs_nothing() {
        let (inventory, engine, store) = fixture();
        let scheduler = Scheduler::spawn(engine, store, 1.0, Duration::from_secs(60));
        scheduler.stop().await;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(inventory.passes(), 0);
    }
}
