use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use super::engine::SyncEngine;

/// Drives periodic reconciliation.
///
/// Reconciles once shortly after startup, then on a fixed interval while
/// online, and immediately on every offline-to-online transition. Ticks
/// that land while a reconcile is still in flight are dropped by the
/// engine's per-collection guard.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    online: watch::Receiver<bool>,
    interval: Duration,
    startup_delay: Duration,
}

impl SyncScheduler {
    pub fn new(
        engine: Arc<SyncEngine>,
        online: watch::Receiver<bool>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            online,
            interval,
            startup_delay: Duration::from_secs(2),
        }
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    async fn reconcile_if_online(&self) {
        if !*self.online.borrow() {
            debug!("offline, skipping scheduled reconcile");
            return;
        }
        for (collection, result) in self.engine.reconcile_all().await {
            match result {
                Ok(Some(report)) => {
                    debug!(%collection, pushed = report.pushed, "scheduled reconcile done")
                }
                Ok(None) => debug!(%collection, "reconcile already running"),
                Err(e) => debug!(%collection, error = %e, "scheduled reconcile failed"),
            }
        }
    }

    /// Runs until the connectivity channel closes.
    pub async fn run(mut self) {
        tokio::time::sleep(self.startup_delay).await;
        self.reconcile_if_online().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await; // the first tick fires immediately

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reconcile_if_online().await;
                }
                changed = self.online.changed() => {
                    if changed.is_err() {
                        info!("connectivity monitor stopped, sync scheduler exiting");
                        return;
                    }
                    if *self.online.borrow() {
                        info!("back online, reconciling");
                        self.reconcile_if_online().await;
                        ticker.reset();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, DocumentKind};
    use crate::remote::memory::MemoryRemoteStore;
    use crate::remote::RemoteStore;
    use crate::store::{init_db, Collection, LocalStore};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scheduler_reconciles_on_online_transition() {
        let dir = tempdir().unwrap();
        let pool = init_db(dir.path().join("test.db")).await.unwrap();
        let remote = Arc::new(MemoryRemoteStore::new());
        let engine = Arc::new(SyncEngine::new(
            LocalStore::new(pool),
            remote.clone() as Arc<dyn RemoteStore>,
        ));

        remote.seed(
            Collection::Clients,
            vec![serde_json::to_value(Client::new(
                DocumentKind::Cpf,
                "52998224725",
                "Maria",
                "Mari",
                "119",
            ))
            .unwrap()],
        );

        let (tx, rx) = watch::channel(false);
        let scheduler = SyncScheduler::new(engine.clone(), rx, Duration::from_secs(3600))
            .with_startup_delay(Duration::from_millis(1));
        let handle = tokio::spawn(scheduler.run());

        // offline at startup, nothing pulled yet
        tokio::time::sleep(Duration::from_millis(50)).await;
        let local: Vec<Client> = engine.store().read(Collection::Clients).await.unwrap();
        assert!(local.is_empty());

        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let local: Vec<Client> = engine.store().read(Collection::Clients).await.unwrap();
        assert_eq!(local.len(), 1);

        drop(tx);
        handle.await.unwrap();
    }
}
