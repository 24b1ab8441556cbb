use crate::application::ports::{ConnectivityEvent, ConnectivityProvider};
use crate::application::services::offline_queue::{OfflineQueue, ReplayOutcome};
use crate::infrastructure::sync::metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub last_sync: Option<i64>,
    pub sync_errors: u32,
}

/// Orchestrates replay passes over the offline queue: manual "sync now",
/// a periodic driver, and connectivity-transition triggers. The queue
/// never schedules itself.
pub struct SyncService {
    queue: Arc<OfflineQueue>,
    connectivity: Arc<dyn ConnectivityProvider>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncService {
    pub fn new(queue: Arc<OfflineQueue>, connectivity: Arc<dyn ConnectivityProvider>) -> Self {
        Self {
            queue,
            connectivity,
            status: Arc::new(RwLock::new(SyncStatus {
                is_syncing: false,
                last_sync: None,
                sync_errors: 0,
            })),
        }
    }

    /// Manual sync trigger. A pass already in flight makes this a no-op
    /// returning zero counts.
    pub async fn sync_now(&self) -> ReplayOutcome {
        self.sync_with_trigger("manual").await
    }

    async fn sync_with_trigger(&self, trigger: &str) -> ReplayOutcome {
        {
            let mut status = self.status.write().await;
            if status.is_syncing {
                return ReplayOutcome::default();
            }
            status.is_syncing = true;
        }

        let outcome = self.queue.replay_all().await;
        metrics::record_pass(trigger, outcome.success, outcome.failed);

        let mut status = self.status.write().await;
        status.is_syncing = false;
        status.last_sync = Some(chrono::Utc::now().timestamp());
        status.sync_errors = status.sync_errors.saturating_add(outcome.failed);

        tracing::info!(
            target: "offline::sync",
            trigger,
            success = outcome.success,
            failed = outcome.failed,
            "sync pass finished"
        );

        outcome
    }

    pub async fn get_status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Drive replay on a fixed interval. The returned handle lets the
    /// caller stop the driver on teardown.
    pub fn schedule_sync(&self, interval_secs: u64) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                service.sync_with_trigger("interval").await;
            }
        })
    }

    /// Replay on every offline→online transition reported by the
    /// connectivity signal.
    pub fn watch_connectivity(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut events = self.connectivity.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::Online) => {
                        service.sync_with_trigger("connectivity").await;
                    }
                    Ok(ConnectivityEvent::Offline) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "offline::sync",
                            skipped,
                            "connectivity events lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            connectivity: self.connectivity.clone(),
            status: self.status.clone(),
        }
    }
}
