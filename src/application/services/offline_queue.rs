use crate::application::ports::{
    ConnectivityProvider, KeyValueStore, ReferralGateway, OFFLINE_QUEUE_KEY,
};
use crate::domain::entities::OfflineAction;
use crate::domain::value_objects::{ActionId, ActionPayload};
use crate::infrastructure::sync::metrics;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Aggregate result of one replay pass. Dropped actions count under
/// `failed`; the drop itself is logged, not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    pub success: u32,
    pub failed: u32,
}

/// Durable FIFO holding area for writes that could not reach the remote
/// referral API, plus the replay protocol that drains it.
///
/// Every operation is a read-modify-write of the whole serialized queue
/// under an internal mutex, which is sound for a single process sharing
/// one store handle. Multiple processes on the same store are not
/// coordinated.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn ReferralGateway>,
    connectivity: Arc<dyn ConnectivityProvider>,
    max_retries: u32,
    dispatch_timeout: Duration,
    mutation: Mutex<()>,
    count_tx: watch::Sender<usize>,
}

impl OfflineQueue {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn ReferralGateway>,
        connectivity: Arc<dyn ConnectivityProvider>,
        config: &SyncConfig,
    ) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            store,
            gateway,
            connectivity,
            max_retries: config.max_retries,
            dispatch_timeout: Duration::from_secs(config.dispatch_timeout_secs),
            mutation: Mutex::new(()),
            count_tx,
        }
    }

    /// Append a new action and persist the queue. Never fails: storage
    /// write errors are logged and swallowed.
    pub async fn enqueue(&self, payload: ActionPayload) -> OfflineAction {
        let action = OfflineAction::new(payload);

        let _guard = self.mutation.lock().await;
        let mut actions = self.load().await;
        actions.push(action.clone());
        self.persist(&actions).await;

        tracing::debug!(
            target: "offline::queue",
            action_id = %action.id,
            kind = action.payload.kind(),
            pending = actions.len(),
            "queued offline action"
        );

        action
    }

    /// Remove the action with the given id. Absent ids are a no-op.
    pub async fn dequeue(&self, id: &ActionId) {
        let _guard = self.mutation.lock().await;
        let mut actions = self.load().await;
        let before = actions.len();
        actions.retain(|action| &action.id != id);
        if actions.len() != before {
            self.persist(&actions).await;
        }
    }

    /// Replace the retry counter of the action with the given id; leaves
    /// the queue unchanged when the id is absent.
    pub async fn update_retries(&self, id: &ActionId, retries: u32) {
        let _guard = self.mutation.lock().await;
        let mut actions = self.load().await;
        let mut changed = false;
        for action in actions.iter_mut() {
            if &action.id == id {
                action.retries = retries;
                changed = true;
            }
        }
        if changed {
            self.persist(&actions).await;
        }
    }

    /// Current queue contents in insertion order. Missing or unreadable
    /// storage yields an empty list, never an error.
    pub async fn list_pending(&self) -> Vec<OfflineAction> {
        self.load().await
    }

    pub async fn pending_count(&self) -> usize {
        self.load().await.len()
    }

    /// Observe the pending count without polling; the receiver sees the
    /// count after every queue mutation.
    pub fn watch_count(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    /// Drain the queue against the remote API.
    ///
    /// Immediately returns zeros while offline. Otherwise each action
    /// present at the start of the pass is dispatched exactly once, in
    /// insertion order, one in-flight call at a time; actions enqueued
    /// mid-pass wait for the next pass. Removal happens only after the
    /// remote call is confirmed, so a crash mid-pass leaves no dual-write
    /// hazard.
    pub async fn replay_all(&self) -> ReplayOutcome {
        if !self.connectivity.is_online().await {
            return ReplayOutcome::default();
        }

        let snapshot = self.list_pending().await;
        let mut outcome = ReplayOutcome::default();

        for action in snapshot {
            match self.dispatch(&action).await {
                Ok(()) => {
                    self.dequeue(&action.id).await;
                    outcome.success += 1;
                }
                Err(err) => {
                    outcome.failed += 1;
                    let retries = action.retries + 1;
                    if retries >= self.max_retries {
                        tracing::error!(
                            target: "offline::queue",
                            action_id = %action.id,
                            kind = action.payload.kind(),
                            retries,
                            error = %err,
                            "retry ceiling reached, dropping action"
                        );
                        metrics::record_dropped();
                        self.dequeue(&action.id).await;
                    } else {
                        tracing::warn!(
                            target: "offline::queue",
                            action_id = %action.id,
                            retries,
                            error = %err,
                            "replay attempt failed"
                        );
                        self.update_retries(&action.id, retries).await;
                    }
                }
            }
        }

        outcome
    }

    async fn dispatch(&self, action: &OfflineAction) -> Result<(), AppError> {
        let call = async {
            match &action.payload {
                ActionPayload::CreateReferral(draft) => self.gateway.create_referral(draft).await,
                ActionPayload::UpdateStatus {
                    referral_id,
                    status,
                } => self.gateway.update_status(referral_id, *status).await,
            }
        };

        match tokio::time::timeout(self.dispatch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Network(format!(
                "dispatch timed out after {}s",
                self.dispatch_timeout.as_secs()
            ))),
        }
    }

    async fn load(&self) -> Vec<OfflineAction> {
        match self.store.get(OFFLINE_QUEUE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(actions) => actions,
                Err(err) => {
                    tracing::warn!(
                        target: "offline::queue",
                        error = %err,
                        "stored queue is unreadable, treating as empty"
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(
                    target: "offline::queue",
                    error = %err,
                    "failed to read stored queue, treating as empty"
                );
                Vec::new()
            }
        }
    }

    async fn persist(&self, actions: &[OfflineAction]) {
        match serde_json::to_string(actions) {
            Ok(raw) => {
                if let Err(err) = self.store.set(OFFLINE_QUEUE_KEY, &raw).await {
                    tracing::warn!(
                        target: "offline::queue",
                        error = %err,
                        pending = actions.len(),
                        "failed to persist queue, in-memory state may diverge"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    target: "offline::queue",
                    error = %err,
                    "failed to serialize queue"
                );
            }
        }
        self.count_tx.send_replace(actions.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ReferralDraft, ReferralStatus};
    use crate::infrastructure::connectivity::ConnectivityMonitor;
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Gateway double that consumes a scripted sequence of outcomes, then
    /// falls back to a fixed outcome once the script runs dry.
    struct StubGateway {
        script: Mutex<VecDeque<bool>>,
        fallback_ok: bool,
        calls: AtomicU32,
    }

    impl StubGateway {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(VecDeque::new()),
                fallback_ok: true,
                calls: AtomicU32::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(VecDeque::new()),
                fallback_ok: false,
                calls: AtomicU32::new(0),
            })
        }

        fn scripted(outcomes: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(outcomes.iter().copied().collect()),
                fallback_ok: true,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        async fn next_outcome(&self) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ok = self
                .script
                .lock()
                .await
                .pop_front()
                .unwrap_or(self.fallback_ok);
            if ok {
                Ok(())
            } else {
                Err(AppError::Network("remote call rejected".into()))
            }
        }
    }

    #[async_trait]
    impl ReferralGateway for StubGateway {
        async fn create_referral(&self, _draft: &ReferralDraft) -> Result<(), AppError> {
            self.next_outcome().await
        }

        async fn update_status(
            &self,
            _referral_id: &str,
            _status: ReferralStatus,
        ) -> Result<(), AppError> {
            self.next_outcome().await
        }
    }

    /// Gateway whose calls never settle; exercises the dispatch timeout.
    struct HungGateway;

    #[async_trait]
    impl ReferralGateway for HungGateway {
        async fn create_referral(&self, _draft: &ReferralDraft) -> Result<(), AppError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn update_status(
            &self,
            _referral_id: &str,
            _status: ReferralStatus,
        ) -> Result<(), AppError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    /// Store whose writes always fail; reads still work.
    struct ReadOnlyStore {
        inner: MemoryKeyValueStore,
    }

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::Storage("write quota exceeded".into()))
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig {
            auto_sync: false,
            sync_interval: 60,
            max_retries: 3,
            dispatch_timeout_secs: 1,
        }
    }

    fn build_queue(
        gateway: Arc<dyn ReferralGateway>,
        online: bool,
    ) -> (OfflineQueue, Arc<MemoryKeyValueStore>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let monitor = Arc::new(ConnectivityMonitor::new(online));
        let queue = OfflineQueue::new(store.clone(), gateway, monitor, &test_config());
        (queue, store)
    }

    fn draft(index: u32) -> ActionPayload {
        ActionPayload::CreateReferral(ReferralDraft {
            referrer_id: "rep-1".into(),
            referee_name: format!("Referee {index}"),
            referee_phone: format!("555-01{index:02}"),
            referee_email: None,
            notes: None,
        })
    }

    #[tokio::test]
    async fn list_pending_preserves_insertion_order() {
        let (queue, _store) = build_queue(StubGateway::succeeding(), true);

        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(queue.enqueue(draft(i)).await.id);
        }

        let pending = queue.list_pending().await;
        let listed: Vec<_> = pending.iter().map(|a| a.id.clone()).collect();
        assert_eq!(listed, ids);
        assert_eq!(queue.pending_count().await, 4);
    }

    #[tokio::test]
    async fn dequeue_is_idempotent() {
        let (queue, _store) = build_queue(StubGateway::succeeding(), true);

        let kept = queue.enqueue(draft(0)).await;
        let removed = queue.enqueue(draft(1)).await;

        queue.dequeue(&removed.id).await;
        queue.dequeue(&removed.id).await;
        queue
            .dequeue(&ActionId::parse("no-such-action").unwrap())
            .await;

        let pending = queue.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, kept.id);
    }

    #[tokio::test]
    async fn successful_pass_drains_the_queue() {
        let gateway = StubGateway::succeeding();
        let (queue, _store) = build_queue(gateway.clone(), true);

        for i in 0..3 {
            queue.enqueue(draft(i)).await;
        }

        let outcome = queue.replay_all().await;
        assert_eq!(
            outcome,
            ReplayOutcome {
                success: 3,
                failed: 0
            }
        );
        assert!(queue.list_pending().await.is_empty());
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn replay_while_offline_is_a_noop() {
        let gateway = StubGateway::succeeding();
        let (queue, _store) = build_queue(gateway.clone(), false);

        let first = queue.enqueue(draft(0)).await;
        let second = queue.enqueue(draft(1)).await;

        let outcome = queue.replay_all().await;
        assert_eq!(outcome, ReplayOutcome::default());
        assert_eq!(gateway.calls(), 0);

        let pending = queue.list_pending().await;
        let ids: Vec<_> = pending.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn mixed_pass_retries_first_and_removes_second() {
        let gateway = StubGateway::scripted(&[false, true]);
        let (queue, _store) = build_queue(gateway, true);

        let failing = queue.enqueue(draft(0)).await;
        queue.enqueue(draft(1)).await;

        let outcome = queue.replay_all().await;
        assert_eq!(
            outcome,
            ReplayOutcome {
                success: 1,
                failed: 1
            }
        );

        let pending = queue.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, failing.id);
        assert_eq!(pending[0].retries, 1);
    }

    #[tokio::test]
    async fn third_failed_attempt_drops_the_action() {
        let gateway = StubGateway::failing();
        let (queue, _store) = build_queue(gateway.clone(), true);

        queue.enqueue(draft(0)).await;

        for expected_retries in 1..=2u32 {
            let outcome = queue.replay_all().await;
            assert_eq!(outcome.failed, 1);
            let pending = queue.list_pending().await;
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].retries, expected_retries);
        }

        let outcome = queue.replay_all().await;
        assert_eq!(
            outcome,
            ReplayOutcome {
                success: 0,
                failed: 1
            }
        );
        assert!(queue.list_pending().await.is_empty());
        assert_eq!(gateway.calls(), 3);

        // A later pass never sees the dropped action again.
        let outcome = queue.replay_all().await;
        assert_eq!(outcome, ReplayOutcome::default());
    }

    #[tokio::test]
    async fn hung_dispatch_counts_as_a_failed_attempt() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let config = SyncConfig {
            dispatch_timeout_secs: 1,
            ..test_config()
        };
        let queue = OfflineQueue::new(store, Arc::new(HungGateway), monitor, &config);

        queue.enqueue(draft(0)).await;

        let outcome = queue.replay_all().await;
        assert_eq!(
            outcome,
            ReplayOutcome {
                success: 0,
                failed: 1
            }
        );
        assert_eq!(queue.list_pending().await[0].retries, 1);
    }

    #[tokio::test]
    async fn enqueue_survives_store_write_failure() {
        let store = Arc::new(ReadOnlyStore {
            inner: MemoryKeyValueStore::new(),
        });
        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let queue = OfflineQueue::new(
            store,
            StubGateway::succeeding(),
            monitor,
            &test_config(),
        );

        let action = queue.enqueue(draft(0)).await;
        assert_eq!(action.retries, 0);

        // The write was swallowed; nothing was durably stored.
        assert!(queue.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_stored_queue_reads_as_empty() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .set(OFFLINE_QUEUE_KEY, "{not json")
            .await
            .unwrap();

        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let queue = OfflineQueue::new(
            store,
            StubGateway::succeeding(),
            monitor,
            &test_config(),
        );

        assert!(queue.list_pending().await.is_empty());
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn count_watch_tracks_enqueue_and_drain() {
        let (queue, _store) = build_queue(StubGateway::succeeding(), true);
        let mut rx = queue.watch_count();
        assert_eq!(*rx.borrow(), 0);

        queue.enqueue(draft(0)).await;
        queue.enqueue(draft(1)).await;
        assert_eq!(*rx.borrow_and_update(), 2);

        queue.replay_all().await;
        assert_eq!(*rx.borrow_and_update(), 0);
    }
}
