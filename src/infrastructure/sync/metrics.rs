use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPassStatus {
    Success,
    Failure,
}

/// Point-in-time view of the process-wide replay counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMetricsSnapshot {
    pub total_success: u64,
    pub total_failure: u64,
    pub consecutive_failure: u64,
    pub dropped_actions: u64,
    pub last_outcome: Option<ReplayPassStatus>,
    pub last_trigger: Option<String>,
    pub last_success_count: Option<u32>,
    pub last_failure_count: Option<u32>,
    pub last_timestamp_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    last_outcome: Option<ReplayPassStatus>,
    trigger: Option<String>,
    success_count: Option<u32>,
    failure_count: Option<u32>,
    timestamp_ms: Option<u64>,
}

struct ReplayMetrics {
    success: AtomicU64,
    failure: AtomicU64,
    consecutive_failure: AtomicU64,
    dropped: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl ReplayMetrics {
    fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    fn record_pass(&self, trigger: &str, success_count: u32, failure_count: u32) {
        let status = if failure_count == 0 {
            self.success.fetch_add(1, Ordering::Relaxed);
            self.consecutive_failure.store(0, Ordering::Relaxed);
            ReplayPassStatus::Success
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
            self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
            ReplayPassStatus::Failure
        };

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.trigger = Some(trigger.to_string());
            guard.success_count = Some(success_count);
            guard.failure_count = Some(failure_count);
            guard.timestamp_ms = Some(current_unix_ms());
        }
    }

    fn snapshot(&self) -> ReplayMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastPassMetadata::default());

        ReplayMetricsSnapshot {
            total_success: self.success.load(Ordering::Relaxed),
            total_failure: self.failure.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            dropped_actions: self.dropped.load(Ordering::Relaxed),
            last_outcome: metadata.last_outcome,
            last_trigger: metadata.trigger,
            last_success_count: metadata.success_count,
            last_failure_count: metadata.failure_count,
            last_timestamp_ms: metadata.timestamp_ms,
        }
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

static REPLAY_METRICS: LazyLock<ReplayMetrics> = LazyLock::new(ReplayMetrics::new);

/// Record one finished replay pass and return the updated snapshot.
pub fn record_pass(trigger: &str, success_count: u32, failure_count: u32) -> ReplayMetricsSnapshot {
    REPLAY_METRICS.record_pass(trigger, success_count, failure_count);
    REPLAY_METRICS.snapshot()
}

/// Record an action permanently discarded at the retry ceiling.
pub fn record_dropped() {
    REPLAY_METRICS.dropped.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> ReplayMetricsSnapshot {
    REPLAY_METRICS.snapshot()
}
