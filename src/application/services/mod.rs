pub mod offline_queue;
pub mod sync_service;

pub use offline_queue::{OfflineQueue, ReplayOutcome};
pub use sync_service::{SyncService, SyncStatus};
