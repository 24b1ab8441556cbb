pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    ConnectivityEvent, ConnectivityProvider, KeyValueStore, ReferralGateway, OFFLINE_QUEUE_KEY,
};
pub use application::services::{OfflineQueue, ReplayOutcome, SyncService, SyncStatus};
pub use domain::entities::OfflineAction;
pub use domain::value_objects::{ActionId, ActionPayload, ReferralDraft, ReferralStatus};
pub use infrastructure::api::HttpReferralGateway;
pub use infrastructure::connectivity::ConnectivityMonitor;
pub use infrastructure::storage::{MemoryKeyValueStore, SqliteKeyValueStore};
pub use shared::{AppConfig, AppError, Result};

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "referra=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
