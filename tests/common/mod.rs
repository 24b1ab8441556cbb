use async_trait::async_trait;
use referra::shared::config::SyncConfig;
use referra::{
    ActionPayload, AppError, ReferralDraft, ReferralGateway, ReferralStatus, SqliteKeyValueStore,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        auto_sync: false,
        sync_interval: 60,
        max_retries: 3,
        dispatch_timeout_secs: 5,
    }
}

pub fn referral_payload(index: u32) -> ActionPayload {
    ActionPayload::CreateReferral(ReferralDraft {
        referrer_id: "rep-42".to_string(),
        referee_name: format!("Referee {index}"),
        referee_phone: format!("555-02{index:02}"),
        referee_email: Some(format!("referee{index}@example.com")),
        notes: None,
    })
}

pub async fn open_store(path: &Path) -> (SqliteKeyValueStore, Pool<Sqlite>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .expect("sqlite database");

    let store = SqliteKeyValueStore::new(pool.clone());
    store.initialize().await.expect("kv_store schema");
    (store, pool)
}

/// Gateway double with a fixed outcome and a call counter.
pub struct CountingGateway {
    ok: bool,
    calls: AtomicU32,
}

impl CountingGateway {
    pub fn succeeding() -> Self {
        Self {
            ok: true,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            ok: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.ok {
            Ok(())
        } else {
            Err(AppError::Network("remote call rejected".to_string()))
        }
    }
}

#[async_trait]
impl ReferralGateway for CountingGateway {
    async fn create_referral(&self, _draft: &ReferralDraft) -> Result<(), AppError> {
        self.outcome()
    }

    async fn update_status(
        &self,
        _referral_id: &str,
        _status: ReferralStatus,
    ) -> Result<(), AppError> {
        self.outcome()
    }
}
