use crate::shared::error::AppError;
use async_trait::async_trait;

/// Storage key under which the serialized offline queue lives, distinct
/// from all other persisted state.
pub const OFFLINE_QUEUE_KEY: &str = "referra.offline_queue";

/// Durable client-side key-value store the queue persists into.
///
/// Injected rather than reached for globally so tests can substitute an
/// in-memory fake.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}
