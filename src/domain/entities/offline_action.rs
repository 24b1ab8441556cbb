use crate::domain::value_objects::{ActionId, ActionPayload};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A pending write operation awaiting confirmation by the remote system.
///
/// Created when a write fails for lack of connectivity, mutated only by
/// the replay routine (retry increments) and removed exactly once: on
/// successful replay or when the retry ceiling is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineAction {
    pub id: ActionId,
    #[serde(flatten)]
    pub payload: ActionPayload,
    /// Creation time in milliseconds since epoch. Ordering and display
    /// only, never expiry.
    pub timestamp: i64,
    pub retries: u32,
}

impl OfflineAction {
    pub fn new(payload: ActionPayload) -> Self {
        Self {
            id: ActionId::generate(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Whether `retries` has reached the drop ceiling.
    pub fn retries_exhausted(&self, ceiling: u32) -> bool {
        self.retries >= ceiling
    }
}
