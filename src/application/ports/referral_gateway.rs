use crate::domain::value_objects::{ReferralDraft, ReferralStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Remote referral API. The queue only consumes success or failure; the
/// response body is discarded.
#[async_trait]
pub trait ReferralGateway: Send + Sync {
    async fn create_referral(&self, draft: &ReferralDraft) -> Result<(), AppError>;
    async fn update_status(
        &self,
        referral_id: &str,
        status: ReferralStatus,
    ) -> Result<(), AppError>;
}
