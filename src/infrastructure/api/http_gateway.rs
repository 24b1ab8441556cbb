use crate::application::ports::ReferralGateway;
use crate::domain::value_objects::{ReferralDraft, ReferralStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Referral API over HTTP. Only the status code is consumed; response
/// bodies are discarded.
pub struct HttpReferralGateway {
    client: Client,
    base_url: String,
}

impl HttpReferralGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ReferralGateway for HttpReferralGateway {
    async fn create_referral(&self, draft: &ReferralDraft) -> Result<(), AppError> {
        self.client
            .post(self.endpoint("/api/referrals"))
            .json(draft)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn update_status(
        &self,
        referral_id: &str,
        status: ReferralStatus,
    ) -> Result<(), AppError> {
        self.client
            .patch(self.endpoint(&format!("/api/referrals/{referral_id}")))
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let gateway = HttpReferralGateway::new("http://localhost:3000/");
        assert_eq!(
            gateway.endpoint("/api/referrals"),
            "http://localhost:3000/api/referrals"
        );
    }
}
