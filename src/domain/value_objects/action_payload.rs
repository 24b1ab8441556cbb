use serde::{Deserialize, Serialize};

use super::referral_status::ReferralStatus;

/// Fields a representative fills in when submitting a referral.
///
/// The queue performs no schema validation on these fields; the
/// submitting layer is responsible for shaping them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralDraft {
    pub referrer_id: String,
    pub referee_name: String,
    pub referee_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referee_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The write operation a queued action carries.
///
/// One variant per remote operation, so replay dispatch is exhaustive
/// instead of a runtime tag switch. Serialized as `{"type": ..., "data":
/// ...}` under the action record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActionPayload {
    CreateReferral(ReferralDraft),
    UpdateStatus {
        referral_id: String,
        status: ReferralStatus,
    },
}

impl ActionPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionPayload::CreateReferral(_) => "create_referral",
            ActionPayload::UpdateStatus { .. } => "update_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_referral_serializes_with_tag_and_data() {
        let payload = ActionPayload::CreateReferral(ReferralDraft {
            referrer_id: "rep-7".into(),
            referee_name: "Ada Lovelace".into(),
            referee_phone: "555-0100".into(),
            referee_email: None,
            notes: Some("met at expo".into()),
        });

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "create_referral");
        assert_eq!(json["data"]["referee_name"], "Ada Lovelace");
        assert!(json["data"].get("referee_email").is_none());
    }

    #[test]
    fn update_status_round_trips() {
        let payload = ActionPayload::UpdateStatus {
            referral_id: "ref-42".into(),
            status: ReferralStatus::Quoted,
        };

        let json = serde_json::to_string(&payload).unwrap();
        let back: ActionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn unknown_tag_fails_to_decode() {
        let raw = r#"{"type":"delete_referral","data":{"referral_id":"ref-1"}}"#;
        assert!(serde_json::from_str::<ActionPayload>(raw).is_err());
    }
}
