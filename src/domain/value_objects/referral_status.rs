use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage of a referral: submitted → contacted → quoted → sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Submitted,
    Contacted,
    Quoted,
    Sold,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Submitted => "submitted",
            ReferralStatus::Contacted => "contacted",
            ReferralStatus::Quoted => "quoted",
            ReferralStatus::Sold => "sold",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "submitted" => Ok(ReferralStatus::Submitted),
            "contacted" => Ok(ReferralStatus::Contacted),
            "quoted" => Ok(ReferralStatus::Quoted),
            "sold" => Ok(ReferralStatus::Sold),
            other => Err(format!("Unknown referral status: {other}")),
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
