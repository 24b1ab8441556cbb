pub mod action_id;
pub mod action_payload;
pub mod referral_status;

pub use action_id::ActionId;
pub use action_payload::{ActionPayload, ReferralDraft};
pub use referral_status::ReferralStatus;
