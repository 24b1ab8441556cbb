pub mod connectivity;
pub mod key_value_store;
pub mod referral_gateway;

pub use connectivity::{ConnectivityEvent, ConnectivityProvider};
pub use key_value_store::{KeyValueStore, OFFLINE_QUEUE_KEY};
pub use referral_gateway::ReferralGateway;
