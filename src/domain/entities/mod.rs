pub mod offline_action;

pub use offline_action::OfflineAction;
