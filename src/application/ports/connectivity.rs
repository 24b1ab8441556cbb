use async_trait::async_trait;
use tokio::sync::broadcast;

/// Online/offline transition of the client's network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// Connectivity signal consumed to decide *when* to replay; the queue's
/// own operations only read the boolean.
#[async_trait]
pub trait ConnectivityProvider: Send + Sync {
    async fn is_online(&self) -> bool;
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent>;
}
