use crate::application::ports::{ConnectivityEvent, ConnectivityProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// In-process connectivity signal: a boolean flag plus a broadcast of
/// transitions. The embedding shell flips the flag from whatever
/// platform signal it has (socket probe, OS callback, manual toggle).
pub struct ConnectivityMonitor {
    online: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Update the link state. Emits an event only on actual transitions;
    /// repeated reports of the same state are silent.
    pub fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }

        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };

        tracing::info!(target: "connectivity", online, "connectivity changed");
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl ConnectivityProvider for ConnectivityMonitor {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transitions_emit_exactly_once() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        monitor.set_online(true);
        monitor.set_online(false);

        assert_eq!(rx.recv().await.unwrap(), ConnectivityEvent::Online);
        assert_eq!(rx.recv().await.unwrap(), ConnectivityEvent::Offline);
        assert!(rx.try_recv().is_err());
        assert!(!monitor.is_online().await);
    }
}
