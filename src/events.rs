//! Session lifecycle events for the presentation layer.
//!
//! Events go out after the SessionStore has notified its observers. Delivery is
//! through a broadcast channel, so a receiver that lags loses the oldest events
//! rather than blocking the session.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::content::ContentId;
use crate::profile::UserProfile;
use crate::wallet::ConnectionState;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "kebab-case")]
pub enum SessionEvent {
    WalletConnected {
        state: ConnectionState,
    },
    WalletConnectFailed {
        error: String,
    },
    WalletDisconnected,
    ProfileSaved {
        profile: UserProfile,
        #[serde(rename = "contentId")]
        content_id: ContentId,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::WalletConnected { .. } => "wallet-connected",
            SessionEvent::WalletConnectFailed { .. } => "wallet-connect-failed",
            SessionEvent::WalletDisconnected => "wallet-disconnected",
            SessionEvent::ProfileSaved { .. } => "profile-saved",
        }
    }
}

/// Broadcast sender for [`SessionEvent`]s. Clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self { Self::new() }
}

impl EventBus {
    pub fn new() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Send to current receivers; returns how many there were.
    pub fn emit(&self, event: SessionEvent) -> usize {
        let name = event.name();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(event = name, receivers = delivered, "session event emitted");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn receivers_get_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(bus.emit(SessionEvent::WalletDisconnected), 1);
        bus.emit(SessionEvent::WalletConnectFailed { error: "nope".into() });

        assert_eq!(rx.recv().await.unwrap().name(), "wallet-disconnected");
        assert_eq!(rx.recv().await.unwrap().name(), "wallet-connect-failed");
    }

    #[test]
    fn emit_without_receivers_is_fine() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(SessionEvent::WalletDisconnected), 0);
    }

    #[test]
    fn events_serialize_with_kebab_names() {
        let value = serde_json::to_value(SessionEvent::WalletDisconnected).unwrap();
        assert_eq!(value, json!({"event": "wallet-disconnected"}));
        let value = serde_json::to_value(SessionEvent::WalletConnected { state: ConnectionState::Disconnected }).unwrap();
        assert_eq!(value, json!({"event": "wallet-connected", "detail": {"state": {"connected": false}}}));
    }
}
