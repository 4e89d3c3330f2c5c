//! Dashboard event channel.
//!
//! Stores and background tasks publish [`DashboardEvent`]s on a tokio
//! broadcast channel.  Views subscribe to drive toasts, the unread badge and
//! storage warnings without polling.

use serde::Serialize;
use tokio::sync::broadcast;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DashboardEvent {
    /// Transient popup for an alert that was just logged.
    Toast { title: String, description: String },

    /// The unread notification count after a log mutation.
    UnreadChanged { unread: usize },

    /// A simulated price tick was applied to the crypto store.
    PriceTick { id: String, price: f64 },

    /// Persisted state could not be read or written; the store carried on
    /// with its in-memory (or default) state.
    PersistenceWarning { store: String, message: String },
}

impl DashboardEvent {
    /// Matches the `event` field of the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toast { .. } => "toast",
            Self::UnreadChanged { .. } => "unread-changed",
            Self::PriceTick { .. } => "price-tick",
            Self::PersistenceWarning { .. } => "persistence-warning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: DashboardEvent) {
        let name = event.name();
        // No subscribers is normal while nothing is rendering.
        if self.tx.send(event).is_err() {
            tracing::trace!(event = name, "No subscribers for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(DashboardEvent::UnreadChanged { unread: 3 });
        assert_eq!(
            rx.recv().await.unwrap(),
            DashboardEvent::UnreadChanged { unread: 3 }
        );
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(DashboardEvent::PriceTick {
            id: "bitcoin".into(),
            price: 1.0,
        });
    }

    #[test]
    fn event_wire_format() {
        let json = serde_json::to_value(DashboardEvent::Toast {
            title: "Bitcoin Alert".into(),
            description: "up".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "toast");
        assert_eq!(json["title"], "Bitcoin Alert");
    }

    #[test]
    fn event_field_matches_name() {
        let events = [
            DashboardEvent::Toast {
                title: "t".into(),
                description: "d".into(),
            },
            DashboardEvent::UnreadChanged { unread: 1 },
            DashboardEvent::PriceTick {
                id: "bitcoin".into(),
                price: 1.0,
            },
            DashboardEvent::PersistenceWarning {
                store: "notifications".into(),
                message: "disk full".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
        let json = serde_json::to_value(DashboardEvent::UnreadChanged { unread: 2 }).unwrap();
        assert_eq!(json["event"], "unread-changed");
    }
}
