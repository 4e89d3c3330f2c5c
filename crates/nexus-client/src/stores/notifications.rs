use chrono::Utc;
use tokio::sync::Mutex;

use nexus_shared::constants::MAX_NOTIFICATIONS;
use nexus_shared::{
    NewNotification, Notification, NotificationPreferences, NotificationPreferencesPatch,
};

use crate::events::{DashboardEvent, EventBus};
use crate::persist::{load_or_default, save_or_warn, SharedDatabase};

const STORE: &str = "notifications";

#[derive(Default)]
struct NotificationState {
    /// Newest first, at most `MAX_NOTIFICATIONS` long.
    items: Vec<Notification>,
    preferences: NotificationPreferences,
    last_id: i64,
}

impl NotificationState {
    fn unread(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Millisecond timestamp, bumped past the last issued id so ids stay
    /// unique and increasing within a burst.
    fn next_id(&mut self) -> String {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }
}

/// Bounded, persisted notification log.
pub struct NotificationStore {
    state: Mutex<NotificationState>,
    db: SharedDatabase,
    events: EventBus,
}

impl NotificationStore {
    pub fn load(db: SharedDatabase, events: EventBus) -> Self {
        let mut items: Vec<Notification> =
            load_or_default(&db, &events, STORE, |db| db.load_notifications());
        items.truncate(MAX_NOTIFICATIONS);

        let last_id = items
            .iter()
            .filter_map(|n| n.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        tracing::debug!(count = items.len(), "Notification log restored");
        Self {
            state: Mutex::new(NotificationState {
                items,
                last_id,
                ..Default::default()
            }),
            db,
            events,
        }
    }

    /// Log a notification, evicting the oldest entry past the cap.
    pub async fn add(&self, payload: NewNotification) -> Notification {
        let mut state = self.state.lock().await;

        let id = state.next_id();
        let notification = payload.into_notification(id);
        state.items.insert(0, notification.clone());
        state.items.truncate(MAX_NOTIFICATIONS);

        self.persist(&state);
        self.events.emit(DashboardEvent::Toast {
            title: notification.title.clone(),
            description: notification.message.clone(),
        });
        self.publish_unread(&state);

        tracing::debug!(id = %notification.id, kind = ?notification.kind, "Notification added");
        notification
    }

    pub async fn mark_all_as_read(&self) {
        let mut state = self.state.lock().await;
        for item in state.items.iter_mut() {
            item.read = true;
        }
        self.persist(&state);
        self.publish_unread(&state);
    }

    /// Returns `false` (and writes nothing) when `id` is not in the log.
    pub async fn mark_as_read(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        item.read = true;
        self.persist(&state);
        self.publish_unread(&state);
        true
    }

    /// Returns `false` (and writes nothing) when `id` is not in the log.
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(index) = state.items.iter().position(|n| n.id == id) else {
            return false;
        };
        state.items.remove(index);
        self.persist(&state);
        self.publish_unread(&state);
        true
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.items.clear();
        self.persist(&state);
        self.publish_unread(&state);
    }

    pub async fn items(&self) -> Vec<Notification> {
        self.state.lock().await.items.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.state.lock().await.unread()
    }

    pub async fn preferences(&self) -> NotificationPreferences {
        self.state.lock().await.preferences
    }

    // Preferences live in memory only.
    pub async fn update_preferences(
        &self,
        patch: NotificationPreferencesPatch,
    ) -> NotificationPreferences {
        let mut state = self.state.lock().await;
        state.preferences.apply(patch);
        state.preferences
    }

    fn persist(&self, state: &NotificationState) {
        save_or_warn(&self.db, &self.events, STORE, |db| {
            db.save_notifications(&state.items)
        });
    }

    fn publish_unread(&self, state: &NotificationState) {
        self.events.emit(DashboardEvent::UnreadChanged {
            unread: state.unread(),
        });
    }
}
