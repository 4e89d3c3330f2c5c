use tokio::sync::Mutex;

use nexus_shared::{FavoriteItem, FavoriteKind};

use crate::events::EventBus;
use crate::persist::{load_or_default, save_or_warn, SharedDatabase};

const STORE: &str = "preferences";

/// The user's favorite coins and cities, persisted after every change.
pub struct PreferencesStore {
    favorites: Mutex<Vec<FavoriteItem>>,
    db: SharedDatabase,
    events: EventBus,
}

impl PreferencesStore {
    /// Restore favorites from `db`. Missing or unreadable data starts empty.
    pub fn load(db: SharedDatabase, events: EventBus) -> Self {
        let favorites = load_or_default(&db, &events, STORE, |db| db.load_favorites());
        tracing::debug!(count = favorites.len(), "Favorites restored");
        Self {
            favorites: Mutex::new(favorites),
            db,
            events,
        }
    }

    /// Add `item` if no favorite with its `(id, kind)` exists, otherwise
    /// remove that favorite. Returns whether the item is now a favorite.
    pub async fn toggle_favorite(&self, item: FavoriteItem) -> bool {
        let mut favorites = self.favorites.lock().await;

        let added = match favorites.iter().position(|f| f.matches(&item.id, item.kind)) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(item);
                true
            }
        };

        save_or_warn(&self.db, &self.events, STORE, |db| db.save_favorites(&favorites));
        added
    }

    pub async fn clear_favorites(&self) {
        let mut favorites = self.favorites.lock().await;
        favorites.clear();
        save_or_warn(&self.db, &self.events, STORE, |db| db.clear_favorites());
    }

    pub async fn favorites(&self) -> Vec<FavoriteItem> {
        self.favorites.lock().await.clone()
    }

    pub async fn is_favorite(&self, id: &str, kind: FavoriteKind) -> bool {
        self.favorites.lock().await.iter().any(|f| f.matches(id, kind))
    }
}
