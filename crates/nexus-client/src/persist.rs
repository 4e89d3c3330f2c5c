//! Glue between the stores and the shared [`Database`].
//!
//! Persistence failures never reach the caller of a store action: they are
//! logged, published as [`DashboardEvent::PersistenceWarning`], and the
//! store keeps going with its in-memory state (or the default on load).

use std::sync::{Arc, Mutex};

use nexus_store::Database;

use crate::events::{DashboardEvent, EventBus};

/// The single SQLite connection shared by every persisting store.
pub type SharedDatabase = Arc<Mutex<Database>>;

pub fn shared(db: Database) -> SharedDatabase {
    Arc::new(Mutex::new(db))
}

fn with_db<T>(db: &SharedDatabase, op: impl FnOnce(&Database) -> nexus_store::Result<T>) -> Result<T, String> {
    let guard = db.lock().map_err(|e| format!("Lock poisoned: {e}"))?;
    op(&guard).map_err(|e| e.to_string())
}

fn warn(events: &EventBus, store: &str, message: String) {
    events.emit(DashboardEvent::PersistenceWarning {
        store: store.to_string(),
        message,
    });
}

/// Load persisted state, falling back to `T::default()` on any failure.
pub(crate) fn load_or_default<T: Default>(
    db: &SharedDatabase,
    events: &EventBus,
    store: &str,
    op: impl FnOnce(&Database) -> nexus_store::Result<T>,
) -> T {
    match with_db(db, op) {
        Ok(value) => value,
        Err(message) => {
            tracing::warn!(store, error = %message, "Failed to load persisted state, starting empty");
            warn(events, store, message);
            T::default()
        }
    }
}

/// Write state, reporting but swallowing any failure.
pub(crate) fn save_or_warn(
    db: &SharedDatabase,
    events: &EventBus,
    store: &str,
    op: impl FnOnce(&Database) -> nexus_store::Result<()>,
) {
    if let Err(message) = with_db(db, op) {
        tracing::warn!(store, error = %message, "Failed to persist state");
        warn(events, store, message);
    }
}
