use nexus_shared::constants::NOTIFICATIONS_KEY;
use nexus_shared::Notification;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Load the persisted notification log, newest first as it was written.
    pub fn load_notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.load_json(NOTIFICATIONS_KEY)?.unwrap_or_default())
    }

    pub fn save_notifications(&self, items: &[Notification]) -> Result<()> {
        self.save_json(NOTIFICATIONS_KEY, items)
    }
}
