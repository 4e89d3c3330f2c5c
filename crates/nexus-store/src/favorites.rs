use nexus_shared::constants::FAVORITES_KEY;
use nexus_shared::FavoriteItem;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Load the persisted favorites list. Absent entry means no favorites.
    pub fn load_favorites(&self) -> Result<Vec<FavoriteItem>> {
        Ok(self.load_json(FAVORITES_KEY)?.unwrap_or_default())
    }

    pub fn save_favorites(&self, favorites: &[FavoriteItem]) -> Result<()> {
        self.save_json(FAVORITES_KEY, favorites)
    }

    // Clearing drops the entry instead of writing an empty list.
    pub fn clear_favorites(&self) -> Result<()> {
        self.remove_entry(FAVORITES_KEY)?;
        Ok(())
    }
}
