//! Dashboard state containers.
//!
//! Each store owns its own lock; none of them reach into another.  Fetching
//! stores record a status per target (see [`crate::status`]), persisting
//! stores write through [`crate::persist`] after every mutation.

mod crypto;
mod domain;
mod news;
mod notifications;
mod preferences;
mod weather;

pub use crypto::{blend_price_change, CryptoStore};
pub use domain::Dated;
pub use news::NewsStore;
pub use notifications::NotificationStore;
pub use preferences::PreferencesStore;
pub use weather::WeatherStore;
