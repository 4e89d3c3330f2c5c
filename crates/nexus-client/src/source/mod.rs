//! Data sources feeding the domain stores.
//!
//! Stores never generate data themselves; they call a [`DataSource`] and
//! capture its outcome as state.  The shipped implementation is
//! [`SimulatedSource`], which fabricates values in-process behind an
//! artificial latency.  A real HTTP provider would implement the same trait.

mod simulated;

use async_trait::async_trait;

use nexus_shared::{
    CryptoData, CryptoHistoryItem, FetchError, NewsArticle, WeatherData, WeatherHistoryItem,
};

pub use simulated::{round_dp, SimulatedSource};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Latest figures for one coin.
    async fn crypto_snapshot(&self, id: &str) -> Result<CryptoData, FetchError>;

    /// Daily price points for one coin, ascending by date.
    async fn crypto_history(&self, id: &str) -> Result<Vec<CryptoHistoryItem>, FetchError>;

    /// Current conditions for a city, keyed by slug.
    async fn weather_snapshot(&self, city_key: &str) -> Result<WeatherData, FetchError>;

    /// Daily weather points for a city, ascending by date.
    async fn weather_history(&self, city_key: &str)
        -> Result<Vec<WeatherHistoryItem>, FetchError>;

    /// Latest headlines, newest first.
    async fn news(&self) -> Result<Vec<NewsArticle>, FetchError>;
}
