use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use nexus_shared::{CryptoData, CryptoHistoryItem, LoadStatus};

use super::domain::DomainStore;
use crate::source::{round_dp, DataSource};
use crate::status::{FetchKind, FetchTarget, TargetStatus};

/// Fold a price tick into the smoothed change figure.
///
/// The percent move from `prev_price` to `new_price` is rounded to two
/// decimals, scaled down by ten and added onto `prev_change`.  `None` when
/// the previous price cannot anchor a percentage.
pub fn blend_price_change(prev_price: f64, prev_change: f64, new_price: f64) -> Option<f64> {
    if !(prev_price.is_finite() && prev_price > 0.0 && new_price.is_finite()) {
        return None;
    }
    let delta_pct = round_dp((new_price - prev_price) / prev_price * 100.0, 2);
    Some(prev_change + delta_pct / 10.0)
}

pub struct CryptoStore {
    inner: DomainStore<CryptoData, CryptoHistoryItem>,
    source: Arc<dyn DataSource>,
}

impl CryptoStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            inner: DomainStore::new("crypto"),
            source,
        }
    }

    pub async fn fetch_snapshot(&self, id: &str, cancel: &CancellationToken) -> LoadStatus {
        self.inner
            .load_snapshot(id, cancel, self.source.crypto_snapshot(id))
            .await
    }

    pub async fn fetch_history(&self, id: &str, cancel: &CancellationToken) -> LoadStatus {
        self.inner
            .load_history(id, cancel, self.source.crypto_history(id))
            .await
    }

    /// Apply a pushed price to a coin already in the store.
    ///
    /// Returns the new 24h change figure, or `None` when the tick was
    /// ignored (unknown coin or unusable previous price).  Load status is
    /// not touched.
    pub async fn apply_tick(&self, id: &str, new_price: f64) -> Option<f64> {
        self.inner
            .update(id, |coin| {
                let change = blend_price_change(coin.price, coin.price_change_24h, new_price)?;
                coin.price = new_price;
                coin.price_change_24h = change;
                Some(change)
            })
            .await
            .flatten()
    }

    pub async fn snapshot(&self, id: &str) -> Option<CryptoData> {
        self.inner.get(id).await
    }

    pub async fn snapshots(&self) -> HashMap<String, CryptoData> {
        self.inner.all().await
    }

    pub async fn history(&self, id: &str) -> Vec<CryptoHistoryItem> {
        self.inner.history(id).await
    }

    pub async fn status(&self, kind: FetchKind, id: &str) -> TargetStatus {
        let target = FetchTarget { kind, key: id.to_string() };
        self.inner.status(&target).await
    }

    pub async fn statuses(&self, kind: FetchKind) -> HashMap<String, TargetStatus> {
        self.inner.statuses(kind).await
    }

    pub async fn overall_status(&self) -> LoadStatus {
        self.inner.overall_status().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use nexus_shared::{FetchError, NewsArticle, WeatherData, WeatherHistoryItem};

    use super::*;
    use crate::source::SimulatedSource;

    fn store() -> CryptoStore {
        let source = SimulatedSource::seeded(42).with_delays(Duration::ZERO, Duration::ZERO);
        CryptoStore::new(Arc::new(source))
    }

    #[test]
    fn test_blend_price_change() {
        // +1% -> 0.1 accumulated
        let change = blend_price_change(100.0, 2.0, 101.0).unwrap();
        assert!((change - 2.1).abs() < 1e-9);

        // +0.333..% rounds to 0.33 -> 0.033
        let change = blend_price_change(300.0, 0.0, 301.0).unwrap();
        assert!((change - 0.033).abs() < 1e-9);

        let change = blend_price_change(50.0, -1.0, 49.0).unwrap();
        assert!((change + 1.2).abs() < 1e-9);

        assert_eq!(blend_price_change(0.0, 1.0, 10.0), None);
        assert_eq!(blend_price_change(10.0, 1.0, f64::NAN), None);
    }

    #[tokio::test]
    async fn fetch_then_tick_end_to_end() {
        let store = store();
        let cancel = CancellationToken::new();

        let status = store.fetch_snapshot("bitcoin", &cancel).await;
        assert_eq!(status, LoadStatus::Succeeded);

        let before = store.snapshot("bitcoin").await.unwrap();
        assert!(before.price.is_finite() && before.price > 0.0);

        let new_price = before.price * 1.005;
        let change = store.apply_tick("bitcoin", new_price).await.unwrap();

        let after = store.snapshot("bitcoin").await.unwrap();
        assert_eq!(after.price, new_price);
        assert!((after.price_change_24h - (before.price_change_24h + 0.05)).abs() < 1e-9);
        assert_eq!(after.price_change_24h, change);
        assert_eq!(store.overall_status().await, LoadStatus::Succeeded);
    }

    #[tokio::test]
    async fn tick_for_unknown_coin_is_ignored() {
        let store = store();
        assert_eq!(store.apply_tick("bitcoin", 1.0).await, None);
        assert!(store.snapshot("bitcoin").await.is_none());
    }

    #[tokio::test]
    async fn failed_fetch_is_captured_per_key() {
        let store = store();
        let cancel = CancellationToken::new();

        store.fetch_snapshot("ethereum", &cancel).await;
        let status = store.fetch_snapshot("dogecoin", &cancel).await;
        assert_eq!(status, LoadStatus::Failed);

        let doge = store.status(FetchKind::Snapshot, "dogecoin").await;
        assert_eq!(doge.error.as_deref(), Some("Failed to fetch cryptocurrency data"));

        let eth = store.status(FetchKind::Snapshot, "ethereum").await;
        assert_eq!(eth.status, LoadStatus::Succeeded);
        assert!(store.snapshot("ethereum").await.is_some());
        assert_eq!(store.overall_status().await, LoadStatus::Failed);

        // The next successful poll clears the store-wide banner; the failed
        // key keeps its own error.
        store.fetch_snapshot("ethereum", &cancel).await;
        assert_eq!(store.overall_status().await, LoadStatus::Succeeded);
        let doge = store.status(FetchKind::Snapshot, "dogecoin").await;
        assert_eq!(doge.status, LoadStatus::Failed);
    }

    #[tokio::test]
    async fn history_replaces_previous_series() {
        let store = store();
        let cancel = CancellationToken::new();

        store.fetch_history("cardano", &cancel).await;
        let first = store.history("cardano").await;
        assert_eq!(first.len(), 7);

        store.fetch_history("cardano", &cancel).await;
        let second = store.history("cardano").await;
        assert_eq!(second.len(), 7);
        assert!(second.windows(2).all(|w| w[0].date <= w[1].date));
    }

    /// Returns history in reverse order, to check the store sorts it.
    struct ReversedHistory;

    #[async_trait]
    impl DataSource for ReversedHistory {
        async fn crypto_snapshot(&self, id: &str) -> Result<CryptoData, FetchError> {
            Err(FetchError::Unavailable(format!("no snapshot for {id}")))
        }

        async fn crypto_history(&self, _id: &str) -> Result<Vec<CryptoHistoryItem>, FetchError> {
            let now = Utc::now();
            Ok((0..3)
                .map(|i| CryptoHistoryItem {
                    date: now - ChronoDuration::days(i),
                    price: i as f64,
                })
                .collect())
        }

        async fn weather_snapshot(&self, key: &str) -> Result<WeatherData, FetchError> {
            Err(FetchError::Unavailable(format!("no weather for {key}")))
        }

        async fn weather_history(&self, key: &str) -> Result<Vec<WeatherHistoryItem>, FetchError> {
            Err(FetchError::Unavailable(format!("no weather for {key}")))
        }

        async fn news(&self) -> Result<Vec<NewsArticle>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn history_is_sorted_ascending() {
        let store = CryptoStore::new(Arc::new(ReversedHistory));
        store
            .fetch_history("bitcoin", &CancellationToken::new())
            .await;

        let prices: Vec<f64> = store.history("bitcoin").await.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![2.0, 1.0, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_applies_nothing() {
        let source = SimulatedSource::seeded(1);
        let store = Arc::new(CryptoStore::new(Arc::new(source)));
        let cancel = CancellationToken::new();

        let task = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { store.fetch_snapshot("bitcoin", &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.overall_status().await, LoadStatus::Loading);
        cancel.cancel();

        assert_eq!(task.await.unwrap(), LoadStatus::Idle);
        assert!(store.snapshot("bitcoin").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_overlapping_fetch_applies() {
        let store = Arc::new(store_with_delay());
        let cancel = CancellationToken::new();

        let first = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { store.fetch_snapshot("bitcoin", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = store.fetch_snapshot("bitcoin", &cancel).await;

        // The first call resolves before the second but is superseded by it.
        assert_eq!(first.await.unwrap(), LoadStatus::Loading);
        assert_eq!(second, LoadStatus::Succeeded);
        assert!(store.snapshot("bitcoin").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_history_fetch_returns_to_idle() {
        let store = Arc::new(store_with_delay());

        let task = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .fetch_history("bitcoin", &CancellationToken::new())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.overall_status().await, LoadStatus::Loading);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(store.status(FetchKind::History, "bitcoin").await.status, LoadStatus::Idle);
        assert_eq!(store.overall_status().await, LoadStatus::Idle);
        assert!(store.history("bitcoin").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_newer_fetch_lets_running_poll_apply() {
        let store = Arc::new(store_with_delay());
        let cancel = CancellationToken::new();

        let poll = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { store.fetch_snapshot("bitcoin", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let manual = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { store.fetch_snapshot("bitcoin", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        manual.abort();
        assert!(manual.await.unwrap_err().is_cancelled());
        assert_eq!(store.status(FetchKind::Snapshot, "bitcoin").await.status, LoadStatus::Loading);

        assert_eq!(poll.await.unwrap(), LoadStatus::Succeeded);
        assert!(store.snapshot("bitcoin").await.is_some());
        assert_eq!(store.overall_status().await, LoadStatus::Succeeded);
    }

    fn store_with_delay() -> CryptoStore {
        let source = SimulatedSource::seeded(3)
            .with_delays(Duration::from_millis(800), Duration::from_millis(1000));
        CryptoStore::new(Arc::new(source))
    }
}
