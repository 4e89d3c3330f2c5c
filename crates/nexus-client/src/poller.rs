//! Periodic snapshot refresh.
//!
//! Crypto and weather snapshots are re-fetched on one interval, headlines on
//! a slower one.  The first round runs immediately on start.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use nexus_shared::constants::{NEWS_POLL_SECS, SNAPSHOT_POLL_SECS, TRACKED_CITIES, TRACKED_CRYPTOS};

use crate::stores::{CryptoStore, NewsStore, WeatherStore};

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub snapshot_interval: Duration,
    pub news_interval: Duration,
    pub cryptos: Vec<String>,
    pub cities: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: Duration::from_secs(SNAPSHOT_POLL_SECS),
            news_interval: Duration::from_secs(NEWS_POLL_SECS),
            cryptos: TRACKED_CRYPTOS.iter().map(|s| s.to_string()).collect(),
            cities: TRACKED_CITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Run `round` now and then every `period` until `cancel` fires.
///
/// The in-flight round observes the same token, so cancellation also stops
/// a pending fetch.
async fn every<F, Fut>(name: &'static str, period: Duration, cancel: CancellationToken, mut round: F)
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => round(cancel.clone()).await,
        }
    }
    tracing::debug!(poller = name, "Poller stopped");
}

pub fn spawn_pollers(
    crypto: Arc<CryptoStore>,
    weather: Arc<WeatherStore>,
    news: Arc<NewsStore>,
    config: PollConfig,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let cryptos = Arc::new(config.cryptos);
    let cities = Arc::new(config.cities);

    let crypto_task = every("crypto", config.snapshot_interval, cancel.clone(), move |cancel| {
        let crypto = crypto.clone();
        let ids = cryptos.clone();
        async move {
            join_all(ids.iter().map(|id| crypto.fetch_snapshot(id, &cancel))).await;
        }
    });

    let weather_task = every("weather", config.snapshot_interval, cancel.clone(), move |cancel| {
        let weather = weather.clone();
        let cities = cities.clone();
        async move {
            join_all(cities.iter().map(|city| weather.fetch_snapshot(city, &cancel))).await;
        }
    });

    let news_task = every("news", config.news_interval, cancel.clone(), move |cancel| {
        let news = news.clone();
        async move {
            news.fetch(&cancel).await;
        }
    });

    vec![
        tokio::spawn(crypto_task),
        tokio::spawn(weather_task),
        tokio::spawn(news_task),
    ]
}

#[cfg(test)]
mod tests {
    use nexus_shared::LoadStatus;

    use super::*;
    use crate::source::{DataSource, SimulatedSource};

    fn stores() -> (Arc<CryptoStore>, Arc<WeatherStore>, Arc<NewsStore>) {
        let source: Arc<dyn DataSource> = Arc::new(SimulatedSource::seeded(21));
        (
            Arc::new(CryptoStore::new(source.clone())),
            Arc::new(WeatherStore::new(source.clone())),
            Arc::new(NewsStore::new(source)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_round_runs_immediately() {
        let (crypto, weather, news) = stores();
        let cancel = CancellationToken::new();
        let tasks = spawn_pollers(
            crypto.clone(),
            weather.clone(),
            news.clone(),
            PollConfig::default(),
            &cancel,
        );

        // Past the simulated latency but well before the first interval.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(crypto.snapshots().await.len(), 3);
        assert_eq!(weather.snapshots().await.len(), 3);
        assert_eq!(news.articles().await.len(), 5);

        cancel.cancel();
        join_all(tasks).await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_inflight_round() {
        let (crypto, weather, news) = stores();
        let cancel = CancellationToken::new();
        let tasks = spawn_pollers(crypto.clone(), weather, news, PollConfig::default(), &cancel);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(crypto.overall_status().await, LoadStatus::Loading);
        cancel.cancel();
        join_all(tasks).await;

        assert!(crypto.snapshots().await.is_empty());
        assert_eq!(crypto.overall_status().await, LoadStatus::Idle);
    }
}
