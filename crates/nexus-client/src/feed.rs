//! Simulated push feed.
//!
//! Stands in for a live market/weather stream: a welcome notification shortly
//! after start, a price tick every few seconds, and an occasional weather
//! alert.  All three run as tokio tasks stopped by one [`CancellationToken`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use nexus_shared::constants::{
    MAX_TICK_FLUCTUATION, PRICE_ALERT_PROBABILITY, PRICE_TICK_SECS, TRACKED_CITIES,
    TRACKED_CRYPTOS, WEATHER_ALERT_PROBABILITY, WEATHER_ALERT_SECS, WEATHER_EVENTS,
    WELCOME_DELAY_MS,
};
use nexus_shared::{city_slug, NewNotification, NotificationKind};

use crate::catalog;
use crate::events::{DashboardEvent, EventBus};
use crate::stores::{CryptoStore, NotificationStore};

/// Which price a tick perturbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceBasis {
    /// The catalogue reference price. Ticks jitter around a fixed level and
    /// do not follow the fetched market price.
    #[default]
    Fixed,
    /// The price currently held by the crypto store (reference price if the
    /// coin has not been fetched yet).
    Store,
}

impl FromStr for PriceBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "store" => Ok(Self::Store),
            other => Err(format!("unknown price basis '{other}' (expected 'fixed' or 'store')")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub welcome_delay: Duration,
    pub price_tick_interval: Duration,
    pub weather_alert_interval: Duration,
    pub price_alert_probability: f64,
    pub weather_alert_probability: f64,
    pub tracked_cryptos: Vec<String>,
    pub tracked_cities: Vec<String>,
    pub price_basis: PriceBasis,
    /// Seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            welcome_delay: Duration::from_millis(WELCOME_DELAY_MS),
            price_tick_interval: Duration::from_secs(PRICE_TICK_SECS),
            weather_alert_interval: Duration::from_secs(WEATHER_ALERT_SECS),
            price_alert_probability: PRICE_ALERT_PROBABILITY,
            weather_alert_probability: WEATHER_ALERT_PROBABILITY,
            tracked_cryptos: TRACKED_CRYPTOS.iter().map(|s| s.to_string()).collect(),
            tracked_cities: TRACKED_CITIES.iter().map(|s| s.to_string()).collect(),
            price_basis: PriceBasis::Fixed,
            seed: None,
        }
    }
}

impl FeedConfig {
    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// One simulated price movement.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub id: String,
    pub base: f64,
    /// Absolute move applied to `base`.
    pub change: f64,
}

impl PriceTick {
    pub fn new_price(&self) -> f64 {
        self.base + self.change
    }

    pub fn percent(&self) -> f64 {
        self.change.abs() / self.base * 100.0
    }
}

/// Move `base` by a uniform amount within ±1%.
pub fn roll_price_tick(rng: &mut impl Rng, id: &str, base: f64) -> PriceTick {
    let factor = rng.gen_range(-MAX_TICK_FLUCTUATION..MAX_TICK_FLUCTUATION);
    PriceTick {
        id: id.to_string(),
        base,
        change: factor * base,
    }
}

pub fn price_alert(tick: &PriceTick) -> NewNotification {
    let name = catalog::coin_display_name(&tick.id);
    let direction = if tick.change > 0.0 { "increased" } else { "decreased" };
    NewNotification::new(
        NotificationKind::PriceAlert,
        format!("{name} Alert"),
        format!("Price has {direction} by {:.2}% in the last hour", tick.percent()),
    )
    .with_action(format!("/crypto/{}", tick.id), format!("View {name} details"))
}

pub fn weather_alert(city: &str, event: &str) -> NewNotification {
    NewNotification::new(
        NotificationKind::WeatherAlert,
        format!("Weather Alert: {city}"),
        format!("{event} expected in the next 24 hours"),
    )
    .with_action(format!("/weather/{}", city_slug(city)), format!("View {city} weather"))
}

pub fn welcome_notification() -> NewNotification {
    NewNotification::new(
        NotificationKind::System,
        "Welcome to CryptoWeather Nexus",
        "Stay updated with real-time crypto prices and weather alerts.",
    )
}

/// Drives price ticks and alerts into the stores.
#[derive(Clone)]
pub struct FeedGenerator {
    crypto: Arc<CryptoStore>,
    notifications: Arc<NotificationStore>,
    events: EventBus,
    config: Arc<FeedConfig>,
}

impl FeedGenerator {
    pub fn new(
        crypto: Arc<CryptoStore>,
        notifications: Arc<NotificationStore>,
        events: EventBus,
        config: FeedConfig,
    ) -> Self {
        Self {
            crypto,
            notifications,
            events,
            config: Arc::new(config),
        }
    }

    /// Spawn the welcome, price and weather tasks. They exit when `cancel`
    /// fires; the welcome notification is skipped if that happens first.
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        tracing::info!(
            tick_secs = self.config.price_tick_interval.as_secs_f64(),
            alert_secs = self.config.weather_alert_interval.as_secs_f64(),
            basis = ?self.config.price_basis,
            "Starting simulated feed"
        );
        vec![
            tokio::spawn(self.clone().welcome(cancel.clone())),
            tokio::spawn(self.clone().price_loop(cancel.clone())),
            tokio::spawn(self.clone().weather_loop(cancel.clone())),
        ]
    }

    async fn welcome(self, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.welcome_delay) => {
                self.notifications.add(welcome_notification()).await;
            }
        }
    }

    async fn price_loop(self, cancel: CancellationToken) {
        let period = self.config.price_tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut rng = self.config.rng(1);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.price_tick(&mut rng).await,
            }
        }
        tracing::debug!("Price feed stopped");
    }

    async fn weather_loop(self, cancel: CancellationToken) {
        let period = self.config.weather_alert_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut rng = self.config.rng(2);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.weather_check(&mut rng).await,
            }
        }
        tracing::debug!("Weather alerts stopped");
    }

    /// Price a tick for `id` is rolled around. The store basis falls back to
    /// the catalogue price until the coin has been fetched.
    async fn reference_price(&self, id: &str) -> f64 {
        match self.config.price_basis {
            PriceBasis::Fixed => catalog::base_price(id),
            PriceBasis::Store => match self.crypto.snapshot(id).await {
                Some(coin) => coin.price,
                None => catalog::base_price(id),
            },
        }
    }

    async fn price_tick(&self, rng: &mut StdRng) {
        let Some(id) = self.config.tracked_cryptos.choose(rng).cloned() else {
            return;
        };

        let base = self.reference_price(&id).await;
        let tick = roll_price_tick(rng, &id, base);

        if self.crypto.apply_tick(&id, tick.new_price()).await.is_some() {
            self.events.emit(DashboardEvent::PriceTick {
                id: id.clone(),
                price: tick.new_price(),
            });
        }

        if rng.gen::<f64>() < self.config.price_alert_probability {
            self.notifications.add(price_alert(&tick)).await;
        }
    }

    async fn weather_check(&self, rng: &mut StdRng) {
        if rng.gen::<f64>() >= self.config.weather_alert_probability {
            return;
        }
        let (Some(city), Some(event)) = (
            self.config.tracked_cities.choose(rng),
            WEATHER_EVENTS.choose(rng),
        ) else {
            return;
        };
        self.notifications.add(weather_alert(city, event)).await;
    }
}

#[cfg(test)]
mod tests {
    use nexus_store::Database;

    use super::*;
    use crate::persist::shared;
    use crate::source::SimulatedSource;

    struct Harness {
        crypto: Arc<CryptoStore>,
        notifications: Arc<NotificationStore>,
        events: EventBus,
    }

    fn harness() -> Harness {
        let source = SimulatedSource::seeded(9).with_delays(Duration::ZERO, Duration::ZERO);
        let events = EventBus::default();
        let db = shared(Database::open_in_memory().unwrap());
        Harness {
            crypto: Arc::new(CryptoStore::new(Arc::new(source))),
            notifications: Arc::new(NotificationStore::load(db, events.clone())),
            events,
        }
    }

    fn feed(h: &Harness, config: FeedConfig) -> FeedGenerator {
        FeedGenerator::new(h.crypto.clone(), h.notifications.clone(), h.events.clone(), config)
    }

    fn quiet_config() -> FeedConfig {
        FeedConfig {
            price_alert_probability: 0.0,
            weather_alert_probability: 0.0,
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_price_alert_text() {
        let tick = PriceTick {
            id: "bitcoin".into(),
            base: 45_000.0,
            change: -225.0,
        };
        let n = price_alert(&tick);
        assert_eq!(n.kind, NotificationKind::PriceAlert);
        assert_eq!(n.title, "Bitcoin Alert");
        assert_eq!(n.message, "Price has decreased by 0.50% in the last hour");
        assert_eq!(n.action_url.as_deref(), Some("/crypto/bitcoin"));
        assert_eq!(n.action_label.as_deref(), Some("View Bitcoin details"));
    }

    #[test]
    fn test_weather_alert_text() {
        let n = weather_alert("New York", "Heat Wave");
        assert_eq!(n.title, "Weather Alert: New York");
        assert_eq!(n.message, "Heat Wave expected in the next 24 hours");
        assert_eq!(n.action_url.as_deref(), Some("/weather/new-york"));
        assert_eq!(n.action_label.as_deref(), Some("View New York weather"));
    }

    #[test]
    fn test_roll_stays_within_one_percent() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let tick = roll_price_tick(&mut rng, "ethereum", 3_000.0);
            assert!(tick.change.abs() <= 30.0);
            assert!(tick.percent() <= 1.0);
        }
    }

    #[test]
    fn test_price_basis_parse() {
        assert_eq!("Store".parse::<PriceBasis>(), Ok(PriceBasis::Store));
        assert_eq!("fixed".parse::<PriceBasis>(), Ok(PriceBasis::Fixed));
        assert!("market".parse::<PriceBasis>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_arrives_after_delay() {
        let h = harness();
        let cancel = CancellationToken::new();
        let _tasks = feed(&h, quiet_config()).spawn(&cancel);

        tokio::time::sleep(Duration::from_millis(1_900)).await;
        assert!(h.notifications.items().await.is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let items = h.notifications.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, NotificationKind::System);
        assert_eq!(items[0].title, "Welcome to CryptoWeather Nexus");
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_move_prices_around_reference() {
        let h = harness();
        let cancel = CancellationToken::new();
        for id in TRACKED_CRYPTOS {
            h.crypto.fetch_snapshot(id, &cancel).await;
        }
        let mut rx = h.events.subscribe();

        let config = FeedConfig {
            tracked_cryptos: vec!["cardano".into()],
            ..quiet_config()
        };
        let _tasks = feed(&h, config).spawn(&cancel);
        tokio::time::sleep(Duration::from_secs(31)).await;
        cancel.cancel();

        let ticks: Vec<f64> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::PriceTick { id, price } if id == "cardano" => Some(price),
                _ => None,
            })
            .collect();
        assert_eq!(ticks.len(), 3);
        assert!(ticks.iter().all(|p| (p - 1.2).abs() <= 0.012 + 1e-12));

        let coin = h.crypto.snapshot("cardano").await.unwrap();
        assert_eq!(Some(&coin.price), ticks.last());
    }

    #[tokio::test(start_paused = true)]
    async fn store_basis_walks_from_current_price() {
        let h = harness();
        let cancel = CancellationToken::new();
        h.crypto.fetch_snapshot("bitcoin", &cancel).await;
        h.crypto.apply_tick("bitcoin", 30_000.0).await.unwrap();
        let mut rx = h.events.subscribe();

        let config = FeedConfig {
            tracked_cryptos: vec!["bitcoin".into()],
            price_basis: PriceBasis::Store,
            ..quiet_config()
        };
        let _tasks = feed(&h, config).spawn(&cancel);
        tokio::time::sleep(Duration::from_secs(31)).await;
        cancel.cancel();

        let ticks: Vec<f64> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::PriceTick { price, .. } => Some(price),
                _ => None,
            })
            .collect();
        assert_eq!(ticks.len(), 3);

        // Each tick is rolled around the price left by the previous one,
        // never around the catalogue price.
        let mut previous = 30_000.0;
        for price in &ticks {
            assert!((price - previous).abs() <= previous * 0.01 + 1e-9);
            previous = *price;
        }
        assert!(ticks.iter().all(|p| *p < 31_000.0));

        let coin = h.crypto.snapshot("bitcoin").await.unwrap();
        assert_eq!(Some(&coin.price), ticks.last());
    }

    #[tokio::test]
    async fn reference_price_follows_basis() {
        let h = harness();
        h.crypto.fetch_snapshot("bitcoin", &CancellationToken::new()).await;
        h.crypto.apply_tick("bitcoin", 30_000.0).await.unwrap();

        let store = feed(
            &h,
            FeedConfig {
                price_basis: PriceBasis::Store,
                ..quiet_config()
            },
        );
        assert_eq!(store.reference_price("bitcoin").await, 30_000.0);
        // Not fetched yet: the catalogue price stands in.
        assert_eq!(
            store.reference_price("ethereum").await,
            catalog::base_price("ethereum")
        );

        let fixed = feed(&h, quiet_config());
        assert_eq!(
            fixed.reference_price("bitcoin").await,
            catalog::base_price("bitcoin")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn certain_alerts_are_logged() {
        let h = harness();
        let cancel = CancellationToken::new();
        let config = FeedConfig {
            welcome_delay: Duration::from_secs(3_600),
            price_alert_probability: 1.0,
            weather_alert_probability: 1.0,
            seed: Some(7),
            ..Default::default()
        };
        let _tasks = feed(&h, config).spawn(&cancel);

        tokio::time::sleep(Duration::from_secs(31)).await;
        cancel.cancel();

        let items = h.notifications.items().await;
        let count = |kind: NotificationKind| items.iter().filter(|n| n.kind == kind).count();
        assert_eq!(count(NotificationKind::PriceAlert), 3);
        assert_eq!(count(NotificationKind::WeatherAlert), 1);

        let weather = items
            .iter()
            .find(|n| n.kind == NotificationKind::WeatherAlert)
            .unwrap();
        assert!(weather.title.starts_with("Weather Alert: "));
        assert!(weather.message.ends_with(" expected in the next 24 hours"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_every_task() {
        let h = harness();
        let cancel = CancellationToken::new();
        let config = FeedConfig {
            price_alert_probability: 1.0,
            weather_alert_probability: 1.0,
            seed: Some(3),
            ..Default::default()
        };
        let tasks = feed(&h, config).spawn(&cancel);

        cancel.cancel();
        for task in tasks {
            task.await.unwrap();
        }

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(h.notifications.items().await.is_empty());
    }
}
