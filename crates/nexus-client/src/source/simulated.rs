use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use nexus_shared::constants::{
    CRYPTO_HISTORY_DAYS, HISTORY_DELAY_MS, SNAPSHOT_DELAY_MS, WEATHER_CONDITIONS,
    WEATHER_HISTORY_DAYS,
};
use nexus_shared::{
    CryptoData, CryptoHistoryItem, FetchError, NewsArticle, WeatherData, WeatherHistoryItem,
};

use super::DataSource;
use crate::catalog;

/// Round `value` to `dp` decimal places.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// In-process stand-in for the market, weather and news providers.
pub struct SimulatedSource {
    rng: Mutex<StdRng>,
    snapshot_delay: Duration,
    history_delay: Duration,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic source for tests and reproducible demos.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            snapshot_delay: Duration::from_millis(SNAPSHOT_DELAY_MS),
            history_delay: Duration::from_millis(HISTORY_DELAY_MS),
        }
    }

    pub fn with_delays(mut self, snapshot: Duration, history: Duration) -> Self {
        self.snapshot_delay = snapshot;
        self.history_delay = history;
        self
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_condition(rng: &mut StdRng) -> String {
    WEATHER_CONDITIONS
        .choose(rng)
        .copied()
        .unwrap_or("Sunny")
        .to_string()
}

#[async_trait]
impl DataSource for SimulatedSource {
    async fn crypto_snapshot(&self, id: &str) -> Result<CryptoData, FetchError> {
        tokio::time::sleep(self.snapshot_delay).await;

        let profile = catalog::coin(id)
            .ok_or_else(|| FetchError::Unavailable("Failed to fetch cryptocurrency data".into()))?;

        Ok(self.with_rng(|rng| CryptoData {
            id: profile.id.to_string(),
            name: profile.name.to_string(),
            symbol: profile.symbol.to_string(),
            price: profile.base_price + rng.gen_range(-profile.price_spread..profile.price_spread),
            price_change_24h: round_dp(
                rng.gen_range(-profile.change_range..profile.change_range),
                2,
            ),
            volume_24h: profile.volume_base + rng.gen::<f64>() * profile.volume_jitter,
            market_cap: profile.market_cap_base + rng.gen::<f64>() * profile.market_cap_jitter,
            all_time_high: Some(profile.all_time_high),
            circulating_supply: Some(profile.circulating_supply),
        }))
    }

    async fn crypto_history(&self, id: &str) -> Result<Vec<CryptoHistoryItem>, FetchError> {
        tokio::time::sleep(self.history_delay).await;

        let base = catalog::base_price(id);
        let today = Utc::now();
        let days = CRYPTO_HISTORY_DAYS;

        let mut points = self.with_rng(|rng| {
            (0..days)
                .map(|i| {
                    let day_factor = (days - i) as f64 / days as f64;
                    let random_change = rng.gen_range(-0.05..0.05) * base;
                    let trend = (i as f64).sin() * base * 0.03;
                    CryptoHistoryItem {
                        date: today - ChronoDuration::days(i as i64),
                        price: round_dp(base + random_change * day_factor + trend, 2),
                    }
                })
                .collect::<Vec<_>>()
        });
        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    async fn weather_snapshot(&self, city_key: &str) -> Result<WeatherData, FetchError> {
        tokio::time::sleep(self.snapshot_delay).await;

        let base = catalog::base_temperature(city_key);
        Ok(self.with_rng(|rng| {
            let temp = base + rng.gen_range(-5.0..5.0);
            let feels = temp - rng.gen::<f64>() * 3.0;
            WeatherData {
                temperature: round_dp(temp, 1),
                feels_like: round_dp(feels, 1),
                humidity: rng.gen_range(30..80),
                conditions: pick_condition(rng),
                wind_speed: round_dp(rng.gen_range(2.0..10.0), 1),
                temp_min: round_dp(temp - rng.gen::<f64>() * 5.0, 1),
                temp_max: round_dp(temp + rng.gen::<f64>() * 5.0, 1),
            }
        }))
    }

    async fn weather_history(
        &self,
        city_key: &str,
    ) -> Result<Vec<WeatherHistoryItem>, FetchError> {
        tokio::time::sleep(self.history_delay).await;

        let base = catalog::base_temperature(city_key);
        let today = Utc::now();

        let mut points = self.with_rng(|rng| {
            (0..WEATHER_HISTORY_DAYS)
                .map(|i| {
                    let temp = base + rng.gen_range(-3.0..3.0);
                    let feels = temp - rng.gen::<f64>() * 2.0;
                    WeatherHistoryItem {
                        date: today - ChronoDuration::days(i as i64),
                        temperature: round_dp(temp, 1),
                        feels_like: round_dp(feels, 1),
                        humidity: rng.gen_range(30..80),
                        conditions: pick_condition(rng),
                    }
                })
                .collect::<Vec<_>>()
        });
        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    async fn news(&self) -> Result<Vec<NewsArticle>, FetchError> {
        tokio::time::sleep(self.history_delay).await;

        let now = Utc::now();
        let article = |hours: i64, title: &str, description: &str, slug: &str, source: &str| {
            NewsArticle {
                title: title.to_string(),
                description: description.to_string(),
                url: format!("https://example.com/{slug}"),
                published_at: now - ChronoDuration::hours(hours),
                source: source.to_string(),
            }
        };

        Ok(vec![
            article(
                4,
                "Bitcoin Reaches New Monthly High as Market Sentiment Turns Bullish",
                "Bitcoin has surged to a new monthly high, breaking through the $50,000 resistance level as market sentiment turns increasingly bullish following positive regulatory developments.",
                "bitcoin-new-high",
                "CryptoNews",
            ),
            article(
                8,
                "Ethereum Gas Fees Drop to Lowest Level in Months After Network Upgrade",
                "Ethereum's gas fees have dropped to their lowest levels in months following the latest network upgrade, making transactions more affordable for users and developers.",
                "ethereum-gas-fees",
                "BlockchainInsider",
            ),
            article(
                14,
                "Major Bank Announces Crypto Custody Service for Institutional Clients",
                "One of the world's largest banks has announced a new cryptocurrency custody service aimed at institutional clients, signaling growing mainstream acceptance of digital assets.",
                "bank-crypto-custody",
                "FinanceDaily",
            ),
            article(
                28,
                "Cardano Foundation Announces Major Partnership for Smart Contract Deployment",
                "The Cardano Foundation has announced a strategic partnership with a leading technology firm to accelerate smart contract deployment and adoption on the Cardano blockchain.",
                "cardano-partnership",
                "CryptoInsider",
            ),
            article(
                36,
                "Regulators Propose New Framework for Cryptocurrency Exchanges",
                "Global financial regulators have proposed a new comprehensive framework for cryptocurrency exchanges, aiming to enhance consumer protection while fostering innovation in the sector.",
                "crypto-regulation",
                "RegulationToday",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_source() -> SimulatedSource {
        SimulatedSource::seeded(7).with_delays(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.23456, 2), 1.23);
        assert_eq!(round_dp(-0.456, 1), -0.5);
    }

    #[tokio::test]
    async fn crypto_snapshot_stays_in_range() {
        let source = instant_source();
        for _ in 0..50 {
            let btc = source.crypto_snapshot("bitcoin").await.unwrap();
            assert!(btc.price >= 42_500.0 && btc.price <= 47_500.0);
            assert!(btc.price_change_24h.abs() <= 5.0);
            assert_eq!(btc.symbol, "BTC");
        }
    }

    #[tokio::test]
    async fn unknown_coin_fails() {
        let source = instant_source();
        let err = source.crypto_snapshot("dogecoin").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch cryptocurrency data");
    }

    #[tokio::test]
    async fn histories_are_ascending_and_fixed_length() {
        let source = instant_source();

        let crypto = source.crypto_history("ethereum").await.unwrap();
        assert_eq!(crypto.len(), CRYPTO_HISTORY_DAYS);
        assert!(crypto.windows(2).all(|w| w[0].date < w[1].date));

        let weather = source.weather_history("london").await.unwrap();
        assert_eq!(weather.len(), WEATHER_HISTORY_DAYS);
        assert!(weather.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn weather_snapshot_is_plausible() {
        let source = instant_source();
        let w = source.weather_snapshot("tokyo").await.unwrap();
        assert!(w.temperature >= 20.0 && w.temperature <= 30.0);
        assert!((30..80).contains(&w.humidity));
        assert!(WEATHER_CONDITIONS.contains(&w.conditions.as_str()));
    }

    #[tokio::test]
    async fn news_is_newest_first() {
        let source = instant_source();
        let articles = source.news().await.unwrap();
        assert_eq!(articles.len(), 5);
        assert!(articles
            .windows(2)
            .all(|w| w[0].published_at > w[1].published_at));
    }
}
