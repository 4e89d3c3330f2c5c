//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.  Invalid values are logged and the
//! default is kept.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use nexus_client::{DashboardConfig, FeedConfig, PollConfig, PriceBasis};
use nexus_shared::constants::{
    DEFAULT_HTTP_PORT, NEWS_POLL_SECS, PRICE_TICK_SECS, SNAPSHOT_POLL_SECS, WEATHER_ALERT_SECS,
};

#[derive(Debug, Clone)]
pub struct NexusConfig {
    /// Socket address of the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Directory of the SQLite database.
    /// Env: `DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Seed shared by the simulated source and the feed.
    /// Env: `FEED_SEED`
    pub feed_seed: Option<u64>,

    /// Env: `PRICE_TICK_SECS`
    pub price_tick_secs: u64,

    /// Env: `WEATHER_ALERT_SECS`
    pub weather_alert_secs: u64,

    /// Snapshot refresh interval.
    /// Env: `POLL_SECS`
    pub poll_secs: u64,

    /// Env: `NEWS_POLL_SECS`
    pub news_poll_secs: u64,

    /// `fixed` or `store`.
    /// Env: `PRICE_BASIS`
    pub price_basis: PriceBasis,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            data_dir: None,
            feed_seed: None,
            price_tick_secs: PRICE_TICK_SECS,
            weather_alert_secs: WEATHER_ALERT_SECS,
            poll_secs: SNAPSHOT_POLL_SECS,
            news_poll_secs: NEWS_POLL_SECS,
            price_basis: PriceBasis::Fixed,
        }
    }
}

impl NexusConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(dir) = lookup("DATA_DIR").filter(|d| !d.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(seed) = parse_var(&lookup, "FEED_SEED") {
            config.feed_seed = Some(seed);
        }

        // Zero would make the tokio interval panic.
        for (key, slot) in [
            ("PRICE_TICK_SECS", &mut config.price_tick_secs),
            ("WEATHER_ALERT_SECS", &mut config.weather_alert_secs),
            ("POLL_SECS", &mut config.poll_secs),
            ("NEWS_POLL_SECS", &mut config.news_poll_secs),
        ] {
            match parse_var::<u64>(&lookup, key) {
                Some(0) => tracing::warn!(key, "Interval must be positive, using default"),
                Some(secs) => *slot = secs,
                None => {}
            }
        }

        if let Some(basis) = parse_var(&lookup, "PRICE_BASIS") {
            config.price_basis = basis;
        }

        config
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            data_dir: self.data_dir.clone(),
            source_seed: self.feed_seed,
            feed: FeedConfig {
                price_tick_interval: Duration::from_secs(self.price_tick_secs),
                weather_alert_interval: Duration::from_secs(self.weather_alert_secs),
                price_basis: self.price_basis,
                seed: self.feed_seed,
                ..Default::default()
            },
            poll: PollConfig {
                snapshot_interval: Duration::from_secs(self.poll_secs),
                news_interval: Duration::from_secs(self.news_poll_secs),
                ..Default::default()
            },
        }
    }
}

/// Parse `key` if set; warn and return `None` when the value is invalid.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> NexusConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NexusConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.poll_secs, 60);
        assert_eq!(config.news_poll_secs, 600);
        assert_eq!(config.price_basis, PriceBasis::Fixed);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATA_DIR", "/tmp/nexus"),
            ("FEED_SEED", "42"),
            ("PRICE_TICK_SECS", "2"),
            ("PRICE_BASIS", "store"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/nexus")));
        assert_eq!(config.feed_seed, Some(42));
        assert_eq!(config.price_tick_secs, 2);
        assert_eq!(config.price_basis, PriceBasis::Store);

        let dashboard = config.dashboard_config();
        assert_eq!(dashboard.feed.price_tick_interval, Duration::from_secs(2));
        assert_eq!(dashboard.feed.seed, Some(42));
        assert_eq!(dashboard.source_seed, Some(42));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("POLL_SECS", "0"),
            ("NEWS_POLL_SECS", "soon"),
            ("PRICE_BASIS", "market"),
        ]);
        assert_eq!(config.http_addr, NexusConfig::default().http_addr);
        assert_eq!(config.poll_secs, 60);
        assert_eq!(config.news_poll_secs, 600);
        assert_eq!(config.price_basis, PriceBasis::Fixed);
    }
}
