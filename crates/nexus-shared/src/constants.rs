/// Application name
pub const APP_NAME: &str = "CryptoWeather Nexus";

/// Maximum number of entries kept in the notification log
pub const MAX_NOTIFICATIONS: usize = 20;

/// Number of daily points in a crypto price history
pub const CRYPTO_HISTORY_DAYS: usize = 7;

/// Number of daily points in a weather history
pub const WEATHER_HISTORY_DAYS: usize = 5;

/// Storage key of the persisted favorites list
pub const FAVORITES_KEY: &str = "crypto-weather-favorites";

/// Storage key of the persisted notification log
pub const NOTIFICATIONS_KEY: &str = "cryptoweather-notifications";

/// Coins tracked by the dashboard and the price feed
pub const TRACKED_CRYPTOS: [&str; 3] = ["bitcoin", "ethereum", "cardano"];

/// Cities tracked by the dashboard and the weather feed (display names)
pub const TRACKED_CITIES: [&str; 3] = ["New York", "London", "Tokyo"];

/// Weather condition vocabulary used by the simulated source
pub const WEATHER_CONDITIONS: [&str; 5] = ["Sunny", "Cloudy", "Partly Cloudy", "Rainy", "Stormy"];

/// Event labels used by simulated weather alerts
pub const WEATHER_EVENTS: [&str; 5] = [
    "Heavy Rain",
    "Thunderstorm",
    "Heat Wave",
    "Snowfall",
    "High Winds",
];

/// Simulated network latency for snapshot fetches (milliseconds)
pub const SNAPSHOT_DELAY_MS: u64 = 800;

/// Simulated network latency for history fetches (milliseconds)
pub const HISTORY_DELAY_MS: u64 = 1000;

/// Delay before the one-time welcome notification (milliseconds)
pub const WELCOME_DELAY_MS: u64 = 2000;

/// Price tick interval of the feed generator in seconds
pub const PRICE_TICK_SECS: u64 = 10;

/// Weather alert check interval of the feed generator in seconds
pub const WEATHER_ALERT_SECS: u64 = 30;

/// Refresh interval of crypto and weather snapshots in seconds
pub const SNAPSHOT_POLL_SECS: u64 = 60;

/// Refresh interval of the news headlines in seconds
pub const NEWS_POLL_SECS: u64 = 600;

/// Chance that a price tick also raises a price alert
pub const PRICE_ALERT_PROBABILITY: f64 = 0.05;

/// Chance that a weather check raises a weather alert
pub const WEATHER_ALERT_PROBABILITY: f64 = 0.1;

/// Maximum relative price move of a single tick (1%)
pub const MAX_TICK_FLUCTUATION: f64 = 0.01;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;
