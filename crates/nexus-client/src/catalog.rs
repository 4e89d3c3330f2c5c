//! Static reference data for the simulated markets and cities.

use nexus_shared::city_slug;

/// Simulation parameters of one coin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub base_price: f64,
    /// Snapshot price is drawn from `base_price ± price_spread`.
    pub price_spread: f64,
    /// 24h change is drawn from `± change_range` percent.
    pub change_range: f64,
    pub volume_base: f64,
    pub volume_jitter: f64,
    pub market_cap_base: f64,
    pub market_cap_jitter: f64,
    pub all_time_high: f64,
    pub circulating_supply: f64,
}

pub const COINS: [CoinProfile; 3] = [
    CoinProfile {
        id: "bitcoin",
        name: "Bitcoin",
        symbol: "BTC",
        base_price: 45_000.0,
        price_spread: 2_500.0,
        change_range: 5.0,
        volume_base: 25_000_000_000.0,
        volume_jitter: 5_000_000_000.0,
        market_cap_base: 850_000_000_000.0,
        market_cap_jitter: 40_000_000_000.0,
        all_time_high: 69_000.0,
        circulating_supply: 19_000_000.0,
    },
    CoinProfile {
        id: "ethereum",
        name: "Ethereum",
        symbol: "ETH",
        base_price: 3_000.0,
        price_spread: 250.0,
        change_range: 6.0,
        volume_base: 15_000_000_000.0,
        volume_jitter: 3_000_000_000.0,
        market_cap_base: 360_000_000_000.0,
        market_cap_jitter: 20_000_000_000.0,
        all_time_high: 4_800.0,
        circulating_supply: 120_000_000.0,
    },
    CoinProfile {
        id: "cardano",
        name: "Cardano",
        symbol: "ADA",
        base_price: 1.2,
        price_spread: 0.2,
        change_range: 7.5,
        volume_base: 3_000_000_000.0,
        volume_jitter: 1_000_000_000.0,
        market_cap_base: 40_000_000_000.0,
        market_cap_jitter: 5_000_000_000.0,
        all_time_high: 3.1,
        circulating_supply: 33_000_000_000.0,
    },
];

/// Reference price for coins outside the catalogue.
pub const FALLBACK_BASE_PRICE: f64 = 100.0;

/// Reference temperature (°C) for cities outside the table.
pub const FALLBACK_BASE_TEMPERATURE: f64 = 18.0;

pub fn coin(id: &str) -> Option<&'static CoinProfile> {
    COINS.iter().find(|c| c.id == id)
}

/// Fixed reference price used by history generation and the price feed.
pub fn base_price(id: &str) -> f64 {
    coin(id).map_or(FALLBACK_BASE_PRICE, |c| c.base_price)
}

/// Cities with a reference temperature (°C), keyed by slug.
pub const CITIES: [(&str, f64); 3] = [("new-york", 20.0), ("london", 15.0), ("tokyo", 25.0)];

/// Reference temperature of a city, keyed by slug.
pub fn base_temperature(city_key: &str) -> f64 {
    CITIES
        .iter()
        .find(|(key, _)| *key == city_key)
        .map_or(FALLBACK_BASE_TEMPERATURE, |(_, temp)| *temp)
}

/// Whether `city` (display name or slug) is one of the catalogue cities.
pub fn is_known_city(city: &str) -> bool {
    let slug = city_slug(city);
    CITIES.iter().any(|(key, _)| *key == slug)
}

/// Display name of a coin id: catalogue name, else the id capitalized.
pub fn coin_display_name(id: &str) -> String {
    if let Some(c) = coin(id) {
        return c.name.to_string();
    }
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_prices() {
        assert_eq!(base_price("bitcoin"), 45_000.0);
        assert_eq!(base_price("cardano"), 1.2);
        assert_eq!(base_price("dogecoin"), FALLBACK_BASE_PRICE);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(coin_display_name("ethereum"), "Ethereum");
        assert_eq!(coin_display_name("dogecoin"), "Dogecoin");
        assert_eq!(coin_display_name(""), "");
    }

    #[test]
    fn test_base_temperature() {
        assert_eq!(base_temperature("tokyo"), 25.0);
        assert_eq!(base_temperature("paris"), FALLBACK_BASE_TEMPERATURE);
    }

    #[test]
    fn test_known_cities() {
        assert!(is_known_city("New York"));
        assert!(is_known_city("london"));
        assert!(!is_known_city("Paris"));
        assert!(!is_known_city(""));
    }
}
