use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use nexus_shared::{city_slug, LoadStatus, WeatherData, WeatherHistoryItem};

use super::domain::DomainStore;
use crate::source::DataSource;
use crate::status::{FetchKind, FetchTarget, TargetStatus};

/// Current conditions and recent history per city.
///
/// Cities may be passed by display name or slug; everything is stored under
/// the slug (`"New York"` and `"new-york"` are the same entry).
pub struct WeatherStore {
    inner: DomainStore<WeatherData, WeatherHistoryItem>,
    source: Arc<dyn DataSource>,
}

impl WeatherStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            inner: DomainStore::new("weather"),
            source,
        }
    }

    pub async fn fetch_snapshot(&self, city: &str, cancel: &CancellationToken) -> LoadStatus {
        let key = city_slug(city);
        self.inner
            .load_snapshot(&key, cancel, self.source.weather_snapshot(&key))
            .await
    }

    pub async fn fetch_history(&self, city: &str, cancel: &CancellationToken) -> LoadStatus {
        let key = city_slug(city);
        self.inner
            .load_history(&key, cancel, self.source.weather_history(&key))
            .await
    }

    pub async fn snapshot(&self, city: &str) -> Option<WeatherData> {
        self.inner.get(&city_slug(city)).await
    }

    pub async fn snapshots(&self) -> HashMap<String, WeatherData> {
        self.inner.all().await
    }

    pub async fn history(&self, city: &str) -> Vec<WeatherHistoryItem> {
        self.inner.history(&city_slug(city)).await
    }

    pub async fn status(&self, kind: FetchKind, city: &str) -> TargetStatus {
        let target = FetchTarget {
            kind,
            key: city_slug(city),
        };
        self.inner.status(&target).await
    }

    pub async fn statuses(&self, kind: FetchKind) -> HashMap<String, TargetStatus> {
        self.inner.statuses(kind).await
    }

    pub async fn overall_status(&self) -> LoadStatus {
        self.inner.overall_status().await
    }
}
