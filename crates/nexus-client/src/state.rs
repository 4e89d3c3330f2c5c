//! Dashboard composition root.
//!
//! [`Dashboard`] owns one instance of every store plus the shared database
//! and event channel.  It is built once by the host and handed around by
//! `Arc`; background work is started explicitly and stopped through the
//! returned [`BackgroundTasks`] handle.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nexus_store::Database;

use crate::events::{DashboardEvent, EventBus};
use crate::feed::{FeedConfig, FeedGenerator};
use crate::persist::{self, SharedDatabase};
use crate::poller::{spawn_pollers, PollConfig};
use crate::source::{DataSource, SimulatedSource};
use crate::stores::{CryptoStore, NewsStore, NotificationStore, PreferencesStore, WeatherStore};

#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    /// Directory holding the SQLite file. `None` uses the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Seed of the simulated data source; `None` seeds from entropy.
    pub source_seed: Option<u64>,
    pub feed: FeedConfig,
    pub poll: PollConfig,
}

pub struct Dashboard {
    pub crypto: Arc<CryptoStore>,
    pub weather: Arc<WeatherStore>,
    pub news: Arc<NewsStore>,
    pub preferences: Arc<PreferencesStore>,
    pub notifications: Arc<NotificationStore>,
    events: EventBus,
    db: SharedDatabase,
}

impl Dashboard {
    /// Open the database and build every store on top of the simulated source.
    pub fn open(config: &DashboardConfig) -> nexus_store::Result<Self> {
        let db = match &config.data_dir {
            Some(dir) => Database::open_in_dir(dir)?,
            None => Database::new()?,
        };
        let source = match config.source_seed {
            Some(seed) => SimulatedSource::seeded(seed),
            None => SimulatedSource::new(),
        };
        Ok(Self::with_parts(db, Arc::new(source)))
    }

    /// Assemble a dashboard from an already opened database and any source.
    pub fn with_parts(db: Database, source: Arc<dyn DataSource>) -> Self {
        if let Some(path) = db.path() {
            tracing::info!(path = %path.display(), "Dashboard database opened");
        }
        let db = persist::shared(db);
        let events = EventBus::default();

        Self {
            crypto: Arc::new(CryptoStore::new(source.clone())),
            weather: Arc::new(WeatherStore::new(source.clone())),
            news: Arc::new(NewsStore::new(source)),
            preferences: Arc::new(PreferencesStore::load(db.clone(), events.clone())),
            notifications: Arc::new(NotificationStore::load(db.clone(), events.clone())),
            events,
            db,
        }
    }

    /// Spawn the simulated feed and the pollers under one cancellation token.
    pub fn start(&self, feed: FeedConfig, poll: PollConfig) -> BackgroundTasks {
        let cancel = CancellationToken::new();

        let mut handles = FeedGenerator::new(
            self.crypto.clone(),
            self.notifications.clone(),
            self.events.clone(),
            feed,
        )
        .spawn(&cancel);
        handles.extend(spawn_pollers(
            self.crypto.clone(),
            self.weather.clone(),
            self.news.clone(),
            poll,
            &cancel,
        ));

        tracing::info!(tasks = handles.len(), "Background tasks started");
        BackgroundTasks { cancel, handles }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.db
    }
}

/// Teardown handle for everything [`Dashboard::start`] spawned.
///
/// Dropping it cancels the tasks without waiting for them.
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every task and wait until all of them have exited.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }
        tracing::info!("Background tasks stopped");
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
