//! Keyed snapshot/history container shared by the crypto and weather stores.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use nexus_shared::{CryptoHistoryItem, FetchError, LoadStatus, WeatherHistoryItem};

use crate::status::{lock_board, FetchKind, FetchTarget, PendingFetch, StatusBoard, TargetStatus};

/// A history point that can be ordered by date.
pub trait Dated {
    fn date(&self) -> DateTime<Utc>;
}

impl Dated for CryptoHistoryItem {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Dated for WeatherHistoryItem {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

struct DomainState<T, H> {
    data: HashMap<String, T>,
    history: HashMap<String, Vec<H>>,
}

/// Per-key snapshots and history series with per-target load status.
///
/// The status board sits behind its own blocking mutex so a fetch future
/// dropped mid-flight can release its ticket synchronously.
pub struct DomainStore<T, H> {
    name: &'static str,
    state: RwLock<DomainState<T, H>>,
    statuses: Mutex<StatusBoard>,
}

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn run_cancellable<R, Fut>(cancel: &CancellationToken, fut: Fut) -> Result<R, FetchError>
where
    Fut: Future<Output = Result<R, FetchError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = fut => result,
    }
}

impl<T: Clone, H: Clone + Dated> DomainStore<T, H> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(DomainState {
                data: HashMap::new(),
                history: HashMap::new(),
            }),
            statuses: Mutex::new(StatusBoard::new()),
        }
    }

    /// Run a snapshot fetch for `key` and merge its result into the map.
    pub async fn load_snapshot<Fut>(&self, key: &str, cancel: &CancellationToken, fut: Fut) -> LoadStatus
    where
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let target = FetchTarget::snapshot(key);
        self.settle(&target, cancel, fut, |state, value| {
            state.data.insert(key.to_string(), value);
        })
        .await
    }

    /// Run a history fetch for `key`; the result replaces any prior series.
    pub async fn load_history<Fut>(&self, key: &str, cancel: &CancellationToken, fut: Fut) -> LoadStatus
    where
        Fut: Future<Output = Result<Vec<H>, FetchError>>,
    {
        let target = FetchTarget::history(key);
        self.settle(&target, cancel, fut, |state, mut series| {
            series.sort_by_key(|p| p.date());
            state.history.insert(key.to_string(), series);
        })
        .await
    }

    async fn settle<R, Fut>(
        &self,
        target: &FetchTarget,
        cancel: &CancellationToken,
        fut: Fut,
        apply: impl FnOnce(&mut DomainState<T, H>, R),
    ) -> LoadStatus
    where
        Fut: Future<Output = Result<R, FetchError>>,
    {
        let pending = PendingFetch::begin(&self.statuses, target.clone());

        let result = run_cancellable(cancel, fut).await;

        let mut state = self.state.write().await;
        match result {
            Ok(value) => {
                if pending.succeed() {
                    apply(&mut *state, value);
                } else {
                    tracing::debug!(store = self.name, key = %target.key, kind = ?target.kind, "Dropping stale fetch result");
                }
            }
            Err(FetchError::Cancelled) => {
                pending.abandon();
                tracing::debug!(store = self.name, key = %target.key, "Fetch cancelled");
            }
            Err(e) => {
                if pending.fail(e.to_string()) {
                    tracing::warn!(store = self.name, key = %target.key, kind = ?target.kind, error = %e, "Fetch failed");
                }
            }
        }
        drop(state);
        lock_board(&self.statuses).get(target).status
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.state.read().await.data.get(key).cloned()
    }

    pub async fn all(&self) -> HashMap<String, T> {
        self.state.read().await.data.clone()
    }

    pub async fn history(&self, key: &str) -> Vec<H> {
        self.state
            .read()
            .await
            .history
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn status(&self, target: &FetchTarget) -> TargetStatus {
        lock_board(&self.statuses).get(target)
    }

    pub async fn statuses(&self, kind: FetchKind) -> HashMap<String, TargetStatus> {
        lock_board(&self.statuses).by_kind(kind)
    }

    pub async fn overall_status(&self) -> LoadStatus {
        lock_board(&self.statuses).overall()
    }

    /// Mutate an existing snapshot in place. `None` when the key is unknown.
    pub async fn update<R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.state.write().await.data.get_mut(key).map(f)
    }
}
