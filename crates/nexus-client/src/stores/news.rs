use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use nexus_shared::{FetchError, LoadStatus, NewsArticle};

use crate::source::DataSource;
use crate::status::{lock_board, FetchTarget, PendingFetch, StatusBoard, TargetStatus};
use crate::stores::domain::run_cancellable;

const HEADLINES: &str = "headlines";

/// Latest headlines. A successful fetch replaces the whole list.
pub struct NewsStore {
    articles: RwLock<Vec<NewsArticle>>,
    statuses: Mutex<StatusBoard>,
    source: Arc<dyn DataSource>,
}

impl NewsStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            articles: RwLock::new(Vec::new()),
            statuses: Mutex::new(StatusBoard::new()),
            source,
        }
    }

    pub async fn fetch(&self, cancel: &CancellationToken) -> LoadStatus {
        let target = FetchTarget::snapshot(HEADLINES);
        let pending = PendingFetch::begin(&self.statuses, target.clone());

        let result = run_cancellable(cancel, self.source.news()).await;

        let mut articles = self.articles.write().await;
        match result {
            Ok(fresh) => {
                if pending.succeed() {
                    tracing::debug!(count = fresh.len(), "Headlines refreshed");
                    *articles = fresh;
                }
            }
            Err(FetchError::Cancelled) => {
                pending.abandon();
            }
            Err(e) => {
                if pending.fail(e.to_string()) {
                    tracing::warn!(error = %e, "News fetch failed");
                }
            }
        }
        drop(articles);
        lock_board(&self.statuses).get(&target).status
    }

    pub async fn articles(&self) -> Vec<NewsArticle> {
        self.articles.read().await.clone()
    }

    pub async fn status(&self) -> TargetStatus {
        lock_board(&self.statuses).get(&FetchTarget::snapshot(HEADLINES))
    }
}
