use std::collections::HashSet;
use std::sync::Arc;

use futures_util::Stream;
use serde::Serialize;
use tracing::{info, warn};

use crate::batch::{run_batch, SyncUnit};
use crate::config::SyncConfig;
use crate::curated::curated_feed_links;
use crate::error::SyncError;
use crate::fetch::{validate_feed_url, FeedSource};
use crate::models::{Feed, FeedId, ItemFilter};
use crate::normalize::{normalize, NormalizedFeed};
use crate::progress::{JobHandle, JobKind, JobLog, JobProgress, JobTracker, LogStatus};
use crate::reconcile::{reconcile, ReconcileOutcome, SyncedFeed};
use crate::storage::FeedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub feeds: u64,
    pub items: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFeed {
    pub feed: Option<Feed>,
    pub deleted_items: u64,
}

struct Inner<S, F> {
    store: S,
    source: F,
    config: SyncConfig,
    refresh: Arc<JobTracker>,
    curated: Arc<JobTracker>,
}

/// Entry point for the request-handling layer.
///
/// Cloning is cheap; clones share the store, source and both job trackers.
pub struct FeedSync<S, F> {
    inner: Arc<Inner<S, F>>,
}

impl<S, F> Clone for FeedSync<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: FeedStore, F: FeedSource> FeedSync<S, F> {
    pub fn new(store: S, source: F, config: SyncConfig) -> Self {
        Self::with_trackers(
            store,
            source,
            config,
            JobTracker::new(JobKind::RefreshAll),
            JobTracker::new(JobKind::LoadCurated),
        )
    }

    pub fn with_trackers(
        store: S,
        source: F,
        config: SyncConfig,
        refresh: Arc<JobTracker>,
        curated: Arc<JobTracker>,
    ) -> Self {
        debug_assert_eq!(refresh.kind(), JobKind::RefreshAll);
        debug_assert_eq!(curated.kind(), JobKind::LoadCurated);
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                config,
                refresh,
                curated,
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn tracker(&self, kind: JobKind) -> &Arc<JobTracker> {
        match kind {
            JobKind::RefreshAll => &self.inner.refresh,
            JobKind::LoadCurated => &self.inner.curated,
        }
    }

    /// Configured curated list, or the built-in one.
    pub fn curated_feeds(&self) -> Vec<String> {
        self.inner
            .config
            .curated_feeds
            .clone()
            .unwrap_or_else(curated_feed_links)
    }

    async fn fetch_and_normalize(&self, raw_url: &str) -> Result<NormalizedFeed, SyncError> {
        let url = validate_feed_url(raw_url)?;
        let self_url = raw_url.trim();
        let body = self
            .inner
            .source
            .fetch(&url)
            .await
            .map_err(|source| SyncError::Fetch {
                url: self_url.to_owned(),
                source,
            })?;
        normalize(&body, self_url)
    }

    /// Fetches, normalizes and reconciles one feed.
    pub async fn sync_single_feed(&self, url: &str) -> Result<SyncedFeed, SyncError> {
        let normalized = self.fetch_and_normalize(url).await?;
        let self_url = normalized.feed.self_url.clone();
        let existing = self
            .inner
            .store
            .find_feed_by_self(&self_url)
            .await
            .map_err(|e| SyncError::storage(&self_url, e))?;
        let synced = reconcile(&self.inner.store, normalized, existing).await?;
        info!(
            feed = %self_url,
            outcome = ?synced.outcome,
            items = synced.items.len(),
            "feed synced"
        );
        Ok(synced)
    }

    async fn sync_unit(&self, unit: SyncUnit) -> Result<LogStatus, SyncError> {
        match unit {
            SyncUnit::Stored(feed) => {
                let normalized = self.fetch_and_normalize(&feed.data.self_url).await?;
                reconcile(&self.inner.store, normalized, Some(feed)).await?;
                Ok(LogStatus::Success)
            }
            SyncUnit::Url(url) => {
                let synced = self.sync_single_feed(&url).await?;
                Ok(match synced.outcome {
                    ReconcileOutcome::Created => LogStatus::Created,
                    ReconcileOutcome::Updated => LogStatus::Updated,
                })
            }
        }
    }

    /// Starts re-syncing every stored feed in the background.
    ///
    /// Returns immediately. While a refresh is running, further calls are
    /// no-ops that return a handle to the ongoing run's tracker.
    pub fn start_refresh_all(&self) -> JobHandle {
        let tracker = Arc::clone(&self.inner.refresh);
        let Some(guard) = tracker.try_start() else {
            return JobHandle::already_running(tracker);
        };
        let this = self.clone();
        let join = tokio::spawn(async move {
            let _guard = guard;
            this.refresh_all().await;
        });
        JobHandle::spawned(tracker, join)
    }

    async fn refresh_all(&self) {
        let store = &self.inner.store;
        let tracker = &self.inner.refresh;
        let counted = match store.count_feeds().await {
            Ok(total) => {
                tracker.set_total(total);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to count feeds");
                false
            }
        };
        let feeds = match store.list_feeds().await {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!(error = %e, "failed to list feeds, nothing to refresh");
                tracker.record(JobLog::failed("*", SyncError::storage("*", e).to_string()));
                return;
            }
        };
        if !counted {
            tracker.set_total(feeds.len() as u64);
        }

        let units = feeds.into_iter().map(SyncUnit::Stored).collect();
        run_batch(units, self.inner.config.concurrency(), tracker, |unit| {
            let this = self.clone();
            async move { this.sync_unit(unit).await }
        })
        .await;
    }

    /// Starts importing `urls` in the background, creating unknown feeds and
    /// updating known ones. Duplicate URLs are synced once.
    pub fn start_load_curated(&self, urls: Vec<String>) -> JobHandle {
        let tracker = Arc::clone(&self.inner.curated);
        let Some(guard) = tracker.try_start() else {
            return JobHandle::already_running(tracker);
        };

        let mut seen = HashSet::new();
        let units: Vec<SyncUnit> = urls
            .into_iter()
            .filter(|url| seen.insert(url.trim().to_owned()))
            .map(SyncUnit::Url)
            .collect();
        tracker.set_total(units.len() as u64);

        let this = self.clone();
        let join = tokio::spawn(async move {
            let _guard = guard;
            let limit = this.inner.config.concurrency();
            run_batch(units, limit, &this.inner.curated, |unit| {
                let this = this.clone();
                async move { this.sync_unit(unit).await }
            })
            .await;
        });
        JobHandle::spawned(tracker, join)
    }

    pub fn progress(&self, kind: JobKind) -> JobProgress {
        self.tracker(kind).snapshot()
    }

    /// Snapshots of `kind` at the configured progress interval.
    pub fn watch_progress(&self, kind: JobKind) -> impl Stream<Item = JobProgress> + Send {
        self.tracker(kind)
            .watch(self.inner.config.progress_interval())
    }

    /// Removes a feed together with its items.
    pub async fn delete_feed(&self, id: FeedId) -> Result<DeletedFeed, SyncError> {
        let name = id.to_string();
        let store = &self.inner.store;
        let deleted_items = store
            .delete_items(id)
            .await
            .map_err(|e| SyncError::storage(&name, e))?;
        let feed = store
            .delete_feed(id)
            .await
            .map_err(|e| SyncError::storage(&name, e))?;
        info!(feed = %name, deleted_items, found = feed.is_some(), "feed deleted");
        Ok(DeletedFeed {
            feed,
            deleted_items,
        })
    }

    pub async fn stats(&self) -> Result<StoreStats, SyncError> {
        let store = &self.inner.store;
        let feeds = store
            .count_feeds()
            .await
            .map_err(|e| SyncError::storage("*", e))?;
        let items = store
            .count_items(ItemFilter::All)
            .await
            .map_err(|e| SyncError::storage("*", e))?;
        Ok(StoreStats { feeds, items })
    }
}
