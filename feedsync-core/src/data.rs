use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Feed, FeedData, FeedId, FeedPatch, Item, ItemData, ItemFilter, ItemId};
use crate::storage::FeedStore;

#[derive(Debug, Default)]
struct Documents {
    feeds: HashMap<FeedId, Feed>,
    items: HashMap<ItemId, Item>,
    // self URL -> feed id
    by_self: HashMap<String, FeedId>,
    // (feed id, guid) -> item id
    by_guid: HashMap<(FeedId, String), ItemId>,
}

impl Documents {
    fn from_parts(feeds: Vec<Feed>, items: Vec<Item>) -> Self {
        let mut docs = Self::default();
        for feed in feeds {
            docs.by_self.insert(feed.data.self_url.clone(), feed.id);
            docs.feeds.insert(feed.id, feed);
        }
        for item in items {
            if !docs.feeds.contains_key(&item.feed) {
                warn!(item = %item.id, feed = %item.feed, "dropping orphaned item");
                continue;
            }
            docs.by_guid
                .insert((item.feed, item.data.guid.clone()), item.id);
            docs.items.insert(item.id, item);
        }
        docs
    }
}

#[derive(Debug, Clone)]
struct StorePaths {
    feeds: PathBuf,
    items: PathBuf,
}

/// Document store kept in memory, optionally mirrored to JSON files.
///
/// Writes go to a `*.json.tmp` sibling first and are renamed into place, so a
/// crash mid-write leaves the previous file intact. On load, a corrupt main
/// file falls back to the temp file.
///
/// Item upserts only touch memory; [`FeedStore::flush`] writes them out.
#[derive(Debug, Clone)]
pub struct JsonStore {
    inner: Arc<RwLock<Documents>>,
    paths: Option<StorePaths>,
    persist_lock: Arc<Mutex<()>>,
    items_dirty: Arc<AtomicBool>,
}

impl JsonStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Documents::default())),
            paths: None,
            persist_lock: Arc::new(Mutex::new(())),
            items_dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Loads `feeds_store.json` and `items_store.json` from `dir`, creating
    /// the directory if needed. Missing or unreadable files yield an empty store.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let paths = StorePaths {
            feeds: dir.join("feeds_store.json"),
            items: dir.join("items_store.json"),
        };

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(error = %e, path = %dir.display(), "failed to create data dir");
        }

        let feeds: Vec<Feed> = read_json_with_tmp_fallback(&paths.feeds).await;
        let items: Vec<Item> = read_json_with_tmp_fallback(&paths.items).await;
        debug!(feeds = feeds.len(), items = items.len(), "loaded json store");

        Self {
            inner: Arc::new(RwLock::new(Documents::from_parts(feeds, items))),
            paths: Some(paths),
            persist_lock: Arc::new(Mutex::new(())),
            items_dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn get_feed(&self, id: FeedId) -> Option<Feed> {
        self.inner.read().await.feeds.get(&id).cloned()
    }

    /// Items of a feed, newest first.
    pub async fn list_items(&self, feed: FeedId) -> Vec<Item> {
        let inner = self.inner.read().await;
        let mut items: Vec<Item> = inner
            .items
            .values()
            .filter(|item| item.feed == feed)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.data.published.cmp(&a.data.published));
        items
    }

    async fn persist_feeds(&self) -> Result<(), StoreError> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let mut feeds: Vec<Feed> = self.inner.read().await.feeds.values().cloned().collect();
        feeds.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        write_json_atomic(&paths.feeds, &feeds).await
    }
}

async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => Default::default(),
                }
            }
        },
        Err(_) => Default::default(),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

impl FeedStore for JsonStore {
    async fn find_feed_by_self(&self, self_url: &str) -> Result<Option<Feed>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_self
            .get(self_url)
            .and_then(|id| inner.feeds.get(id))
            .cloned())
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>, StoreError> {
        let inner = self.inner.read().await;
        let mut feeds: Vec<Feed> = inner.feeds.values().cloned().collect();
        feeds.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(feeds)
    }

    async fn create_feed(&self, data: &FeedData) -> Result<Feed, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_self.contains_key(&data.self_url) {
            return Err(StoreError::Conflict(data.self_url.clone()));
        }
        let now = Utc::now();
        let feed = Feed {
            id: Uuid::new_v4(),
            data: data.clone(),
            items: Vec::new(),
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.by_self.insert(feed.data.self_url.clone(), feed.id);
        inner.feeds.insert(feed.id, feed.clone());
        drop(inner);
        self.persist_feeds().await?;
        Ok(feed)
    }

    async fn update_feed(&self, id: FeedId, patch: FeedPatch) -> Result<Feed, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(data) = &patch.data {
            if let Some(owner) = inner.by_self.get(&data.self_url) {
                if *owner != id {
                    return Err(StoreError::Conflict(data.self_url.clone()));
                }
            }
        }
        let Documents { feeds, by_self, .. } = &mut *inner;
        let feed = feeds
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("feed {id}")))?;
        if let Some(data) = patch.data {
            if data.self_url != feed.data.self_url {
                by_self.remove(&feed.data.self_url);
                by_self.insert(data.self_url.clone(), id);
            }
            feed.data = data;
        }
        if let Some(items) = patch.items {
            feed.items = items;
        }
        if let Some(synced) = patch.last_synced_at {
            feed.last_synced_at = Some(synced);
        }
        feed.updated_at = Utc::now();
        let updated = feed.clone();
        drop(inner);
        self.persist_feeds().await?;
        Ok(updated)
    }

    async fn upsert_item(&self, guid: &str, feed: FeedId, data: &ItemData) -> Result<Item, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.feeds.contains_key(&feed) {
            return Err(StoreError::NotFound(format!("feed {feed}")));
        }
        let key = (feed, guid.to_owned());
        let mut data = data.clone();
        data.guid = guid.to_owned();

        if let Some(existing_id) = inner.by_guid.get(&key).copied() {
            let item = inner
                .items
                .get_mut(&existing_id)
                .ok_or_else(|| StoreError::NotFound(format!("item {existing_id}")))?;
            if item.data == data {
                // Nothing changed; skip the write.
                return Ok(item.clone());
            }
            item.data = data;
            item.updated_at = Utc::now();
            let updated = item.clone();
            drop(inner);
            self.items_dirty.store(true, Ordering::Release);
            return Ok(updated);
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            feed,
            data,
            created_at: now,
            updated_at: now,
        };
        inner.by_guid.insert(key, item.id);
        inner.items.insert(item.id, item.clone());
        drop(inner);
        self.items_dirty.store(true, Ordering::Release);
        Ok(item)
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(paths) = &self.paths else {
            self.items_dirty.store(false, Ordering::Release);
            return Ok(());
        };
        // Flushes queued behind a write find the flag cleared and skip.
        let _guard = self.persist_lock.lock().await;
        if !self.items_dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let mut items: Vec<Item> = self.inner.read().await.items.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Err(e) = write_json_atomic(&paths.items, &items).await {
            self.items_dirty.store(true, Ordering::Release);
            return Err(e);
        }
        debug!(items = items.len(), "flushed items");
        Ok(())
    }

    async fn count_feeds(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.feeds.len() as u64)
    }

    async fn count_items(&self, filter: ItemFilter) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        let count = match filter {
            ItemFilter::All => inner.items.len(),
            ItemFilter::Feed(feed) => inner.items.values().filter(|i| i.feed == feed).count(),
        };
        Ok(count as u64)
    }

    async fn delete_feed(&self, id: FeedId) -> Result<Option<Feed>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.feeds.remove(&id);
        if let Some(feed) = &removed {
            inner.by_self.remove(&feed.data.self_url);
        }
        drop(inner);
        if removed.is_some() {
            self.persist_feeds().await?;
        }
        Ok(removed)
    }

    async fn delete_items(&self, feed: FeedId) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.items.len();
        inner.items.retain(|_, item| item.feed != feed);
        inner.by_guid.retain(|(owner, _), _| *owner != feed);
        let removed = (before - inner.items.len()) as u64;
        drop(inner);
        if removed > 0 {
            self.items_dirty.store(true, Ordering::Release);
            self.flush().await?;
        }
        Ok(removed)
    }
}
