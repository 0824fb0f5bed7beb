use std::collections::HashMap;

use chrono::Utc;
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, SyncError};
use crate::models::{Feed, FeedPatch, Item, ItemData, ItemId};
use crate::normalize::NormalizedFeed;
use crate::storage::FeedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncedFeed {
    pub feed: Feed,
    pub items: Vec<Item>,
    pub outcome: ReconcileOutcome,
}

/// Merges a freshly normalized feed into the store.
///
/// Items are upserted by `(guid, feed)`, so running this twice over the same
/// content leaves the item count unchanged. A failure part-way leaves earlier
/// writes in place; the next sync repairs them.
pub async fn reconcile<S: FeedStore>(
    store: &S,
    normalized: NormalizedFeed,
    existing: Option<Feed>,
) -> Result<SyncedFeed, SyncError> {
    let NormalizedFeed { feed: data, items } = normalized;
    let name = data.self_url.clone();
    let storage_err = |e| SyncError::storage(&name, e);

    let (feed, outcome) = match existing {
        None => {
            let created = store.create_feed(&data).await.map_err(storage_err)?;
            (created, ReconcileOutcome::Created)
        }
        Some(existing) => {
            let patch = FeedPatch {
                data: Some(data),
                last_synced_at: Some(Utc::now()),
                ..FeedPatch::default()
            };
            let updated = store
                .update_feed(existing.id, patch)
                .await
                .map_err(storage_err)?;
            (updated, ReconcileOutcome::Updated)
        }
    };

    let stored = upsert_items(store, &feed, &items).await.map_err(storage_err)?;
    store.flush().await.map_err(storage_err)?;

    // The feed links exactly the items its source currently publishes.
    let linked: Vec<ItemId> = stored.iter().map(|item| item.id).collect();
    let feed = if linked != feed.items {
        let patch = FeedPatch {
            items: Some(linked),
            ..FeedPatch::default()
        };
        store
            .update_feed(feed.id, patch)
            .await
            .map_err(storage_err)?
    } else {
        feed
    };

    debug!(
        feed = %feed.data.self_url,
        outcome = ?outcome,
        items = stored.len(),
        "reconciled feed"
    );
    Ok(SyncedFeed {
        feed,
        items: stored,
        outcome,
    })
}

async fn upsert_items<S: FeedStore>(
    store: &S,
    feed: &Feed,
    items: &[ItemData],
) -> Result<Vec<Item>, StoreError> {
    let results = try_join_all(
        items
            .iter()
            .map(|item| store.upsert_item(&item.guid, feed.id, item)),
    )
    .await?;

    // A feed may repeat a guid; keep one entry per stored item, latest write wins.
    let mut positions: HashMap<ItemId, usize> = HashMap::new();
    let mut unique: Vec<Item> = Vec::with_capacity(results.len());
    for item in results {
        match positions.get(&item.id) {
            Some(&pos) => unique[pos] = item,
            None => {
                positions.insert(item.id, unique.len());
                unique.push(item);
            }
        }
    }
    Ok(unique)
}
