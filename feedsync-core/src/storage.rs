//! Storage collaborator used by the reconciliation engine.
//!
//! Every operation is treated as an atomic single-document write or read.
//! Implementations must enforce uniqueness of `Feed::self` and of the
//! `(guid, feed)` pair on items.

use std::future::Future;

use crate::error::StoreError;
use crate::models::{Feed, FeedData, FeedId, FeedPatch, Item, ItemData, ItemFilter};

pub trait FeedStore: Send + Sync + Clone + 'static {
    fn find_feed_by_self(
        &self,
        self_url: &str,
    ) -> impl Future<Output = Result<Option<Feed>, StoreError>> + Send;

    fn list_feeds(&self) -> impl Future<Output = Result<Vec<Feed>, StoreError>> + Send;

    /// Fails with [`StoreError::Conflict`] when `data.self_url` is taken.
    fn create_feed(&self, data: &FeedData)
        -> impl Future<Output = Result<Feed, StoreError>> + Send;

    fn update_feed(
        &self,
        id: FeedId,
        patch: FeedPatch,
    ) -> impl Future<Output = Result<Feed, StoreError>> + Send;

    /// Inserts the item when `(guid, feed)` is unknown, overwrites it otherwise.
    /// The write may stay buffered until [`FeedStore::flush`].
    fn upsert_item(
        &self,
        guid: &str,
        feed: FeedId,
        data: &ItemData,
    ) -> impl Future<Output = Result<Item, StoreError>> + Send;

    /// Makes item upserts since the last flush durable.
    fn flush(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn count_feeds(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn count_items(&self, filter: ItemFilter)
        -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Returns the removed feed, or `None` if it did not exist.
    fn delete_feed(&self, id: FeedId)
        -> impl Future<Output = Result<Option<Feed>, StoreError>> + Send;

    /// Returns the number of removed items.
    fn delete_items(&self, feed: FeedId) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
