use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type FeedId = Uuid;
pub type ItemId = Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub label: Option<String>,
    pub term: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Generator {
    pub label: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub url: String,
    /// Medium such as `image`, `audio` or `video`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub mimetype: Option<String>,
    pub length: Option<u64>,
    pub title: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Atom,
    Rss,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedMeta {
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub version: String,
}

/// Canonical feed-level fields, identical for every source format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedData {
    #[serde(rename = "self")]
    pub self_url: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: String,
    pub copyright: Option<String>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub generator: Option<Generator>,
    pub image: Option<Image>,
    pub meta: FeedMeta,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Canonical item fields. `guid` is never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    pub guid: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub image: Option<Image>,
    pub media: Vec<Media>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: FeedId,
    #[serde(flatten)]
    pub data: FeedData,
    pub items: Vec<ItemId>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Human-readable name used in job logs.
    pub fn display_name(&self) -> &str {
        self.data
            .title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.data.self_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub feed: FeedId,
    #[serde(flatten)]
    pub data: ItemData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied by [`crate::storage::FeedStore::update_feed`].
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct FeedPatch {
    pub data: Option<FeedData>,
    pub items: Option<Vec<ItemId>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemFilter {
    #[default]
    All,
    Feed(FeedId),
}
