pub mod batch;
pub mod config;
pub mod curated;
pub mod data;
pub mod error;
pub mod fetch;
pub mod language;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod scheduler;
pub mod service;
pub mod storage;

pub use batch::{run_batch, SyncUnit};
pub use config::{AppConfig, StorageConfig, SyncConfig};
pub use curated::curated_feed_links;
pub use data::JsonStore;
pub use error::{ConfigError, FetchError, StoreError, SyncError};
pub use fetch::{validate_feed_url, FeedSource, HttpFetcher};
pub use models::{Feed, FeedData, FeedKind, Item, ItemData, ItemFilter};
pub use normalize::{normalize, NormalizedFeed};
pub use progress::{JobHandle, JobKind, JobLog, JobProgress, JobTracker, LogStatus};
pub use reconcile::{reconcile, ReconcileOutcome, SyncedFeed};
pub use scheduler::{spawn_scheduler, SchedulerHandle};
pub use service::{DeletedFeed, FeedSync, StoreStats};
pub use storage::FeedStore;
