mod common;

use std::time::Duration;

use feedsync_core::{spawn_scheduler, FeedSync, JobKind, JsonStore, SyncConfig};

use common::{sample_rss, CountingSource};

#[tokio::test]
async fn scheduler_refreshes_stored_feeds_until_stopped() {
    let source = CountingSource::new(sample_rss(), Duration::ZERO);
    let sync = FeedSync::new(JsonStore::in_memory(), source.clone(), SyncConfig::default());
    sync.sync_single_feed("https://example.com/feed")
        .await
        .unwrap();
    assert_eq!(source.calls(), 1);

    let scheduler = spawn_scheduler(sync.clone(), Duration::from_secs(3600));

    // The first tick fires immediately.
    let mut waited = Duration::ZERO;
    while sync.progress(JobKind::RefreshAll).finished_at.is_none() {
        assert!(waited < Duration::from_secs(5), "refresh never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }

    let progress = sync.progress(JobKind::RefreshAll);
    assert_eq!(progress.total, 1);
    assert_eq!(progress.success(), 1);
    assert_eq!(source.calls(), 2);

    scheduler.stop().await.unwrap();
    assert_eq!(source.calls(), 2);
}
