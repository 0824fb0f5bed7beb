use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::fetch::FeedSource;
use crate::service::FeedSync;
use crate::storage::FeedStore;

pub struct SchedulerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops triggering new refreshes. A refresh already in flight keeps
    /// running to completion in the background.
    pub async fn stop(self) -> Result<(), SyncError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(SyncError::from)
    }
}

/// Triggers a full refresh every `interval`, the first one immediately.
/// Ticks that land while a refresh is still running are skipped.
pub fn spawn_scheduler<S, F>(service: FeedSync<S, F>, interval: Duration) -> SchedulerHandle
where
    S: FeedStore,
    F: FeedSource,
{
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("refresh scheduler shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let handle = service.start_refresh_all();
                    if handle.started() {
                        info!("scheduled refresh started");
                    } else {
                        debug!("previous refresh still running, skipping tick");
                    }
                }
            }
        }
    });

    SchedulerHandle { cancel_tx, join }
}
