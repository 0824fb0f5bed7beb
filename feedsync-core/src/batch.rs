use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::{stream, FutureExt, StreamExt};
use tracing::warn;

use crate::error::SyncError;
use crate::models::Feed;
use crate::progress::{JobLog, JobTracker, LogStatus};

/// One unit of batch work.
#[derive(Debug, Clone)]
pub enum SyncUnit {
    /// A known feed, re-synced from its `self` URL.
    Stored(Feed),
    /// A bare feed URL that may or may not be stored yet.
    Url(String),
}

impl SyncUnit {
    pub fn identifier(&self) -> String {
        match self {
            SyncUnit::Stored(feed) => feed.display_name().to_owned(),
            SyncUnit::Url(url) => url.clone(),
        }
    }
}

/// Runs `work` over every unit with at most `limit` units in flight.
///
/// Settles all units: an error or panic in one unit is recorded against that
/// unit and never stops its siblings. Every unit increments `processed` on the
/// tracker exactly once, in completion order.
pub async fn run_batch<F, Fut>(units: Vec<SyncUnit>, limit: usize, tracker: &JobTracker, work: F)
where
    F: Fn(SyncUnit) -> Fut,
    Fut: Future<Output = Result<LogStatus, SyncError>>,
{
    stream::iter(units)
        .map(|unit| {
            let identifier = unit.identifier();
            let pipeline = AssertUnwindSafe(work(unit)).catch_unwind();
            async move {
                let log = match pipeline.await {
                    Ok(Ok(status)) => JobLog::ok(identifier, status),
                    Ok(Err(err)) => {
                        warn!(job = %tracker.kind(), unit = %identifier, error = %err, "unit failed");
                        JobLog::failed(identifier, err.to_string())
                    }
                    Err(_) => {
                        warn!(job = %tracker.kind(), unit = %identifier, "unit panicked");
                        JobLog::failed(identifier, "unit panicked")
                    }
                };
                tracker.record(log);
            }
        })
        .buffer_unordered(limit.max(1))
        .for_each(|()| async {})
        .await;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::progress::JobKind;

    #[tokio::test]
    async fn settles_errors_and_panics() {
        let tracker = JobTracker::new(JobKind::LoadCurated);
        let _guard = tracker.try_start().unwrap();
        let units = ["ok", "bad", "panic", "ok2"]
            .iter()
            .map(|s| SyncUnit::Url((*s).to_owned()))
            .collect();

        run_batch(units, 2, &tracker, |unit| async move {
            match unit.identifier().as_str() {
                "bad" => Err(SyncError::validation("bad", "nope")),
                "panic" => panic!("boom"),
                _ => Ok(LogStatus::Created),
            }
        })
        .await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.processed, 4);
        assert_eq!(snapshot.created(), 2);
        assert_eq!(snapshot.failed(), 2);
        let panicked = snapshot.logs.iter().find(|l| l.identifier == "panic").unwrap();
        assert_eq!(panicked.message.as_deref(), Some("unit panicked"));
    }

    #[tokio::test]
    async fn respects_limit() {
        let tracker = JobTracker::new(JobKind::RefreshAll);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let units = (0..20).map(|i| SyncUnit::Url(i.to_string())).collect();
        let (in_flight, peak) = (&in_flight, &peak);

        run_batch(units, 3, &tracker, move |_| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(LogStatus::Success)
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(tracker.snapshot().processed, 20);
    }
}
