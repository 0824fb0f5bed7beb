//! Live progress of long-running sync jobs.
//!
//! One [`JobTracker`] exists per [`JobKind`]. Workers record unit outcomes
//! concurrently; readers take snapshots at any time. All mutations go through
//! a single mutex held only for the duration of a counter bump, so a snapshot
//! never waits on network or storage I/O.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    RefreshAll,
    LoadCurated,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::RefreshAll => f.write_str("refresh-all"),
            JobKind::LoadCurated => f.write_str("load-curated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Created,
    Updated,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobLog {
    pub identifier: String,
    pub status: LogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobLog {
    pub fn ok(identifier: impl Into<String>, status: LogStatus) -> Self {
        Self {
            identifier: identifier.into(),
            status,
            message: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: LogStatus::Failed,
            message: Some(message.into()),
        }
    }
}

/// Outcome counters; the vocabulary depends on the job kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Counters {
    Refresh { success: u64, failed: u64 },
    Curated { created: u64, updated: u64, failed: u64 },
}

impl Counters {
    fn empty(kind: JobKind) -> Self {
        match kind {
            JobKind::RefreshAll => Counters::Refresh { success: 0, failed: 0 },
            JobKind::LoadCurated => Counters::Curated {
                created: 0,
                updated: 0,
                failed: 0,
            },
        }
    }

    fn bump(&mut self, status: LogStatus) {
        match (self, status) {
            (Counters::Refresh { failed, .. } | Counters::Curated { failed, .. }, LogStatus::Failed) => {
                *failed += 1
            }
            (Counters::Refresh { success, .. }, _) => *success += 1,
            (Counters::Curated { created, .. }, LogStatus::Created) => *created += 1,
            // A plain success on an existing feed is an update.
            (Counters::Curated { updated, .. }, _) => *updated += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub kind: JobKind,
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: u64,
    pub processed: u64,
    #[serde(flatten)]
    pub counters: Counters,
    pub logs: Vec<JobLog>,
}

impl JobProgress {
    fn idle(kind: JobKind) -> Self {
        Self {
            kind,
            is_running: false,
            started_at: None,
            finished_at: None,
            total: 0,
            processed: 0,
            counters: Counters::empty(kind),
            logs: Vec::new(),
        }
    }

    pub fn success(&self) -> u64 {
        match self.counters {
            Counters::Refresh { success, .. } => success,
            Counters::Curated { created, updated, .. } => created + updated,
        }
    }

    pub fn created(&self) -> u64 {
        match self.counters {
            Counters::Curated { created, .. } => created,
            Counters::Refresh { .. } => 0,
        }
    }

    pub fn updated(&self) -> u64 {
        match self.counters {
            Counters::Curated { updated, .. } => updated,
            Counters::Refresh { .. } => 0,
        }
    }

    pub fn failed(&self) -> u64 {
        match self.counters {
            Counters::Refresh { failed, .. } | Counters::Curated { failed, .. } => failed,
        }
    }
}

#[derive(Debug)]
pub struct JobTracker {
    kind: JobKind,
    state: Mutex<JobProgress>,
}

impl JobTracker {
    pub fn new(kind: JobKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            state: Mutex::new(JobProgress::idle(kind)),
        })
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    fn lock(&self) -> MutexGuard<'_, JobProgress> {
        // Counters stay meaningful even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `Idle → Running`, resetting all counters and logs.
    ///
    /// Returns `None` when a run of this kind is already in progress. The
    /// returned guard moves the tracker back to `Idle` when dropped.
    pub fn try_start(self: &Arc<Self>) -> Option<RunGuard> {
        let mut state = self.lock();
        if state.is_running {
            debug!(job = %self.kind, "job already running, ignoring start");
            return None;
        }
        *state = JobProgress::idle(self.kind);
        state.is_running = true;
        state.started_at = Some(Utc::now());
        drop(state);
        info!(job = %self.kind, "job started");
        Some(RunGuard {
            tracker: Arc::clone(self),
        })
    }

    pub fn set_total(&self, total: u64) {
        self.lock().total = total;
    }

    /// Records the outcome of one unit of work.
    pub fn record(&self, log: JobLog) {
        let mut state = self.lock();
        state.processed += 1;
        state.counters.bump(log.status);
        state.logs.push(log);
    }

    fn finish(&self) {
        let mut state = self.lock();
        state.is_running = false;
        state.finished_at = Some(Utc::now());
        info!(
            job = %self.kind,
            total = state.total,
            processed = state.processed,
            failed = state.failed(),
            "job finished"
        );
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running
    }

    pub fn snapshot(&self) -> JobProgress {
        self.lock().clone()
    }

    /// Full snapshots every `interval`, starting immediately. The stream never
    /// ends; consumers drop it when they disconnect.
    pub fn watch(self: &Arc<Self>, interval: Duration) -> impl Stream<Item = JobProgress> + Send {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        stream::unfold((Arc::clone(self), ticker), |(tracker, mut ticker)| async move {
            ticker.tick().await;
            let snapshot = tracker.snapshot();
            Some((snapshot, (tracker, ticker)))
        })
    }
}

/// Marks the owning run as finished when dropped, including on panic.
#[derive(Debug)]
pub struct RunGuard {
    tracker: Arc<JobTracker>,
}

impl RunGuard {
    pub fn tracker(&self) -> &Arc<JobTracker> {
        &self.tracker
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}

/// Handle to a fire-and-forget job.
#[derive(Debug)]
pub struct JobHandle {
    tracker: Arc<JobTracker>,
    join: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub(crate) fn spawned(tracker: Arc<JobTracker>, join: JoinHandle<()>) -> Self {
        Self {
            tracker,
            join: Some(join),
        }
    }

    /// Handle for a start request that was ignored because a run was active.
    pub(crate) fn already_running(tracker: Arc<JobTracker>) -> Self {
        Self { tracker, join: None }
    }

    /// Whether this handle started a new run.
    pub fn started(&self) -> bool {
        self.join.is_some()
    }

    pub fn kind(&self) -> JobKind {
        self.tracker.kind()
    }

    pub fn snapshot(&self) -> JobProgress {
        self.tracker.snapshot()
    }

    /// Waits for the run started by this handle and returns the final
    /// snapshot. For an ignored start this returns the current snapshot
    /// without waiting.
    pub async fn wait(self) -> Result<JobProgress, SyncError> {
        if let Some(join) = self.join {
            join.await?;
        }
        Ok(self.tracker.snapshot())
    }
}
