use thiserror::Error;

/// Failure of the pipeline for one feed URL.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid feed URL {url:?}: {reason}")]
    Validation { url: String, reason: String },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse feed {url}: {message}")]
    Parse { url: String, message: String },
    #[error("storage error for feed {feed}: {source}")]
    Storage {
        feed: String,
        #[source]
        source: StoreError,
    },
    #[error("background job failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SyncError {
    pub fn validation(url: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn storage(feed: &str, source: StoreError) -> Self {
        Self::Storage {
            feed: feed.to_owned(),
            source,
        }
    }

    /// Whether the caller can fix the failure by sending a different input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("source unreachable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a feed with self URL {0} already exists")]
    Conflict(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
