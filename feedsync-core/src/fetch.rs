use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{redirect, Client, ClientBuilder};
use tracing::debug;
use url::Url;

use crate::config::SyncConfig;
use crate::error::{FetchError, SyncError};

/// Retrieves raw feed content. Callers hand over URLs that already passed
/// [`validate_feed_url`].
pub trait FeedSource: Send + Sync + Clone + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Syntactic check run before any network access: an absolute `http(s)` URL
/// with a host and no embedded whitespace.
pub fn validate_feed_url(raw: &str) -> Result<Url, SyncError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SyncError::validation(raw, "empty URL"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(SyncError::validation(raw, "URL contains whitespace"));
    }
    let url = Url::parse(trimmed).map_err(|e| SyncError::validation(raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(SyncError::validation(
                raw,
                format!("unsupported scheme {other:?}"),
            ))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(SyncError::validation(raw, "URL has no host"));
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::new(client, config.request_timeout()))
    }
}

impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        debug!(url = %url, "fetching feed");
        let request = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok(response.bytes().await?)
        };
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(|err| match err {
                FetchError::Network(e) if e.is_timeout() => FetchError::Timeout,
                FetchError::Network(e) if e.is_connect() => FetchError::Unreachable(e.to_string()),
                other => other,
            }),
            Err(_) => Err(FetchError::Timeout),
        }
    }
}
