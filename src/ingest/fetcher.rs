// src/ingest/fetcher.rs
//! Dual-source fetch: channel feed first, `yt-dlp` enumeration when the feed
//! is unavailable or empty. Failures on either path degrade to zero items.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::ingest::types::{ChannelEnumerator, FeedClient, FetchPath, RawItem, Source};

pub const DEFAULT_FAST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_FALLBACK_LIMIT: usize = 10;

/// Why a fetch path produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{path} path timed out after {secs}s")]
    Timeout { path: FetchPath, secs: u64 },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("enumerator process failed: {0}")]
    Process(String),
}

/// Short label for logs and the `kind` metric label.
pub fn error_kind(e: &anyhow::Error) -> &'static str {
    if let Some(fe) = e.downcast_ref::<FetchError>() {
        return match fe {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Http { .. } => "http",
            FetchError::Malformed(_) => "malformed",
            FetchError::Process(_) => "process",
        };
    }
    if e.downcast_ref::<reqwest::Error>().is_some() {
        return "transport";
    }
    "other"
}

/// Result of fetching one source.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<RawItem>,
    /// Path that produced `items`; `None` when both came back empty.
    pub path: Option<FetchPath>,
    pub fast_error: Option<String>,
    pub fallback_error: Option<String>,
    pub fallback_attempted: bool,
}

pub struct DualSourceFetcher {
    feed: Arc<dyn FeedClient>,
    enumerator: Arc<dyn ChannelEnumerator>,
    fast_timeout: Duration,
    fallback_timeout: Duration,
    fallback_limit: usize,
}

impl DualSourceFetcher {
    pub fn new(feed: Arc<dyn FeedClient>, enumerator: Arc<dyn ChannelEnumerator>) -> Self {
        Self {
            feed,
            enumerator,
            fast_timeout: DEFAULT_FAST_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
        }
    }

    pub fn with_timeouts(mut self, fast: Duration, fallback: Duration) -> Self {
        self.fast_timeout = fast;
        self.fallback_timeout = fallback;
        self
    }

    pub fn with_fallback_limit(mut self, limit: usize) -> Self {
        self.fallback_limit = limit.max(1);
        self
    }

    /// Fetch recent items for `source`. `channel_id` is `None` when resolution
    /// failed, which skips the feed path entirely.
    pub async fn fetch(&self, source: &Source, channel_id: Option<&str>) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        // 1) Fast path
        if let Some(id) = channel_id {
            match self.fetch_fast(id, &source.name).await {
                Ok(items) if !items.is_empty() => {
                    counter!("curate_fetched_total", "path" => "feed").increment(items.len() as u64);
                    outcome.items = items;
                    outcome.path = Some(FetchPath::Feed);
                    return outcome;
                }
                Ok(_) => {
                    tracing::debug!(source = %source.name, "feed returned no items");
                }
                Err(e) => {
                    let kind = error_kind(&e);
                    tracing::warn!(source = %source.name, provider = self.feed.name(), kind, error = %format!("{e:#}"), "feed path failed");
                    counter!("curate_fetch_errors_total", "path" => "feed", "kind" => kind)
                        .increment(1);
                    outcome.fast_error = Some(format!("{e:#}"));
                }
            }
        }

        // 2) Fallback path, exactly once
        outcome.fallback_attempted = true;
        counter!("curate_fallback_used_total").increment(1);
        match self.fetch_fallback(source).await {
            Ok(mut items) => {
                items.truncate(self.fallback_limit);
                if items.is_empty() {
                    tracing::info!(source = %source.name, "both paths empty");
                } else {
                    counter!("curate_fetched_total", "path" => "enumerator")
                        .increment(items.len() as u64);
                    outcome.path = Some(FetchPath::Enumerator);
                }
                outcome.items = items;
            }
            Err(e) => {
                let kind = error_kind(&e);
                tracing::warn!(source = %source.name, provider = self.enumerator.name(), kind, error = %format!("{e:#}"), "enumerator path failed");
                counter!("curate_fetch_errors_total", "path" => "enumerator", "kind" => kind)
                    .increment(1);
                outcome.fallback_error = Some(format!("{e:#}"));
            }
        }
        outcome
    }

    async fn fetch_fast(&self, channel_id: &str, source_name: &str) -> anyhow::Result<Vec<RawItem>> {
        match timeout(self.fast_timeout, self.feed.fetch_feed(channel_id, source_name)).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                path: FetchPath::Feed,
                secs: self.fast_timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn fetch_fallback(&self, source: &Source) -> anyhow::Result<Vec<RawItem>> {
        let fut = self.enumerator.list_recent(source, self.fallback_limit);
        match timeout(self.fallback_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                path: FetchPath::Enumerator,
                secs: self.fallback_timeout.as_secs(),
            }
            .into()),
        }
    }
}
