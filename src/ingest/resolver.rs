// src/ingest/resolver.rs
//! Channel resolution: locator (handle/custom URL) → stable `UC…` channel id.
//!
//! Failure is an expected outcome: `resolve_source` never errors, it reports
//! `Resolution::Failed` and the fetcher goes straight to the enumerator.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::ingest::types::{ChannelResolver, Source};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Resolution {
    /// Id given in configuration.
    Configured(String),
    /// Id served from the on-disk cache.
    Cached(String),
    /// Id resolved this run.
    Resolved(String),
    Failed(String),
}

impl Resolution {
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Resolution::Configured(id) | Resolution::Cached(id) | Resolution::Resolved(id) => {
                Some(id)
            }
            Resolution::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Resolution::Failed(_))
    }
}

fn channel_id_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^UC[0-9A-Za-z_-]{22}$").unwrap())
}

/// Id embedded in the locator itself (`…/channel/UC…`).
pub fn channel_id_from_url(locator: &str) -> Option<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"/channel/(UC[0-9A-Za-z_-]{22})").unwrap());
    re.captures(locator).map(|c| c[1].to_string())
}

/// Search a channel page for its id. Patterns ordered from most to least specific.
pub fn channel_id_from_html(html: &str) -> Option<String> {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    let res = RES.get_or_init(|| {
        [
            r#"<meta itemprop="(?:channelId|identifier)" content="(UC[0-9A-Za-z_-]{22})""#,
            r#""externalId"\s*:\s*"(UC[0-9A-Za-z_-]{22})""#,
            r#""channelId"\s*:\s*"(UC[0-9A-Za-z_-]{22})""#,
            r#"channel_id=(UC[0-9A-Za-z_-]{22})"#,
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });
    res.iter()
        .find_map(|re| re.captures(html).map(|c| c[1].to_string()))
}

/// Resolves by URL shape first, then by fetching the channel page.
pub struct HttpChannelResolver {
    client: reqwest::Client,
}

impl HttpChannelResolver {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; daily-video-curator/0.1)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building resolver http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChannelResolver for HttpChannelResolver {
    async fn resolve(&self, locator: &str) -> Result<String> {
        if let Some(id) = channel_id_from_url(locator) {
            return Ok(id);
        }
        let resp = self
            .client
            .get(locator)
            // Skip the EU consent interstitial, which carries no channel metadata.
            .header("Cookie", "CONSENT=YES+1")
            .send()
            .await
            .with_context(|| format!("fetching channel page {locator}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("channel page {locator} returned HTTP {status}"));
        }
        let html = resp.text().await.context("reading channel page")?;
        channel_id_from_html(&html).ok_or_else(|| anyhow!("no channel id found on {locator}"))
    }
}

/// Locator → channel id map persisted as pretty JSON.
#[derive(Debug)]
pub struct ChannelCache {
    path: Option<PathBuf>,
    inner: Mutex<BTreeMap<String, String>>,
}

impl ChannelCache {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load from `path`; a missing or unreadable file starts an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "channel cache unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path),
            inner: Mutex::new(map),
        }
    }

    pub fn get(&self, locator: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("channel cache mutex poisoned")
            .get(locator)
            .cloned()
    }

    pub fn insert(&self, locator: &str, id: &str) -> Result<()> {
        let snapshot = {
            let mut map = self.inner.lock().expect("channel cache mutex poisoned");
            map.insert(locator.to_string(), id.to_string());
            map.clone()
        };
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("channel cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolver wrapper that consults `ChannelCache` first. Only successes are
/// cached, so a failed locator is retried fresh on the next run.
pub struct CachedResolver<R> {
    inner: R,
    cache: ChannelCache,
}

impl<R: ChannelResolver> CachedResolver<R> {
    pub fn new(inner: R, cache: ChannelCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ChannelCache {
        &self.cache
    }
}

#[async_trait]
impl<R: ChannelResolver> ChannelResolver for CachedResolver<R> {
    async fn resolve(&self, locator: &str) -> Result<String> {
        if let Some(id) = self.cache.get(locator) {
            return Ok(id);
        }
        let id = self.inner.resolve(locator).await?;
        if channel_id_re().is_match(&id) {
            if let Err(e) = self.cache.insert(locator, &id) {
                tracing::warn!(locator, error = %format!("{e:#}"), "channel cache write failed");
            }
        }
        Ok(id)
    }

    fn cached_id(&self, locator: &str) -> Option<String> {
        self.cache.get(locator)
    }
}

/// One resolution attempt for `source`. Never fails.
pub async fn resolve_source(resolver: &dyn ChannelResolver, source: &Source) -> Resolution {
    if let Some(id) = source.channel_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Resolution::Configured(id.to_string());
    }
    if let Some(id) = resolver.cached_id(&source.url) {
        return Resolution::Cached(id);
    }
    match resolver.resolve(&source.url).await {
        Ok(id) if channel_id_re().is_match(&id) => Resolution::Resolved(id),
        Ok(id) => {
            tracing::warn!(source = %source.name, %id, "resolver returned a malformed channel id");
            counter!("curate_resolution_failures_total").increment(1);
            Resolution::Failed(format!("malformed channel id `{id}`"))
        }
        Err(e) => {
            tracing::warn!(source = %source.name, url = %source.url, error = %format!("{e:#}"), "channel resolution failed");
            counter!("curate_resolution_failures_total").increment(1);
            Resolution::Failed(format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ID: &str = "UCabcdefghijklmnopqrstuv";

    struct CountingResolver {
        calls: AtomicUsize,
        answer: Option<&'static str>,
    }

    #[async_trait]
    impl ChannelResolver for CountingResolver {
        async fn resolve(&self, _locator: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .map(str::to_string)
                .ok_or_else(|| anyhow!("not found"))
        }
    }

    #[test]
    fn finds_id_in_url_and_html() {
        assert_eq!(
            channel_id_from_url(&format!("https://www.youtube.com/channel/{ID}/videos")),
            Some(ID.to_string())
        );
        let html = format!(r#"<html>..."externalId":"{ID}",...</html>"#);
        assert_eq!(channel_id_from_html(&html), Some(ID.to_string()));
        assert_eq!(channel_id_from_html("<html></html>"), None);
    }

    #[tokio::test]
    async fn configured_id_skips_resolver() {
        let r = CountingResolver {
            calls: AtomicUsize::new(0),
            answer: None,
        };
        let src = Source::new("S", "https://www.youtube.com/@s").with_channel_id(ID);
        let res = resolve_source(&r, &src).await;
        assert_eq!(res, Resolution::Configured(ID.to_string()));
        assert_eq!(r.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedResolver::new(
            CountingResolver {
                calls: AtomicUsize::new(0),
                answer: None,
            },
            ChannelCache::in_memory(),
        );
        let src = Source::new("S", "https://www.youtube.com/@s");
        assert!(resolve_source(&cached, &src).await.is_failure());
        assert!(resolve_source(&cached, &src).await.is_failure());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.cache().is_empty());
    }

    #[tokio::test]
    async fn successes_are_served_from_cache() {
        let cached = CachedResolver::new(
            CountingResolver {
                calls: AtomicUsize::new(0),
                answer: Some(ID),
            },
            ChannelCache::in_memory(),
        );
        let src = Source::new("S", "https://www.youtube.com/@s");
        assert_eq!(
            resolve_source(&cached, &src).await,
            Resolution::Resolved(ID.to_string())
        );
        assert_eq!(
            resolve_source(&cached, &src).await,
            Resolution::Cached(ID.to_string())
        );
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_id_is_a_failure() {
        let r = CountingResolver {
            calls: AtomicUsize::new(0),
            answer: Some("not-an-id"),
        };
        let src = Source::new("S", "https://www.youtube.com/@s");
        assert!(resolve_source(&r, &src).await.is_failure());
    }
}
