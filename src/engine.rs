//! # Curation Engine
//! One run: resolve → fetch → filter → seen-check per source, concurrently,
//! then merge into a single newest-first snapshot and (optionally) cluster.
//!
//! A run never fails. Per-source trouble ends up in `SourceDiagnostics`; a
//! run where nothing survives yields an empty snapshot.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use metrics::{counter, gauge};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::filter::{apply_filters, cutoff_date, DEFAULT_LOOKBACK_HOURS};
use crate::history::SeenStore;
use crate::ingest::fetcher::DualSourceFetcher;
use crate::ingest::resolver::{resolve_source, Resolution};
use crate::ingest::types::{ChannelResolver, CuratedItem, FetchPath, PublishDate, Source};
use crate::snapshot::PlaylistSnapshot;
use crate::topics::{cluster_items, ClusterReport, DEFAULT_SIMILARITY_THRESHOLD};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(15);

// ---- cancellation ----

/// Fires the cancel signal. Dropping it without calling `cancel` does not cancel.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token nobody can cancel.
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is gone.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

// ---- run inputs/outputs ----

#[derive(Debug, Clone)]
pub struct RunParams {
    pub lookback_hours: u64,
    pub similarity_threshold: f64,
    pub max_concurrency: usize,
    pub cluster: bool,
    pub generic_terms: Vec<String>,
    /// Upper bound on one source's channel resolution; expiry counts as a failure.
    pub resolve_timeout: Duration,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cluster: true,
            generic_terms: Vec::new(),
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

/// What happened to one source during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDiagnostics {
    pub source: String,
    /// `None` when the run was cancelled before this source resolved.
    pub resolution: Option<Resolution>,
    pub path: Option<FetchPath>,
    pub fetched: usize,
    pub recency_dropped: usize,
    pub format_dropped: usize,
    pub seen_dropped: usize,
    pub final_count: usize,
    pub note: Option<String>,
}

impl SourceDiagnostics {
    fn cancelled(source: &Source) -> Self {
        Self {
            source: source.name.clone(),
            resolution: None,
            path: None,
            fetched: 0,
            recency_dropped: 0,
            format_dropped: 0,
            seen_dropped: 0,
            final_count: 0,
            note: Some("cancelled".into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub snapshot: PlaylistSnapshot,
    /// One entry per configured source, in configuration order.
    pub diagnostics: Vec<SourceDiagnostics>,
    pub clusters: Option<ClusterReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn diagnostics_for(&self, source: &str) -> Option<&SourceDiagnostics> {
        self.diagnostics.iter().find(|d| d.source == source)
    }
}

// ---- engine ----

pub struct Curator {
    resolver: Arc<dyn ChannelResolver>,
    fetcher: Arc<DualSourceFetcher>,
    seen: Arc<dyn SeenStore>,
    params: RunParams,
}

impl Curator {
    pub fn new(
        resolver: Arc<dyn ChannelResolver>,
        fetcher: Arc<DualSourceFetcher>,
        seen: Arc<dyn SeenStore>,
        params: RunParams,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            seen,
            params,
        }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub async fn run(&self, sources: &[Source], now: DateTime<Utc>, cancel: CancelToken) -> RunReport {
        crate::ingest::ensure_metrics_described();
        let cutoff = cutoff_date(now, self.params.lookback_hours);
        let width = self.params.max_concurrency.max(1);

        tracing::info!(
            target: "curate",
            sources = sources.len(),
            cutoff = %cutoff,
            concurrency = width,
            "run started"
        );

        let mut results: Vec<(usize, Option<(Vec<CuratedItem>, SourceDiagnostics)>)> =
            stream::iter(sources.iter().enumerate())
                .map(|(idx, src)| {
                    let mut token = cancel.clone();
                    async move {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => (idx, None),
                            r = self.curate_source(src, cutoff) => (idx, Some(r)),
                        }
                    }
                })
                .buffer_unordered(width)
                .collect()
                .await;

        // completion order is arbitrary; restore configuration order
        results.sort_by_key(|(idx, _)| *idx);

        let mut merged = Vec::new();
        let mut diagnostics = Vec::with_capacity(sources.len());
        let mut cancelled = cancel.is_cancelled();
        for (idx, res) in results {
            match res {
                Some((items, diag)) => {
                    merged.extend(items);
                    diagnostics.push(diag);
                }
                None => {
                    cancelled = true;
                    tracing::info!(source = %sources[idx].name, "source cancelled");
                    diagnostics.push(SourceDiagnostics::cancelled(&sources[idx]));
                }
            }
        }

        // stable: same-day items keep source order, then per-source order
        merged.sort_by(|a, b| b.published.cmp(&a.published));

        counter!("curate_kept_total").increment(merged.len() as u64);
        gauge!("curate_last_run_ts").set(now.timestamp() as f64);

        let clusters = if self.params.cluster {
            Some(cluster_items(
                &merged,
                &self.params.generic_terms,
                self.params.similarity_threshold,
            ))
        } else {
            None
        };

        let snapshot = PlaylistSnapshot::new(now, merged);
        let failed = diagnostics
            .iter()
            .filter(|d| d.resolution.as_ref().is_some_and(Resolution::is_failure))
            .count();
        tracing::info!(
            target: "curate",
            snapshot = %snapshot.id,
            kept = snapshot.total,
            sources = diagnostics.len(),
            unresolved = failed,
            multi_item_clusters = clusters.as_ref().map(|c| c.multi_item().count()).unwrap_or(0),
            cancelled,
            "run finished"
        );

        RunReport {
            snapshot,
            diagnostics,
            clusters,
            cancelled,
        }
    }

    async fn curate_source(
        &self,
        source: &Source,
        cutoff: PublishDate,
    ) -> (Vec<CuratedItem>, SourceDiagnostics) {
        let limit = self.params.resolve_timeout;
        let resolution =
            match tokio::time::timeout(limit, resolve_source(self.resolver.as_ref(), source)).await {
                Ok(r) => r,
                Err(_) => {
                    tracing::warn!(source = %source.name, secs = limit.as_secs(), "channel resolution timed out");
                    counter!("curate_resolution_failures_total").increment(1);
                    Resolution::Failed(format!("resolution timed out after {}s", limit.as_secs()))
                }
            };
        let outcome = self.fetcher.fetch(source, resolution.channel_id()).await;
        let fetched = outcome.items.len();

        let (filtered, stats) = apply_filters(cutoff, outcome.items, source.allow_shorts);
        counter!("curate_recency_dropped_total").increment(stats.recency_dropped as u64);
        counter!("curate_format_dropped_total").increment(stats.format_dropped as u64);

        let before = filtered.len();
        let kept: Vec<CuratedItem> = filtered
            .into_iter()
            .filter(|it| !self.seen.contains(&it.video_id))
            .collect();
        let seen_dropped = before - kept.len();
        counter!("curate_seen_dropped_total").increment(seen_dropped as u64);

        let note = match (&outcome.fast_error, &outcome.fallback_error) {
            (_, Some(fb)) => Some(format!("enumerator: {fb}")),
            (Some(fast), None) if fetched == 0 => Some(format!("feed: {fast}")),
            _ if fetched == 0 => Some("no items from either path".to_string()),
            _ => None,
        };

        tracing::debug!(
            source = %source.name,
            path = ?outcome.path,
            fetched,
            recency_dropped = stats.recency_dropped,
            format_dropped = stats.format_dropped,
            seen_dropped,
            kept = kept.len(),
            "source curated"
        );

        let diag = SourceDiagnostics {
            source: source.name.clone(),
            resolution: Some(resolution),
            path: outcome.path,
            fetched,
            recency_dropped: stats.recency_dropped,
            format_dropped: stats.format_dropped,
            seen_dropped,
            final_count: kept.len(),
            note,
        };
        (kept, diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_token_observes_handle() {
        let (handle, mut token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn never_token_stays_pending() {
        let mut token = CancelToken::never();
        let r = tokio::time::timeout(std::time::Duration::from_millis(20), token.cancelled()).await;
        assert!(r.is_err());
    }
}
