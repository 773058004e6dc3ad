//! Daily curation run: binary entrypoint.
//! Loads config, runs one curation pass over every source and persists the
//! snapshot, cluster report and metrics under the state directory.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_video_curator::config;
use daily_video_curator::engine::{cancel_pair, Curator};
use daily_video_curator::history::{JsonFileSeenStore, SeenStore};
use daily_video_curator::ingest::fetcher::DualSourceFetcher;
use daily_video_curator::ingest::providers::{YoutubeFeedClient, YtDlpEnumerator};
use daily_video_curator::ingest::resolver::{CachedResolver, ChannelCache, HttpChannelResolver};
use daily_video_curator::metrics::Metrics;

const SEEN_STORE_CAP: usize = 5_000;
const RESOLVER_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Compact logs by default; `CURATE_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_video_curator=info,curate=info,warn"));

    let json = std::env::var("CURATE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;
    let metrics = Metrics::init()?;

    // --- wiring ---
    let cache = ChannelCache::load(cfg.channel_cache_path());
    let resolver = CachedResolver::new(HttpChannelResolver::new(RESOLVER_HTTP_TIMEOUT)?, cache);
    let feed = YoutubeFeedClient::new(cfg.fast_timeout())?;
    let enumerator = YtDlpEnumerator::new(cfg.ytdlp_path.clone());
    let fetcher = DualSourceFetcher::new(Arc::new(feed), Arc::new(enumerator))
        .with_timeouts(cfg.fast_timeout(), cfg.fallback_timeout())
        .with_fallback_limit(cfg.fallback_limit);
    let seen = Arc::new(JsonFileSeenStore::open(cfg.seen_store_path(), SEEN_STORE_CAP)?);

    let curator = Curator::new(
        Arc::new(resolver),
        Arc::new(fetcher),
        seen.clone(),
        cfg.run_params(),
    );

    // Ctrl-C stops outstanding sources; finished ones still make the snapshot.
    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let now = chrono::Utc::now();
    let report = curator.run(&cfg.sources, now, token).await;

    // --- persist: snapshot first, then mark seen ---
    let snap_dir = cfg.snapshot_dir();
    std::fs::create_dir_all(&snap_dir)
        .with_context(|| format!("creating {}", snap_dir.display()))?;
    let stem = format!("{}-{}", now.format("%Y%m%d"), report.snapshot.id);
    let snap_path = snap_dir.join(format!("{stem}.json"));
    std::fs::write(&snap_path, report.snapshot.to_json_pretty()?)
        .with_context(|| format!("writing {}", snap_path.display()))?;

    seen.mark_seen(&report.snapshot.video_ids())?;

    if let Some(clusters) = &report.clusters {
        let p = snap_dir.join(format!("{stem}.clusters.json"));
        std::fs::write(&p, serde_json::to_vec_pretty(clusters)?)
            .with_context(|| format!("writing {}", p.display()))?;
    }
    let diag_path = snap_dir.join(format!("{stem}.diagnostics.json"));
    std::fs::write(&diag_path, serde_json::to_vec_pretty(&report.diagnostics)?)
        .with_context(|| format!("writing {}", diag_path.display()))?;

    if let Err(e) = metrics.write_textfile(&cfg.metrics_textfile_path()) {
        tracing::warn!(error = ?e, "metrics textfile not written");
    }

    tracing::info!(
        target: "curate",
        path = %snap_path.display(),
        items = report.snapshot.total,
        cancelled = report.cancelled,
        "snapshot written"
    );
    Ok(())
}
