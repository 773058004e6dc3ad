// src/ingest/mod.rs
pub mod fetcher;
pub mod providers;
pub mod resolver;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// Max title length kept after normalization (chars).
const TITLE_CAP: usize = 300;

/// One-time metrics registration (so series show up in the exported textfile).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curate_fetched_total",
            "Items returned by the feed or enumerator path."
        );
        describe_counter!(
            "curate_recency_dropped_total",
            "Items dropped as older than the lookback cutoff."
        );
        describe_counter!(
            "curate_format_dropped_total",
            "Items dropped as short-form."
        );
        describe_counter!(
            "curate_seen_dropped_total",
            "Items dropped because a previous run already emitted them."
        );
        describe_counter!("curate_kept_total", "Items kept in the snapshot.");
        describe_counter!(
            "curate_resolution_failures_total",
            "Channels whose id could not be resolved."
        );
        describe_counter!(
            "curate_fetch_errors_total",
            "Feed/enumerator failures (timeout, transport, malformed payload)."
        );
        describe_counter!(
            "curate_fallback_used_total",
            "Sources that needed the enumerator fallback."
        );
        describe_histogram!("curate_fetch_ms", "Per-path fetch time in milliseconds.");
        describe_gauge!("curate_last_run_ts", "Unix ts when curation last ran.");
    });
}

/// Normalize a video title: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_title(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > TITLE_CAP {
        out = out.chars().take(TITLE_CAP).collect();
    }

    out
}
