//! # Recency & Format Filter
//! Narrows fetched items to what belongs in today's feed.
//!
//! - Recency: published on or after the cutoff *day* (cutoff time-of-day is
//!   truncated to midnight UTC, so feed items without sub-day precision are
//!   never dropped for being a few hours short).
//! - Format: short-form items are dropped unless the source opts in. Known
//!   duration under 60s, or a `#shorts`-style marker in the title, excludes.
//!   Unknown duration without a marker is kept.
//!
//! Both rules must pass. Recency is evaluated first, which only matters for
//! which drop counter an item is attributed to.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::ingest::types::{CuratedItem, PublishDate, RawItem};

pub const DEFAULT_LOOKBACK_HOURS: u64 = 48;
pub const SHORT_FORM_MAX_SECS: u64 = 60;
const MAX_LOOKBACK_HOURS: u64 = 24 * 366 * 100;

/// Title tokens marking a short-form upload (compared lowercase).
const SHORT_FORM_MARKERS: &[&str] = &["#shorts", "#short", "#ytshorts"];

/// Per-rule drop counters for one filtering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub recency_dropped: usize,
    pub format_dropped: usize,
}

/// Cutoff day for a run at `now` looking back `lookback_hours`.
pub fn cutoff_date(now: DateTime<Utc>, lookback_hours: u64) -> PublishDate {
    let hours = lookback_hours.min(MAX_LOOKBACK_HOURS) as i64;
    let cutoff = now
        .checked_sub_signed(Duration::hours(hours))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    PublishDate::from_datetime(cutoff)
}

pub fn passes_recency(item: &RawItem, cutoff: PublishDate) -> bool {
    item.published >= cutoff
}

pub fn has_short_form_marker(title: &str) -> bool {
    title.split_whitespace().any(|tok| {
        let t = tok
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        SHORT_FORM_MARKERS.contains(&t.as_str())
    })
}

pub fn passes_format(item: &RawItem, allow_shorts: bool) -> bool {
    if allow_shorts {
        return true;
    }
    if let Some(d) = item.duration_secs {
        if d < SHORT_FORM_MAX_SECS {
            return false;
        }
    }
    !has_short_form_marker(&item.title)
}

/// Apply both rules to one source's items, preserving input order.
pub fn apply_filters(
    cutoff: PublishDate,
    items: Vec<RawItem>,
    allow_shorts: bool,
) -> (Vec<CuratedItem>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut kept = Vec::with_capacity(items.len());
    for it in items {
        if !passes_recency(&it, cutoff) {
            stats.recency_dropped += 1;
            continue;
        }
        if !passes_format(&it, allow_shorts) {
            stats.format_dropped += 1;
            continue;
        }
        kept.push(it);
    }
    (kept, stats)
}
