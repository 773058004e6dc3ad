//! Run output: the ordered list of curated items plus run metadata.
//! Built once per run and never mutated; persisting it is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ingest::types::CuratedItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Content fingerprint (run day + ordered ids). Same content → same id,
    /// so a storage layer can treat rewrites of a run as idempotent.
    pub id: String,
    pub run_at: DateTime<Utc>,
    pub total: usize,
    /// Newest first.
    pub items: Vec<CuratedItem>,
}

impl PlaylistSnapshot {
    pub fn new(run_at: DateTime<Utc>, items: Vec<CuratedItem>) -> Self {
        let id = fingerprint(run_at, &items);
        Self {
            id,
            run_at,
            total: items.len(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn video_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.video_id.clone()).collect()
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// First 6 bytes of SHA-256 over the run day and item ids, hex-encoded.
fn fingerprint(run_at: DateTime<Utc>, items: &[CuratedItem]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(run_at.format("%Y%m%d").to_string().as_bytes());
    for it in items {
        hasher.update(b"\n");
        hasher.update(it.source.as_bytes());
        hasher.update(b"/");
        hasher.update(it.video_id.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
