// src/ingest/providers/ytdlp.rs
//! Fallback enumerator backed by the `yt-dlp` CLI.
//!
//! Slower than the channel feed, but works straight from the channel locator
//! (no resolved id needed) and reports durations. Output is one JSON object per
//! line (`--dump-json`), capped with `--playlist-end`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

use crate::ingest::fetcher::FetchError;
use crate::ingest::normalize_title;
use crate::ingest::types::{ChannelEnumerator, FetchPath, PublishDate, RawItem, Source};

#[derive(Debug, Deserialize)]
struct VideoLine {
    id: Option<String>,
    title: Option<String>,
    upload_date: Option<String>, // "YYYYMMDD"
    timestamp: Option<i64>,      // unix seconds, when upload_date is missing
    duration: Option<f64>,
}

/// Point yt-dlp at the uploads tab so channel home shelves are not enumerated.
pub fn uploads_url(locator: &str) -> String {
    let base = locator.trim().trim_end_matches('/');
    if base.ends_with("/videos") || base.contains("list=") {
        base.to_string()
    } else {
        format!("{base}/videos")
    }
}

/// Parse `--dump-json` output. Lines that are not JSON objects or lack an id
/// or a date are skipped; at most `limit` items are returned.
pub fn parse_dump_lines(stdout: &str, source_name: &str, limit: usize) -> Vec<RawItem> {
    let mut out = Vec::new();
    for line in stdout.lines() {
        if out.len() >= limit {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v: VideoLine = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(source = source_name, error = %e, "skipping non-json yt-dlp line");
                continue;
            }
        };
        let Some(video_id) = v.id.filter(|s| !s.is_empty()) else {
            continue;
        };
        let published = v
            .upload_date
            .as_deref()
            .and_then(PublishDate::parse_key)
            .or_else(|| v.timestamp.and_then(PublishDate::from_unix));
        let Some(published) = published else {
            tracing::debug!(source = source_name, %video_id, "yt-dlp entry without usable date");
            continue;
        };
        out.push(RawItem {
            video_id,
            title: normalize_title(v.title.as_deref().unwrap_or_default()),
            published,
            source: source_name.to_string(),
            duration_secs: v
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|d| d.trunc() as u64),
            path: FetchPath::Enumerator,
        });
    }
    out
}

pub struct YtDlpEnumerator {
    program: String,
}

impl YtDlpEnumerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlpEnumerator {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl ChannelEnumerator for YtDlpEnumerator {
    async fn list_recent(&self, source: &Source, limit: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let url = uploads_url(&source.url);

        // kill_on_drop: the fetcher's timeout drops this future, which must not leak the child.
        let output = Command::new(&self.program)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                "--ignore-errors",
                "--playlist-end",
            ])
            .arg(limit.to_string())
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning {}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        // --ignore-errors makes yt-dlp exit non-zero on a single bad entry; keep what parsed.
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().last().unwrap_or_default().chars().take(200).collect();
            return Err(FetchError::Process(format!("{} ({})", output.status, tail)).into());
        }

        let items = parse_dump_lines(&stdout, &source.name, limit);
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("curate_fetch_ms", "path" => "enumerator").record(ms);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_url_appends_videos_tab_once() {
        assert_eq!(
            uploads_url("https://www.youtube.com/@markets/"),
            "https://www.youtube.com/@markets/videos"
        );
        assert_eq!(
            uploads_url("https://www.youtube.com/@markets/videos"),
            "https://www.youtube.com/@markets/videos"
        );
    }

    #[test]
    fn parses_lines_with_duration_and_date_fallbacks() {
        let out = concat!(
            r#"{"id":"a1","title":"Jobs report","upload_date":"20260206","duration":612.4}"#,
            "\n",
            "WARNING: not json\n",
            r#"{"id":"b2","title":"Quick take #shorts","timestamp":1770422400,"duration":45}"#,
            "\n",
            r#"{"id":"c3","title":"No date"}"#,
            "\n",
        );
        let items = parse_dump_lines(out, "Markets", 10);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].duration_secs, Some(612));
        assert_eq!(items[0].published.key(), "20260206");
        assert_eq!(items[1].duration_secs, Some(45));
        // 1770422400 = 2026-02-07T00:00:00Z
        assert_eq!(items[1].published.key(), "20260207");
        assert!(items.iter().all(|i| i.path == FetchPath::Enumerator));
    }

    #[test]
    fn limit_caps_output() {
        let line = r#"{"id":"x","title":"t","upload_date":"20260206"}"#;
        let out = std::iter::repeat(line).take(15).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_dump_lines(&out, "S", 10).len(), 10);
    }

    #[tokio::test]
    async fn missing_binary_is_an_error_not_a_panic() {
        let e = YtDlpEnumerator::new("definitely-not-a-real-yt-dlp-binary");
        let src = Source::new("S", "https://www.youtube.com/@s");
        assert!(e.list_recent(&src, 10).await.is_err());
    }
}
