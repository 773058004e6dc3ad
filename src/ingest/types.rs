// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One tracked channel, as loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String, // display name, e.g. "Bloomberg Television"
    pub url: String,  // human-facing locator, e.g. "https://www.youtube.com/@markets"
    #[serde(default)]
    pub channel_id: Option<String>, // pre-resolved id, skips the resolver when set
    #[serde(default)]
    pub allow_shorts: bool,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            channel_id: None,
            allow_shorts: false,
        }
    }

    pub fn with_channel_id(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    pub fn allowing_shorts(mut self) -> Self {
        self.allow_shorts = true;
        self
    }
}

/// Calendar day an item was published, compared at day granularity.
/// Renders as fixed-width `YYYYMMDD`, so string order equals date order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishDate(NaiveDate);

impl PublishDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse the `YYYYMMDD` key (as reported by yt-dlp's `upload_date`).
    pub fn parse_key(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(Self)
    }

    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| Self(dt.date_naive()))
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn key(&self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl fmt::Display for PublishDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for PublishDate {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for PublishDate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        PublishDate::parse_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date key `{raw}`")))
    }
}

/// Which fetch path produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPath {
    /// Structured channel feed keyed by resolved id.
    Feed,
    /// Direct enumeration of the channel's uploads by locator.
    Enumerator,
}

impl FetchPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPath::Feed => "feed",
            FetchPath::Enumerator => "enumerator",
        }
    }
}

impl fmt::Display for FetchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub video_id: String,
    pub title: String,
    pub published: PublishDate,
    pub source: String, // display name of the owning Source
    pub duration_secs: Option<u64>, // None = unknown (feed path never reports it)
    pub path: FetchPath,
}

/// An item that survived recency and format filtering.
pub type CuratedItem = RawItem;

/// Fast path: structured feed lookup keyed by channel id.
#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch_feed(&self, channel_id: &str, source_name: &str) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}

/// Fallback path: enumerate a channel's most recent uploads from its locator.
#[async_trait::async_trait]
pub trait ChannelEnumerator: Send + Sync {
    async fn list_recent(&self, source: &Source, limit: usize) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}

/// Maps a channel locator to its stable channel id.
#[async_trait::async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn resolve(&self, locator: &str) -> Result<String>;

    /// Id known without I/O (e.g. from a cache), if any.
    fn cached_id(&self, _locator: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_fixed_width_and_sortable() {
        let a = PublishDate::from_ymd(2026, 2, 6).unwrap();
        let b = PublishDate::from_ymd(2026, 11, 1).unwrap();
        assert_eq!(a.key(), "20260206");
        assert!(a < b);
        assert!(a.key() < b.key());
    }

    #[test]
    fn parse_key_rejects_garbage() {
        assert!(PublishDate::parse_key("2026-02-06").is_none());
        assert!(PublishDate::parse_key("20261340").is_none());
        assert_eq!(
            PublishDate::parse_key(" 20260206 "),
            PublishDate::from_ymd(2026, 2, 6)
        );
    }

    #[test]
    fn serde_roundtrips_as_key_string() {
        let d = PublishDate::from_ymd(2026, 2, 6).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"20260206\"");
        let back: PublishDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
