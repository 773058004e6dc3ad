// src/ingest/providers/mod.rs
pub mod youtube_feed;
pub mod ytdlp;

pub use youtube_feed::YoutubeFeedClient;
pub use ytdlp::YtDlpEnumerator;
