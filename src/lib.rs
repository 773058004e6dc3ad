// src/lib.rs
// Public library surface for the `curate` binary and integration tests.

pub mod config;
pub mod engine;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod snapshot;
pub mod topics;

// ---- Re-exports for stable public API ----
pub use crate::engine::{cancel_pair, CancelHandle, CancelToken, Curator, RunParams, RunReport};
pub use crate::ingest::types::{CuratedItem, FetchPath, PublishDate, RawItem, Source};
pub use crate::snapshot::PlaylistSnapshot;
