//! Lightweight lexical topic grouping: signal words → Jaccard → greedy anchors.

pub mod cluster;
pub mod signals;
pub mod similarity;

pub use cluster::{cluster_items, Cluster, ClusterReport, DEFAULT_SIMILARITY_THRESHOLD};
pub use signals::{extract_signals, GenericTerms, SignalSet};
pub use similarity::jaccard;
