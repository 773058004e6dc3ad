//! Greedy, single-pass topic clustering.
//!
//! Items are visited in input order. Each one is compared only against the
//! *anchor* (first item) of every existing cluster, oldest cluster first, and
//! joins the first cluster whose anchor similarity reaches the threshold.
//! There is no best-match search: earliest matching cluster wins. Titles with
//! fewer than `MIN_SIGNALS` signal words never match and never attract.

use serde::Serialize;

use crate::ingest::types::CuratedItem;
use crate::topics::signals::{extract_signals, GenericTerms, SignalSet};
use crate::topics::similarity::jaccard;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.35;
pub const MIN_SIGNALS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Anchor's signal words joined by a space, or its title when it has none.
    pub topic: String,
    pub items: Vec<CuratedItem>,
}

impl Cluster {
    /// First item placed in the cluster; `None` only for a hand-built empty cluster.
    pub fn anchor(&self) -> Option<&CuratedItem> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterReport {
    pub clusters: Vec<Cluster>,
    /// Signal words per input item, aligned with the input order.
    pub signals: Vec<SignalSet>,
}

impl ClusterReport {
    /// Clusters holding more than one item (likely the same story).
    pub fn multi_item(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.len() > 1)
    }

    pub fn item_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }
}

fn topic_label(signals: &SignalSet, title: &str) -> String {
    if signals.is_empty() {
        title.to_string()
    } else {
        signals.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

struct Open {
    anchor_idx: usize,
    members: Vec<usize>,
    matchable: bool,
}

pub fn cluster_items<S: AsRef<str>>(
    items: &[CuratedItem],
    generic_terms: &[S],
    threshold: f64,
) -> ClusterReport {
    let generic = GenericTerms::new(generic_terms);
    let signals: Vec<SignalSet> = items
        .iter()
        .map(|it| extract_signals(&it.title, &generic))
        .collect();

    let mut open: Vec<Open> = Vec::new();
    for (idx, sig) in signals.iter().enumerate() {
        // (a) too generic: always alone
        if sig.len() < MIN_SIGNALS {
            open.push(Open {
                anchor_idx: idx,
                members: vec![idx],
                matchable: false,
            });
            continue;
        }

        // (b) first cluster whose anchor is similar enough
        let hit = open
            .iter_mut()
            .filter(|c| c.matchable)
            .find(|c| jaccard(&signals[c.anchor_idx], sig) >= threshold);

        match hit {
            Some(c) => c.members.push(idx),
            // (c) anchor a new cluster
            None => open.push(Open {
                anchor_idx: idx,
                members: vec![idx],
                matchable: true,
            }),
        }
    }

    let clusters = open
        .into_iter()
        .map(|c| Cluster {
            topic: topic_label(&signals[c.anchor_idx], &items[c.anchor_idx].title),
            items: c.members.iter().map(|&i| items[i].clone()).collect(),
        })
        .collect();

    ClusterReport { clusters, signals }
}
