use daily_video_curator::ingest::types::{CuratedItem, FetchPath, PublishDate};
use daily_video_curator::topics::{cluster_items, DEFAULT_SIMILARITY_THRESHOLD};

fn item(id: &str, title: &str) -> CuratedItem {
    CuratedItem {
        video_id: id.to_string(),
        title: title.to_string(),
        published: PublishDate::from_ymd(2026, 2, 7).unwrap(),
        source: "Markets Desk".into(),
        duration_secs: None,
        path: FetchPath::Feed,
    }
}

fn sample() -> Vec<CuratedItem> {
    vec![
        item("1", "Fed rate decision: Powell holds rates steady"),
        item("2", "Oil stocks slide as crude tumbles"),
        item("3", "Breaking: Fed holds rates steady in rate decision"),
        item("4", "Markets"),
        item("5", "Crude tumbles, oil stocks slide further"),
        item("6", "Nvidia earnings beat expectations"),
    ]
}

#[test]
fn every_item_lands_in_exactly_one_cluster() {
    let items = sample();
    let r = cluster_items(&items, &[] as &[&str], DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(r.item_count(), items.len());
    let mut ids: Vec<_> = r
        .clusters
        .iter()
        .flat_map(|c| c.items.iter().map(|i| i.video_id.clone()))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    assert_eq!(r.signals.len(), items.len());
}

#[test]
fn near_duplicates_share_a_cluster_anchored_by_the_first() {
    let r = cluster_items(&sample(), &[] as &[&str], DEFAULT_SIMILARITY_THRESHOLD);
    let fed = &r.clusters[0];
    assert_eq!(fed.anchor().unwrap().video_id, "1");
    let ids: Vec<_> = fed.items.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let oil = r
        .clusters
        .iter()
        .find(|c| c.anchor().is_some_and(|a| a.video_id == "2"))
        .expect("oil cluster");
    assert_eq!(oil.len(), 2);
    assert_eq!(r.multi_item().count(), 2);
}

#[test]
fn single_signal_title_is_a_singleton() {
    let r = cluster_items(&sample(), &[] as &[&str], DEFAULT_SIMILARITY_THRESHOLD);
    let markets = r
        .clusters
        .iter()
        .find(|c| c.anchor().is_some_and(|a| a.video_id == "4"))
        .expect("markets cluster");
    assert_eq!(markets.len(), 1);
    assert_eq!(markets.topic, "markets");
}

#[test]
fn generic_terms_reduce_signals() {
    let items = vec![item("1", "Stock market rally"), item("2", "Stock market selloff")];
    // Without generic terms they share {stock, market} → 2/4 = 0.5
    let plain = cluster_items(&items, &[] as &[&str], DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(plain.clusters.len(), 1);
    // With them each title is down to one signal → both singletons
    let scoped = cluster_items(&items, &["stock market"], DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(scoped.clusters.len(), 2);
}

#[test]
fn clustering_is_deterministic() {
    let items = sample();
    let a = cluster_items(&items, &["earnings"], DEFAULT_SIMILARITY_THRESHOLD);
    let b = cluster_items(&items, &["earnings"], DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(a, b);
}

#[test]
fn empty_input_gives_no_clusters() {
    let r = cluster_items(&[], &[] as &[&str], DEFAULT_SIMILARITY_THRESHOLD);
    assert!(r.clusters.is_empty());
    assert!(r.signals.is_empty());
}
