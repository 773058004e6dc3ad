use daily_video_curator::history::{JsonFileSeenStore, NoopSeenStore, SeenStore};
use std::fs;

#[test]
fn noop_store_never_reports_seen() {
    let s = NoopSeenStore;
    s.mark_seen(&["a".to_string()]).unwrap();
    assert!(!s.contains("a"));
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("state").join("seen.json");

    let s = JsonFileSeenStore::open(&p, 100).unwrap();
    assert!(s.is_empty());
    s.mark_seen(&["vid1".to_string(), "vid2".to_string()]).unwrap();

    let again = JsonFileSeenStore::open(&p, 100).unwrap();
    assert!(again.contains("vid1"));
    assert!(again.contains("vid2"));
    assert!(!again.contains("vid3"));
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("seen.json");
    fs::write(&p, "{not json").unwrap();
    assert!(JsonFileSeenStore::open(&p, 100).is_err());
}

#[test]
fn empty_file_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("seen.json");
    fs::write(&p, "").unwrap();
    assert!(JsonFileSeenStore::open(&p, 100).unwrap().is_empty());
}
