use daily_video_curator::filter::passes_format;
use daily_video_curator::ingest::providers::ytdlp::{parse_dump_lines, uploads_url, YtDlpEnumerator};
use daily_video_curator::ingest::types::{ChannelEnumerator, FetchPath, Source};
use std::fs;

fn fixture() -> String {
    fs::read_to_string("tests/fixtures/ytdlp_dump.jsonl").expect("missing tests/fixtures/ytdlp_dump.jsonl")
}

#[test]
fn dump_lines_skip_noise_and_undated_entries() {
    let items = parse_dump_lines(&fixture(), "Macro Hour", 10);
    let ids: Vec<_> = items.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["bbbbbbbbbb1", "bbbbbbbbbb2", "bbbbbbbbbb3", "bbbbbbbbbb4", "bbbbbbbbbb6"]
    );
    assert!(items.iter().all(|i| i.path == FetchPath::Enumerator));
}

#[test]
fn durations_are_truncated_and_null_is_unknown() {
    let items = parse_dump_lines(&fixture(), "Macro Hour", 10);
    assert_eq!(items[0].duration_secs, Some(754));
    assert_eq!(items[1].duration_secs, Some(1322));
    assert_eq!(items[2].duration_secs, Some(45));
    assert_eq!(items[3].duration_secs, None);
}

#[test]
fn timestamp_is_used_when_upload_date_is_missing() {
    let items = parse_dump_lines(&fixture(), "Macro Hour", 10);
    assert_eq!(items[3].published.key(), "20260207");
}

#[test]
fn limit_caps_the_output() {
    assert_eq!(parse_dump_lines(&fixture(), "Macro Hour", 2).len(), 2);
}

#[test]
fn uploads_url_targets_the_videos_tab() {
    assert_eq!(
        uploads_url("https://www.youtube.com/@markets/"),
        "https://www.youtube.com/@markets/videos"
    );
    assert_eq!(
        uploads_url("https://www.youtube.com/@markets/videos"),
        "https://www.youtube.com/@markets/videos"
    );
    assert_eq!(
        uploads_url("https://www.youtube.com/playlist?list=PL123"),
        "https://www.youtube.com/playlist?list=PL123"
    );
}

#[tokio::test]
async fn missing_program_is_an_error() {
    let e = YtDlpEnumerator::new("definitely-not-installed-yt-dlp-binary");
    let src = Source::new("S", "https://www.youtube.com/@s");
    assert!(e.list_recent(&src, 5).await.is_err());
}

#[test]
fn fractional_duration_just_under_a_minute_stays_short() {
    let out = r#"{"id": "c1", "title": "Jobs number in a minute", "upload_date": "20260207", "duration": 59.6}
{"id": "c2", "title": "Jobs number explained", "upload_date": "20260207", "duration": 60.4}"#;
    let items = parse_dump_lines(out, "Macro Hour", 10);
    assert_eq!(items[0].duration_secs, Some(59));
    assert!(!passes_format(&items[0], false));
    assert_eq!(items[1].duration_secs, Some(60));
    assert!(passes_format(&items[1], false));
}
