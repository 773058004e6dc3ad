use daily_video_curator::topics::{extract_signals, jaccard, GenericTerms, SignalSet};
use rand::Rng;

fn set(words: &[&str]) -> SignalSet {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn empty_side_scores_zero() {
    let a = set(&["fed", "rates"]);
    assert_eq!(jaccard(&a, &SignalSet::new()), 0.0);
    assert_eq!(jaccard(&SignalSet::new(), &a), 0.0);
    assert_eq!(jaccard(&SignalSet::new(), &SignalSet::new()), 0.0);
}

#[test]
fn identical_sets_score_one() {
    let a = set(&["fed", "rates", "powell"]);
    assert_eq!(jaccard(&a, &a.clone()), 1.0);
}

#[test]
fn partial_overlap_is_intersection_over_union() {
    let a = set(&["fed", "rates", "decision"]);
    let b = set(&["fed", "rates", "cut"]);
    assert!((jaccard(&a, &b) - 0.5).abs() < 1e-12);
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    const VOCAB: &[&str] = &[
        "fed", "rates", "powell", "cpi", "inflation", "jobs", "payrolls", "oil", "crude", "yields",
        "treasury", "earnings", "nvidia", "tariffs", "china", "bitcoin",
    ];
    let mut rng = rand::rng();
    for _ in 0..500 {
        let a: SignalSet = (0..rng.random_range(0..6))
            .map(|_| VOCAB[rng.random_range(0..VOCAB.len())].to_string())
            .collect();
        let b: SignalSet = (0..rng.random_range(0..6))
            .map(|_| VOCAB[rng.random_range(0..VOCAB.len())].to_string())
            .collect();
        let ab = jaccard(&a, &b);
        assert_eq!(ab, jaccard(&b, &a));
        assert!((0.0..=1.0).contains(&ab));
    }
}

#[test]
fn near_duplicate_titles_clear_the_default_threshold() {
    let g = GenericTerms::default();
    let a = extract_signals("Fed rate decision: Powell holds rates steady", &g);
    let b = extract_signals("Breaking: Fed holds rates steady in rate decision", &g);
    // b is a without "powell": 6/7
    assert!(jaccard(&a, &b) >= 0.35, "a={a:?} b={b:?}");
}
