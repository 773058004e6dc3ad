//! Signal words: the title tokens left after stripping stop words, platform
//! noise, numbers, years and caller-supplied generic terms.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Normalized signal words of one title. Ordered, so joins are reproducible.
pub type SignalSet = BTreeSet<String>;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "few", "for", "from", "further", "get", "gets", "got", "had", "has", "have", "having", "he",
    "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "just", "like", "may", "me", "might", "more", "most", "much", "must", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "says", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "vs", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Words every channel sprinkles into titles regardless of topic.
const PLATFORM_NOISE: &[&str] = &[
    "analysis", "breaking", "clip", "daily", "episode", "exclusive", "explained", "full",
    "highlights", "latest", "live", "livestream", "new", "news", "official", "podcast",
    "reaction", "recap", "short", "shorts", "show", "stream", "today", "todays", "tonight",
    "update", "updates", "video", "videos", "watch", "week", "weekly",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceCell<HashSet<&'static str>> = OnceCell::new();
    SET.get_or_init(|| STOP_WORDS.iter().chain(PLATFORM_NOISE).copied().collect())
}

fn year_like() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^20\d{2,6}$").unwrap())
}

/// Whitespace-separated words, lowercased, with punctuation stripped from
/// inside each word ("Powell's" → "powells"). Words left empty are dropped.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
}

/// Caller-supplied terms too general to indicate a topic (e.g. the
/// channel's own beat: "stock market", "economy"). Multi-word terms are
/// split and each word excluded on its own.
#[derive(Debug, Clone, Default)]
pub struct GenericTerms {
    words: HashSet<String>,
}

impl GenericTerms {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let words = terms.iter().flat_map(|t| tokens(t.as_ref())).collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_signal(tok: &str, generic: &GenericTerms) -> bool {
    if tok.chars().count() <= 2 {
        return false;
    }
    let all_digits = tok.chars().all(|c| c.is_ascii_digit());
    if all_digits && tok.len() <= 3 {
        return false;
    }
    if year_like().is_match(tok) {
        return false;
    }
    !stop_words().contains(tok) && !generic.contains(tok)
}

pub fn extract_signals(title: &str, generic: &GenericTerms) -> SignalSet {
    tokens(title).filter(|t| is_signal(t, generic)).collect()
}
