//! Keyword tokenizer shared by ingestion and querying.
//!
//! Text is lowercased and scanned for maximal ASCII word runs
//! (`[a-z0-9_]`). A run becomes a keyword only if it consists entirely of
//! letters, is at least [`MIN_KEYWORD_LEN`] long, and is not a stop word.
//! Runs that mix letters with digits or underscores (`v2api`, `snake_case`)
//! are dropped whole rather than split.
//!
//! ```rust
//! use context_relay_core::keywords::extract_keywords;
//!
//! let kw = extract_keywords("How do REFUNDS work? Refunds take time.");
//! assert!(kw.contains("refunds"));
//! assert!(kw.contains("work"));
//! assert!(!kw.contains("take"));
//! ```

use std::collections::BTreeSet;

/// Shortest token kept as a keyword.
pub const MIN_KEYWORD_LEN: usize = 4;

/// Common words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "have", "from", "they", "know", "want", "been", "good", "much",
    "some", "time", "very", "when", "come", "here", "just", "like", "long", "make", "many",
    "over", "such", "take", "than", "them", "well", "were",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Extract the deduplicated keyword set of `text`.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let mut keywords = BTreeSet::new();

    for run in lowered.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
        if run.len() < MIN_KEYWORD_LEN || !run.bytes().all(|b| b.is_ascii_lowercase()) {
            continue;
        }
        if is_stop_word(run) {
            continue;
        }
        keywords.insert(run.to_string());
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_dedups() {
        let kw = extract_keywords("Refund refund REFUND policy");
        assert_eq!(kw.len(), 2);
        assert!(kw.contains("refund"));
        assert!(kw.contains("policy"));
    }

    #[test]
    fn test_short_words_dropped() {
        let kw = extract_keywords("how do I log in to the app");
        assert!(kw.is_empty());
    }

    #[test]
    fn test_stop_words_dropped() {
        let kw = extract_keywords("This is just some text that they wrote");
        assert_eq!(kw.into_iter().collect::<Vec<_>>(), vec!["text", "wrote"]);
    }

    #[test]
    fn test_mixed_runs_dropped_whole() {
        let kw = extract_keywords("upgrade v2api snake_case config2 deploy");
        assert!(kw.contains("upgrade"));
        assert!(kw.contains("deploy"));
        assert!(!kw.contains("snake"));
        assert!(!kw.contains("case"));
        assert!(!kw.contains("config"));
    }

    #[test]
    fn test_punctuation_and_unicode_are_separators() {
        let kw = extract_keywords("login-troubleshooting, (passwords) naïveté");
        assert!(kw.contains("login"));
        assert!(kw.contains("troubleshooting"));
        assert!(kw.contains("passwords"));
        // "na" and "vet" are too short once the accented letters split them.
        assert_eq!(kw.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \n\t").is_empty());
    }
}
