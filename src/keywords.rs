//! Keyword extraction from Japanese comment text.
//!
//! Tokenizes each comment (morphological segmentation when available,
//! regex/whitespace splitting otherwise), filters out function words,
//! stopwords, symbols and URL-ish junk, then counts the survivors across
//! the whole batch and returns the most frequent ones.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::morphology::{SegmentError, Segmenter};

/// Part-of-speech tags excluded from keyword counting (IPADIC top-level
/// categories: particles, auxiliary verbs, symbols, fillers).
static EXCLUDE_POS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["助詞", "助動詞", "記号", "補助記号", "フィラー"]
        .into_iter()
        .collect()
});

/// Stopwords: function words, demonstratives, filler adverbs and
/// laughter shorthand that dominate comment sections without carrying
/// topical meaning.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "の", "は", "が", "を", "に", "で", "と", "から", "まで", "より",
        "て", "だ", "である", "です", "ます", "する", "した", "される",
        "これ", "それ", "あれ", "この", "その", "あの", "ここ", "そこ", "あそこ",
        "こと", "もの", "ため", "とき", "時", "人", "方", "さん", "やつ",
        "やっぱり", "やはり", "でも", "しかし", "ただ", "ちょっと", "すごく",
        "とても", "かなり", "なんか", "なんて", "みたい", "ような", "という",
        "w", "ww", "www", "笑", "lol", "lmao",
    ]
    .into_iter()
    .collect()
});

// Half-width ASCII symbol runs, stripped before whitespace splitting.
static ASCII_SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!-/:-@\[-`{-~]").unwrap());
static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// A word made up of nothing but half-/full-width symbols and whitespace.
static SYMBOLS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[!-/:-@\[-`{-~\s　]+$").unwrap());

/// One keyword with its occurrence count across the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Batch keyword extractor. Stateless between calls; the only held state is
/// the shared, read-only morphological segmenter probed at startup.
pub struct KeywordExtractor {
    segmenter: Option<Arc<dyn Segmenter>>,
}

impl KeywordExtractor {
    pub fn new(segmenter: Option<Arc<dyn Segmenter>>) -> Self {
        Self { segmenter }
    }

    /// Top `top_n` keywords of the batch, most frequent first. Ties keep
    /// first-encountered order; fewer distinct words than `top_n` returns
    /// them all; an empty batch returns an empty vec.
    pub fn extract_keywords(&self, texts: &[String], top_n: usize) -> Vec<KeywordCount> {
        let mut counts: Vec<KeywordCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in self.extract_words(text) {
                match index.get(&word) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(word.clone(), counts.len());
                        counts.push(KeywordCount { word, count: 1 });
                    }
                }
            }
        }

        // Stable sort: equal counts stay in first-seen order.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(top_n);

        tracing::info!("keyword extraction finished: {} keywords", counts.len());
        counts
    }

    /// Full word-frequency table over the batch, untruncated. Diagnostic
    /// companion to [`Self::extract_keywords`].
    pub fn get_word_frequency(&self, texts: &[String]) -> HashMap<String, usize> {
        let mut frequency = HashMap::new();
        for text in texts {
            for word in self.extract_words(text) {
                *frequency.entry(word).or_insert(0) += 1;
            }
        }
        frequency
    }

    fn extract_words(&self, text: &str) -> Vec<String> {
        match &self.segmenter {
            Some(segmenter) => match self.extract_morphological(segmenter.as_ref(), text) {
                Ok(words) => words,
                Err(e) => {
                    // One-shot degradation: this call only, batch continues.
                    tracing::error!("morphological analysis error, using simple splitting: {e}");
                    self.extract_simple(text)
                }
            },
            None => self.extract_simple(text),
        }
    }

    fn extract_morphological(
        &self,
        segmenter: &dyn Segmenter,
        text: &str,
    ) -> Result<Vec<String>, SegmentError> {
        let morphemes = segmenter.segment(text)?;

        let words = morphemes
            .into_iter()
            .filter(|m| !EXCLUDE_POS.contains(m.pos.as_str()))
            .map(|m| m.surface)
            .filter(|w| !w.chars().all(char::is_numeric))
            .filter(|w| passes_common_filters(w))
            .collect();

        Ok(words)
    }

    /// Whitespace splitting with symbol/digit stripping, for when no
    /// morphological capability exists. Part-of-speech filtering is skipped
    /// here since no tags are available.
    fn extract_simple(&self, text: &str) -> Vec<String> {
        let text = ASCII_SYMBOLS.replace_all(text, " ");
        let text = DIGIT_RUNS.replace_all(&text, "");
        let text = WHITESPACE_RUNS.replace_all(&text, " ");

        text.split_whitespace()
            .filter(|w| passes_common_filters(w))
            .map(str::to_owned)
            .collect()
    }
}

/// Filters shared by both tokenization paths: minimum length, stopword set,
/// meaningful-word heuristics.
fn passes_common_filters(word: &str) -> bool {
    word.chars().count() >= 2 && !STOPWORDS.contains(word) && is_meaningful_word(word)
}

/// Heuristic junk filter: URL/email/handle fragments, symbol-only strings,
/// and laughter-style runs of one repeated character.
fn is_meaningful_word(word: &str) -> bool {
    if word.contains("http") || word.contains('@') || word.contains(".com") {
        return false;
    }

    if SYMBOLS_ONLY.is_match(word) {
        return false;
    }

    let distinct: HashSet<char> = word.chars().collect();
    if distinct.len() == 1 && word.chars().count() > 2 {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::Morpheme;

    fn simple_extractor() -> KeywordExtractor {
        KeywordExtractor::new(None)
    }

    /// Segmenter that fails every call, for exercising the per-call
    /// degradation branch.
    struct FailingSegmenter;

    impl Segmenter for FailingSegmenter {
        fn segment(&self, _text: &str) -> Result<Vec<Morpheme>, SegmentError> {
            Err(SegmentError("boom".to_string()))
        }
    }

    #[test]
    fn per_call_segmenter_error_falls_back_silently() {
        let extractor = KeywordExtractor::new(Some(Arc::new(FailingSegmenter)));
        let texts = vec!["rust tokio rust".to_string()];
        let keywords = extractor.extract_keywords(&texts, 20);
        assert_eq!(keywords[0], KeywordCount { word: "rust".into(), count: 2 });
        assert_eq!(keywords[1], KeywordCount { word: "tokio".into(), count: 1 });
    }

    #[test]
    fn counts_and_orders_by_frequency() {
        let texts = vec![
            "rust tokio rust".to_string(),
            "tokio rust axum".to_string(),
        ];
        let keywords = simple_extractor().extract_keywords(&texts, 20);

        assert_eq!(keywords[0], KeywordCount { word: "rust".into(), count: 3 });
        assert_eq!(keywords[1], KeywordCount { word: "tokio".into(), count: 2 });
        assert_eq!(keywords[2], KeywordCount { word: "axum".into(), count: 1 });
    }

    #[test]
    fn truncates_to_top_n() {
        let texts = vec!["alpha beta gamma delta".to_string()];
        let keywords = simple_extractor().extract_keywords(&texts, 2);
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn counts_are_non_increasing() {
        let texts = vec![
            "alpha alpha beta".to_string(),
            "gamma beta alpha gamma".to_string(),
        ];
        let keywords = simple_extractor().extract_keywords(&texts, 20);
        for pair in keywords.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let texts = vec!["alpha beta".to_string(), "beta alpha".to_string()];
        let keywords = simple_extractor().extract_keywords(&texts, 20);
        assert_eq!(keywords[0].word, "alpha");
        assert_eq!(keywords[1].word, "beta");
    }

    #[test]
    fn empty_batch_yields_empty_result() {
        let keywords = simple_extractor().extract_keywords(&[], 20);
        assert!(keywords.is_empty());
    }

    #[test]
    fn repeated_character_runs_are_excluded() {
        let texts = vec!["wwwww 楽しい動画 wwwww".to_string()];
        let keywords = simple_extractor().extract_keywords(&texts, 20);
        assert!(keywords.iter().all(|k| k.word != "wwwww"));
        assert!(keywords.iter().any(|k| k.word == "楽しい動画"));
    }

    #[test]
    fn short_and_stopword_tokens_are_excluded() {
        let texts = vec!["の x でも interesting".to_string()];
        let keywords = simple_extractor().extract_keywords(&texts, 20);
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["interesting"]);
    }

    #[test]
    fn digit_runs_are_stripped() {
        let texts = vec!["2024 感想 12345".to_string()];
        let keywords = simple_extractor().extract_keywords(&texts, 20);
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["感想"]);
    }

    #[test]
    fn meaningful_word_rejects_urls_and_handles() {
        assert!(!is_meaningful_word("http://x.com"));
        assert!(!is_meaningful_word("example.com"));
        assert!(!is_meaningful_word("@someone"));
        assert!(!is_meaningful_word("!!??"));
        assert!(!is_meaningful_word("　 　"));
        assert!(!is_meaningful_word("笑笑笑"));
        assert!(is_meaningful_word("笑笑"));
        assert!(is_meaningful_word("動画"));
    }

    #[test]
    fn word_frequency_matches_keyword_counts() {
        let texts = vec!["alpha beta alpha".to_string()];
        let extractor = simple_extractor();
        let frequency = extractor.get_word_frequency(&texts);
        assert_eq!(frequency.get("alpha"), Some(&2));
        assert_eq!(frequency.get("beta"), Some(&1));

        let keywords = extractor.extract_keywords(&texts, 20);
        assert_eq!(keywords.len(), frequency.len());
    }

    #[test]
    fn extraction_is_idempotent() {
        let texts = vec!["alpha beta".to_string(), "beta gamma beta".to_string()];
        let extractor = simple_extractor();
        let first = extractor.extract_keywords(&texts, 20);
        let second = extractor.extract_keywords(&texts, 20);
        assert_eq!(first, second);
    }

    #[cfg(feature = "morphology")]
    mod morphological {
        use super::*;
        use crate::morphology::init_segmenter;

        #[test]
        fn filters_particles_and_auxiliaries() {
            let extractor = KeywordExtractor::new(init_segmenter());
            let texts = vec!["とても面白い動画でした".to_string()];
            let keywords = extractor.extract_keywords(&texts, 20);

            let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
            assert!(words.contains(&"面白い"));
            assert!(words.contains(&"動画"));
            assert!(!words.contains(&"でし"));
            assert!(!words.contains(&"た"));
            // とても is an adverb in the stopword set
            assert!(!words.contains(&"とても"));
        }

        #[test]
        fn counts_across_comments() {
            let extractor = KeywordExtractor::new(init_segmenter());
            let texts = vec![
                "最高でした".to_string(),
                "つまらない".to_string(),
                "最高でした".to_string(),
            ];
            let keywords = extractor.extract_keywords(&texts, 20);
            let top = &keywords[0];
            assert_eq!(top.word, "最高");
            assert_eq!(top.count, 2);
        }
    }
}
