//! Sentiment classification for Japanese comments.
//!
//! Primary path: a polarity lexicon (TSV, `SENTIMENT_DICT_PATH`) scored per
//! sentence through the shared morphological segmenter, summed across the
//! comment. Fallback path: fixed positive/negative keyword lists matched by
//! substring. The lexicon path is probed once at startup; per-call scoring
//! errors fall back for that call only.

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::morphology::{SegmentError, Segmenter};

// Calibration constants of the wrapped scorer's scale; preserved verbatim.
const POSITIVE_THRESHOLD: f64 = 0.1;
const NEGATIVE_THRESHOLD: f64 = -0.1;

static POSITIVE_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "素晴らしい", "最高", "面白い", "いいね", "良い", "よい", "よかった",
        "ありがとう", "感動", "楽しい", "嬉しい", "すごい", "かっこいい",
        "きれい", "美しい", "感謝", "好き", "愛", "幸せ", "喜び",
    ]
});

static NEGATIVE_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "つまらない", "嫌い", "ひどい", "最悪", "悪い", "だめ", "ダメ",
        "残念", "微妙", "納得いかない", "腹立つ", "怒", "悲しい",
        "失望", "がっかり", "不満", "問題", "困る",
    ]
});

/// Polarity class of a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Per-class counts over a batch. All three classes are always present;
/// the counts sum to the batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SentimentTally {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentTally {
    fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Lexicon-backed sentence scorer. Scores each sentence as the mean polarity
/// of its lexicon hits (0.0 when a sentence has none).
struct PolarityScorer {
    lexicon: HashMap<String, f64>,
    segmenter: Arc<dyn Segmenter>,
}

impl PolarityScorer {
    /// Startup probe. Missing dictionary path, unreadable dictionary or a
    /// missing segmenter all mean the capability is absent for the process
    /// lifetime; each case logs one warning.
    fn from_env(segmenter: Option<Arc<dyn Segmenter>>) -> Option<Self> {
        let path = match env::var("SENTIMENT_DICT_PATH") {
            Ok(path) => path,
            Err(_) => {
                tracing::warn!(
                    "SENTIMENT_DICT_PATH not set, using keyword-list sentiment fallback"
                );
                return None;
            }
        };

        let Some(segmenter) = segmenter else {
            tracing::warn!(
                "no morphological segmenter available, using keyword-list sentiment fallback"
            );
            return None;
        };

        match load_lexicon(&path) {
            Ok(lexicon) => {
                tracing::info!("loaded polarity lexicon: {} entries", lexicon.len());
                Some(Self { lexicon, segmenter })
            }
            Err(e) => {
                tracing::warn!(
                    "failed to load polarity lexicon {path}, using keyword-list fallback: {e:#}"
                );
                None
            }
        }
    }

    fn score_sentences(&self, text: &str) -> Result<Vec<f64>, SegmentError> {
        let mut scores = Vec::new();

        for sentence in split_sentences(text) {
            let morphemes = self.segmenter.segment(sentence)?;
            let hits: Vec<f64> = morphemes
                .iter()
                .filter_map(|m| self.lexicon.get(m.surface.as_str()).copied())
                .collect();

            if hits.is_empty() {
                scores.push(0.0);
            } else {
                scores.push(hits.iter().sum::<f64>() / hits.len() as f64);
            }
        }

        Ok(scores)
    }
}

fn load_lexicon(path: &str) -> anyhow::Result<HashMap<String, f64>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    parse_lexicon(&raw)
}

/// TSV lines of `surface<TAB>score`; blank lines and `#` comments skipped.
fn parse_lexicon(raw: &str) -> anyhow::Result<HashMap<String, f64>> {
    let mut lexicon = HashMap::new();

    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (word, score) = line
            .split_once('\t')
            .with_context(|| format!("line {}: expected <word>\\t<score>", lineno + 1))?;
        let score: f64 = score
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad score", lineno + 1))?;
        lexicon.insert(word.to_string(), score);
    }

    Ok(lexicon)
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['。', '！', '？', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Comment sentiment classifier. `scorer` is `Some` only when the lexicon
/// capability probed successfully at startup.
pub struct SentimentAnalyzer {
    scorer: Option<PolarityScorer>,
}

impl SentimentAnalyzer {
    pub fn new(segmenter: Option<Arc<dyn Segmenter>>) -> Self {
        Self {
            scorer: PolarityScorer::from_env(segmenter),
        }
    }

    /// Analyzer locked to the keyword-list path, as if no lexicon existed.
    pub fn keyword_only() -> Self {
        Self { scorer: None }
    }

    /// Classify a single comment. Never fails: any internal scoring error
    /// resolves to the keyword fallback for this call.
    pub fn classify(&self, text: &str) -> SentimentLabel {
        if let Some(scorer) = &self.scorer {
            match scorer.score_sentences(text) {
                Ok(scores) => {
                    let total: f64 = scores.iter().sum();
                    return if total > POSITIVE_THRESHOLD {
                        SentimentLabel::Positive
                    } else if total < NEGATIVE_THRESHOLD {
                        SentimentLabel::Negative
                    } else {
                        SentimentLabel::Neutral
                    };
                }
                Err(e) => {
                    tracing::error!("polarity scoring error, using keyword fallback: {e}");
                }
            }
        }

        keyword_fallback(text)
    }

    /// Classify every comment in order and tally per class. Empty batch
    /// yields the all-zero tally.
    pub fn analyze_batch(&self, texts: &[String]) -> SentimentTally {
        let mut tally = SentimentTally::default();
        for text in texts {
            tally.record(self.classify(text));
        }

        tracing::info!(
            "sentiment analysis finished: positive={} neutral={} negative={}",
            tally.positive,
            tally.neutral,
            tally.negative
        );
        tally
    }
}

/// Fixed-list substring matching. The target script has no case distinction,
/// so the literal keyword forms are matched as-is.
fn keyword_fallback(text: &str) -> SentimentLabel {
    let positive_count = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
    let negative_count = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count();

    if positive_count > negative_count {
        SentimentLabel::Positive
    } else if negative_count > positive_count {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}
