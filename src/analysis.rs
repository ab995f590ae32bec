//! Pipeline orchestration: runs the sentiment path and the keyword path
//! over one immutable comment batch and merges them into a summary.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::keywords::{KeywordCount, KeywordExtractor};
use crate::morphology;
use crate::sentiment::{SentimentAnalyzer, SentimentTally};

pub const DEFAULT_TOP_N: usize = 20;

/// Aggregate result for one analyzed batch. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisSummary {
    pub sentiment: SentimentTally,
    pub keywords: Vec<KeywordCount>,
    pub total_comments: usize,
}

/// The comment-to-insight pipeline. Both analyzers are constructed once at
/// startup and shared read-only; the lindera tokenizer is `Sync`, so no
/// locking is needed around the shared segmenter.
pub struct AnalysisPipeline {
    keywords: Arc<KeywordExtractor>,
    sentiment: Arc<SentimentAnalyzer>,
}

impl AnalysisPipeline {
    /// Probes the analyzer capabilities once; failures degrade the affected
    /// path permanently instead of failing construction.
    pub fn new() -> Self {
        let segmenter = morphology::init_segmenter();
        Self {
            keywords: Arc::new(KeywordExtractor::new(segmenter.clone())),
            sentiment: Arc::new(SentimentAnalyzer::new(segmenter)),
        }
    }

    /// Analyze one batch. The two paths have no data dependency and run as
    /// parallel blocking tasks. An empty batch yields the zero summary.
    pub async fn analyze(
        &self,
        comments: Vec<String>,
        top_n: usize,
    ) -> anyhow::Result<AnalysisSummary> {
        let batch: Arc<[String]> = comments.into();
        let total_comments = batch.len();

        let sentiment_task = {
            let analyzer = Arc::clone(&self.sentiment);
            let batch = Arc::clone(&batch);
            tokio::task::spawn_blocking(move || analyzer.analyze_batch(&batch))
        };
        let keyword_task = {
            let extractor = Arc::clone(&self.keywords);
            let batch = Arc::clone(&batch);
            tokio::task::spawn_blocking(move || extractor.extract_keywords(&batch, top_n))
        };

        let (sentiment, keywords) = tokio::join!(sentiment_task, keyword_task);

        Ok(AnalysisSummary {
            sentiment: sentiment?,
            keywords: keywords?,
            total_comments,
        })
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
