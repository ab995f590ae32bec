//! YouTube Data API v3 client: validates that a video exists, then pages
//! through its comment threads and returns the plain comment texts.

use serde::Deserialize;
use std::env;
use std::time::Duration;

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_MAX_COMMENTS: usize = 100;
// Hard page-size cap of the commentThreads endpoint.
const MAX_PAGE_SIZE: usize = 100;

/// Domain errors of the comment-fetching boundary. The analysis core never
/// sees these; the request layer maps them to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("YOUTUBE_API_KEY is not configured")]
    MissingApiKey,
    #[error("video not found")]
    NotFound,
    #[error("YouTube API quota exceeded or access forbidden")]
    RateLimited,
    #[error("YouTube API transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected YouTube API response: HTTP {0}")]
    UpstreamStatus(u16),
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
}

pub struct YouTubeClient {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl YouTubeClient {
    pub fn from_env() -> Self {
        let api_key = env::var("YOUTUBE_API_KEY").ok();
        if api_key.is_none() {
            tracing::warn!("YOUTUBE_API_KEY is not set; /api/analyze will fail until it is");
        }

        Self {
            api_key,
            base_url: API_BASE_URL.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Fetch up to `max_results` top-level comment texts for `video_id`,
    /// relevance-ordered, following `nextPageToken` pagination.
    pub async fn get_comments(
        &self,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        self.check_video_exists(api_key, video_id).await?;
        let comments = self
            .fetch_comment_threads(api_key, video_id, max_results)
            .await?;

        tracing::info!("fetched {} comments for video {video_id}", comments.len());
        Ok(comments)
    }

    async fn check_video_exists(&self, api_key: &str, video_id: &str) -> Result<(), FetchError> {
        let url = format!("{}/videos", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("key", api_key), ("id", video_id), ("part", "id")])
            .send()
            .await?;

        let response = map_status(response)?;
        let data: VideoListResponse = response.json().await?;
        if data.items.is_empty() {
            return Err(FetchError::NotFound);
        }
        Ok(())
    }

    async fn fetch_comment_threads(
        &self,
        api_key: &str,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/commentThreads", self.base_url);
        let page_size = max_results.min(MAX_PAGE_SIZE).to_string();

        let mut comments = Vec::new();
        let mut next_page_token: Option<String> = None;

        while comments.len() < max_results {
            let mut request = self.http.get(&url).query(&[
                ("key", api_key),
                ("videoId", video_id),
                ("part", "snippet"),
                ("maxResults", page_size.as_str()),
                ("order", "relevance"),
            ]);
            if let Some(token) = &next_page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = map_status(request.send().await?)?;
            let data: CommentThreadsResponse = response.json().await?;

            for item in data.items {
                comments.push(item.snippet.top_level_comment.snippet.text_display);
                if comments.len() >= max_results {
                    break;
                }
            }

            next_page_token = data.next_page_token;
            if next_page_token.is_none() {
                break;
            }
        }

        comments.truncate(max_results);
        Ok(comments)
    }
}

fn map_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == reqwest::StatusCode::FORBIDDEN {
        Err(FetchError::RateLimited)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(FetchError::NotFound)
    } else {
        Err(FetchError::UpstreamStatus(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_threads_response_deserializes() {
        let raw = serde_json::json!({
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "最高でした"}}}},
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "つまらない"}}}}
            ],
            "nextPageToken": "abc123"
        });
        let parsed: CommentThreadsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(
            parsed.items[0].snippet.top_level_comment.snippet.text_display,
            "最高でした"
        );
        assert_eq!(parsed.next_page_token.as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_page_token_and_items_default() {
        let parsed: CommentThreadsResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.items.is_empty());
        assert!(parsed.next_page_token.is_none());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_domain_error() {
        let client = YouTubeClient {
            api_key: None,
            base_url: API_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        };
        let err = client.get_comments("abc", 10).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }
}
