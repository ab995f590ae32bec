//! HTTP request layer: schemas, handlers and the mapping from domain
//! errors to status codes. The analysis core below this layer never
//! returns errors; everything user-facing is decided here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analysis::{AnalysisPipeline, AnalysisSummary, DEFAULT_TOP_N};
use crate::youtube::{FetchError, YouTubeClient, DEFAULT_MAX_COMMENTS};

const MSG_INVALID_URL: &str =
    "Invalid YouTube URL. Expected format: https://www.youtube.com/watch?v=VIDEO_ID";
const MSG_VIDEO_NOT_FOUND: &str = "Video not found";
const MSG_API_LIMIT: &str = "YouTube API quota exceeded";
const MSG_NO_COMMENTS: &str = "No comments found for this video";
const MSG_ANALYSIS_ERROR: &str = "Analysis failed due to an internal error";

/// Shared handler state: the upstream client and the analysis pipeline,
/// both constructed once at startup.
pub struct AppState {
    pub youtube: YouTubeClient,
    pub pipeline: AnalysisPipeline,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Watch, short or embed URL of the video to analyze.
    pub video_url: String,
    /// How many keywords to return (default 20).
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// User-facing error: a status code plus a stable message body.
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound => Self::new(StatusCode::NOT_FOUND, MSG_VIDEO_NOT_FOUND),
            FetchError::RateLimited => Self::new(StatusCode::FORBIDDEN, MSG_API_LIMIT),
            FetchError::MissingApiKey
            | FetchError::Transport(_)
            | FetchError::UpstreamStatus(_) => {
                tracing::error!("comment fetch failed: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_ANALYSIS_ERROR)
            }
        }
    }
}

static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]+)",
        r"(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]+)",
        r"(?:https?://)?(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Pull the video id out of a watch/short/embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).map(|caps| caps[1].to_string()))
}

/// Health probe.
#[utoipa::path(
    get,
    path = "/",
    tag = "analysis",
    responses((status = 200, description = "Service banner"))
)]
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "YouTube Comment Analyzer API" }))
}

/// Fetch a video's comments and return sentiment counts plus the most
/// frequent keywords.
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "analysis",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis summary", body = AnalysisSummary),
        (status = 400, description = "Invalid YouTube URL", body = ErrorResponse),
        (status = 403, description = "Upstream quota exceeded", body = ErrorResponse),
        (status = 404, description = "Video or comments not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn analyze_comments(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisSummary>, ApiError> {
    let video_id = extract_video_id(&request.video_url)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, MSG_INVALID_URL))?;
    tracing::info!("extracted video id: {video_id}");

    let comments = state
        .youtube
        .get_comments(&video_id, DEFAULT_MAX_COMMENTS)
        .await?;

    // Short-circuit before the pipeline; an empty set is a user-facing 404.
    if comments.is_empty() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, MSG_NO_COMMENTS));
    }

    let top_n = request.top_n.unwrap_or(DEFAULT_TOP_N);
    let summary = state
        .pipeline
        .analyze(comments, top_n)
        .await
        .map_err(|e| {
            tracing::error!("analysis pipeline failed: {e:#}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_ANALYSIS_ERROR)
        })?;

    Ok(Json(summary))
}
