mod analysis;
mod api;
mod keywords;
mod morphology;
mod sentiment;
mod youtube;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::AnalysisPipeline;
use crate::youtube::YouTubeClient;

#[derive(OpenApi)]
#[openapi(
    paths(api::root, api::analyze_comments),
    components(
        schemas(
            api::AnalyzeRequest,
            api::ErrorResponse,
            analysis::AnalysisSummary,
            keywords::KeywordCount,
            sentiment::SentimentTally
        )
    ),
    tags(
        (name = "analysis", description = "YouTube Comment Analysis API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    // Analyzer capabilities are probed exactly once, here. Missing
    // capabilities degrade the pipeline, never the process.
    let state = Arc::new(api::AppState {
        youtube: YouTubeClient::from_env(),
        pipeline: AnalysisPipeline::new(),
    });

    let frontend_origin =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::root))
        .route("/api/analyze", post(api::analyze_comments))
        .layer(cors)
        .with_state(state);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
