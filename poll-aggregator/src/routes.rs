use crate::state::AppState;
use crate::types::{NewsQuery, PollError, VoteRequest};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = match &self {
            PollError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            PollError::NotFound { .. } => StatusCode::NOT_FOUND,
            PollError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            PollError::ParseFailure(_) | PollError::StoreUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let message = match self {
            PollError::InvalidArgument(message) => message,
            PollError::NotFound { .. } => "Poll not found".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/polls", get(list_polls_handler))
        .route("/api/polls/vote", patch(vote_handler))
        .route("/api/polls/generate", post(generate_handler))
        .route("/api/news", get(news_handler))
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "message": "Poll aggregator API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "polls": "/api/polls",
            "vote": "/api/polls/vote",
            "generate": "/api/polls/generate",
            "news": "/api/news",
        }
    }))
}

async fn list_polls_handler(State(state): State<AppState>) -> Result<Response, PollError> {
    let active = state.service.list_active().await?;
    Ok(Json(active).into_response())
}

async fn vote_handler(
    State(state): State<AppState>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Response, PollError> {
    let Json(request) =
        payload.map_err(|rejection| PollError::InvalidArgument(rejection.body_text()))?;

    let poll = state.service.vote(&request).await?;
    Ok(Json(json!({
        "message": "Vote recorded successfully",
        "poll": poll,
    }))
    .into_response())
}

async fn generate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let poll = state.generator.run_cycle().await;
    let next = state.next_poll.advance(state.generation_window);
    info!("On-demand generation finished, next poll expected at {}", next);

    Json(json!({
        "generated": poll.is_some(),
        "poll": poll,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    pub category: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
}

async fn news_handler(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>,
) -> Result<Response, PollError> {
    let query = NewsQuery {
        country: params.country.unwrap_or_else(|| "us".to_string()),
        category: Some(params.category.unwrap_or_else(|| "general".to_string())),
        language: params.language,
    };

    let articles = state.news.top_headlines(&query).await?;
    Ok(Json(articles).into_response())
}
