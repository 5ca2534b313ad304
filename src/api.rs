//! HTTP routes over [`SearchService`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::SearchError;
use crate::service::{ChunkResult, SearchRequest, SearchService, SummaryResult};

/// JSON error payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    detail: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the router: `GET /healthz`, `POST /search`, `POST /summary_search`.
pub fn router(service: SearchService) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/search", post(search_handler))
        .route("/summary_search", post(summary_search_handler))
        .with_state(service)
}

async fn healthz(State(service): State<SearchService>) -> Result<Json<HealthBody>, ApiError> {
    service.health().await.map_err(error_response)?;
    Ok(Json(HealthBody { status: "ok" }))
}

async fn search_handler(
    State(service): State<SearchService>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<ChunkResult>>, ApiError> {
    let results = service.search(&request).await.map_err(error_response)?;
    Ok(Json(results))
}

async fn summary_search_handler(
    State(service): State<SearchService>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SummaryResult>>, ApiError> {
    let results = service
        .summary_search(&request)
        .await
        .map_err(error_response)?;
    Ok(Json(results))
}

fn error_response(err: SearchError) -> ApiError {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorBody {
            detail: err.to_string(),
        }),
    )
}
