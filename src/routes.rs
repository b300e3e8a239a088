use crate::models::{ReportParams, ValidationErrors};
use crate::pipeline::ReportPipeline;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReportPipeline>,
}

/// Everything a handler can surface. Collaborator failures never show up
/// here; the pipeline absorbs them.
pub enum ApiError {
    Validation(ValidationErrors),
    NotFound,
    Http(StatusCode, String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "message": "Validation error",
                    "details": details,
                })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "status": "error", "message": "Report not found" })),
            )
                .into_response(),
            ApiError::Http(status, message) => (
                status,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!("Internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error", "message": "An internal error occurred" })),
                )
                    .into_response()
            }
        }
    }
}

pub async fn generate_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportParams>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(params) = payload.map_err(|e| ApiError::Http(e.status(), e.body_text()))?;

    let result = state.pipeline.assemble(&params).await.map_err(|details| {
        warn!("Validation error: {:?}", details.0.keys().collect::<Vec<_>>());
        ApiError::Validation(details)
    })?;

    Ok(Json(json!({
        "status": "success",
        "report_id": result.report_id,
        "pdf_url": result.pdf_url,
        "doc_url": result.doc_url,
    })))
}

pub async fn get_report(
    Path(report_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    match state.pipeline.lookup(&report_id).await {
        Some(record) => Ok(Json(record).into_response()),
        None => {
            warn!("Report not found: {report_id}");
            Err(ApiError::NotFound)
        }
    }
}

pub async fn download_report(
    Path(report_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let record = state
        .pipeline
        .lookup(&report_id)
        .await
        .ok_or(ApiError::NotFound)?;
    let pdf_url = record.pdf_url.ok_or(ApiError::NotFound)?;

    let location =
        HeaderValue::from_str(&pdf_url).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, location);
    Ok((StatusCode::SEE_OTHER, headers).into_response())
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate_report", post(generate_report))
        .route("/get_report/:report_id", get(get_report))
        .route("/download_report/:report_id", get(download_report))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
