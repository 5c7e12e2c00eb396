use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::credential;
use crate::extract::ExtractionError;
use crate::llm::DispatchError;
use crate::models::{AnalyzeRequest, AuditRequest, ExtractRequest, RedesignRequest, RoadmapRequest};
use crate::pipeline::{Pipeline, RunError, RunOptions, StageError};
use crate::rate_limit::{self, RateLimiter};

/// Header carrying a per-request credential override.
pub const CREDENTIAL_HEADER: &str = "x-groq-api-key";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub default_credential: Arc<str>,
}

impl AppState {
    /// A present header always wins over the default, even when it is not
    /// valid UTF-8; the provider then rejects it as unauthorized.
    fn credential(&self, headers: &HeaderMap) -> String {
        let header = headers
            .get(CREDENTIAL_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));
        credential::resolve_with_default(header.as_deref(), &self.default_credential)
    }
}

pub fn router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .route("/extract", post(extract_endpoint))
        .route("/scrape", post(extract_endpoint))
        .route("/analyze", post(analyze_endpoint))
        .route("/redesign", post(redesign_endpoint))
        .route("/roadmap", post(roadmap_endpoint))
        .route("/audit", post(audit_endpoint))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::enforce));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Extraction(ExtractionError),
    Stage(StageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Extraction(e) => extraction_status(e),
            ApiError::Stage(e) => stage_status(e),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Extraction(e) => e.to_string(),
            ApiError::Stage(e) => e.to_string(),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Extraction(e) => ApiError::Extraction(e),
            RunError::Analysis(e) => ApiError::Stage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.message());
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

fn extraction_status(e: &ExtractionError) -> StatusCode {
    match e {
        ExtractionError::InvalidUrl(_)
        | ExtractionError::UnsupportedContentType
        | ExtractionError::PageTooLarge => StatusCode::BAD_REQUEST,
        ExtractionError::FetchTimeout => StatusCode::REQUEST_TIMEOUT,
        ExtractionError::FetchFailed { status, .. } => status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY),
    }
}

fn stage_status(e: &StageError) -> StatusCode {
    match e {
        StageError::Dispatch(DispatchError::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
        StageError::Dispatch(DispatchError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn extract_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body(payload)?;
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;

    let page = state
        .pipeline
        .extractor()
        .extract(&url)
        .await
        .map_err(ApiError::Extraction)?;
    Ok(Json(page).into_response())
}

async fn analyze_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body(payload)?;
    let page = req
        .data
        .ok_or_else(|| ApiError::BadRequest("Data is required".to_string()))?;
    let credential = state.credential(&headers);

    let analysis = state
        .pipeline
        .generator()
        .analyze(&page, &credential)
        .await
        .map_err(ApiError::Stage)?;
    Ok(Json(analysis).into_response())
}

async fn redesign_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RedesignRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body(payload)?;
    let page = req
        .data
        .ok_or_else(|| ApiError::BadRequest("Missing data".to_string()))?;
    let credential = state.credential(&headers);

    let redesign = state
        .pipeline
        .generator()
        .redesign(&page, req.custom_prompt.as_deref(), &credential)
        .await
        .map_err(ApiError::Stage)?;
    Ok(Json(redesign).into_response())
}

async fn roadmap_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RoadmapRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body(payload)?;
    let page = req
        .data
        .ok_or_else(|| ApiError::BadRequest("Missing data".to_string()))?;
    let credential = state.credential(&headers);

    let roadmap = state
        .pipeline
        .generator()
        .roadmap(&page, req.redesign.as_ref(), &credential)
        .await
        .map_err(ApiError::Stage)?;
    Ok(Json(roadmap).into_response())
}

async fn audit_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AuditRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body(payload)?;
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;
    let options = RunOptions {
        custom_prompt: req.custom_prompt,
        credential: state.credential(&headers),
    };

    let mut run = state.pipeline.run(&url, &options).await;
    let status = match run.failure.take() {
        Some(failure) => ApiError::from(failure).status(),
        None => StatusCode::OK,
    };
    Ok((status, Json(run)).into_response())
}
