//! HTTP surface for the recommendation engine.
//!
//! `POST /v1/model-recommendation` (alias `/api/recommendations`) runs the
//! simplified 0–10 evaluator, shaping candidates from snapshots when the
//! payload has none. `POST /v1/recommend` runs the full engine.
#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use llmhub_core::{
    engine::{RecommendationRequest, Recommender},
    model::CandidateModel,
    simple::{evaluate_with_snapshots, SimplePayload},
    snapshot::latest_per_slug,
    AdvisorError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub const SERVICE_NAME: &str = "model-recommendation-api";
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

// --- State ---

/// Engine plus the snapshot rows used when a request brings no candidates.
pub struct AppState {
    recommender: Recommender,
    rows: Vec<CandidateModel>,
    latest: Vec<CandidateModel>,
    source: String,
}

impl AppState {
    pub fn new(recommender: Recommender, rows: Vec<CandidateModel>, source: String) -> Self {
        let latest = latest_per_slug(&rows).into_iter().cloned().collect();
        Self {
            recommender,
            rows,
            latest,
            source,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub type SharedState = Arc<AppState>;

// --- Error Handling ---

pub enum AppError {
    BadRequest(String),
    Core(AdvisorError),
    MethodNotAllowed,
    NotFound(String),
}

impl From<AdvisorError> for AppError {
    fn from(e: AdvisorError) -> Self {
        AppError::Core(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        AppError::BadRequest(rej.body_text())
    }
}

fn core_error_parts(e: AdvisorError) -> (StatusCode, &'static str, String) {
    let code = e.code();
    match e {
        AdvisorError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, code, msg),
        AdvisorError::Json(e) => (StatusCode::BAD_REQUEST, code, e.to_string()),
        other => {
            tracing::error!("internal error: {other}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                "Internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "invalid_payload", m),
            AppError::Core(e) => core_error_parts(e),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "Use POST for this endpoint.".to_string(),
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
        };
        let body = Json(json!({ "error": code, "message": msg }));
        if status == StatusCode::METHOD_NOT_ALLOWED {
            return (status, [(header::ALLOW, "POST")], body).into_response();
        }
        (status, body).into_response()
    }
}

// --- Request Types ---

/// Full-engine request; `candidates` falls back to the loaded snapshots.
#[derive(Deserialize)]
struct RecommendBody {
    #[serde(default)]
    candidates: Option<Vec<CandidateModel>>,
    #[serde(flatten)]
    request: RecommendationRequest,
}

fn status_for(no_feasible: bool) -> StatusCode {
    if no_feasible {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    }
}

// --- Handlers ---

async fn health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": SERVICE_NAME,
        "now": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}

async fn simple_recommendation(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(value) = body?;
    let payload = SimplePayload::from_value(value)?;
    let out = evaluate_with_snapshots(payload, &state.rows, &state.source)?;
    tracing::debug!(
        ranked = out.ranking.len(),
        rejected = out.rejected.len(),
        "simple recommendation"
    );
    Ok((status_for(out.no_feasible_candidates()), Json(out)).into_response())
}

async fn full_recommendation(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(value) = body?;
    if !value.is_object() {
        return Err(AdvisorError::InvalidRequest("Payload must be a JSON object.".into()).into());
    }
    let body: RecommendBody = serde_json::from_value(value).map_err(AdvisorError::from)?;
    let candidates = body.candidates.as_deref().unwrap_or(&state.latest);
    let out = state.recommender.recommend(candidates, &body.request)?;
    Ok((status_for(out.no_feasible_candidates()), Json(out)).into_response())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Route not found: {method} {}", uri.path()))
}

// --- Router ---

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/v1/model-recommendation",
            post(simple_recommendation).fallback(method_not_allowed),
        )
        .route(
            "/api/recommendations",
            post(simple_recommendation).fallback(method_not_allowed),
        )
        .route(
            "/v1/recommend",
            post(full_recommendation).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
