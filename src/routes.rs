//! HTTP surface for the orchestration pipeline.
//!
//! One POST route per orchestrated operation. Every body is validated
//! before any capability call; failures come back as structured JSON with
//! a stable error code, never a propagated exception.

use crate::app::App;
use crate::models::{
    AnalyzeRequest, DescriptionRequest, GenerateRequest, GenerateResponse, KitRequest,
};
use crate::Error;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/v1/generate", post(generate_background))
        .route("/v1/analyze-product", post(analyze_product))
        .route("/v1/descriptions/generate", post(generate_description))
        .route("/v1/marketing/kit", post(generate_marketing_kit))
        .route("/healthz", get(healthz))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState { app })
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn generate_background(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(e);
    }

    match state.app.generate_background(body).await {
        Ok(result) => Json(GenerateResponse {
            preset: result.used_prompt.origin.preset(),
            result_url: result.result_url,
            width: result.width,
            height: result.height,
            used_prompt: result.used_prompt.text,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn analyze_product(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(e);
    }

    match state.app.analyze_product(body).await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => error_response(e),
    }
}

async fn generate_description(
    State(state): State<AppState>,
    Json(body): Json<DescriptionRequest>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(e);
    }

    match state.app.generate_description(body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn generate_marketing_kit(
    State(state): State<AppState>,
    Json(body): Json<KitRequest>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(e);
    }

    match state.app.generate_marketing_kit(body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

/// Single mapping from the error taxonomy to HTTP status + body.
fn error_response(err: Error) -> Response {
    let status = match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::UploadFailed(_)
        | Error::AnalysisFailed(_)
        | Error::GenerationFailed(_)
        | Error::NoOutput
        | Error::LlmFailed(_) => StatusCode::BAD_GATEWAY,
        _ => {
            // Unanticipated failures get logged with context and surface
            // as an opaque internal_error.
            error!("internal error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let mut body = serde_json::json!({ "error": err.code() });
    if let Some(detail) = err.public_detail() {
        body["detail"] = serde_json::Value::String(detail);
    }

    (status, Json(body)).into_response()
}
