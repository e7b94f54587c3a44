//! Axum routes for the gateway.
//!
//! Maps the pipeline's typed result or error onto the wire: 200 success,
//! 400 invalid input, 503 not ready, 500 inference failure.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tabgate::{ErrorResponse, GatewayError, InferencePipeline, ModelArtifacts};

/// Shared gateway state; the artifacts are immutable after startup so
/// concurrent requests read them without a lock.
pub struct GatewayState {
    pub artifacts: ModelArtifacts,
    pub pipeline: InferencePipeline,
}

impl GatewayState {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        GatewayState {
            artifacts,
            pipeline: InferencePipeline::default(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Construct the gateway router with all endpoints
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "tabgate-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run one prediction request.
///
/// POST /predict
///
/// The body is taken raw so the pipeline owns JSON validation and its
/// error messages.
async fn predict(State(state): State<Arc<GatewayState>>, body: Bytes) -> Response {
    match state.pipeline.run(&state.artifacts, &body) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(error: GatewayError) -> Response {
    let status = match &error {
        GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GatewayError::ServiceNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "Inference failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
