// Handlers module
// HTTP handlers for the REST API

pub mod questions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    SharedStore,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness check
/// GET /health
/// Always healthy while the process serves requests; the store is not consulted.
pub async fn health_check() -> impl IntoResponse {
    info!("Health check requested");
    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}

/// Readiness check
/// GET /health/ready
/// Round-trips to the store and reports 503 when it cannot be reached.
pub async fn readiness_check(
    State(store): State<SharedStore>,
) -> ApiResult<impl IntoResponse> {
    store.ping().await.map_err(ApiError::Unavailable)?;

    Ok((StatusCode::OK, Json(HealthResponse { status: "ready" })))
}
