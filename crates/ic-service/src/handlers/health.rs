//! Liveness endpoint.

use crate::models::HealthResponse;
use axum::Json;
use tracing::instrument;

/// Health check handler.
///
/// The service holds no connections of its own, so liveness never touches
/// the identity provider or the calendaring API.
#[instrument(skip_all, name = "ic.health.check")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
