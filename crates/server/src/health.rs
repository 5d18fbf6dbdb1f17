use axum::Json;
use http::StatusCode;
use serde::Serialize;

/// Represents the health status of the server.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum HealthState {
    /// The server is up and serving requests.
    Healthy,
}

/// Handles health check requests and returns the current health status.
pub(crate) async fn health() -> (StatusCode, Json<HealthState>) {
    (StatusCode::OK, Json(HealthState::Healthy))
}
