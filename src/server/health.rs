use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::server::router::AppState;

pub const SERVICE_NAME: &str = "sdui";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthStatus {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            reason: None,
        }
    }
}

/// Liveness: the process is up and serving.
pub async fn liveness() -> Json<HealthStatus> {
    Json(HealthStatus::new("healthy"))
}

/// Readiness: the template store answers a ping.
pub async fn readiness(State(state): State<AppState>) -> Response {
    let store = state.resolver.store();
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus::new("ready"))).into_response(),
        Err(err) => {
            tracing::warn!(store = store.name(), error = %err, "Readiness check failed");
            let status = HealthStatus {
                reason: Some(err.to_string()),
                ..HealthStatus::new("unavailable")
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
        }
    }
}
