use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::interpreter::Interpreter;
use crate::resolve::ScreenResolver;
use crate::server::{health, request_id, screens};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ScreenResolver>,
    pub interpreter: Arc<Interpreter>,
}

impl AppState {
    pub fn new(resolver: Arc<ScreenResolver>, interpreter: Arc<Interpreter>) -> Self {
        Self {
            resolver,
            interpreter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/v1/screens/{screen_id}", get(screens::get_screen))
        .route("/v1/screens/{screen_id}/render", post(screens::render_screen))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
