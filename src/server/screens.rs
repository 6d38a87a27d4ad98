//! Screen endpoints.
//!
//! `GET /v1/screens/{screen_id}` returns the resolved template unchanged;
//! `POST /v1/screens/{screen_id}/render` also evaluates it against an
//! environment built from the query plus the request body.

use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::DateTime;
use serde::Deserialize;

use crate::interpreter::{Environment, RenderTree};
use crate::resolve::ScreenContext;
use crate::schema::ScreenDocument;
use crate::server::error::ServerError;
use crate::server::router::AppState;

/// Query parameters accepted by both screen endpoints.
///
/// Everything arrives as text; empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenQuery {
    pub user_id: Option<String>,
    pub route_id: Option<String>,
    pub service_date: Option<String>,
    pub device_model: Option<String>,
    pub app_version: Option<String>,
    pub locale: Option<String>,
}

impl ScreenQuery {
    pub fn into_context(self) -> Result<ScreenContext, ServerError> {
        let service_date = match non_empty(self.service_date) {
            Some(raw) => Some(DateTime::parse_from_rfc3339(&raw).map_err(|err| {
                ServerError::InvalidRequest(format!("serviceDate '{raw}' is not RFC 3339: {err}"))
            })?),
            None => None,
        };

        Ok(ScreenContext {
            user_id: non_empty(self.user_id),
            route_id: non_empty(self.route_id),
            service_date,
            device_model: non_empty(self.device_model),
            app_version: non_empty(self.app_version),
            locale: non_empty(self.locale),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of a render request. An empty body means no extra bindings.
#[derive(Debug, Default, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub environment: Environment,
}

impl RenderRequest {
    fn parse(body: &[u8]) -> Result<Self, ServerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|err| ServerError::InvalidRequest(format!("invalid render request body: {err}")))
    }
}

pub async fn get_screen(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ScreenQuery>, QueryRejection>,
) -> Result<Json<ScreenDocument>, ServerError> {
    let Path(screen_id) = path?;
    let Query(query) = query?;
    let context = query.into_context()?;
    let document = state.resolver.resolve(&screen_id, &context).await?;
    tracing::debug!(screen_id = %document.id, version = document.version, "Screen resolved");
    Ok(Json(ScreenDocument::clone(&document)))
}

pub async fn render_screen(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ScreenQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<RenderTree>, ServerError> {
    let Path(screen_id) = path?;
    let Query(query) = query?;
    let request = RenderRequest::parse(&body)?;
    let context = query.into_context()?;
    let document = state.resolver.resolve(&screen_id, &context).await?;

    let mut env = Environment::from_context(&context);
    env.overlay(&request.environment);

    let interpreter = state.interpreter.clone();
    let tree = tokio::task::spawn_blocking(move || interpreter.render(&document, &env))
        .await
        .map_err(|err| ServerError::Internal(format!("render task failed: {err}")))?;

    tracing::debug!(
        screen_id = %tree.screen_id,
        nodes = tree.nodes.len(),
        diagnostics = tree.diagnostics.len(),
        "Screen rendered"
    );
    Ok(Json(tree))
}
