//! Mock image host for resource loader tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

pub const LOGO_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-logo";

#[derive(Clone, Default)]
pub struct AssetHits {
    hits: Arc<AtomicUsize>,
    flaky: Arc<AtomicUsize>,
}

impl AssetHits {
    pub fn count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves:
/// - `/logo.png`: a small image
/// - `/huge.png`: 64 KiB of zeros
/// - `/slow.png`: answers after two seconds
/// - `/flaky.png`: 503 on the first request, the small image afterwards
/// - anything else: 404
pub async fn spawn_asset_server() -> (SocketAddr, AssetHits) {
    let hits = AssetHits::default();
    let app = Router::new()
        .route("/logo.png", get(logo))
        .route("/huge.png", get(huge))
        .route("/slow.png", get(slow))
        .route("/flaky.png", get(flaky))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind asset server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hits)
}

async fn logo(State(hits): State<AssetHits>) -> impl IntoResponse {
    hits.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], LOGO_BYTES)
}

async fn huge(State(hits): State<AssetHits>) -> impl IntoResponse {
    hits.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 64 * 1024])
}

async fn slow(State(hits): State<AssetHits>) -> impl IntoResponse {
    hits.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    ([(header::CONTENT_TYPE, "image/png")], LOGO_BYTES)
}

async fn flaky(State(hits): State<AssetHits>) -> Response {
    hits.hits.fetch_add(1, Ordering::SeqCst);
    if hits.flaky.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], LOGO_BYTES).into_response()
}
