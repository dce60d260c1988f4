// HTTP surface (spec §6.1) — grounded on `rusty-db`'s REST server:
// tower-http tracing/timeout layers plus CORS, `axum::serve` over a
// `TcpListener`. No GraphQL, no Swagger UI, no admin/cluster/pool
// endpoint families, no auth middleware — this engine serves exactly
// the two routes the spec names (§6.1 explicitly drops the rest).

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;

use super::handlers::{get_scroll, post_dismiss};
use super::types::AppState;

pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/feed/scroll", get(get_scroll))
        .route("/feed/scroll/dismiss", post(post_dismiss))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::new().allow_methods(Any).allow_headers(Any).allow_origin(Any))
}

pub async fn run(addr: &str, state: Arc<AppState>, request_timeout: Duration) -> Result<()> {
    let router = build_router(state, request_timeout);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "feed engine listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| crate::error::FeedError::Internal(format!("server error: {e}")))?;
    Ok(())
}
