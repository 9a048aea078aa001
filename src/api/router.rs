//! Analyzer router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Layers (outermost → innermost): access log → body limit → handler.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the analyzer router around `ctx` (its factory decides which model
/// client each request gets).
pub fn analyzer_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.settings.max_upload_bytes;

    Router::new()
        .route("/", get(endpoints::page::index))
        .route("/api/health", get(endpoints::health::check))
        .route("/api/analyze", post(endpoints::analyze::analyze))
        .route("/api/analyze/stream", post(endpoints::analyze::analyze_stream))
        .route("/api/reports/:id", get(endpoints::report::download))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::access::log_access))
}
