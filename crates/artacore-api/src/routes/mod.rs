//! API routes

mod content;
mod health;
pub mod metrics;

use artacore_auth::gate_middleware;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Uri,
    middleware,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

pub use content::RequireAuth;

async fn not_found(uri: Uri) -> ApiError {
    debug!("No route for {}", uri.path());
    ApiError::NotFound(format!("Route: {}", uri.path()))
}

/// Create the main router
///
/// The request gate wraps every route, including the fallback; it decides
/// by path whether a request needs a token at all.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let gate = state.gate.clone();
    let body_limit = state.max_upload_bytes;
    let uploads_prefix = format!("/{}", state.public_url_prefix.trim_matches('/'));
    let uploads = ServeDir::new(state.storage.root());

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Admin API
        .merge(content::routes())
        .with_state(state)
        // Uploaded files, read-only
        .nest_service(&uploads_prefix, uploads)
        .layer(DefaultBodyLimit::max(body_limit));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(gate, gate_middleware))
}
