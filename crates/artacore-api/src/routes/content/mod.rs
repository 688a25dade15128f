//! Admin API routes
//!
//! Login, registration, posts, media and uploads. Everything except login
//! and registration sits behind the request gate.

pub mod auth;
pub mod media;
pub mod posts;
pub mod types;
pub mod upload;

use axum::Router;

use crate::state::AppState;

pub use auth::RequireAuth;

/// Create admin API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(posts::routes())
        .merge(media::routes())
        .merge(upload::routes())
}
