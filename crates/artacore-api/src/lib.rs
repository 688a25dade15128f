//! Artacore CMS REST API
//!
//! This crate provides the Axum-based HTTP API for the Artacore admin panel:
//! login and registration, posts, media, uploads and the request gate that
//! guards everything under the API prefix.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use extract::ApiJson;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
