//! Artacore CMS Database Layer
//!
//! This crate provides the persistence layer for the Artacore admin panel:
//! staff accounts, blog posts, categories and media assets, stored in
//! SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
