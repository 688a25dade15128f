//! Artacore CMS Storage Layer
//!
//! This crate places uploaded media files on disk and reports the public
//! URL under which they are served.

pub mod backend;
pub mod error;
pub mod local;

pub use backend::{MediaKind, StorageBackend, StoredFile, sanitize_file_name};
pub use error::StorageError;
pub use local::LocalStorage;
