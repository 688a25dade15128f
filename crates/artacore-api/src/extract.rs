//! Request extractors

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor whose rejections use the `ApiError` envelope
///
/// A missing field, bad syntax or a wrong content type becomes a 400
/// `{"error","code"}` instead of axum's plain-text 415/422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
