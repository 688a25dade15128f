//! Media library routes

use artacore_auth::Action;
use axum::{Json, Router, extract::State, routing::get};
use tracing::info;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{DeleteMediaRequest, MediaResponse, MessageResponse, UpdateMediaRequest};

/// GET /api/media
async fn list_media(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaResponse>>, ApiError> {
    auth.require(&state, Action::ReadContent)?;

    let media = state.db.list_media().await?;
    Ok(Json(media.into_iter().map(Into::into).collect()))
}

/// PUT /api/media
async fn update_media(
    auth: RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateMediaRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = auth.require(&state, Action::WriteContent)?;
    let id = request
        .id
        .ok_or_else(|| ApiError::BadRequest("Media id is required".to_string()))?;

    let alt_image = request.alt_image.unwrap_or_default();
    if !state.db.update_media_alt(id, &alt_image).await? {
        return Err(ApiError::NotFound(format!("Media: {}", id)));
    }

    info!("Media {} alt text updated by {}", id, user.email);

    Ok(Json(MessageResponse {
        message: "Media updated".to_string(),
    }))
}

/// DELETE /api/media
async fn delete_media(
    auth: RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteMediaRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = auth.require(&state, Action::DeleteContent)?;
    let id = request
        .id
        .ok_or_else(|| ApiError::BadRequest("Media id is required".to_string()))?;

    if !state.db.soft_delete_media(id).await? {
        return Err(ApiError::NotFound(format!("Media: {}", id)));
    }

    info!("Media {} deleted by {}", id, user.email);

    Ok(Json(MessageResponse {
        message: "Media deleted".to_string(),
    }))
}

/// GET /api/media/type
async fn list_media_types(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    auth.require(&state, Action::ReadContent)?;
    Ok(Json(state.db.list_media_types().await?))
}

/// Create media routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/media",
            get(list_media).put(update_media).delete(delete_media),
        )
        .route("/api/media/type", get(list_media_types))
}
