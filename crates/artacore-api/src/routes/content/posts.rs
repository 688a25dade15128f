//! Post routes

use artacore_auth::Action;
use artacore_db::{NewPost, UpdatePost};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{
    CategoryRequest, CategoryResponse, MessageResponse, PostRequest, PostResponse,
    PostSummaryResponse,
};

/// Status given to posts created without one
const DEFAULT_STATUS: &str = "draft";
const MAX_TITLE_LENGTH: usize = 255;

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Empty or whitespace-only status falls back to `fallback`
fn status_or(status: Option<String>, fallback: String) -> String {
    match status {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => fallback,
    }
}

// ==================== Post Routes ====================

/// GET /api/posts
async fn list_posts(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<PostSummaryResponse>>, ApiError> {
    auth.require(&state, Action::ReadContent)?;

    let posts = state.db.list_posts().await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// POST /api/posts
async fn create_post(
    auth: RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let user = auth.require(&state, Action::WriteContent)?;
    validate_title(&request.title)?;

    debug!("Creating post '{}' for {}", request.title, user.email);

    let post = state
        .db
        .insert_post(NewPost {
            title: request.title.trim().to_string(),
            description: request.description,
            content: request.content,
            category_id: request.category_id,
            thumbnail: request.thumbnail,
            status: status_or(request.status, DEFAULT_STATUS.to_string()),
            author: user.email.clone(),
        })
        .await?;

    info!("Created post {} by {}", post.id, post.author);

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// GET /api/posts/{id}
async fn get_post(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    auth.require(&state, Action::ReadContent)?;

    let post = state
        .db
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post: {}", id)))?;

    Ok(Json(post.into()))
}

/// PUT /api/posts/{id}
async fn update_post(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<PostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let user = auth.require(&state, Action::WriteContent)?;
    validate_title(&request.title)?;

    let existing = state
        .db
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post: {}", id)))?;

    let updated = state
        .db
        .update_post(
            id,
            UpdatePost {
                title: request.title.trim().to_string(),
                description: request.description,
                content: request.content,
                category_id: request.category_id,
                thumbnail: request.thumbnail,
                status: status_or(request.status, existing.status),
            },
        )
        .await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Post: {}", id)));
    }

    info!("Post {} updated by {}", id, user.email);

    let post = state
        .db
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post: {}", id)))?;
    Ok(Json(post.into()))
}

/// DELETE /api/posts/{id}
async fn delete_post(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = auth.require(&state, Action::DeleteContent)?;

    if !state.db.soft_delete_post(id).await? {
        return Err(ApiError::NotFound(format!("Post: {}", id)));
    }

    info!("Post {} deleted by {}", id, user.email);

    Ok(Json(MessageResponse {
        message: "Post deleted".to_string(),
    }))
}

/// GET /api/posts/status
async fn list_statuses(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    auth.require(&state, Action::ReadContent)?;
    Ok(Json(state.db.list_post_statuses().await?))
}

/// GET /api/posts/categories
async fn list_categories(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    auth.require(&state, Action::ReadContent)?;

    let categories = state.db.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// POST /api/posts/categories
async fn create_category(
    auth: RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let user = auth.require(&state, Action::WriteContent)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Category name cannot be empty".to_string()));
    }

    let category = state.db.insert_category(name).await?;
    info!("Category {} created by {}", category.name, user.email);

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Create post routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/status", get(list_statuses))
        .route(
            "/api/posts/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}
