//! Request/Response DTOs for the admin API
//!
//! Field names follow the admin panel's camelCase wire format.

use artacore_db::{Category, Media, Post, PostSummary, User};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "identity")]
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
}

/// Self-registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// User response (without password)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub created_date: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role.as_str().to_string(),
            created_date: u.created_at.to_rfc3339(),
        }
    }
}

// ==================== Post Types ====================

/// Create or update post request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "categoryID", alias = "categoryId")]
    pub category_id: Option<i64>,
    pub thumbnail: Option<String>,
    pub status: Option<String>,
}

/// Row in the posts list
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummaryResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_date: String,
    pub status: String,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(p: PostSummary) -> Self {
        Self {
            id: p.id,
            title: p.title,
            author: p.author,
            created_date: p.created_at.to_rfc3339(),
            status: p.status,
        }
    }
}

/// Full post
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "categoryID")]
    pub category_id: Option<i64>,
    pub thumbnail: Option<String>,
    pub status: String,
    pub author: String,
    pub created_date: String,
    pub updated_date: String,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            content: p.content,
            category_id: p.category_id,
            thumbnail: p.thumbnail,
            status: p.status,
            author: p.author,
            created_date: p.created_at.to_rfc3339(),
            updated_date: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

// ==================== Media Types ====================

/// Media library entry
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub file_extension: String,
    pub file_size: i64,
    pub file_type: String,
    pub alt_image: String,
    pub created_date: String,
}

impl From<Media> for MediaResponse {
    fn from(m: Media) -> Self {
        Self {
            id: m.id,
            title: m.file_name,
            url: m.file_path,
            file_extension: m.file_extension,
            file_size: m.file_size,
            file_type: m.file_type,
            alt_image: m.alt_image,
            created_date: m.created_at.to_rfc3339(),
        }
    }
}

/// Update alt text request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    pub id: Option<i64>,
    pub alt_image: Option<String>,
}

/// Delete media request
#[derive(Deserialize)]
pub struct DeleteMediaRequest {
    pub id: Option<i64>,
}

// ==================== Upload Types ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    /// Same as `file_url`; the rich-text editor reads this key
    pub url: String,
    pub id: i64,
}

#[derive(Serialize)]
pub struct ThumbnailResponse {
    pub url: String,
}

/// Generic acknowledgement for mutations without a body
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
