//! Upload routes

use artacore_auth::Action;
use artacore_db::NewMedia;
use artacore_storage::{MediaKind, StoredFile};
use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{ThumbnailResponse, UploadResponse};

/// Folder thumbnails are stored under
const THUMBNAIL_FOLDER: &str = "thumbnail";
/// Multipart fields `/api/upload` takes its file from. The rich-text editor
/// posts `upload`; the media library posts `file`.
const UPLOAD_FIELDS: &[&str] = &["file", "upload"];
const THUMBNAIL_FIELDS: &[&str] = &["upload"];

struct UploadedFile {
    name: String,
    data: Bytes,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Multipart error: {}", e))
}

/// Read the multipart body, returning the file found under any of
/// `file_fields` and the text of `type_field` if present.
async fn read_multipart(
    multipart: &mut Multipart,
    file_fields: &[&str],
    type_field: Option<&str>,
) -> Result<(Option<UploadedFile>, Option<String>), ApiError> {
    let mut file = None;
    let mut file_type = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if file_fields.contains(&name.as_str()) {
            let file_name = field
                .file_name()
                .map(String::from)
                .ok_or_else(|| ApiError::BadRequest("Missing file name".to_string()))?;
            let data = field.bytes().await.map_err(multipart_error)?;
            file = Some(UploadedFile {
                name: file_name,
                data,
            });
        } else if Some(name.as_str()) == type_field {
            let text = field.text().await.map_err(multipart_error)?;
            if !text.trim().is_empty() {
                file_type = Some(text.trim().to_string());
            }
        }
    }

    Ok((file, file_type))
}

fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

// ==================== Upload Routes ====================

/// POST /api/upload
async fn upload(
    auth: RequireAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let user = auth.require(&state, Action::UploadMedia)?;

    let (file, file_type) =
        read_multipart(&mut multipart, UPLOAD_FIELDS, Some("fileType")).await?;
    let file = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let file_type =
        file_type.unwrap_or_else(|| MediaKind::from_file_name(&file.name).as_str().to_string());

    debug!(
        "Storing upload {} ({} bytes) as {}",
        file.name,
        file.data.len(),
        file_type
    );

    let stored = state.storage.save(&file_type, &file.name, file.data).await?;

    let media = match state
        .db
        .insert_media(NewMedia {
            file_name: stored.file_name.clone(),
            file_path: stored.url.clone(),
            file_extension: file_extension(&stored.file_name),
            file_size: stored.size as i64,
            file_type: file_type.clone(),
        })
        .await
    {
        Ok(media) => media,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    metrics::counter!("artacore_uploads_total", "kind" => "media").increment(1);
    info!("{} uploaded {} (media {})", user.email, stored.url, media.id);

    Ok(Json(UploadResponse {
        success: true,
        file_name: stored.file_name,
        file_type,
        file_url: stored.url.clone(),
        url: stored.url,
        id: media.id,
    }))
}

/// POST /api/upload/thumbnail
async fn upload_thumbnail(
    auth: RequireAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    let user = auth.require(&state, Action::UploadMedia)?;

    let (file, _) = read_multipart(&mut multipart, THUMBNAIL_FIELDS, None).await?;
    let file = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let stored = state
        .storage
        .save(THUMBNAIL_FOLDER, &file.name, file.data)
        .await?;

    metrics::counter!("artacore_uploads_total", "kind" => "thumbnail").increment(1);
    info!("{} uploaded thumbnail {}", user.email, stored.url);

    Ok(Json(ThumbnailResponse { url: stored.url }))
}

/// Remove a stored file whose media row could not be written
async fn discard(state: &AppState, stored: &StoredFile) {
    if let Err(e) = state.storage.delete(&stored.folder, &stored.file_name).await {
        error!("Failed to remove orphaned upload {}: {}", stored.url, e);
    }
}

/// Create upload routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/upload/thumbnail", post(upload_thumbnail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("1700-cat.PNG"), "png");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("README"), "");
    }
}
