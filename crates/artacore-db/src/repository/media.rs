//! Media asset operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Media, NewMedia};
use crate::repository::Database;
use crate::utils::to_db_timestamp;

impl Database {
    // ==================== Media Operations ====================

    /// Record an uploaded file
    pub async fn insert_media(&self, media: NewMedia) -> Result<Media, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO media (file_name, file_path, file_extension, file_size, file_type, alt_image, is_deleted, created_at)
            VALUES (?, ?, ?, ?, ?, '', 0, ?)
            RETURNING id
            "#,
        )
        .bind(&media.file_name)
        .bind(&media.file_path)
        .bind(&media.file_extension)
        .bind(media.file_size)
        .bind(&media.file_type)
        .bind(to_db_timestamp(now))
        .fetch_one(&self.pool)
        .await?;

        Ok(Media {
            id: result.get("id"),
            file_name: media.file_name,
            file_path: media.file_path,
            file_extension: media.file_extension,
            file_size: media.file_size,
            file_type: media.file_type,
            alt_image: String::new(),
            is_deleted: false,
            created_at: now,
        })
    }

    /// List media that has not been soft-deleted, newest first
    pub async fn list_media(&self) -> Result<Vec<Media>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, file_name, file_path, file_extension, file_size, file_type, alt_image, is_deleted, created_at
            FROM media
            WHERE is_deleted = 0
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Media::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Set the alt text of a media asset
    pub async fn update_media_alt(&self, id: i64, alt_image: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE media
            SET alt_image = ?
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(alt_image)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a media asset
    pub async fn soft_delete_media(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE media SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct file types among live media
    pub async fn list_media_types(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT file_type
            FROM media
            WHERE is_deleted = 0
            ORDER BY file_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("file_type").map_err(DbError::from))
            .collect()
    }
}
