//! Post and category operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Category, NewPost, Post, PostSummary, UpdatePost};
use crate::repository::Database;
use crate::utils::to_db_timestamp;

impl Database {
    // ==================== Post Operations ====================

    /// Insert a new post
    pub async fn insert_post(&self, post: NewPost) -> Result<Post, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, description, content, category_id, thumbnail, status, author, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.content)
        .bind(post.category_id)
        .bind(&post.thumbnail)
        .bind(&post.status)
        .bind(&post.author)
        .bind(to_db_timestamp(now))
        .bind(to_db_timestamp(now))
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Post {
            id,
            title: post.title,
            description: post.description,
            content: post.content,
            category_id: post.category_id,
            thumbnail: post.thumbnail,
            status: post.status,
            author: post.author,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// List posts that have not been soft-deleted, newest first
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, status, created_at
            FROM posts
            WHERE is_deleted = 0
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| PostSummary::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a live (not soft-deleted) post by ID
    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, description, content, category_id, thumbnail, status, author, is_deleted, created_at, updated_at
            FROM posts
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Post::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Replace the editable fields of a live post
    pub async fn update_post(&self, id: i64, update: UpdatePost) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, description = ?, content = ?, category_id = ?, thumbnail = ?, status = ?, updated_at = ?
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.content)
        .bind(update.category_id)
        .bind(&update.thumbnail)
        .bind(&update.status)
        .bind(to_db_timestamp(now))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a post
    pub async fn soft_delete_post(&self, id: i64) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_deleted = 1, updated_at = ?
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(to_db_timestamp(now))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct statuses in use
    pub async fn list_post_statuses(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT status
            FROM posts
            WHERE status IS NOT NULL
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("status").map_err(DbError::from))
            .collect()
    }

    // ==================== Category Operations ====================

    /// Insert a category
    pub async fn insert_category(&self, name: &str) -> Result<Category, DbError> {
        let result = sqlx::query("INSERT INTO categories (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::on_insert(e, || format!("Category '{}' already exists", name)))?;

        Ok(Category {
            id: result.get("id"),
            name: name.to_string(),
        })
    }

    /// List all categories
    pub async fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Category::try_from(row).map_err(DbError::from))
            .collect()
    }
}
