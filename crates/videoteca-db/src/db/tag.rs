use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;
use videoteca_core::models::{NewTag, Tag, TagChanges};
use videoteca_core::AppError;

use super::errors::{DbOperation, ResultExt};

const ENTITY: &str = "Tag";

/// Repository for tags
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a tag
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "insert"))]
    pub async fn create(&self, new_tag: NewTag) -> Result<Tag, AppError> {
        new_tag.validate()?;

        let tag = sqlx::query_as::<Postgres, Tag>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&new_tag.name)
        .fetch_one(&self.pool)
        .await
        .map_db_err(ENTITY, DbOperation::Insert)?;

        tracing::info!(tag_id = %tag.id, "Tag created");
        Ok(tag)
    }

    /// Get tag by ID
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            "SELECT id, name, created_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Get tag by its exact name
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            "SELECT id, name, created_at FROM tags WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    /// List all tags ordered by name
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<Postgres, Tag>(
            "SELECT id, name, created_at FROM tags ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "count"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Apply changes to a tag
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, changes: TagChanges) -> Result<Tag, AppError> {
        changes.validate()?;

        let tag = sqlx::query_as::<Postgres, Tag>(
            r#"
            UPDATE tags
            SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_db_err(ENTITY, DbOperation::Update)?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", ENTITY)))?;

        Ok(tag)
    }

    /// Delete a tag. Its video associations go with it; the videos stay.
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_db_err(ENTITY, DbOperation::Delete)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} not found", ENTITY)));
        }

        tracing::info!(tag_id = %id, "Tag deleted");
        Ok(())
    }
}
