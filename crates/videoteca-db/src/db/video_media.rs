use sqlx::{PgExecutor, PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;
use videoteca_core::models::{MediaStatus, NewVideoMedia, VideoMedia, VideoMediaChanges};
use videoteca_core::AppError;

use super::errors::{DbOperation, ResultExt};

const ENTITY: &str = "VideoMedia";

/// Media of a video, looked up with any executor so the video repository can
/// read it inside its own transaction.
pub(crate) async fn find_by_video_with<'e, E>(
    executor: E,
    video_id: Uuid,
) -> Result<Option<VideoMedia>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<Postgres, VideoMedia>(
        r#"
        SELECT id, video_path, status, video_id, created_at, updated_at
        FROM video_media
        WHERE video_id = $1
        "#,
    )
    .bind(video_id)
    .fetch_optional(executor)
    .await
}

/// Repository for video media
#[derive(Clone)]
pub struct VideoMediaRepository {
    pool: PgPool,
}

impl VideoMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach media to a video. A video has at most one media row.
    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "insert"))]
    pub async fn create(&self, new_media: NewVideoMedia) -> Result<VideoMedia, AppError> {
        new_media.validate()?;

        let media = sqlx::query_as::<Postgres, VideoMedia>(
            r#"
            INSERT INTO video_media (video_path, status, video_id)
            VALUES ($1, $2, $3)
            RETURNING id, video_path, status, video_id, created_at, updated_at
            "#,
        )
        .bind(&new_media.video_path)
        .bind(new_media.status)
        .bind(new_media.video_id)
        .fetch_one(&self.pool)
        .await
        .map_db_err(ENTITY, DbOperation::Insert)?;

        tracing::info!(
            media_id = %media.id,
            video_id = %media.video_id,
            status = %media.status,
            "Video media created"
        );
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<VideoMedia>, AppError> {
        let media = sqlx::query_as::<Postgres, VideoMedia>(
            r#"
            SELECT id, video_path, status, video_id, created_at, updated_at
            FROM video_media
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    /// Media attached to a video, if any
    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "select"))]
    pub async fn find_by_video(&self, video_id: Uuid) -> Result<Option<VideoMedia>, AppError> {
        Ok(find_by_video_with(&self.pool, video_id).await?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<VideoMedia>, AppError> {
        let media = sqlx::query_as::<Postgres, VideoMedia>(
            r#"
            SELECT id, video_path, status, video_id, created_at, updated_at
            FROM video_media
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "count"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_media")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Apply changes to media
    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        changes: VideoMediaChanges,
    ) -> Result<VideoMedia, AppError> {
        changes.validate()?;

        let media = sqlx::query_as::<Postgres, VideoMedia>(
            r#"
            UPDATE video_media
            SET video_path = COALESCE($2, video_path),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, video_path, status, video_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.video_path.as_deref())
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await
        .map_db_err(ENTITY, DbOperation::Update)?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", ENTITY)))?;

        Ok(media)
    }

    /// Move media to `status`. Any transition is allowed.
    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "update", db.record_id = %id))]
    pub async fn set_status(&self, id: Uuid, status: MediaStatus) -> Result<VideoMedia, AppError> {
        let media = self
            .update(
                id,
                VideoMediaChanges {
                    video_path: None,
                    status: Some(status),
                },
            )
            .await?;

        tracing::info!(media_id = %id, status = %status, "Video media status changed");
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM video_media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_db_err(ENTITY, DbOperation::Delete)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} not found", ENTITY)));
        }

        Ok(())
    }
}
