//! Video repository
//!
//! Every create and update runs the publishing rule inside its transaction:
//! the row is locked, the media is read, `Video::clean` decides, and the
//! first publication time is stamped before the row is written back.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use videoteca_core::models::{video_status_display, NewVideo, Tag, Video, VideoChanges};
use videoteca_core::AppError;
use videoteca_storage::{store_thumbnail, Storage};

use super::errors::{DbOperation, ResultExt};
use super::video_media::find_by_video_with;

const ENTITY: &str = "Video";

const VIDEO_COLUMNS: &str = "id, title, description, thumbnail, slug, published_at, is_published, \
                             num_likes, num_views, author_id, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound(format!("{} not found", ENTITY))
}

/// Repository for videos and their tag associations
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
    storage: Arc<dyn Storage>,
}

impl VideoRepository {
    pub fn new(pool: PgPool, storage: Arc<dyn Storage>) -> Self {
        Self { pool, storage }
    }

    /// Create a video and its tag associations
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "insert"))]
    pub async fn create(&self, new_video: NewVideo) -> Result<Video, AppError> {
        new_video.validate()?;
        new_video.clean()?;

        let mut tx = self.pool.begin().await?;

        let video = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            INSERT INTO videos (title, description, slug, is_published, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(&new_video.slug)
        .bind(new_video.is_published)
        .bind(new_video.author_id)
        .fetch_one(&mut *tx)
        .await
        .map_db_err(ENTITY, DbOperation::Insert)?;

        Self::insert_tags_tx(&mut tx, video.id, &new_video.tag_ids).await?;

        tx.commit().await?;

        tracing::info!(video_id = %video.id, slug = %video.slug, "Video created");
        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {} FROM videos WHERE slug = $1",
            VIDEO_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn get_by_title(&self, title: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {} FROM videos WHERE title = $1",
            VIDEO_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// List all videos, newest first
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, title ASC",
            VIDEO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "count"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Apply changes and save, enforcing the publishing rule.
    ///
    /// Saving with empty changes still re-checks the rule, so an already
    /// published video whose media left `PROCESSING_FINISHED` can no longer
    /// be saved as published.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, changes: VideoChanges) -> Result<Video, AppError> {
        changes.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {} FROM videos WHERE id = $1 FOR UPDATE",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(not_found)?;

        let was_published = video.is_published;
        video.apply_changes(changes);

        let media = find_by_video_with(&mut *tx, id).await?;
        video.clean(media.as_ref())?;
        video.stamp_publication(Utc::now());

        let saved = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            UPDATE videos
            SET title = $2,
                description = $3,
                slug = $4,
                is_published = $5,
                published_at = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.slug)
        .bind(video.is_published)
        .bind(video.published_at)
        .fetch_one(&mut *tx)
        .await
        .map_db_err(ENTITY, DbOperation::Update)?;

        tx.commit().await?;

        if saved.is_published != was_published {
            tracing::info!(
                video_id = %id,
                state = ?saved.publish_state(),
                published_at = ?saved.published_at,
                "Video publication state changed"
            );
        }

        Ok(saved)
    }

    /// Delete a video. Fails with `Protected` while media is attached.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_db_err(ENTITY, DbOperation::Delete)?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        tracing::info!(video_id = %id, "Video deleted");
        Ok(())
    }

    /// Tags of a video ordered by name
    #[tracing::instrument(skip(self), fields(db.table = "video_tags", db.operation = "select", db.record_id = %id))]
    pub async fn tags(&self, id: Uuid) -> Result<Vec<Tag>, AppError> {
        self.ensure_exists(id).await?;

        let tags = sqlx::query_as::<Postgres, Tag>(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tags t
            INNER JOIN video_tags vt ON vt.tag_id = t.id
            WHERE vt.video_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Replace the tag set of a video
    #[tracing::instrument(skip(self, tag_ids), fields(db.table = "video_tags", db.operation = "update", db.record_id = %id, count = tag_ids.len()))]
    pub async fn set_tags(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<Vec<Tag>, AppError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM videos WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(not_found());
        }

        sqlx::query("DELETE FROM video_tags WHERE video_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::insert_tags_tx(&mut tx, id, tag_ids).await?;

        tx.commit().await?;

        self.tags(id).await
    }

    async fn insert_tags_tx(
        tx: &mut Transaction<'_, Postgres>,
        video_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO video_tags (video_id, tag_id)
            SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS t(tag_id)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(video_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await
        .map_db_err("Video tag", DbOperation::Insert)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn increment_views(&self, id: Uuid) -> Result<Video, AppError> {
        self.increment_counter(id, "num_views").await
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn increment_likes(&self, id: Uuid) -> Result<Video, AppError> {
        self.increment_counter(id, "num_likes").await
    }

    // `column` is always one of the two counter names above.
    async fn increment_counter(&self, id: Uuid, column: &'static str) -> Result<Video, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "UPDATE videos SET {column} = {column} + 1 WHERE id = $1 RETURNING {}",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(not_found)?;

        Ok(video)
    }

    /// Status label of the video's media, or "Pendente" without media
    #[tracing::instrument(skip(self), fields(db.table = "video_media", db.operation = "select", db.record_id = %id))]
    pub async fn status_display(&self, id: Uuid) -> Result<&'static str, AppError> {
        self.ensure_exists(id).await?;
        let media = find_by_video_with(&self.pool, id).await?;
        Ok(video_status_display(media.as_ref()))
    }

    /// Store a thumbnail under a generated name and point the video at it
    #[tracing::instrument(skip(self, data), fields(db.table = "videos", db.operation = "update", db.record_id = %id, size_bytes = data.len()))]
    pub async fn upload_thumbnail(
        &self,
        id: Uuid,
        original_filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<Video, AppError> {
        self.ensure_exists(id).await?;

        let (key, url) =
            store_thumbnail(self.storage.as_ref(), original_filename, content_type, data).await?;

        let updated = sqlx::query_as::<Postgres, Video>(&format!(
            "UPDATE videos SET thumbnail = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .bind(&key)
        .fetch_optional(&self.pool)
        .await;

        match updated {
            Ok(Some(video)) => {
                tracing::info!(video_id = %id, key = %key, url = %url, "Thumbnail stored");
                Ok(video)
            }
            other => {
                if let Err(e) = self.storage.delete(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to remove orphaned thumbnail");
                }
                match other {
                    Ok(_) => Err(not_found()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Public URL of the video's thumbnail, if it has one
    pub fn thumbnail_url(&self, video: &Video) -> Option<String> {
        video.thumbnail.as_deref().map(|key| self.storage.url(key))
    }

    async fn ensure_exists(&self, id: Uuid) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}
