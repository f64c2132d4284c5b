use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;
use validator::Validate;

use super::video_media::VideoMedia;
use crate::error::AppError;
use crate::validation::slugify;

pub const NO_MEDIA_MESSAGE: &str = "O vídeo não possui mídia associada.";
pub const NOT_PROCESSED_MESSAGE: &str = "O vídeo não foi processado.";
pub const PENDING_STATUS_LABEL: &str = "Pendente";

/// Publication state derived from `is_published`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Unpublished,
    Published,
}

/// Catalogue entry. Aggregate root for its media and tag associations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub num_likes: i64,
    pub num_views: i64,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Video {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.title)
    }
}

impl Video {
    pub fn publish_state(&self) -> PublishState {
        if self.is_published {
            PublishState::Published
        } else {
            PublishState::Unpublished
        }
    }

    /// Check the publishing rule against the video's media, if any.
    ///
    /// Media belonging to another video is treated as absent.
    pub fn clean(&self, media: Option<&VideoMedia>) -> Result<(), AppError> {
        let media = media.filter(|m| m.video_id == self.id);
        check_publishable(self.is_published, media)
    }

    /// Record the first publication time. An existing timestamp is never
    /// replaced or cleared, including when the video is unpublished.
    pub fn stamp_publication(&mut self, now: DateTime<Utc>) {
        if self.is_published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
    }

    /// Apply caller-supplied changes to the in-memory row.
    pub fn apply_changes(&mut self, changes: VideoChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(slug) = changes.slug {
            self.slug = slug;
        }
        if let Some(is_published) = changes.is_published {
            self.is_published = is_published;
        }
    }
}

/// Status label shown for a video: the media status label, or "Pendente"
/// when the video has no media yet.
pub fn video_status_display(media: Option<&VideoMedia>) -> &'static str {
    media.map_or(PENDING_STATUS_LABEL, |m| m.status.label())
}

fn check_publishable(is_published: bool, media: Option<&VideoMedia>) -> Result<(), AppError> {
    if !is_published {
        return Ok(());
    }

    match media {
        None => Err(AppError::Validation(NO_MEDIA_MESSAGE.to_string())),
        Some(media) if !media.status.unlocks_publication() => {
            Err(AppError::Validation(NOT_PROCESSED_MESSAGE.to_string()))
        }
        Some(_) => Ok(()),
    }
}

/// Input for creating a video
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVideo {
    #[validate(
        length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
        custom(function = "crate::validation::validate_text")
    )]
    pub title: String,
    #[validate(custom(function = "crate::validation::validate_text"))]
    pub description: String,
    #[validate(
        length(min = 1, max = 50, message = "Slug must be between 1 and 50 characters"),
        custom(function = "crate::validation::validate_slug")
    )]
    pub slug: String,
    #[serde(default)]
    pub is_published: bool,
    pub author_id: Uuid,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl NewVideo {
    /// Unpublished video whose slug is derived from the title.
    pub fn new(title: impl Into<String>, description: impl Into<String>, author_id: Uuid) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            description: description.into(),
            is_published: false,
            author_id,
            tag_ids: Vec::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<Uuid>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = is_published;
        self
    }

    /// A video being created has no media yet, so it cannot start published.
    pub fn clean(&self) -> Result<(), AppError> {
        check_publishable(self.is_published, None)
    }
}

/// Input for changing a video. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VideoChanges {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
        custom(function = "crate::validation::validate_text")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "crate::validation::validate_text"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "Slug must be between 1 and 50 characters"),
        custom(function = "crate::validation::validate_slug")
    )]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

impl VideoChanges {
    pub fn publish() -> Self {
        Self {
            is_published: Some(true),
            ..Default::default()
        }
    }

    pub fn unpublish() -> Self {
        Self {
            is_published: Some(false),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.slug.is_none()
            && self.is_published.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaStatus;
    use chrono::Duration;

    fn sample_video() -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            title: "Aprendizado de Máquina".to_string(),
            description: "Introdução ao aprendizado de máquina.".to_string(),
            thumbnail: None,
            slug: "aprendizado-de-maquina".to_string(),
            published_at: None,
            is_published: false,
            num_likes: 0,
            num_views: 0,
            author_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    fn media_for(video: &Video, status: MediaStatus) -> VideoMedia {
        let now = Utc::now();
        VideoMedia {
            id: Uuid::new_v4(),
            video_path: "videos/datascience.mp4".to_string(),
            status,
            video_id: video.id,
            created_at: now,
            updated_at: now,
        }
    }

    fn validation_message(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unpublished_video_is_always_clean() {
        let video = sample_video();
        assert!(video.clean(None).is_ok());
        assert_eq!(video.publish_state(), PublishState::Unpublished);
    }

    #[test]
    fn test_publishing_without_media_fails() {
        let mut video = sample_video();
        video.is_published = true;
        assert_eq!(validation_message(video.clean(None)), NO_MEDIA_MESSAGE);
    }

    #[test]
    fn test_publishing_requires_finished_processing() {
        let mut video = sample_video();
        video.is_published = true;

        for status in [
            MediaStatus::UploadedStarted,
            MediaStatus::ProcessingStarted,
            MediaStatus::ProcessingError,
        ] {
            let media = media_for(&video, status);
            assert_eq!(
                validation_message(video.clean(Some(&media))),
                NOT_PROCESSED_MESSAGE
            );
        }

        let media = media_for(&video, MediaStatus::ProcessingFinished);
        assert!(video.clean(Some(&media)).is_ok());
        assert_eq!(video.publish_state(), PublishState::Published);
    }

    #[test]
    fn test_media_of_another_video_does_not_count() {
        let mut video = sample_video();
        video.is_published = true;
        let other = sample_video();
        let media = media_for(&other, MediaStatus::ProcessingFinished);
        assert_eq!(validation_message(video.clean(Some(&media))), NO_MEDIA_MESSAGE);
    }

    #[test]
    fn test_publication_timestamp_is_sticky() {
        let mut video = sample_video();
        let first = Utc::now();

        video.stamp_publication(first);
        assert!(video.published_at.is_none());

        video.is_published = true;
        video.stamp_publication(first);
        assert_eq!(video.published_at, Some(first));

        video.stamp_publication(first + Duration::hours(1));
        assert_eq!(video.published_at, Some(first));

        video.apply_changes(VideoChanges::unpublish());
        video.stamp_publication(first + Duration::hours(2));
        assert_eq!(video.published_at, Some(first));

        video.apply_changes(VideoChanges::publish());
        video.stamp_publication(first + Duration::hours(3));
        assert_eq!(video.published_at, Some(first));
    }

    #[test]
    fn test_status_display() {
        let video = sample_video();
        assert_eq!(video_status_display(None), "Pendente");
        let media = media_for(&video, MediaStatus::ProcessingStarted);
        assert_eq!(video_status_display(Some(&media)), "Processamento Iniciado");
    }

    #[test]
    fn test_new_video_derives_slug_and_validates() {
        let new = NewVideo::new(
            "Aprendizado de Máquina",
            "Introdução ao aprendizado de máquina.",
            Uuid::new_v4(),
        );
        assert_eq!(new.slug, "aprendizado-de-maquina");
        assert!(new.validate().is_ok());
        assert!(new.clean().is_ok());
        assert_eq!(
            validation_message(new.published(true).clean()),
            NO_MEDIA_MESSAGE
        );
    }

    #[test]
    fn test_new_video_rejects_bad_fields() {
        let author = Uuid::new_v4();

        let errors = NewVideo::new("Tutorial de LOL'; SHUTDOWN; --", "ok", author)
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let errors = NewVideo::new("Deep Learning", "<script>", author)
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("description"));

        let errors = NewVideo::new("Deep Learning", "ok", author)
            .with_slug("deep learning")
            .validate()
            .unwrap_err();
        assert_eq!(errors.field_errors()["slug"][0].code, "invalid_slug");

        let errors = NewVideo::new("a".repeat(101), "ok", author)
            .with_slug("long")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_apply_changes_only_touches_supplied_fields() {
        let mut video = sample_video();
        let original = video.clone();

        video.apply_changes(VideoChanges::default());
        assert_eq!(video, original);

        video.apply_changes(VideoChanges {
            title: Some("Machine Learning Avançado".to_string()),
            ..Default::default()
        });
        assert_eq!(video.title, "Machine Learning Avançado");
        assert_eq!(video.slug, original.slug);
        assert_eq!(video.description, original.description);
    }
}
