use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Processing state of an uploaded video file.
///
/// Any status may be set at any time; only `ProcessingFinished` allows the
/// owning video to be published.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "video_media_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    #[default]
    UploadedStarted,
    ProcessingStarted,
    ProcessingFinished,
    ProcessingError,
}

impl MediaStatus {
    pub const ALL: [MediaStatus; 4] = [
        MediaStatus::UploadedStarted,
        MediaStatus::ProcessingStarted,
        MediaStatus::ProcessingFinished,
        MediaStatus::ProcessingError,
    ];

    /// Stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::UploadedStarted => "UPLOADED_STARTED",
            MediaStatus::ProcessingStarted => "PROCESSING_STARTED",
            MediaStatus::ProcessingFinished => "PROCESSING_FINISHED",
            MediaStatus::ProcessingError => "PROCESSING_ERROR",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MediaStatus::UploadedStarted => "Upload Iniciado",
            MediaStatus::ProcessingStarted => "Processamento Iniciado",
            MediaStatus::ProcessingFinished => "Processamento Finalizado",
            MediaStatus::ProcessingError => "Erro no Processamento",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MediaStatus::ProcessingFinished | MediaStatus::ProcessingError
        )
    }

    pub fn unlocks_publication(&self) -> bool {
        *self == MediaStatus::ProcessingFinished
    }
}

impl Display for MediaStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Unknown media status: {}", s)))
    }
}

/// Uploaded file and processing state of a video (one per video)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoMedia {
    pub id: Uuid,
    pub video_path: String,
    pub status: MediaStatus,
    pub video_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoMedia {
    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

/// Input for attaching media to a video
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVideoMedia {
    #[validate(
        length(min = 1, max = 255, message = "Video path must be between 1 and 255 characters"),
        custom(function = "crate::validation::validate_file_path")
    )]
    pub video_path: String,
    #[serde(default)]
    pub status: MediaStatus,
    pub video_id: Uuid,
}

impl NewVideoMedia {
    pub fn new(video_id: Uuid, video_path: impl Into<String>) -> Self {
        Self {
            video_path: video_path.into(),
            status: MediaStatus::default(),
            video_id,
        }
    }

    pub fn with_status(mut self, status: MediaStatus) -> Self {
        self.status = status;
        self
    }
}

/// Input for changing media. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VideoMediaChanges {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 255, message = "Video path must be between 1 and 255 characters"),
        custom(function = "crate::validation::validate_file_path")
    )]
    pub video_path: Option<String>,
    #[serde(default)]
    pub status: Option<MediaStatus>,
}

impl VideoMediaChanges {
    pub fn is_empty(&self) -> bool {
        self.video_path.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_upload_started() {
        assert_eq!(MediaStatus::default(), MediaStatus::UploadedStarted);
        let media = NewVideoMedia::new(Uuid::new_v4(), "videos/datascience.mp4");
        assert_eq!(media.status, MediaStatus::UploadedStarted);
    }

    #[test]
    fn test_status_labels() {
        let labels: Vec<_> = MediaStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Upload Iniciado",
                "Processamento Iniciado",
                "Processamento Finalizado",
                "Erro no Processamento",
            ]
        );
    }

    #[test]
    fn test_status_parses_stored_value() {
        for status in MediaStatus::ALL {
            assert_eq!(status.as_str().parse::<MediaStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(
            "processing_finished".parse::<MediaStatus>().unwrap(),
            MediaStatus::ProcessingFinished
        );
        assert!(matches!(
            "DONE".parse::<MediaStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_status_serializes_as_stored_value() {
        let json = serde_json::to_string(&MediaStatus::ProcessingError).unwrap();
        assert_eq!(json, "\"PROCESSING_ERROR\"");
    }

    #[test]
    fn test_only_finished_unlocks_publication() {
        for status in MediaStatus::ALL {
            assert_eq!(
                status.unlocks_publication(),
                status == MediaStatus::ProcessingFinished
            );
        }
        assert!(MediaStatus::ProcessingError.is_terminal());
        assert!(!MediaStatus::ProcessingStarted.is_terminal());
    }

    #[test]
    fn test_new_video_media_validation() {
        let video_id = Uuid::new_v4();
        assert!(NewVideoMedia::new(video_id, "videos/bigdata.mp4")
            .validate()
            .is_ok());

        let errors = NewVideoMedia::new(video_id, "videos/big data.mp4")
            .validate()
            .unwrap_err();
        assert_eq!(errors.field_errors()["video_path"][0].code, "invalid_path");

        let long_path = format!("videos/{}.mp4", "a".repeat(250));
        assert!(NewVideoMedia::new(video_id, long_path).validate().is_err());
    }

    #[test]
    fn test_changes_validation() {
        assert!(VideoMediaChanges::default().is_empty());
        let changes = VideoMediaChanges {
            video_path: Some("videos/../etc;passwd".to_string()),
            status: None,
        };
        assert!(changes.validate().is_err());
    }
}
