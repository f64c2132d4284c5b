use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;
use validator::Validate;

/// Free-form label attached to videos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

/// Input for creating a tag
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTag {
    #[validate(
        length(min = 1, max = 50, message = "Tag name must be between 1 and 50 characters"),
        custom(function = "crate::validation::validate_text")
    )]
    pub name: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Input for changing a tag. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TagChanges {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "Tag name must be between 1 and 50 characters"),
        custom(function = "crate::validation::validate_text")
    )]
    pub name: Option<String>,
}

impl TagChanges {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}
