//! Videoteca Core Library
//!
//! This crate provides the domain models, field validators, publishing rules,
//! error types and configuration shared by all Videoteca components.

pub mod config;
pub mod error;
pub mod filename;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{missing_required_env, Config, REQUIRED_ENV_VARS};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use filename::{random_filename, random_filename_at};
pub use models::{MediaStatus, PublishState, Tag, User, Video, VideoMedia};
