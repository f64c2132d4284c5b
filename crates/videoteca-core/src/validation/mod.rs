//! Validation modules

pub mod fields;

pub use fields::{slugify, validate_file_path, validate_slug, validate_text};
