//! Thumbnail uploads
//!
//! Thumbnails are stored under [`THUMBNAIL_PREFIX`] with a generated name so
//! repeated uploads of the same file never collide. Only the final component
//! of the client-supplied name is used.

use crate::{Storage, StorageError, StorageResult};
use std::path::Path;
use videoteca_core::random_filename;

pub const THUMBNAIL_PREFIX: &str = "thumbnails";

/// Store a thumbnail and return (storage_key, storage_url)
pub async fn store_thumbnail(
    storage: &dyn Storage,
    original_filename: &str,
    content_type: &str,
    data: Vec<u8>,
) -> StorageResult<(String, String)> {
    let basename = Path::new(original_filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("Invalid thumbnail filename: {}", original_filename))
        })?;
    let filename = random_filename(basename);
    tracing::debug!(
        original = %original_filename,
        generated = %filename,
        "Generated thumbnail filename"
    );
    storage
        .upload(THUMBNAIL_PREFIX, &filename, content_type, data)
        .await
}
