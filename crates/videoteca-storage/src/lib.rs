//! Videoteca Storage Library
//!
//! File storage for uploaded thumbnails. The [`Storage`] trait is the seam the
//! repositories depend on; [`LocalStorage`] keeps files under `MEDIA_ROOT`.
//!
//! # Storage key format
//!
//! Keys are `{prefix}/{filename}`, e.g. `thumbnails/3f2a….jpg`. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the `keys` module.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod thumbnails;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use thumbnails::{store_thumbnail, THUMBNAIL_PREFIX};
pub use traits::{Storage, StorageError, StorageResult};
