//! Storage filenames for uploaded thumbnails.
//!
//! The generated name is the MD5 digest of the original filename followed by
//! the upload time, so two uploads of the same file never share a name. The
//! original extension is kept.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

/// Generate a storage filename for `original` using the current time.
pub fn random_filename(original: &str) -> String {
    random_filename_at(original, Utc::now())
}

/// Generate a storage filename for `original` as if uploaded at `at`.
///
/// Everything after the last `.` is treated as the extension. A name without
/// a dot keeps the whole name as its extension.
pub fn random_filename_at(original: &str, at: DateTime<Utc>) -> String {
    let ext = original.rsplit('.').next().unwrap_or(original);

    let seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1e9;
    let mut hasher = Md5::new();
    hasher.update(format!("{}{}", original, seconds).as_bytes());
    hasher.update(at.timestamp_subsec_nanos().to_be_bytes());

    format!("{}.{}", hex::encode(hasher.finalize()), ext)
}
