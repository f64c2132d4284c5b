//! Shared key generation for storage backends.

/// Generate a storage key for `filename` under `prefix`.
///
/// An empty prefix yields the bare filename.
pub fn generate_storage_key(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}
