use crate::{LocalStorage, Storage, StorageResult};
use std::sync::Arc;
use videoteca_core::Config;

/// Create the file storage backend described by `config.media`
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(&config.media.root, config.media.base_url.clone()).await?;

    tracing::info!(
        root = %config.media.root,
        base_url = %config.media.base_url,
        "Local media storage initialized"
    );

    Ok(Arc::new(storage))
}
