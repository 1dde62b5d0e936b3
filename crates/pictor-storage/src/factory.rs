use std::sync::Arc;

use pictor_core::{Config, StorageBackend};

use crate::mem::MemKvStore;
use crate::traits::{BufferStore, KvStore, StoreError, StoreResult};

/// Create the buffer store selected by configuration.
pub async fn create_buffer_store(config: &Config) -> StoreResult<Arc<dyn BufferStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = crate::local::LocalStore::new(config.local_store_root.clone());
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StoreError::Config(
            "local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StoreError::Config("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StoreError::Config("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let store = crate::s3::S3Store::new(bucket, region, config.s3_endpoint.clone())?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StoreError::Config(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),
    }
}

/// Create the style store: DynamoDB when a table is configured (and the
/// feature is compiled in), otherwise an in-memory store seeded from
/// STYLE_FILE when present.
pub async fn create_kv_store(config: &Config) -> StoreResult<Arc<dyn KvStore>> {
    if let Some(table) = config.style_table.clone() {
        #[cfg(feature = "kv-dynamodb")]
        {
            return Ok(Arc::new(crate::dynamodb::DynamoKvStore::new(table).await));
        }
        #[cfg(not(feature = "kv-dynamodb"))]
        {
            let _ = table;
            return Err(StoreError::Config(
                "STYLE_TABLE set but the kv-dynamodb feature is not enabled".to_string(),
            ));
        }
    }

    match config.style_file.as_deref() {
        Some(path) => Ok(Arc::new(MemKvStore::from_json_file(path).await?)),
        None => Ok(Arc::new(MemKvStore::new())),
    }
}
