use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, ObjectStoreExt};

use crate::traits::{guess_content_type, BufferStore, ObjectOutput, StoreError, StoreResult};

const PRESIGN_EXPIRES: Duration = Duration::from_secs(1200);

/// S3 buffer store (works against AWS and S3-compatible endpoints).
#[derive(Clone)]
pub struct S3Store {
    store: AmazonS3,
}

impl S3Store {
    /// `endpoint_url` selects an S3-compatible provider (MinIO etc.); plain
    /// http endpoints are allowed for those.
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket);

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(S3Store { store })
    }
}

fn map_store_err(key: &str, err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::NotFound(key.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl BufferStore for S3Store {
    async fn get(&self, key: &str) -> StoreResult<ObjectOutput> {
        let location = ObjectPath::from(key);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| map_store_err(key, e))?;

        let mut headers = BTreeMap::new();
        if let Some(etag) = result.meta.e_tag.clone() {
            headers.insert("ETag".to_string(), etag);
        }
        headers.insert(
            "Last-Modified".to_string(),
            result
                .meta
                .last_modified
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        );
        if let Some(cache) = result.attributes.get(&Attribute::CacheControl) {
            headers.insert("Cache-Control".to_string(), cache.to_string());
        }
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string())
            .or_else(|| guess_content_type(key).map(String::from));

        let bytes = result.bytes().await.map_err(|e| map_store_err(key, e))?;
        tracing::debug!(key = %key, size = bytes.len(), "s3 store read");

        Ok(ObjectOutput {
            bytes,
            content_type,
            headers,
        })
    }

    async fn url(&self, key: &str) -> StoreResult<String> {
        let location = ObjectPath::from(key);
        let url = self
            .store
            .signed_url(Method::GET, &location, PRESIGN_EXPIRES)
            .await
            .map_err(|e| map_store_err(key, e))?;
        Ok(url.to_string())
    }
}
