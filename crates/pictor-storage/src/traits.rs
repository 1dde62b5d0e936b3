//! Storage abstraction traits
//!
//! The pipeline reads sources through `BufferStore` and resolves styles
//! through `KvStore`. Backends are interchangeable behind these traits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use pictor_core::StyleRecord;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A fetched object: raw bytes plus the response metadata a caller may want
/// to surface (ETag, Last-Modified, Cache-Control).
#[derive(Debug, Clone)]
pub struct ObjectOutput {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Read access to stored source objects.
#[async_trait]
pub trait BufferStore: Send + Sync {
    /// Fetch the object's bytes and headers.
    async fn get(&self, key: &str) -> StoreResult<ObjectOutput>;

    /// A URL under which an external process (ffmpeg) can read the object.
    /// Presigned for remote backends, an absolute path for local ones.
    async fn url(&self, key: &str) -> StoreResult<String>;
}

/// Style lookups by name.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<StyleRecord>>;
}

/// Content type from the key's file extension; used when the backend does not
/// record one.
pub fn guess_content_type(key: &str) -> Option<&'static str> {
    let ext = key.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "json" => Some("application/json"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a/b/example.JPG"), Some("image/jpeg"));
        assert_eq!(guess_content_type("example.gif"), Some("image/gif"));
        assert_eq!(guess_content_type("noext"), None);
        assert_eq!(guess_content_type("archive.zip"), None);
    }
}
