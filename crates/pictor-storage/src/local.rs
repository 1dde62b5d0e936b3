use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::traits::{guess_content_type, BufferStore, ObjectOutput, StoreError, StoreResult};

/// Local filesystem buffer store rooted at a directory.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the root directory.
    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StoreError::InvalidKey(format!(
                "key must be a relative path without traversal: {:?}",
                key
            )));
        }
        Ok(self.root.join(key))
    }

    fn headers_for(path: &Path, len: u64) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Ok(meta) = path.metadata() {
            if let Ok(mtime) = meta.modified() {
                let secs = mtime
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                headers.insert("ETag".to_string(), format!("\"{:x}-{:x}\"", len, secs));
                let when: DateTime<Utc> = mtime.into();
                headers.insert(
                    "Last-Modified".to_string(),
                    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
                );
            }
        }
        headers.insert("Cache-Control".to_string(), "max-age=31536000".to_string());
        headers
    }
}

#[async_trait]
impl BufferStore for LocalStore {
    async fn get(&self, key: &str) -> StoreResult<ObjectOutput> {
        let path = self.key_to_path(key)?;
        let bytes = match fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        tracing::debug!(key = %key, size = bytes.len(), "local store read");
        let headers = Self::headers_for(&path, bytes.len() as u64);
        Ok(ObjectOutput {
            bytes,
            content_type: guess_content_type(key).map(String::from),
            headers,
        })
    }

    async fn url(&self, key: &str) -> StoreResult<String> {
        let path = self.key_to_path(key)?;
        let absolute = fs::canonicalize(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(absolute.to_string_lossy().into_owned())
    }
}
