//! In-memory stores for development seeding and tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use pictor_core::StyleRecord;

use crate::traits::{BufferStore, KvStore, ObjectOutput, StoreError, StoreResult};

/// Buffer store backed by a map of key to (bytes, content type).
#[derive(Default)]
pub struct MemBufferStore {
    objects: RwLock<HashMap<String, (Bytes, Option<String>)>>,
}

impl MemBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: Bytes, content_type: Option<&str>) {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert(key.into(), (bytes, content_type.map(String::from)));
    }
}

#[async_trait]
impl BufferStore for MemBufferStore {
    async fn get(&self, key: &str) -> StoreResult<ObjectOutput> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        match objects.get(key) {
            Some((bytes, content_type)) => Ok(ObjectOutput {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
                headers: BTreeMap::new(),
            }),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn url(&self, _key: &str) -> StoreResult<String> {
        Err(StoreError::Backend(
            "in-memory objects have no URL".to_string(),
        ))
    }
}

/// Style store backed by a map, optionally seeded from a JSON document of
/// `[{"id": "...", "style": "..."}]` records.
#[derive(Debug, Default)]
pub struct MemKvStore {
    entries: RwLock<HashMap<String, StyleRecord>>,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = StyleRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect::<HashMap<_, _>>();
        MemKvStore {
            entries: RwLock::new(entries),
        }
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        let records: Vec<StyleRecord> = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Config(format!("malformed style file: {}", e)))?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&self, record: StyleRecord) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl KvStore for MemKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StyleRecord>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }
}
