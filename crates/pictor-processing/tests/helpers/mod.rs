//! Shared setup for pipeline integration tests: a fully wired processor
//! registry over in-memory stores.

pub mod fixtures;

use std::sync::Arc;

use pictor_core::{Config, StorageBackend, StyleRecord};
use pictor_processing::{build_registry, ProcessorRegistry};
use pictor_storage::{BufferStore, MemBufferStore, MemKvStore};

pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Local,
        local_store_root: ".".to_string(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        style_file: None,
        style_table: None,
        auto_webp: false,
        max_gif_size_mb: 5,
        max_gif_pages: 100,
        ffmpeg_path: "ffmpeg".to_string(),
        watermark_font_path: None,
    }
}

/// Registry wired like production, minus remote backends.
pub fn registry(styles: Vec<StyleRecord>) -> Arc<ProcessorRegistry> {
    let kv = Arc::new(MemKvStore::from_records(styles));
    build_registry(&test_config(), kv).expect("registry builds")
}

pub fn as_store(mem: &Arc<MemBufferStore>) -> Arc<dyn BufferStore> {
    mem.clone()
}

pub fn chain(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
