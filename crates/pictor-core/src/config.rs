//! Configuration module
//!
//! Environment-driven configuration for the stores and the processing
//! pipeline. Every field has a default so a bare `pictor` invocation works
//! against a local directory with no environment set up.

use std::env;

/// Which buffer-store backend to construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// Root directory for the local buffer store.
    pub local_store_root: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO etc.)
    pub s3_endpoint: Option<String>,
    /// JSON document seeding the in-memory style store.
    pub style_file: Option<String>,
    /// DynamoDB table holding style records.
    pub style_table: Option<String>,
    /// Serve webp to clients by default when no explicit format is requested.
    pub auto_webp: bool,
    pub max_gif_size_mb: u32,
    pub max_gif_pages: u32,
    pub ffmpeg_path: String,
    /// TTF used to rasterize text watermarks.
    pub watermark_font_path: Option<String>,
}

const MAX_GIF_SIZE_MB: u32 = 5;
const MAX_GIF_PAGES: u32 = 100;

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 'local' or 's3', got '{}'",
                    other
                ))
            }
        };

        Ok(Config {
            storage_backend,
            local_store_root: env::var("LOCAL_STORE_ROOT").unwrap_or_else(|_| ".".to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            style_file: env::var("STYLE_FILE").ok(),
            style_table: env::var("STYLE_TABLE").ok(),
            auto_webp: env::var("AUTO_WEBP")
                .map(|v| matches!(v.to_lowercase().as_str(), "yes" | "1" | "true"))
                .unwrap_or(false),
            max_gif_size_mb: env::var("MAX_GIF_SIZE_MB")
                .unwrap_or_else(|_| MAX_GIF_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_GIF_SIZE_MB),
            max_gif_pages: env::var("MAX_GIF_PAGES")
                .unwrap_or_else(|_| MAX_GIF_PAGES.to_string())
                .parse()
                .unwrap_or(MAX_GIF_PAGES),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            watermark_font_path: env::var("WATERMARK_FONT_PATH").ok(),
        })
    }
}
