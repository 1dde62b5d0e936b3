//! Processor dispatch and composition.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use pictor_core::{AppError, AppResult, Config};
use pictor_storage::{BufferStore, KvStore};

use crate::action::ActionRegistry;
use crate::image::{actions, ImageProcessor};
use crate::style::StyleProcessor;
use crate::video::VideoProcessor;

/// The payload of a finished request.
#[derive(Debug)]
pub enum ProcessData {
    Image(Bytes),
    Json(serde_json::Value),
}

/// What a processor hands back: payload, content type and the response
/// headers accumulated along the way.
#[derive(Debug)]
pub struct ProcessResponse {
    pub data: ProcessData,
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
}

/// One processor per chain namespace (image, video, style).
#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the full request: build a context for `uri` and the chain, then
    /// execute it.
    async fn execute(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ProcessResponse>;
}

/// Namespace to processor mapping; first registration per name wins.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, processor: Arc<dyn Processor>) {
        self.processors
            .entry(processor.name().to_string())
            .or_insert(processor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(name).cloned()
    }

    /// Resolve the processor for a parsed chain and run it.
    pub async fn dispatch(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ProcessResponse> {
        let namespace = actions
            .first()
            .ok_or_else(|| AppError::invalid_argument("empty action chain"))?;
        let processor = self
            .get(namespace)
            .ok_or_else(|| AppError::invalid_argument("can not find processor"))?;
        processor.execute(uri, actions, store).await
    }
}

/// Wire the image, video and style processors into one dispatch registry.
///
/// The style processor resolves named chains through `kv` and re-dispatches
/// them over an inner registry that excludes itself, so a style can never
/// point at another style.
pub fn build_registry(config: &Config, kv: Arc<dyn KvStore>) -> AppResult<Arc<ProcessorRegistry>> {
    let font = match &config.watermark_font_path {
        Some(path) => {
            let data = std::fs::read(path).map_err(|e| {
                AppError::Internal(format!("failed to read watermark font {path}: {e}"))
            })?;
            let font = ab_glyph::FontVec::try_from_vec(data).map_err(|e| {
                AppError::Internal(format!("invalid watermark font {path}: {e}"))
            })?;
            Some(Arc::new(font))
        }
        None => None,
    };

    let mut registry = ActionRegistry::new();
    for action in actions::default_actions(font) {
        registry.register(action);
    }

    let image = Arc::new(ImageProcessor::new(registry));
    image.set_auto_webp(config.auto_webp);
    image.set_max_gif_size_mb(config.max_gif_size_mb);
    image.set_max_gif_pages(config.max_gif_pages);
    let video = Arc::new(VideoProcessor::new(config.ffmpeg_path.clone()));

    let mut inner = ProcessorRegistry::new();
    inner.register(image.clone());
    inner.register(video.clone());
    let style = Arc::new(StyleProcessor::new(kv, Arc::new(inner)));

    let mut processors = ProcessorRegistry::new();
    processors.register(image);
    processors.register(video);
    processors.register(style);
    Ok(Arc::new(processors))
}
