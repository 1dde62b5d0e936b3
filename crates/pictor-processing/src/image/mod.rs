//! The image processor: a two-phase interpreter over slash-separated
//! action chains.
//!
//! Phase one (`new_context`) validates the chain, lets actions set request
//! features, fetches and decodes the source, then applies post-decode
//! suppression policy. Phase two (`process`) runs per-action suppression
//! hooks against the decoded metadata, short-circuits when nothing is left
//! to do, executes the surviving actions in order and encodes the result.

pub mod actions;
pub mod encode;
pub mod handle;
pub mod ops;
pub mod orientation;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::ImageFormat;
use pictor_core::{AppError, AppResult};
use pictor_storage::{BufferStore, ObjectOutput};

use crate::action::ActionRegistry;
use crate::chain::split_kv;
use crate::context::{Features, ImageContext, ProcessContext};
use crate::processor::{ProcessData, ProcessResponse, Processor};

pub use encode::{EncodeOptions, OutputFormat};
pub use handle::{ImageHandle, ImageMetadata};

/// Namespace token for this processor.
pub const NAME: &str = "image";

/// Chain-scoped directive: skip processing when the source is smaller than
/// the given byte count.
const THRESHOLD: &str = "threshold";

/// Chain-scoped directive: cap the number of animated frames to decode.
const CGIF: &str = "cgif";

/// Single-frame PNG sources above this size get the slower encode path.
const LARGE_PNG_BYTES: u64 = 2 * 1024 * 1024;

const DEFAULT_MAX_GIF_SIZE_MB: u32 = 5;
const DEFAULT_MAX_GIF_PAGES: u32 = 100;

/// Executes image action chains. Tunables are atomics so configuration can
/// be adjusted while requests are in flight.
pub struct ImageProcessor {
    actions: ActionRegistry,
    auto_webp: AtomicBool,
    max_gif_size_mb: AtomicU32,
    max_gif_pages: AtomicU32,
}

impl ImageProcessor {
    pub fn new(actions: ActionRegistry) -> Self {
        Self {
            actions,
            auto_webp: AtomicBool::new(false),
            max_gif_size_mb: AtomicU32::new(DEFAULT_MAX_GIF_SIZE_MB),
            max_gif_pages: AtomicU32::new(DEFAULT_MAX_GIF_PAGES),
        }
    }

    /// Convert single-frame output to WebP when no format action ran.
    pub fn set_auto_webp(&self, enabled: bool) {
        self.auto_webp.store(enabled, Ordering::Relaxed);
    }

    pub fn set_max_gif_size_mb(&self, value: u32) {
        self.max_gif_size_mb.store(value, Ordering::Relaxed);
    }

    pub fn set_max_gif_pages(&self, value: u32) {
        self.max_gif_pages.store(value, Ordering::Relaxed);
    }

    /// Phase one: validate the chain, run pre-fetch hooks, fetch and decode
    /// the source, apply post-decode suppression policy.
    pub async fn new_context(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ImageContext> {
        let mut ctx = ProcessContext {
            uri: uri.to_string(),
            actions: actions.to_vec(),
            mask: crate::mask::ActionMask::new(actions),
            store,
            features: Features {
                auto_webp: self.auto_webp.load(Ordering::Relaxed),
                ..Default::default()
            },
            headers: BTreeMap::new(),
        };

        let mut threshold: Option<u64> = None;

        for (index, entry) in actions.iter().enumerate() {
            if entry.is_empty() || entry.as_str() == NAME {
                continue;
            }
            let params: Vec<&str> = entry.split(',').collect();
            let name = params[0];
            match name {
                THRESHOLD => {
                    threshold = Some(parse_threshold(&params)?);
                    ctx.mask.disable(index)?;
                }
                CGIF => {
                    let limit = parse_cgif(&params)?;
                    ctx.features.read_all_animated_frames = false;
                    ctx.features.limit_animated_frames = limit;
                    ctx.mask.disable(index)?;
                }
                _ => {
                    let action = self.actions.get(name).ok_or_else(|| {
                        AppError::invalid_argument(format!("unknown action: \"{name}\""))
                    })?;
                    action.before_new_context(&mut ctx, &params, index)?;
                }
            }
        }

        let ObjectOutput { bytes, headers, .. } = ctx.store.get(&ctx.uri).await?;
        ctx.headers.extend(headers);

        let (image, metadata) = ImageHandle::decode(&bytes, &ctx.features)?;
        let mut ctx = ImageContext::from_parts(ctx, image, metadata);

        if ctx.metadata.pages > 1 {
            let max_size = self.max_gif_size_mb.load(Ordering::Relaxed) as u64 * 1024 * 1024;
            let max_pages = self.max_gif_pages.load(Ordering::Relaxed);
            if ctx.metadata.size > max_size || ctx.metadata.pages > max_pages {
                tracing::debug!(
                    size = ctx.metadata.size,
                    pages = ctx.metadata.pages,
                    "animated source over limits, passing through"
                );
                ctx.mask.disable_all();
            }
        } else if ctx.metadata.format == ImageFormat::Png && ctx.metadata.size > LARGE_PNG_BYTES {
            ctx.image.encode.slow_png = true;
        }

        if let Some(threshold) = threshold {
            if ctx.metadata.size < threshold {
                tracing::debug!(
                    size = ctx.metadata.size,
                    threshold = threshold,
                    "source below threshold, passing through"
                );
                ctx.mask.disable_all();
            }
        }

        Ok(ctx)
    }

    /// Phase two: run suppression hooks, short-circuit when every slot is
    /// disabled, execute the surviving actions in order, encode.
    pub async fn process(&self, ctx: &mut ImageContext) -> AppResult<ProcessResponse> {
        if ctx.actions.is_empty() {
            return Err(AppError::invalid_argument("action chain is empty"));
        }

        if ctx.features.auto_orient {
            if let Some(orientation) = ctx.metadata.orientation {
                if orientation > 1 {
                    ctx.image
                        .map_frames(|frame| orientation::apply_orientation(frame, orientation));
                }
            }
        }

        let mut entries: Vec<(usize, String)> = Vec::new();
        ctx.mask.for_each(|entry, _enabled, index| {
            entries.push((index, entry.to_string()));
        });

        // Suppression hooks run for disabled slots too; a disabled slot can
        // never be re-enabled once the mask is locked.
        for (index, entry) in &entries {
            if entry.is_empty() || entry.as_str() == NAME {
                continue;
            }
            let params: Vec<&str> = entry.split(',').collect();
            let name = params[0];
            if name == THRESHOLD || name == CGIF {
                continue;
            }
            let action = self.actions.get(name).ok_or_else(|| {
                AppError::invalid_argument(format!("unknown action: \"{name}\""))
            })?;
            action.before_process(ctx, &params, *index)?;
        }

        let enabled = ctx.mask.filter_enabled();
        let nothing_to_do = enabled
            .iter()
            .all(|entry| entry.is_empty() || entry.as_str() == NAME);

        if nothing_to_do && !ctx.features.auto_webp {
            let output = ctx.store.get(&ctx.uri).await?;
            let mut headers = std::mem::take(&mut ctx.headers);
            headers.extend(output.headers);
            tracing::debug!(uri = %ctx.uri, "nothing to do, returning source unchanged");
            return Ok(ProcessResponse {
                data: ProcessData::Image(output.bytes),
                content_type: ctx.metadata.format.to_mime_type().to_string(),
                headers,
            });
        }

        for (index, entry) in &entries {
            if entry.is_empty() || entry.as_str() == NAME {
                continue;
            }
            let params: Vec<&str> = entry.split(',').collect();
            let name = params[0];
            if name == THRESHOLD || name == CGIF {
                continue;
            }
            if ctx.mask.is_disabled(*index)? {
                continue;
            }
            let action = self.actions.get(name).ok_or_else(|| {
                AppError::invalid_argument(format!("unknown action: \"{name}\""))
            })?;
            tracing::debug!(action = name, index = index, "executing action");
            action.process(ctx, &params).await?;
            if ctx.features.return_info {
                break;
            }
        }

        if ctx.features.return_info {
            let info = ctx.info.take().unwrap_or_else(|| serde_json::json!({}));
            return Ok(ProcessResponse {
                data: ProcessData::Json(info),
                content_type: "application/json".to_string(),
                headers: std::mem::take(&mut ctx.headers),
            });
        }

        if ctx.features.auto_webp && !ctx.image.is_animated() {
            ctx.image.encode.format = Some(OutputFormat::Webp);
        }

        let (data, content_type) = ctx.image.to_bytes()?;
        Ok(ProcessResponse {
            data: ProcessData::Image(data),
            content_type: content_type.to_string(),
            headers: std::mem::take(&mut ctx.headers),
        })
    }
}

#[async_trait]
impl Processor for ImageProcessor {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn execute(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ProcessResponse> {
        let mut ctx = self.new_context(uri, actions, store).await?;
        self.process(&mut ctx).await
    }
}

fn parse_threshold(params: &[&str]) -> AppResult<u64> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("invalid threshold params"));
    }
    let value: i64 = params[1]
        .parse()
        .map_err(|_| AppError::invalid_argument("invalid threshold params"))?;
    if value <= 0 {
        return Err(AppError::invalid_argument("invalid threshold params"));
    }
    Ok(value as u64)
}

fn parse_cgif(params: &[&str]) -> AppResult<Option<u32>> {
    match params.len() {
        1 => Ok(None),
        2 => match split_kv(params[1]) {
            ("s", Some(value)) => {
                let limit: u32 = value
                    .parse()
                    .map_err(|_| AppError::invalid_argument("invalid cgif params"))?;
                if limit == 0 {
                    return Err(AppError::invalid_argument("invalid cgif params"));
                }
                Ok(Some(limit))
            }
            _ => Err(AppError::invalid_argument("invalid cgif params")),
        },
        _ => Err(AppError::invalid_argument("invalid cgif params")),
    }
}
