//! Output quality, relative to the source's estimated quality or absolute.

use async_trait::async_trait;
use image::ImageFormat;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;
use crate::image::encode::estimate_jpeg_quality;

/// Assumed source quality when estimation fails.
const FALLBACK_JPEG_QUALITY: u8 = 72;

#[derive(Debug, Clone, Default)]
struct QualityOpts {
    /// Relative quality: percentage of the source's estimated quality.
    q: Option<u8>,
    /// Absolute quality.
    absolute: Option<u8>,
}

impl QualityOpts {
    fn parse(params: &[&str]) -> AppResult<Self> {
        let mut opts = QualityOpts::default();
        for param in &params[1..] {
            if param.is_empty() {
                continue;
            }
            match split_kv(param) {
                ("q", Some(v)) => opts.q = Some(parse_number(v, 1, 100, "Quality")?),
                ("Q", Some(v)) => opts.absolute = Some(parse_number(v, 1, 100, "Quality")?),
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown quality param: \"{param}\""
                    )))
                }
            }
        }
        Ok(opts)
    }
}

pub struct QualityAction;

#[async_trait]
impl Action for QualityAction {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        QualityOpts::parse(params).map(|_| ())
    }

    /// Re-quantizing every frame of a gif is not worth it; drop the action.
    fn before_process(
        &self,
        ctx: &mut ImageContext,
        _params: &[&str],
        index: usize,
    ) -> AppResult<()> {
        if ctx.metadata.format == ImageFormat::Gif {
            ctx.mask.disable(index)?;
        }
        Ok(())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let opts = QualityOpts::parse(params)?;
        match ctx.metadata.format {
            ImageFormat::Jpeg => {
                let quality = if let Some(q) = opts.q {
                    // Relative quality scales whatever the source was
                    // encoded at, estimated from its quantization tables.
                    let output = ctx.store.get(&ctx.uri).await?;
                    let estimated =
                        estimate_jpeg_quality(&output.bytes).unwrap_or(FALLBACK_JPEG_QUALITY);
                    let derived = (estimated as f64 * q as f64 / 100.0).round() as u8;
                    derived.clamp(1, 100)
                } else if let Some(absolute) = opts.absolute {
                    absolute
                } else {
                    FALLBACK_JPEG_QUALITY
                };
                ctx.image.encode.quality = Some(quality);
            }
            ImageFormat::WebP => {
                if let Some(quality) = opts.q.or(opts.absolute) {
                    ctx.image.encode.quality = Some(quality);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
