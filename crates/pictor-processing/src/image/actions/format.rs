//! Explicit output format conversion.

use async_trait::async_trait;
use image::ImageFormat;
use pictor_core::{AppError, AppResult};

use crate::action::Action;
use crate::context::{ImageContext, ProcessContext};
use crate::image::encode::OutputFormat;

fn parse_target(params: &[&str]) -> AppResult<OutputFormat> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("format takes exactly one value"));
    }
    OutputFormat::from_name(params[1]).ok_or_else(|| {
        AppError::invalid_argument(format!("unsupported format: \"{}\"", params[1]))
    })
}

pub struct FormatAction;

#[async_trait]
impl Action for FormatAction {
    fn name(&self) -> &'static str {
        "format"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse_target(params).map(|_| ())
    }

    /// A static target only ever needs the first frame, so skip decoding
    /// the rest of an animated source up front.
    fn before_new_context(
        &self,
        ctx: &mut ProcessContext,
        params: &[&str],
        _index: usize,
    ) -> AppResult<()> {
        let target = parse_target(params)?;
        if !target.supports_animation() {
            ctx.features.read_all_animated_frames = false;
        }
        Ok(())
    }

    /// gif to gif is an identity conversion; drop it.
    fn before_process(
        &self,
        ctx: &mut ImageContext,
        params: &[&str],
        index: usize,
    ) -> AppResult<()> {
        let target = parse_target(params)?;
        if ctx.metadata.format == ImageFormat::Gif && target == OutputFormat::Gif {
            ctx.mask.disable(index)?;
        }
        Ok(())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let target = parse_target(params)?;
        ctx.features.auto_webp = false;
        if !target.supports_animation() {
            ctx.image.truncate_frames(1);
        }
        ctx.image.encode.format = Some(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ctx_from_bytes, gif_bytes, png_ctx};

    #[test]
    fn test_validate_targets() {
        assert!(FormatAction.validate(&["format", "jpg"]).is_ok());
        assert!(FormatAction.validate(&["format", "jpeg"]).is_ok());
        assert!(FormatAction.validate(&["format", "png"]).is_ok());
        assert!(FormatAction.validate(&["format", "webp"]).is_ok());
        assert!(FormatAction.validate(&["format", "gif"]).is_ok());
        assert!(FormatAction.validate(&["format", "tiff"]).is_err());
        assert!(FormatAction.validate(&["format"]).is_err());
        assert!(FormatAction.validate(&["format", "jpg", "x"]).is_err());
    }

    #[tokio::test]
    async fn test_process_sets_format_and_clears_auto_webp() {
        let mut ctx = png_ctx(8, 8, &["image", "format,jpg"]);
        ctx.features.auto_webp = true;
        FormatAction
            .process(&mut ctx, &["format", "jpg"])
            .await
            .unwrap();
        assert_eq!(ctx.image.encode.format, Some(OutputFormat::Jpeg));
        assert!(!ctx.features.auto_webp);
    }

    #[tokio::test]
    async fn test_static_target_truncates_animation() {
        let mut ctx = ctx_from_bytes(gif_bytes(3, 8, 8), &["image", "format,jpg"]);
        assert_eq!(ctx.image.pages(), 3);
        FormatAction
            .process(&mut ctx, &["format", "jpg"])
            .await
            .unwrap();
        assert_eq!(ctx.image.pages(), 1);
    }

    #[tokio::test]
    async fn test_gif_to_gif_is_suppressed() {
        let mut ctx = ctx_from_bytes(gif_bytes(2, 8, 8), &["image", "format,gif"]);
        FormatAction
            .before_process(&mut ctx, &["format", "gif"], 1)
            .unwrap();
        assert!(ctx.mask.is_disabled(1).unwrap());
    }
}
