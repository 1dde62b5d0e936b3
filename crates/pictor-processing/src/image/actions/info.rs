//! Source metadata as a JSON payload instead of image bytes.

use async_trait::async_trait;
use pictor_core::{AppError, AppResult};
use serde_json::json;

use crate::action::Action;
use crate::context::ImageContext;

pub struct InfoAction;

#[async_trait]
impl Action for InfoAction {
    fn name(&self) -> &'static str {
        "info"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        if params.len() != 1 || params[0] != "info" {
            return Err(AppError::invalid_argument("info takes no parameters"));
        }
        Ok(())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        self.validate(params)?;

        let format = ctx
            .metadata
            .format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("unknown");
        let height = if ctx.metadata.pages > 1 {
            ctx.metadata.page_height
        } else {
            ctx.metadata.height
        };

        ctx.info = Some(json!({
            "FileSize": { "value": ctx.metadata.size.to_string() },
            "Format": { "value": format },
            "ImageHeight": { "value": height.to_string() },
            "ImageWidth": { "value": ctx.metadata.width.to_string() },
        }));
        ctx.features.return_info = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ctx_from_bytes, gif_bytes, jpeg_bytes, png_ctx};

    #[test]
    fn test_validate_rejects_parameters() {
        assert!(InfoAction.validate(&["info"]).is_ok());
        assert!(InfoAction.validate(&["info", "x"]).is_err());
    }

    #[tokio::test]
    async fn test_info_payload_fields() {
        let mut ctx = png_ctx(20, 10, &["image", "info"]);
        InfoAction.process(&mut ctx, &["info"]).await.unwrap();

        assert!(ctx.features.return_info);
        let info = ctx.info.as_ref().unwrap();
        assert_eq!(info["Format"]["value"], "png");
        assert_eq!(info["ImageWidth"]["value"], "20");
        assert_eq!(info["ImageHeight"]["value"], "10");
        assert_eq!(
            info["FileSize"]["value"],
            ctx.metadata.size.to_string().as_str()
        );
    }

    #[tokio::test]
    async fn test_info_normalizes_jpeg_name() {
        let mut ctx = ctx_from_bytes(jpeg_bytes(8, 8, 80), &["image", "info"]);
        InfoAction.process(&mut ctx, &["info"]).await.unwrap();
        assert_eq!(ctx.info.as_ref().unwrap()["Format"]["value"], "jpg");
    }

    #[tokio::test]
    async fn test_info_reports_frame_height_for_animation() {
        let mut ctx = ctx_from_bytes(gif_bytes(3, 16, 9), &["image", "info"]);
        InfoAction.process(&mut ctx, &["info"]).await.unwrap();
        assert_eq!(ctx.info.as_ref().unwrap()["ImageHeight"]["value"], "9");
    }
}
