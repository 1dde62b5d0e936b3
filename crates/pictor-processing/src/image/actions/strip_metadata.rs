//! Drop ancillary metadata from the output.
//!
//! Output is always encoded fresh from raw pixels, which carries no EXIF,
//! ICC or comment segments. This action exists so a chain can request that
//! explicitly: its presence keeps the request off the untouched-passthrough
//! path, forcing the re-encode.

use async_trait::async_trait;
use pictor_core::{AppError, AppResult};

use crate::action::Action;
use crate::context::ImageContext;

pub struct StripMetadataAction;

#[async_trait]
impl Action for StripMetadataAction {
    fn name(&self) -> &'static str {
        "strip-metadata"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        if params.len() != 1 {
            return Err(AppError::invalid_argument(
                "strip-metadata takes no parameters",
            ));
        }
        Ok(())
    }

    async fn process(&self, _ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        self.validate(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_ctx;

    #[test]
    fn test_validate() {
        assert!(StripMetadataAction.validate(&["strip-metadata"]).is_ok());
        assert!(StripMetadataAction
            .validate(&["strip-metadata", "1"])
            .is_err());
    }

    #[tokio::test]
    async fn test_process_leaves_image_untouched() {
        let mut ctx = png_ctx(4, 4, &["image", "strip-metadata"]);
        StripMetadataAction
            .process(&mut ctx, &["strip-metadata"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (4, 4));
        assert!(ctx.image.encode.format.is_none());
    }
}
