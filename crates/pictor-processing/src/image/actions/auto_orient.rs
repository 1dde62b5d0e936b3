//! Explicit control over EXIF orientation normalization.
//!
//! Presence of this action takes orientation handling away from the
//! processor's default: `auto-orient,1` uprights the image itself,
//! `auto-orient,0` leaves the pixels as stored.

use async_trait::async_trait;
use image::ImageFormat;
use pictor_core::{AppError, AppResult};

use super::parse_toggle;
use crate::action::Action;
use crate::context::{ImageContext, ProcessContext};
use crate::image::orientation::apply_orientation;

fn parse(params: &[&str]) -> AppResult<bool> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument(
            "auto-orient takes exactly one value",
        ));
    }
    parse_toggle(params[1], "AutoOrient")
}

pub struct AutoOrientAction;

#[async_trait]
impl Action for AutoOrientAction {
    fn name(&self) -> &'static str {
        "auto-orient"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    fn before_new_context(
        &self,
        ctx: &mut ProcessContext,
        params: &[&str],
        _index: usize,
    ) -> AppResult<()> {
        parse(params)?;
        ctx.features.auto_orient = false;
        Ok(())
    }

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
        if !parse(params)? {
            return Ok(());
        }
        if let Some(orientation) = ctx.metadata.orientation {
            if orientation > 1 {
                ctx.image
                    .map_frames(|frame| apply_orientation(frame, orientation));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_ctx;

    #[test]
    fn test_validate() {
        assert!(AutoOrientAction.validate(&["auto-orient", "0"]).is_ok());
        assert!(AutoOrientAction.validate(&["auto-orient", "1"]).is_ok());
        assert!(AutoOrientAction.validate(&["auto-orient", "5"]).is_err());
    }

    #[tokio::test]
    async fn test_presence_disables_default_orientation() {
        let ctx = png_ctx(4, 4, &["image", "auto-orient,0"]);
        let mut pre = crate::context::ProcessContext {
            uri: ctx.uri.clone(),
            actions: ctx.actions.clone(),
            mask: crate::mask::ActionMask::new(&ctx.actions),
            store: ctx.store.clone(),
            features: Default::default(),
            headers: Default::default(),
        };
        assert!(pre.features.auto_orient);
        AutoOrientAction
            .before_new_context(&mut pre, &["auto-orient", "0"], 1)
            .unwrap();
        assert!(!pre.features.auto_orient);
    }

    #[tokio::test]
    async fn test_applies_orientation_when_enabled() {
        let mut ctx = png_ctx(6, 4, &["image", "auto-orient,1"]);
        ctx.metadata.orientation = Some(6);
        AutoOrientAction
            .process(&mut ctx, &["auto-orient", "1"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (4, 6));
    }

    #[tokio::test]
    async fn test_disabled_leaves_pixels_alone() {
        let mut ctx = png_ctx(6, 4, &["image", "auto-orient,0"]);
        ctx.metadata.orientation = Some(6);
        AutoOrientAction
            .process(&mut ctx, &["auto-orient", "0"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (6, 4));
    }
}
