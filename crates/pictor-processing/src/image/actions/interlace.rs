//! Progressive (interlaced) JPEG output.

use async_trait::async_trait;
use image::ImageFormat;
use pictor_core::{AppError, AppResult};

use super::parse_toggle;
use crate::action::Action;
use crate::context::ImageContext;

fn parse(params: &[&str]) -> AppResult<bool> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument(
            "interlace takes exactly one value",
        ));
    }
    parse_toggle(params[1], "Interlace")
}

pub struct InterlaceAction;

#[async_trait]
impl Action for InterlaceAction {
    fn name(&self) -> &'static str {
        "interlace"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
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
        if parse(params)? {
            ctx.image.encode.progressive = true;
        }
        Ok(())
    }
}
