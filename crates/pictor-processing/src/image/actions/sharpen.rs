//! Unsharp-mask sharpening.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use super::parse_toggle;
use crate::action::Action;
use crate::context::ImageContext;

const SIGMA: f32 = 1.0;
const THRESHOLD: i32 = 1;

fn parse(params: &[&str]) -> AppResult<bool> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("sharpen takes exactly one value"));
    }
    parse_toggle(params[1], "Sharpen")
}

pub struct SharpenAction;

#[async_trait]
impl Action for SharpenAction {
    fn name(&self) -> &'static str {
        "sharpen"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        if !parse(params)? {
            return Ok(());
        }
        ctx.image
            .map_frames(|frame| imageops::unsharpen(frame, SIGMA, THRESHOLD));
        Ok(())
    }
}
