//! Brightness adjustment.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::context::ImageContext;

fn parse(params: &[&str]) -> AppResult<i32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("bright takes exactly one value"));
    }
    parse_number(params[1], -100, 100, "Bright")
}

pub struct BrightAction;

#[async_trait]
impl Action for BrightAction {
    fn name(&self) -> &'static str {
        "bright"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let value = parse(params)?;
        if value == 0 {
            return Ok(());
        }
        ctx.image
            .map_frames(|frame| imageops::brighten(frame, value));
        Ok(())
    }
}
