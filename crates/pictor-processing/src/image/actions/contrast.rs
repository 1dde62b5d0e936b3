//! Contrast adjustment.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::context::ImageContext;

fn parse(params: &[&str]) -> AppResult<i32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument(
            "contrast takes exactly one value",
        ));
    }
    parse_number(params[1], -100, 100, "Contrast")
}

pub struct ContrastAction;

#[async_trait]
impl Action for ContrastAction {
    fn name(&self) -> &'static str {
        "contrast"
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
            .map_frames(|frame| imageops::contrast(frame, value as f32));
        Ok(())
    }
}
