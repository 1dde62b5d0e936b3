//! Clockwise rotation.

use async_trait::async_trait;
use image::Rgba;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::context::ImageContext;
use crate::image::ops::rotate_expand;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn parse(params: &[&str]) -> AppResult<u32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("rotate takes exactly one value"));
    }
    let degrees: u32 = parse_number(params[1], 0, 360, "Rotate")?;
    Ok(degrees % 360)
}

pub struct RotateAction;

#[async_trait]
impl Action for RotateAction {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let degrees = parse(params)?;
        if degrees == 0 {
            return Ok(());
        }
        ctx.image
            .map_frames(|frame| rotate_expand(frame, degrees, BACKGROUND));
        Ok(())
    }
}
