//! Round the image corners, transparent outside the rounded rectangle.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;

const MAX_RADIUS: u32 = 4096;

fn parse(params: &[&str]) -> AppResult<u32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument(
            "rounded-corners takes exactly one value",
        ));
    }
    match split_kv(params[1]) {
        ("r", Some(v)) => parse_number(v, 1, MAX_RADIUS, "rounded-corners r"),
        _ => Err(AppError::invalid_argument(format!(
            "unknown rounded-corners param: \"{}\"",
            params[1]
        ))),
    }
}

fn round_corners(frame: &RgbaImage, radius: u32) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let (wf, hf) = (w as f64, h as f64);
    let r = (radius as f64).min(wf / 2.0).min(hf / 2.0);

    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let xf = x as f64;
        let yf = y as f64;
        let cx = if xf < r {
            Some(r)
        } else if xf >= wf - r {
            Some(wf - r)
        } else {
            None
        };
        let cy = if yf < r {
            Some(r)
        } else if yf >= hf - r {
            Some(hf - r)
        } else {
            None
        };
        if let (Some(cx), Some(cy)) = (cx, cy) {
            let dx = xf - cx;
            let dy = yf - cy;
            if dx * dx + dy * dy > r * r {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }
    out
}

pub struct RoundedCornersAction;

#[async_trait]
impl Action for RoundedCornersAction {
    fn name(&self) -> &'static str {
        "rounded-corners"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let radius = parse(params)?;
        ctx.image.map_frames(|frame| round_corners(frame, radius));
        Ok(())
    }
}
