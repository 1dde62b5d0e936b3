//! Crop to an inscribed circle, transparent outside the radius.

use async_trait::async_trait;
use image::{imageops, Rgba};
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;

const MAX_RADIUS: u32 = 4096;

fn parse(params: &[&str]) -> AppResult<u32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("circle takes exactly one value"));
    }
    match split_kv(params[1]) {
        ("r", Some(v)) => parse_number(v, 1, MAX_RADIUS, "circle r"),
        _ => Err(AppError::invalid_argument(format!(
            "unknown circle param: \"{}\"",
            params[1]
        ))),
    }
}

pub struct CircleAction;

#[async_trait]
impl Action for CircleAction {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let radius = parse(params)?;
        let (width, height) = ctx.image.dimensions();
        let (wf, hf) = (width as f64, height as f64);

        let short = wf.min(hf);
        let r = (radius as f64).min(short / 2.0);
        let d = (((2.0 * r).round() + 1.0).min(short)) as u32;
        let left = ((wf / 2.0 - r).round().max(0.0) as u32).min(width.saturating_sub(d));
        let top = ((hf / 2.0 - r).round().max(0.0) as u32).min(height.saturating_sub(d));

        ctx.image.map_frames(|frame| {
            let mut out = imageops::crop_imm(frame, left, top, d, d).to_image();
            for (x, y, pixel) in out.enumerate_pixels_mut() {
                let dx = x as f64 - r;
                let dy = y as f64 - r;
                if dx * dx + dy * dy > r * r {
                    *pixel = Rgba([0, 0, 0, 0]);
                }
            }
            out
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_ctx;

    #[test]
    fn test_validate() {
        assert!(CircleAction.validate(&["circle", "r_50"]).is_ok());
        assert!(CircleAction.validate(&["circle", "r_0"]).is_err());
        assert!(CircleAction.validate(&["circle", "r_5000"]).is_err());
        assert!(CircleAction.validate(&["circle", "x_50"]).is_err());
        assert!(CircleAction.validate(&["circle"]).is_err());
    }

    #[tokio::test]
    async fn test_crops_to_circle_bounding_box() {
        let mut ctx = png_ctx(100, 60, &["image", "circle,r_20"]);
        CircleAction
            .process(&mut ctx, &["circle", "r_20"])
            .await
            .unwrap();
        // Diameter 2*20 rounded plus one.
        assert_eq!(ctx.image.dimensions(), (41, 41));

        let frame = &ctx.image.frames()[0];
        // Corners fall outside the circle, the center stays opaque.
        assert_eq!(frame.get_pixel(0, 0)[3], 0);
        assert_eq!(frame.get_pixel(40, 40)[3], 0);
        assert_eq!(frame.get_pixel(20, 20)[3], 255);
    }

    #[tokio::test]
    async fn test_radius_clamps_to_short_edge() {
        let mut ctx = png_ctx(100, 30, &["image", "circle,r_500"]);
        CircleAction
            .process(&mut ctx, &["circle", "r_500"])
            .await
            .unwrap();
        // Clamped to half the short edge, diameter capped at the short edge.
        assert_eq!(ctx.image.dimensions(), (30, 30));
    }
}
