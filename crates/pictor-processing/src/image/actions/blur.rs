//! Gaussian blur.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::context::ImageContext;

/// The strength value 0-100 maps linearly onto this sigma range.
const MIN_SIGMA: f32 = 0.3;
const MAX_SIGMA: f32 = 50.0;

fn parse(params: &[&str]) -> AppResult<f32> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("blur takes exactly one value"));
    }
    parse_number(params[1], 0.0, 100.0, "Blur")
}

fn sigma_for(strength: f32) -> f32 {
    MIN_SIGMA + strength / 100.0 * (MAX_SIGMA - MIN_SIGMA)
}

pub struct BlurAction;

#[async_trait]
impl Action for BlurAction {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let strength = parse(params)?;
        if strength == 0.0 {
            return Ok(());
        }
        let sigma = sigma_for(strength);
        ctx.image.map_frames(|frame| imageops::blur(frame, sigma));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ctx_from_bytes;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_validate() {
        assert!(BlurAction.validate(&["blur", "0"]).is_ok());
        assert!(BlurAction.validate(&["blur", "100"]).is_ok());
        assert!(BlurAction.validate(&["blur", "2.5"]).is_ok());
        assert!(BlurAction.validate(&["blur", "101"]).is_err());
        assert!(BlurAction.validate(&["blur", "-1"]).is_err());
        assert!(BlurAction.validate(&["blur"]).is_err());
    }

    #[test]
    fn test_sigma_range() {
        assert_eq!(sigma_for(0.0), MIN_SIGMA);
        assert_eq!(sigma_for(100.0), MAX_SIGMA);
        assert!(sigma_for(50.0) > MIN_SIGMA && sigma_for(50.0) < MAX_SIGMA);
    }

    #[tokio::test]
    async fn test_blur_softens_edges() {
        let img = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let mut ctx = ctx_from_bytes(crate::testing::encode_png(&img), &["image", "blur,50"]);
        BlurAction.process(&mut ctx, &["blur", "50"]).await.unwrap();

        let frame = &ctx.image.frames()[0];
        let edge = frame.get_pixel(4, 5)[0];
        assert!(edge > 0 && edge < 255);
    }
}
