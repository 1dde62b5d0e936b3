//! Greyscale conversion.

use async_trait::async_trait;
use pictor_core::{AppError, AppResult};

use super::parse_toggle;
use crate::action::Action;
use crate::context::ImageContext;

fn parse(params: &[&str]) -> AppResult<bool> {
    if params.len() != 2 {
        return Err(AppError::invalid_argument("grey takes exactly one value"));
    }
    parse_toggle(params[1], "Grey")
}

pub struct GreyAction;

#[async_trait]
impl Action for GreyAction {
    fn name(&self) -> &'static str {
        "grey"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        if !parse(params)? {
            return Ok(());
        }
        ctx.image.map_frames(|frame| {
            let mut out = frame.clone();
            for pixel in out.pixels_mut() {
                let luma = (0.299 * pixel[0] as f64
                    + 0.587 * pixel[1] as f64
                    + 0.114 * pixel[2] as f64)
                    .round() as u8;
                pixel[0] = luma;
                pixel[1] = luma;
                pixel[2] = luma;
            }
            out
        });
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
        assert!(GreyAction.validate(&["grey", "0"]).is_ok());
        assert!(GreyAction.validate(&["grey", "1"]).is_ok());
        assert!(GreyAction.validate(&["grey", "2"]).is_err());
        assert!(GreyAction.validate(&["grey"]).is_err());
    }

    #[tokio::test]
    async fn test_converts_to_luma() {
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 200]));
        let mut ctx = ctx_from_bytes(crate::testing::encode_png(&red), &["image", "grey,1"]);
        GreyAction.process(&mut ctx, &["grey", "1"]).await.unwrap();

        let pixel = ctx.image.frames()[0].get_pixel(0, 0);
        assert_eq!(pixel[0], 76);
        assert_eq!(pixel[1], 76);
        assert_eq!(pixel[2], 76);
        assert_eq!(pixel[3], 200);
    }

    #[tokio::test]
    async fn test_zero_is_a_no_op() {
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let mut ctx = ctx_from_bytes(crate::testing::encode_png(&red), &["image", "grey,0"]);
        GreyAction.process(&mut ctx, &["grey", "0"]).await.unwrap();
        assert_eq!(*ctx.image.frames()[0].get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }
}
