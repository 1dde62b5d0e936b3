//! Cut the image into equal strips along one axis and keep one of them.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;

#[derive(Debug, Clone)]
struct IndexCropOpts {
    x: Option<u32>,
    y: Option<u32>,
    i: u32,
}

impl IndexCropOpts {
    fn parse(params: &[&str]) -> AppResult<Self> {
        let mut opts = IndexCropOpts {
            x: None,
            y: None,
            i: 0,
        };
        for param in &params[1..] {
            if param.is_empty() {
                continue;
            }
            match split_kv(param) {
                ("x", Some(v)) => opts.x = Some(parse_strip_length(v, "x")?),
                ("y", Some(v)) => opts.y = Some(parse_strip_length(v, "y")?),
                ("i", Some(v)) => {
                    opts.i = v.parse().map_err(|_| {
                        AppError::invalid_argument("indexcrop i must be a non-negative number")
                    })?
                }
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown indexcrop param: \"{param}\""
                    )))
                }
            }
        }
        if opts.x.is_some() == opts.y.is_some() {
            return Err(AppError::invalid_argument(
                "indexcrop requires exactly one of x and y",
            ));
        }
        Ok(opts)
    }
}

fn parse_strip_length(value: &str, axis: &str) -> AppResult<u32> {
    let parsed: u32 = value.parse().map_err(|_| {
        AppError::invalid_argument(format!("indexcrop {axis} must be a positive number"))
    })?;
    if parsed == 0 {
        return Err(AppError::invalid_argument(format!(
            "indexcrop {axis} must be a positive number"
        )));
    }
    Ok(parsed)
}

pub struct IndexCropAction;

#[async_trait]
impl Action for IndexCropAction {
    fn name(&self) -> &'static str {
        "indexcrop"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        IndexCropOpts::parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let opts = IndexCropOpts::parse(params)?;
        let (width, height) = ctx.image.dimensions();

        // A strip index past the end leaves the image unchanged.
        if let Some(len) = opts.x {
            let count = width.div_ceil(len);
            if opts.i >= count {
                return Ok(());
            }
            let x0 = opts.i * len;
            let w = len.min(width - x0);
            ctx.image
                .map_frames(|frame| imageops::crop_imm(frame, x0, 0, w, height).to_image());
        } else if let Some(len) = opts.y {
            let count = height.div_ceil(len);
            if opts.i >= count {
                return Ok(());
            }
            let y0 = opts.i * len;
            let h = len.min(height - y0);
            ctx.image
                .map_frames(|frame| imageops::crop_imm(frame, 0, y0, width, h).to_image());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_ctx;

    #[test]
    fn test_parse_requires_one_axis() {
        assert!(IndexCropOpts::parse(&["indexcrop", "x_10"]).is_ok());
        assert!(IndexCropOpts::parse(&["indexcrop", "y_10", "i_2"]).is_ok());
        assert!(IndexCropOpts::parse(&["indexcrop", "x_10", "y_10"]).is_err());
        assert!(IndexCropOpts::parse(&["indexcrop", "i_1"]).is_err());
        assert!(IndexCropOpts::parse(&["indexcrop", "x_0"]).is_err());
    }

    #[tokio::test]
    async fn test_keeps_selected_horizontal_strip() {
        let mut ctx = png_ctx(30, 10, &["image", "indexcrop,x_10,i_1"]);
        IndexCropAction
            .process(&mut ctx, &["indexcrop", "x_10", "i_1"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (10, 10));
    }

    #[tokio::test]
    async fn test_last_strip_may_be_short() {
        let mut ctx = png_ctx(25, 10, &["image", "indexcrop,x_10,i_2"]);
        IndexCropAction
            .process(&mut ctx, &["indexcrop", "x_10", "i_2"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (5, 10));
    }

    #[tokio::test]
    async fn test_vertical_strips() {
        let mut ctx = png_ctx(10, 40, &["image", "indexcrop,y_15,i_1"]);
        IndexCropAction
            .process(&mut ctx, &["indexcrop", "y_15", "i_1"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (10, 15));
    }

    #[tokio::test]
    async fn test_strip_longer_than_image_is_unchanged() {
        let mut ctx = png_ctx(20, 10, &["image", "indexcrop,x_50,i_0"]);
        IndexCropAction
            .process(&mut ctx, &["indexcrop", "x_50", "i_0"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (20, 10));
    }

    #[tokio::test]
    async fn test_index_past_end_is_unchanged() {
        let mut ctx = png_ctx(20, 10, &["image", "indexcrop,x_10,i_5"]);
        IndexCropAction
            .process(&mut ctx, &["indexcrop", "x_10", "i_5"])
            .await
            .unwrap();
        assert_eq!(ctx.image.dimensions(), (20, 10));
    }
}
