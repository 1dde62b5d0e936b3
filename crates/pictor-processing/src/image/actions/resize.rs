//! Resize with the lfit/mfit/fill/pad/fixed mode family.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use pictor_core::{AppError, AppResult};

use super::{parse_hex_color, parse_number, parse_toggle};
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;

const MAX_DIMENSION: u32 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResizeMode {
    /// Fit inside the box, preserving aspect ratio.
    Lfit,
    /// Cover the box, preserving aspect ratio, no crop.
    Mfit,
    /// Cover the box and center-crop to it.
    Fill,
    /// Fit inside the box and pad to it with a background color.
    Pad,
    /// Exact dimensions, aspect ratio ignored.
    Fixed,
}

impl ResizeMode {
    fn from_name(name: &str) -> AppResult<Self> {
        match name {
            "lfit" => Ok(ResizeMode::Lfit),
            "mfit" => Ok(ResizeMode::Mfit),
            "fill" => Ok(ResizeMode::Fill),
            "pad" => Ok(ResizeMode::Pad),
            "fixed" => Ok(ResizeMode::Fixed),
            _ => Err(AppError::invalid_argument(format!(
                "unknown resize mode: \"{name}\""
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct ResizeOpts {
    w: Option<u32>,
    h: Option<u32>,
    l: Option<u32>,
    s: Option<u32>,
    m: ResizeMode,
    /// When set, never enlarge beyond the source dimensions.
    limit: bool,
    color: Rgba<u8>,
    p: Option<u32>,
}

impl ResizeOpts {
    fn parse(params: &[&str]) -> AppResult<Self> {
        let mut opts = ResizeOpts {
            w: None,
            h: None,
            l: None,
            s: None,
            m: ResizeMode::Lfit,
            limit: true,
            color: Rgba([255, 255, 255, 255]),
            p: None,
        };
        for param in &params[1..] {
            if param.is_empty() {
                continue;
            }
            match split_kv(param) {
                ("w", Some(v)) => opts.w = Some(parse_number(v, 1, MAX_DIMENSION, "resize w")?),
                ("h", Some(v)) => opts.h = Some(parse_number(v, 1, MAX_DIMENSION, "resize h")?),
                ("l", Some(v)) => opts.l = Some(parse_number(v, 1, MAX_DIMENSION, "resize l")?),
                ("s", Some(v)) => opts.s = Some(parse_number(v, 1, MAX_DIMENSION, "resize s")?),
                ("m", Some(v)) => opts.m = ResizeMode::from_name(v)?,
                ("limit", Some(v)) => opts.limit = parse_toggle(v, "resize limit")?,
                ("color", Some(v)) => opts.color = parse_hex_color(v)?,
                ("p", Some(v)) => opts.p = Some(parse_number(v, 1, 1000, "resize p")?),
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown resize param: \"{param}\""
                    )))
                }
            }
        }
        Ok(opts)
    }

    /// Resolve the long/short-edge shorthands into concrete width/height
    /// targets for a source of the given dimensions.
    fn resolve_target(&self, source_w: u32, source_h: u32) -> (Option<u32>, Option<u32>) {
        let mut w = self.w;
        let mut h = self.h;
        if let Some(l) = self.l {
            if source_w > source_h {
                w = Some(l);
            } else {
                h = Some(l);
            }
        }
        if let Some(s) = self.s {
            if source_h < source_w {
                h = Some(s);
            } else {
                w = Some(s);
            }
        }
        (w, h)
    }

    fn plan(&self, source_w: u32, source_h: u32) -> AppResult<ResizePlan> {
        let (sw, sh) = (source_w as f64, source_h as f64);

        let (w, h) = self.resolve_target(source_w, source_h);

        // A bare percentage scales both dimensions and may enlarge.
        if let Some(p) = self.p {
            if w.is_none() && h.is_none() {
                let factor = p as f64 / 100.0;
                return Ok(ResizePlan::Exact {
                    w: round_dim(sw * factor),
                    h: round_dim(sh * factor),
                });
            }
        }

        let (w, h) = match (w, h) {
            (None, None) => {
                return Err(AppError::invalid_argument(
                    "resize requires at least one of w, h, p, l, s",
                ))
            }
            pair => pair,
        };

        let scale_for = |w: Option<u32>, h: Option<u32>, prefer_max: bool| match (w, h) {
            (Some(w), Some(h)) => {
                let sx = w as f64 / sw;
                let sy = h as f64 / sh;
                if prefer_max {
                    sx.max(sy)
                } else {
                    sx.min(sy)
                }
            }
            (Some(w), None) => w as f64 / sw,
            (None, Some(h)) => h as f64 / sh,
            (None, None) => 1.0,
        };

        let proportional = |scale: f64| -> ResizePlan {
            if self.limit && scale >= 1.0 {
                ResizePlan::Keep
            } else {
                ResizePlan::Exact {
                    w: round_dim(sw * scale),
                    h: round_dim(sh * scale),
                }
            }
        };

        let plan = match self.m {
            ResizeMode::Lfit => proportional(scale_for(w, h, false)),
            ResizeMode::Mfit => proportional(scale_for(w, h, true)),
            ResizeMode::Fill => match (w, h) {
                (Some(w), Some(h)) => {
                    let scale = scale_for(Some(w), Some(h), true);
                    if self.limit && scale > 1.0 {
                        ResizePlan::Keep
                    } else {
                        let rw = round_dim(sw * scale).max(w);
                        let rh = round_dim(sh * scale).max(h);
                        ResizePlan::Cover {
                            w: rw,
                            h: rh,
                            crop_w: w.min(rw),
                            crop_h: h.min(rh),
                        }
                    }
                }
                _ => proportional(scale_for(w, h, false)),
            },
            ResizeMode::Pad => match (w, h) {
                (Some(w), Some(h)) => {
                    let scale = scale_for(Some(w), Some(h), false);
                    let effective = if self.limit { scale.min(1.0) } else { scale };
                    ResizePlan::Pad {
                        inner_w: round_dim(sw * effective),
                        inner_h: round_dim(sh * effective),
                        canvas_w: w,
                        canvas_h: h,
                        color: self.color,
                    }
                }
                _ => proportional(scale_for(w, h, false)),
            },
            ResizeMode::Fixed => match (w, h) {
                (Some(w), Some(h)) => {
                    if self.limit && (w > source_w || h > source_h) {
                        ResizePlan::Keep
                    } else {
                        ResizePlan::Exact { w, h }
                    }
                }
                _ => proportional(scale_for(w, h, false)),
            },
        };
        Ok(plan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResizePlan {
    Keep,
    Exact {
        w: u32,
        h: u32,
    },
    /// Resize to (w, h) then center-crop to (crop_w, crop_h).
    Cover {
        w: u32,
        h: u32,
        crop_w: u32,
        crop_h: u32,
    },
    /// Resize to the inner dimensions, centered on a colored canvas.
    Pad {
        inner_w: u32,
        inner_h: u32,
        canvas_w: u32,
        canvas_h: u32,
        color: Rgba<u8>,
    },
}

impl ResizePlan {
    fn apply(&self, frame: &RgbaImage) -> RgbaImage {
        match *self {
            ResizePlan::Keep => frame.clone(),
            ResizePlan::Exact { w, h } => imageops::resize(frame, w, h, FilterType::Lanczos3),
            ResizePlan::Cover { w, h, crop_w, crop_h } => {
                let resized = imageops::resize(frame, w, h, FilterType::Lanczos3);
                let x = (w - crop_w) / 2;
                let y = (h - crop_h) / 2;
                imageops::crop_imm(&resized, x, y, crop_w, crop_h).to_image()
            }
            ResizePlan::Pad {
                inner_w,
                inner_h,
                canvas_w,
                canvas_h,
                color,
            } => {
                let inner = imageops::resize(frame, inner_w, inner_h, FilterType::Lanczos3);
                let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, color);
                let dx = (canvas_w.saturating_sub(inner_w) / 2) as i64;
                let dy = (canvas_h.saturating_sub(inner_h) / 2) as i64;
                imageops::overlay(&mut canvas, &inner, dx, dy);
                canvas
            }
        }
    }
}

fn round_dim(value: f64) -> u32 {
    value.round().max(1.0) as u32
}

pub struct ResizeAction;

#[async_trait]
impl Action for ResizeAction {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        ResizeOpts::parse(params).map(|_| ())
    }

    /// Enlarging an animated gif multiplies the cost per frame, so a resize
    /// beyond the source dimensions is dropped instead.
    fn before_process(
        &self,
        ctx: &mut ImageContext,
        params: &[&str],
        index: usize,
    ) -> AppResult<()> {
        if ctx.metadata.format != ImageFormat::Gif {
            return Ok(());
        }
        let opts = ResizeOpts::parse(params)?;
        let (w, h) = opts.resolve_target(ctx.metadata.width, ctx.metadata.page_height);
        let too_wide = w.is_some_and(|w| w > ctx.metadata.width);
        let too_tall = h.is_some_and(|h| h > ctx.metadata.page_height);
        if too_wide || too_tall {
            ctx.mask.disable(index)?;
        }
        Ok(())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let opts = ResizeOpts::parse(params)?;
        let (source_w, source_h) = ctx.image.dimensions();
        let plan = opts.plan(source_w, source_h)?;
        if plan == ResizePlan::Keep {
            return Ok(());
        }
        ctx.image.map_frames(|frame| plan.apply(frame));
        Ok(())
    }
}
