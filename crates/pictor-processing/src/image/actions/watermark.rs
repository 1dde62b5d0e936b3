//! Text, image and mixed watermark compositing.

use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use pictor_core::{AppError, AppResult};
use pictor_storage::BufferStore;

use super::{parse_hex_color, parse_number, parse_toggle};
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::{ImageContext, ProcessContext};
use crate::image::ops::{apply_opacity, overlay_tile, rotate_expand};

/// URL-safe base64, accepting both padded and unpadded input.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Default edge distance when no explicit x/y offset is given.
const DEFAULT_MARGIN: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatermarkGravity {
    North,
    South,
    East,
    West,
    Center,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl WatermarkGravity {
    fn from_name(name: &str) -> AppResult<Self> {
        use WatermarkGravity::*;
        match name {
            "north" => Ok(North),
            "south" => Ok(South),
            "east" => Ok(East),
            "west" => Ok(West),
            "center" | "centre" => Ok(Center),
            "ne" | "northeast" => Ok(NorthEast),
            "nw" | "northwest" => Ok(NorthWest),
            "se" | "southeast" => Ok(SouthEast),
            "sw" | "southwest" => Ok(SouthWest),
            _ => Err(AppError::invalid_argument(format!(
                "unknown watermark gravity: \"{name}\""
            ))),
        }
    }

    fn is_south(&self) -> bool {
        matches!(
            self,
            WatermarkGravity::South | WatermarkGravity::SouthEast | WatermarkGravity::SouthWest
        )
    }

    fn is_east(&self) -> bool {
        matches!(
            self,
            WatermarkGravity::East | WatermarkGravity::NorthEast | WatermarkGravity::SouthEast
        )
    }
}

#[derive(Debug, Clone)]
struct WatermarkOpts {
    text: String,
    /// Store key of an image watermark.
    image: String,
    /// Opacity percentage.
    t: u32,
    g: WatermarkGravity,
    /// Tile the watermark over the whole image.
    fill: bool,
    rotate: u32,
    size: u32,
    color: Rgba<u8>,
    /// Shrink an oversized watermark to fit the base image.
    auto: bool,
    /// Mixed layout: 0 puts the image left of the text, 1 the reverse.
    order: u32,
    x: Option<u32>,
    y: Option<u32>,
    voffset: i32,
    /// Gap between image and text in the mixed layout.
    interval: u32,
    /// Mixed layout vertical alignment: 0 top, 1 middle, 2 bottom.
    align: u32,
    shadow: u32,
}

impl WatermarkOpts {
    fn parse(params: &[&str]) -> AppResult<Self> {
        let mut opts = WatermarkOpts {
            text: String::new(),
            image: String::new(),
            t: 100,
            g: WatermarkGravity::SouthEast,
            fill: false,
            rotate: 0,
            size: 40,
            color: Rgba([0, 0, 0, 255]),
            auto: true,
            order: 0,
            x: None,
            y: None,
            voffset: 0,
            interval: 0,
            align: 0,
            shadow: 0,
        };
        for param in &params[1..] {
            if param.is_empty() {
                continue;
            }
            match split_kv(param) {
                ("text", Some(v)) => opts.text = decode_b64_string(v, "text")?,
                ("image", Some(v)) => opts.image = decode_b64_string(v, "image")?,
                ("t", Some(v)) => opts.t = parse_number(v, 0, 100, "watermark t")?,
                ("g", Some(v)) => opts.g = WatermarkGravity::from_name(v)?,
                ("fill", Some(v)) => opts.fill = parse_toggle(v, "watermark fill")?,
                ("rotate", Some(v)) => {
                    opts.rotate = parse_number::<u32>(v, 0, 360, "watermark rotate")? % 360
                }
                ("size", Some(v)) => opts.size = parse_number(v, 1, 1000, "watermark size")?,
                ("color", Some(v)) => opts.color = parse_hex_color(v)?,
                ("auto", Some(v)) => opts.auto = parse_toggle(v, "watermark auto")?,
                ("order", Some(v)) => opts.order = parse_number(v, 0, 1, "watermark order")?,
                ("x", Some(v)) => opts.x = Some(parse_number(v, 0, 4096, "watermark x")?),
                ("y", Some(v)) => opts.y = Some(parse_number(v, 0, 4096, "watermark y")?),
                ("voffset", Some(v)) => {
                    opts.voffset = parse_number(v, -1000, 1000, "watermark voffset")?
                }
                ("interval", Some(v)) => {
                    opts.interval = parse_number(v, 0, 1000, "watermark interval")?
                }
                ("align", Some(v)) => opts.align = parse_number(v, 0, 2, "watermark align")?,
                // Font selection is fixed at deployment; the name only has
                // to decode.
                ("type", Some(v)) => {
                    decode_b64_string(v, "type")?;
                }
                ("shadow", Some(v)) => opts.shadow = parse_number(v, 0, 100, "watermark shadow")?,
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown watermark param: \"{param}\""
                    )))
                }
            }
        }
        if opts.text.is_empty() && opts.image.is_empty() {
            return Err(AppError::invalid_argument(
                "watermark requires text or image",
            ));
        }
        Ok(opts)
    }
}

fn decode_b64_string(value: &str, what: &str) -> AppResult<String> {
    let bytes = B64.decode(value).map_err(|_| {
        AppError::invalid_argument(format!("invalid base64 in watermark {what}"))
    })?;
    String::from_utf8(bytes)
        .map_err(|_| AppError::invalid_argument(format!("invalid utf-8 in watermark {what}")))
}

/// Estimated pixel box for rendered text: full width for CJK and other
/// non-latin glyphs, narrower boxes for ASCII.
fn text_extent(text: &str, size: u32) -> (u32, u32) {
    let size = size as f64;
    let mut width = 0.0;
    for ch in text.chars() {
        let cp = ch as u32;
        width += if cp > 256 {
            size
        } else if cp > 97 {
            size / 2.0
        } else {
            size * 0.8
        };
    }
    ((width + 5.0).round() as u32, (size * 1.2).round() as u32)
}

fn align_offset(align: u32, canvas_h: u32, part_h: u32) -> u32 {
    match align {
        1 => (canvas_h - part_h) / 2,
        2 => canvas_h - part_h,
        _ => 0,
    }
}

/// Top-left overlay position of the watermark within the base image.
fn position(
    g: WatermarkGravity,
    base: (u32, u32),
    mark: (u32, u32),
    opts: &WatermarkOpts,
) -> (i64, i64) {
    let (bw, bh) = (base.0 as i64, base.1 as i64);
    let (mw, mh) = (mark.0 as i64, mark.1 as i64);
    let offset_x = opts.x.map_or(DEFAULT_MARGIN, |x| x as i64);
    let offset_y = opts.y.map_or(DEFAULT_MARGIN, |y| y as i64);

    let y = if matches!(
        g,
        WatermarkGravity::East | WatermarkGravity::West | WatermarkGravity::Center
    ) {
        ((bh - mh) as f64 / 2.0).round() as i64 + opts.voffset as i64
    } else if g.is_south() {
        bh - mh - offset_y
    } else {
        offset_y
    };

    let x = if matches!(
        g,
        WatermarkGravity::North | WatermarkGravity::South | WatermarkGravity::Center
    ) {
        ((bw - mw) as f64 / 2.0).round() as i64
    } else if g.is_east() {
        bw - mw - offset_x
    } else {
        offset_x
    };

    (x.max(0), y.max(0))
}

fn maybe_rotate(tile: RgbaImage, degrees: u32, background: Rgba<u8>) -> RgbaImage {
    if degrees == 0 {
        tile
    } else {
        rotate_expand(&tile, degrees, background)
    }
}

/// Shrink the watermark until it fits strictly inside the base image.
fn fit_within(tile: RgbaImage, base_w: u32, base_h: u32) -> RgbaImage {
    if tile.width() < base_w && tile.height() < base_h {
        return tile;
    }
    let max_w = base_w.saturating_sub(1).max(1);
    let max_h = base_h.saturating_sub(1).max(1);
    let scale = (max_w as f64 / tile.width() as f64).min(max_h as f64 / tile.height() as f64);
    let w = ((tile.width() as f64 * scale).round().max(1.0)) as u32;
    let h = ((tile.height() as f64 * scale).round().max(1.0)) as u32;
    imageops::resize(&tile, w, h, FilterType::Lanczos3)
}

pub struct WatermarkAction {
    font: Option<Arc<FontVec>>,
}

impl WatermarkAction {
    pub fn new(font: Option<Arc<FontVec>>) -> Self {
        Self { font }
    }

    fn text_tile(&self, opts: &WatermarkOpts) -> AppResult<RgbaImage> {
        let font = self.font.as_deref().ok_or_else(|| {
            AppError::Internal("watermark font is not configured".to_string())
        })?;
        let (w, h) = text_extent(&opts.text, opts.size);
        let mut tile = RgbaImage::from_pixel(w, h, TRANSPARENT);
        let scale = PxScale::from(opts.size as f32);

        if opts.shadow > 0 {
            let shadow_alpha = (opts.shadow * 255 / 100) as u8;
            draw_text_mut(
                &mut tile,
                Rgba([0, 0, 0, shadow_alpha]),
                2,
                2,
                scale,
                font,
                &opts.text,
            );
        }
        let alpha = (opts.t * 255 / 100) as u8;
        let color = Rgba([opts.color[0], opts.color[1], opts.color[2], alpha]);
        draw_text_mut(&mut tile, color, 0, 0, scale, font, &opts.text);
        Ok(tile)
    }

    async fn image_tile(
        &self,
        store: &Arc<dyn BufferStore>,
        opts: &WatermarkOpts,
    ) -> AppResult<RgbaImage> {
        let output = store.get(&opts.image).await?;
        let mut tile = image::load_from_memory(&output.bytes)
            .map_err(|e| {
                AppError::invalid_argument(format!("watermark image decode failed: {e}"))
            })?
            .to_rgba8();
        apply_opacity(&mut tile, opts.t);
        Ok(tile)
    }

    fn combine(&self, text: &RgbaImage, image: &RgbaImage, opts: &WatermarkOpts) -> RgbaImage {
        let (left, right) = if opts.order == 1 {
            (text, image)
        } else {
            (image, text)
        };
        let w = left.width() + right.width() + opts.interval;
        let h = left.height().max(right.height());
        let mut canvas = RgbaImage::from_pixel(w, h, TRANSPARENT);

        let left_y = align_offset(opts.align, h, left.height());
        let right_y = align_offset(opts.align, h, right.height());
        imageops::overlay(&mut canvas, left, 0, left_y as i64);
        imageops::overlay(
            &mut canvas,
            right,
            (left.width() + opts.interval) as i64,
            right_y as i64,
        );
        canvas
    }
}

#[async_trait]
impl Action for WatermarkAction {
    fn name(&self) -> &'static str {
        "watermark"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        WatermarkOpts::parse(params).map(|_| ())
    }

    /// Watermarks composite onto a single frame, so skip decoding the rest
    /// of an animated source.
    fn before_new_context(
        &self,
        ctx: &mut ProcessContext,
        params: &[&str],
        _index: usize,
    ) -> AppResult<()> {
        WatermarkOpts::parse(params)?;
        ctx.features.read_all_animated_frames = false;
        Ok(())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let opts = WatermarkOpts::parse(params)?;
        let store = ctx.store.clone();

        let tile = if !opts.text.is_empty() && !opts.image.is_empty() {
            let text = self.text_tile(&opts)?;
            let image = self.image_tile(&store, &opts).await?;
            maybe_rotate(self.combine(&text, &image, &opts), opts.rotate, TRANSPARENT)
        } else if !opts.text.is_empty() {
            maybe_rotate(self.text_tile(&opts)?, opts.rotate, TRANSPARENT)
        } else {
            maybe_rotate(self.image_tile(&store, &opts).await?, opts.rotate, WHITE)
        };

        let (base_w, base_h) = ctx.image.dimensions();
        let tile = if opts.auto {
            fit_within(tile, base_w, base_h)
        } else {
            tile
        };

        if opts.fill {
            ctx.image.map_frames(|frame| {
                let mut out = frame.clone();
                overlay_tile(&mut out, &tile);
                out
            });
        } else {
            let (x, y) = position(opts.g, (base_w, base_h), tile.dimensions(), &opts);
            ctx.image.map_frames(|frame| {
                let mut out = frame.clone();
                imageops::overlay(&mut out, &tile, x, y);
                out
            });
        }
        Ok(())
    }
}
