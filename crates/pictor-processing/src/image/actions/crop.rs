//! Rectangular crop anchored on a 3x3 gravity grid.

use async_trait::async_trait;
use image::imageops;
use pictor_core::{AppError, AppResult};

use super::parse_number;
use crate::action::Action;
use crate::chain::split_kv;
use crate::context::ImageContext;

const MAX_COORD: u32 = 100000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    fn from_name(name: &str) -> AppResult<Self> {
        match name {
            "nw" => Ok(Gravity::NorthWest),
            "north" => Ok(Gravity::North),
            "ne" => Ok(Gravity::NorthEast),
            "west" => Ok(Gravity::West),
            "center" => Ok(Gravity::Center),
            "east" => Ok(Gravity::East),
            "sw" => Ok(Gravity::SouthWest),
            "south" => Ok(Gravity::South),
            "se" => Ok(Gravity::SouthEast),
            _ => Err(AppError::invalid_argument(format!(
                "unknown crop gravity: \"{name}\""
            ))),
        }
    }

    /// Column (0-2) of the anchor cell.
    fn column(&self) -> u32 {
        match self {
            Gravity::NorthWest | Gravity::West | Gravity::SouthWest => 0,
            Gravity::North | Gravity::Center | Gravity::South => 1,
            Gravity::NorthEast | Gravity::East | Gravity::SouthEast => 2,
        }
    }

    /// Row (0-2) of the anchor cell.
    fn row(&self) -> u32 {
        match self {
            Gravity::NorthWest | Gravity::North | Gravity::NorthEast => 0,
            Gravity::West | Gravity::Center | Gravity::East => 1,
            Gravity::SouthWest | Gravity::South | Gravity::SouthEast => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct CropOpts {
    /// 0 means "to the right/bottom edge".
    w: u32,
    h: u32,
    x: u32,
    y: u32,
    g: Gravity,
}

impl CropOpts {
    fn parse(params: &[&str]) -> AppResult<Self> {
        let mut opts = CropOpts {
            w: 0,
            h: 0,
            x: 0,
            y: 0,
            g: Gravity::NorthWest,
        };
        for param in &params[1..] {
            if param.is_empty() {
                continue;
            }
            match split_kv(param) {
                ("w", Some(v)) => opts.w = parse_number(v, 0, MAX_COORD, "crop w")?,
                ("h", Some(v)) => opts.h = parse_number(v, 0, MAX_COORD, "crop h")?,
                ("x", Some(v)) => opts.x = parse_number(v, 0, MAX_COORD, "crop x")?,
                ("y", Some(v)) => opts.y = parse_number(v, 0, MAX_COORD, "crop y")?,
                ("g", Some(v)) => opts.g = Gravity::from_name(v)?,
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown crop param: \"{param}\""
                    )))
                }
            }
        }
        Ok(opts)
    }

    /// Resolve the crop region against the current working dimensions. The
    /// gravity anchor shifts x/y by thirds of the image, then missing or
    /// overflowing extents clamp to the edges.
    fn region(&self, width: u32, height: u32) -> AppResult<(u32, u32, u32, u32)> {
        let x = self.x + (width as f64 / 3.0).round() as u32 * self.g.column();
        let y = self.y + (height as f64 / 3.0).round() as u32 * self.g.row();

        if x >= width {
            return Err(AppError::invalid_argument("crop x exceeds image width"));
        }
        if y >= height {
            return Err(AppError::invalid_argument("crop y exceeds image height"));
        }

        let mut w = if self.w == 0 { width - x } else { self.w };
        let mut h = if self.h == 0 { height - y } else { self.h };
        if x + w > width {
            w = width - x;
        }
        if y + h > height {
            h = height - y;
        }
        Ok((x, y, w, h))
    }
}

pub struct CropAction;

#[async_trait]
impl Action for CropAction {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn validate(&self, params: &[&str]) -> AppResult<()> {
        CropOpts::parse(params).map(|_| ())
    }

    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()> {
        let opts = CropOpts::parse(params)?;
        let (width, height) = ctx.image.dimensions();
        let (x, y, w, h) = opts.region(width, height)?;
        ctx.image
            .map_frames(|frame| imageops::crop_imm(frame, x, y, w, h).to_image());
        Ok(())
    }
}
