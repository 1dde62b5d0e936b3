//! Shared pixel operations used by several actions.

use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Rotate a frame clockwise by an arbitrary angle, expanding the canvas so
/// no pixel is clipped. Right-angle rotations take the exact path; anything
/// else lands on an enlarged canvas filled with `background`.
pub fn rotate_expand(frame: &RgbaImage, degrees: u32, background: Rgba<u8>) -> RgbaImage {
    match degrees % 360 {
        0 => frame.clone(),
        90 => imageops::rotate90(frame),
        180 => imageops::rotate180(frame),
        270 => imageops::rotate270(frame),
        deg => {
            let theta = (deg as f32).to_radians();
            let (w, h) = (frame.width() as f32, frame.height() as f32);
            let new_w = (w * theta.cos().abs() + h * theta.sin().abs()).ceil() as u32;
            let new_h = (w * theta.sin().abs() + h * theta.cos().abs()).ceil() as u32;

            let mut canvas = RgbaImage::from_pixel(new_w, new_h, background);
            let dx = ((new_w - frame.width()) / 2) as i64;
            let dy = ((new_h - frame.height()) / 2) as i64;
            imageops::overlay(&mut canvas, frame, dx, dy);
            rotate_about_center(&canvas, theta, Interpolation::Bilinear, background)
        }
    }
}

/// Scale every pixel's alpha by `opacity` percent (0-100).
pub fn apply_opacity(frame: &mut RgbaImage, opacity: u32) {
    if opacity >= 100 {
        return;
    }
    for pixel in frame.pixels_mut() {
        pixel[3] = (pixel[3] as u32 * opacity / 100) as u8;
    }
}

/// Tile `overlay` across `base` starting from the top-left corner.
pub fn overlay_tile(base: &mut RgbaImage, overlay: &RgbaImage) {
    if overlay.width() == 0 || overlay.height() == 0 {
        return;
    }
    let mut y = 0u32;
    while y < base.height() {
        let mut x = 0u32;
        while x < base.width() {
            imageops::overlay(base, overlay, x as i64, y as i64);
            x += overlay.width();
        }
        y += overlay.height();
    }
}
