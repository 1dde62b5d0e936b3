//! EXIF orientation handling.

use std::io::Cursor;

use image::{imageops, RgbaImage};

/// Read the EXIF orientation tag (1-8) from encoded image bytes.
pub fn read_orientation(data: &[u8]) -> Option<u32> {
    let reader = exif::Reader::new();
    let exif = reader.read_from_container(&mut Cursor::new(data)).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Rotation and flip operations needed to upright an image with the given
/// EXIF orientation. Returns (rotate_angle, flip_horizontal, flip_vertical).
pub fn orientation_transforms(orientation: u32) -> (Option<u16>, bool, bool) {
    match orientation {
        2 => (None, true, false),       // Mirror horizontal
        3 => (Some(180), false, false), // Rotate 180
        4 => (None, false, true),       // Mirror vertical
        5 => (Some(90), true, false),   // Transpose
        6 => (Some(90), false, false),  // Rotate 90 CW
        7 => (Some(270), true, false),  // Transverse
        8 => (Some(270), false, false), // Rotate 270 CW
        _ => (None, false, false),      // Normal or invalid
    }
}

/// Upright a single frame according to its EXIF orientation.
pub fn apply_orientation(frame: &RgbaImage, orientation: u32) -> RgbaImage {
    let (rotate, flip_h, flip_v) = orientation_transforms(orientation);

    let mut out = match rotate {
        Some(90) => imageops::rotate90(frame),
        Some(180) => imageops::rotate180(frame),
        Some(270) => imageops::rotate270(frame),
        _ => frame.clone(),
    };
    if flip_h {
        out = imageops::flip_horizontal(&out);
    }
    if flip_v {
        out = imageops::flip_vertical(&out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Minimal little-endian TIFF carrying only an orientation tag.
    fn tiff_with_orientation(orientation: u8) -> Vec<u8> {
        let mut data = vec![
            0x49, 0x49, 0x2a, 0x00, // II, magic 42
            0x08, 0x00, 0x00, 0x00, // IFD offset 8
            0x01, 0x00, // one entry
            0x12, 0x01, // tag 0x0112 orientation
            0x03, 0x00, // type SHORT
            0x01, 0x00, 0x00, 0x00, // count 1
        ];
        data.extend_from_slice(&[orientation, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // no next IFD
        data
    }

    #[test]
    fn test_read_orientation_from_tiff() {
        assert_eq!(read_orientation(&tiff_with_orientation(6)), Some(6));
        assert_eq!(read_orientation(&tiff_with_orientation(3)), Some(3));
    }

    #[test]
    fn test_read_orientation_missing() {
        assert_eq!(read_orientation(b"not an image"), None);
        let frame = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let mut png = Vec::new();
        frame
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .unwrap();
        assert_eq!(read_orientation(&png), None);
    }

    #[test]
    fn test_orientation_transforms_table() {
        assert_eq!(orientation_transforms(1), (None, false, false));
        assert_eq!(orientation_transforms(2), (None, true, false));
        assert_eq!(orientation_transforms(6), (Some(90), false, false));
        assert_eq!(orientation_transforms(8), (Some(270), false, false));
        assert_eq!(orientation_transforms(42), (None, false, false));
    }

    /// Orientation 5 stores the transpose of the upright image. Rotating
    /// 90 CW and then mirroring must restore the original pixel layout.
    #[test]
    fn test_transpose_orientation_uprights_pixels() {
        let upright = RgbaImage::from_fn(3, 2, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 0, 255]));
        let transposed = RgbaImage::from_fn(2, 3, |x, y| *upright.get_pixel(y, x));

        assert_eq!(apply_orientation(&transposed, 5), upright);

        let transverse = RgbaImage::from_fn(2, 3, |x, y| *upright.get_pixel(2 - y, 1 - x));
        assert_eq!(apply_orientation(&transverse, 7), upright);
    }

    #[test]
    fn test_apply_orientation_swaps_dimensions() {
        let frame = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]));
        assert_eq!(apply_orientation(&frame, 6).dimensions(), (2, 4));
        assert_eq!(apply_orientation(&frame, 3).dimensions(), (4, 2));
        assert_eq!(apply_orientation(&frame, 1).dimensions(), (4, 2));
    }
}
