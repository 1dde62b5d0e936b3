//! Image fixtures for integration tests.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, Frame, ImageFormat, Rgba, RgbaImage};

pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("png encodes");
    Bytes::from(out)
}

pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Bytes {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 120, 255])
    });
    let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("jpeg encodes");
    Bytes::from(out)
}

pub fn gif_bytes(frame_count: u32, width: u32, height: u32) -> Bytes {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        for i in 0..frame_count {
            let frame = RgbaImage::from_pixel(width, height, Rgba([(i * 30) as u8, 90, 90, 255]));
            encoder.encode_frame(Frame::new(frame)).expect("gif encodes");
        }
    }
    Bytes::from(out)
}
