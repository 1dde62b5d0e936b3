//! Helpers for building contexts and fixture images in unit tests.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, Frame, ImageFormat, Rgba, RgbaImage};
use pictor_storage::MemBufferStore;

use crate::context::{Features, ImageContext, ProcessContext};
use crate::image::ImageHandle;
use crate::mask::ActionMask;

pub(crate) const SOURCE_KEY: &str = "fixtures/source.img";

pub(crate) fn encode_png(img: &RgbaImage) -> Bytes {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    Bytes::from(out)
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Bytes {
    encode_png(&RgbaImage::from_pixel(
        width,
        height,
        Rgba([120, 140, 160, 255]),
    ))
}

pub(crate) fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Bytes {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 90, 255])
    });
    let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    Bytes::from(out)
}

pub(crate) fn gif_bytes(frame_count: u32, width: u32, height: u32) -> Bytes {
    let mut out = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut out);
        for i in 0..frame_count {
            let frame = RgbaImage::from_pixel(width, height, Rgba([(i * 30) as u8, 80, 80, 255]));
            encoder.encode_frame(Frame::new(frame)).unwrap();
        }
    }
    Bytes::from(out)
}

/// Decode `bytes` into a full image context backed by an in-memory store
/// holding the same bytes under [`SOURCE_KEY`].
pub(crate) fn ctx_from_bytes(bytes: Bytes, chain: &[&str]) -> ImageContext {
    let actions: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
    let store = MemBufferStore::new();
    store.insert(SOURCE_KEY, bytes.clone(), None);

    let (image, metadata) = ImageHandle::decode(&bytes, &Features::default()).unwrap();
    let ctx = ProcessContext {
        uri: SOURCE_KEY.to_string(),
        actions: actions.clone(),
        mask: ActionMask::new(&actions),
        store: Arc::new(store),
        features: Features::default(),
        headers: BTreeMap::new(),
    };
    ImageContext::from_parts(ctx, image, metadata)
}

pub(crate) fn png_ctx(width: u32, height: u32, chain: &[&str]) -> ImageContext {
    ctx_from_bytes(png_bytes(width, height), chain)
}
