//! The decoded working image and its decode-time metadata.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Delay, ImageFormat, RgbaImage};
use pictor_core::{AppError, AppResult};

use super::encode::{
    compress_gif, compress_jpeg, compress_png, compress_webp, EncodeOptions, OutputFormat,
    DEFAULT_JPEG_QUALITY, DEFAULT_WEBP_QUALITY,
};
use super::orientation::read_orientation;
use crate::context::Features;

/// Snapshot taken once at decode time; hooks consult it for suppression
/// decisions and it never tracks later transforms.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Total frame count in the source, even when fewer were materialized.
    pub pages: u32,
    /// Height of a single frame.
    pub page_height: u32,
    pub size: u64,
    pub orientation: Option<u32>,
}

/// The working image: decoded frames plus the encode options actions
/// accumulate while the chain runs.
#[derive(Debug)]
pub struct ImageHandle {
    frames: Vec<RgbaImage>,
    delays: Vec<Delay>,
    source_format: ImageFormat,
    pub encode: EncodeOptions,
}

impl ImageHandle {
    /// Decode source bytes, honoring the animation flags set during the
    /// pre-pass. Animated sources are counted first so the total page count
    /// lands in metadata even when only a capped prefix is materialized.
    pub fn decode(bytes: &Bytes, features: &Features) -> AppResult<(Self, ImageMetadata)> {
        let format = image::guess_format(bytes)
            .map_err(|_| AppError::invalid_argument("unsupported image format"))?;

        let (frames, delays, total) = match format {
            ImageFormat::Gif => {
                let total = GifDecoder::new(Cursor::new(bytes.as_ref()))
                    .map_err(decode_error)?
                    .into_frames()
                    .count();
                let cap = frame_cap(total, features)?;
                let decoder =
                    GifDecoder::new(Cursor::new(bytes.as_ref())).map_err(decode_error)?;
                let (frames, delays) = collect_frames(decoder, cap)?;
                (frames, delays, total)
            }
            ImageFormat::WebP => {
                let decoder =
                    WebPDecoder::new(Cursor::new(bytes.as_ref())).map_err(decode_error)?;
                if decoder.has_animation() {
                    let total = decoder.into_frames().count();
                    let cap = frame_cap(total, features)?;
                    let decoder =
                        WebPDecoder::new(Cursor::new(bytes.as_ref())).map_err(decode_error)?;
                    let (frames, delays) = collect_frames(decoder, cap)?;
                    (frames, delays, total)
                } else {
                    decode_static(bytes, format, features)?
                }
            }
            _ => decode_static(bytes, format, features)?,
        };

        let first = frames
            .first()
            .ok_or_else(|| AppError::invalid_argument("image contains no frames"))?;
        let (width, height) = first.dimensions();

        let metadata = ImageMetadata {
            format,
            width,
            height,
            pages: total as u32,
            page_height: height,
            size: bytes.len() as u64,
            orientation: read_orientation(bytes),
        };

        let handle = ImageHandle {
            frames,
            delays,
            source_format: format,
            encode: EncodeOptions::default(),
        };
        Ok((handle, metadata))
    }

    pub fn width(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.width())
    }

    pub fn height(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.height())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pages(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// Keep only the first `count` frames.
    pub fn truncate_frames(&mut self, count: usize) {
        let count = count.max(1);
        self.frames.truncate(count);
        self.delays.truncate(count);
    }

    /// Replace every frame with the result of `f`.
    pub fn map_frames<F>(&mut self, mut f: F)
    where
        F: FnMut(&RgbaImage) -> RgbaImage,
    {
        for frame in &mut self.frames {
            *frame = f(frame);
        }
    }

    /// Encode the working frames using the accumulated encode options.
    pub fn to_bytes(&self) -> AppResult<(Bytes, &'static str)> {
        let format = self
            .encode
            .format
            .unwrap_or_else(|| OutputFormat::from_source(self.source_format));
        let first = self
            .frames
            .first()
            .ok_or_else(|| AppError::Internal("no frames to encode".to_string()))?;

        let data = match format {
            OutputFormat::Jpeg => compress_jpeg(
                first,
                self.encode.quality.unwrap_or(DEFAULT_JPEG_QUALITY),
                self.encode.progressive,
            )?,
            OutputFormat::Png => compress_png(first, self.encode.slow_png)?,
            OutputFormat::Webp => {
                compress_webp(first, self.encode.quality.unwrap_or(DEFAULT_WEBP_QUALITY))?
            }
            OutputFormat::Gif => compress_gif(&self.frames, &self.delays)?,
        };
        Ok((Bytes::from(data), format.content_type()))
    }
}

/// How many frames to materialize given the total available in the source.
fn frame_cap(total: usize, features: &Features) -> AppResult<usize> {
    if features.read_all_animated_frames {
        return Ok(total.max(1));
    }
    match features.limit_animated_frames {
        Some(limit) => {
            if total <= 1 {
                return Err(AppError::invalid_argument(
                    "frame limit requires an animated source",
                ));
            }
            Ok((limit as usize).min(total))
        }
        None => Ok(1),
    }
}

fn decode_static(
    bytes: &Bytes,
    format: ImageFormat,
    features: &Features,
) -> AppResult<(Vec<RgbaImage>, Vec<Delay>, usize)> {
    frame_cap(1, features)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(decode_error)?;
    Ok((vec![img.to_rgba8()], Vec::new(), 1))
}

fn collect_frames<'a, D>(decoder: D, cap: usize) -> AppResult<(Vec<RgbaImage>, Vec<Delay>)>
where
    D: AnimationDecoder<'a>,
{
    let mut frames = Vec::new();
    let mut delays = Vec::new();
    for frame in decoder.into_frames().take(cap) {
        let frame = frame.map_err(decode_error)?;
        delays.push(frame.delay());
        frames.push(frame.into_buffer());
    }
    Ok((frames, delays))
}

fn decode_error(err: image::ImageError) -> AppError {
    AppError::invalid_argument(format!("image decode failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Frame, Rgba};

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let frame = RgbaImage::from_pixel(width, height, Rgba([50, 100, 150, 255]));
        let mut out = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        Bytes::from(out)
    }

    fn gif_bytes(frame_count: u32) -> Bytes {
        let mut out = Vec::new();
        {
            let mut encoder = image::codecs::gif::GifEncoder::new(&mut out);
            for i in 0..frame_count {
                let frame = RgbaImage::from_pixel(8, 8, Rgba([(i * 40) as u8, 0, 0, 255]));
                encoder.encode_frame(Frame::new(frame)).unwrap();
            }
        }
        Bytes::from(out)
    }

    #[test]
    fn test_decode_static_png() {
        let (handle, metadata) = ImageHandle::decode(&png_bytes(6, 4), &Features::default()).unwrap();
        assert_eq!(handle.dimensions(), (6, 4));
        assert_eq!(handle.pages(), 1);
        assert!(!handle.is_animated());
        assert_eq!(metadata.format, ImageFormat::Png);
        assert_eq!(metadata.pages, 1);
        assert_eq!(metadata.orientation, None);
    }

    #[test]
    fn test_decode_gif_reads_all_frames() {
        let (handle, metadata) = ImageHandle::decode(&gif_bytes(3), &Features::default()).unwrap();
        assert_eq!(handle.pages(), 3);
        assert!(handle.is_animated());
        assert_eq!(metadata.pages, 3);
        assert_eq!(metadata.format, ImageFormat::Gif);
    }

    #[test]
    fn test_decode_gif_caps_frames_but_counts_total() {
        let features = Features {
            read_all_animated_frames: false,
            limit_animated_frames: Some(2),
            ..Default::default()
        };
        let (handle, metadata) = ImageHandle::decode(&gif_bytes(4), &features).unwrap();
        assert_eq!(handle.pages(), 2);
        assert_eq!(metadata.pages, 4);
    }

    #[test]
    fn test_decode_frame_limit_clamps_to_available() {
        let features = Features {
            read_all_animated_frames: false,
            limit_animated_frames: Some(99),
            ..Default::default()
        };
        let (handle, _) = ImageHandle::decode(&gif_bytes(2), &features).unwrap();
        assert_eq!(handle.pages(), 2);
    }

    #[test]
    fn test_decode_frame_limit_rejects_static_source() {
        let features = Features {
            read_all_animated_frames: false,
            limit_animated_frames: Some(2),
            ..Default::default()
        };
        let err = ImageHandle::decode(&png_bytes(4, 4), &features).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_decode_single_frame_when_animation_disabled() {
        let features = Features {
            read_all_animated_frames: false,
            ..Default::default()
        };
        let (handle, metadata) = ImageHandle::decode(&gif_bytes(3), &features).unwrap();
        assert_eq!(handle.pages(), 1);
        assert_eq!(metadata.pages, 3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err =
            ImageHandle::decode(&Bytes::from_static(b"not an image"), &Features::default())
                .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_to_bytes_keeps_source_format() {
        let (handle, _) = ImageHandle::decode(&png_bytes(4, 4), &Features::default()).unwrap();
        let (data, content_type) = handle.to_bytes().unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_to_bytes_honors_format_override() {
        let (mut handle, _) = ImageHandle::decode(&png_bytes(4, 4), &Features::default()).unwrap();
        handle.encode.format = Some(OutputFormat::Jpeg);
        let (data, content_type) = handle.to_bytes().unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_truncate_frames_keeps_at_least_one() {
        let (mut handle, _) = ImageHandle::decode(&gif_bytes(3), &Features::default()).unwrap();
        handle.truncate_frames(0);
        assert_eq!(handle.pages(), 1);
    }
}
