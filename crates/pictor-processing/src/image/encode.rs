//! Output encoding for processed images.
//!
//! Frames are encoded from raw RGBA pixels, so ancillary metadata from the
//! source (EXIF, ICC, comments) never survives a re-encode. JPEG output goes
//! through mozjpeg, WebP through libwebp, PNG and GIF through the image
//! crate's encoders.

use std::time::Duration;

use image::buffer::ConvertBuffer;
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{Delay, ExtendedColorType, Frame, ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use img_parts::jpeg::{markers, Jpeg};
use pictor_core::{AppError, AppResult};

pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_WEBP_QUALITY: u8 = 80;

/// Speed/size trade-off for the GIF encoder, 1 (best) to 30 (fastest).
const GIF_ENCODE_SPEED: i32 = 10;

/// Frame delay to assume when the source did not carry one.
const DEFAULT_FRAME_DELAY_MS: u64 = 100;

/// Formats the service can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl OutputFormat {
    /// Parse a user-supplied format name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::Webp),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    /// Map a decoded source format onto an output format. Containers we can
    /// decode but not write fall back to PNG, which is lossless.
    pub fn from_source(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => OutputFormat::Jpeg,
            ImageFormat::Png => OutputFormat::Png,
            ImageFormat::WebP => OutputFormat::Webp,
            ImageFormat::Gif => OutputFormat::Gif,
            _ => OutputFormat::Png,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Gif => "image/gif",
        }
    }

    pub fn supports_animation(&self) -> bool {
        matches!(self, OutputFormat::Webp | OutputFormat::Gif)
    }
}

/// Encode-time settings accumulated by actions while the chain runs.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Target format; `None` keeps the source format.
    pub format: Option<OutputFormat>,
    /// JPEG/WebP quality, 1-100.
    pub quality: Option<u8>,
    /// Progressive scan order for JPEG output.
    pub progressive: bool,
    /// Spend more time on PNG compression.
    pub slow_png: bool,
}

/// Compress a single frame to JPEG using mozjpeg.
pub(crate) fn compress_jpeg(
    frame: &RgbaImage,
    quality: u8,
    progressive: bool,
) -> AppResult<Vec<u8>> {
    let rgb: RgbImage = frame.convert();
    let (width, height) = rgb.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    if progressive {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(&rgb)?;
    let data = comp.finish()?;
    Ok(data)
}

/// Compress a single frame to PNG.
pub(crate) fn compress_png(frame: &RgbaImage, slow: bool) -> AppResult<Vec<u8>> {
    let compression = if slow {
        CompressionType::Best
    } else {
        CompressionType::Default
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, PngFilter::Adaptive);
    encoder
        .write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| AppError::Internal(format!("png encode failed: {e}")))?;
    Ok(out)
}

/// Compress a single frame to WebP.
pub(crate) fn compress_webp(frame: &RgbaImage, quality: u8) -> AppResult<Vec<u8>> {
    let encoder = webp::Encoder::from_rgba(frame.as_raw(), frame.width(), frame.height());
    let data = encoder.encode(quality as f32);
    Ok(data.to_vec())
}

/// Compress frames to GIF, honoring per-frame delays where known.
pub(crate) fn compress_gif(frames: &[RgbaImage], delays: &[Delay]) -> AppResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, GIF_ENCODE_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| AppError::Internal(format!("gif encode failed: {e}")))?;
        for (i, frame) in frames.iter().enumerate() {
            let delay = delays.get(i).copied().unwrap_or_else(|| {
                Delay::from_saturating_duration(Duration::from_millis(DEFAULT_FRAME_DELAY_MS))
            });
            encoder
                .encode_frame(Frame::from_parts(frame.clone(), 0, 0, delay))
                .map_err(|e| AppError::Internal(format!("gif encode failed: {e}")))?;
        }
    }
    Ok(out)
}

/// Standard luminance quantization table from the JPEG specification,
/// the baseline every IJG-style encoder scales by quality.
#[rustfmt::skip]
const STD_LUMINANCE_QUANT: [u16; 64] = [
    16,  11,  10,  16,  24,  40,  51,  61,
    12,  12,  14,  19,  26,  58,  60,  55,
    14,  13,  16,  24,  40,  57,  69,  56,
    14,  17,  22,  29,  51,  87,  80,  62,
    18,  22,  37,  56,  68, 109, 103,  77,
    24,  35,  55,  64,  81, 104, 113,  92,
    49,  64,  78,  87, 103, 121, 120, 101,
    72,  92,  95,  98, 112, 100, 103,  99,
];

/// Estimate the quality a JPEG was encoded at by comparing its luminance
/// quantization table against the standard table. Returns `None` when the
/// bytes are not a parseable JPEG or carry no luminance table.
pub fn estimate_jpeg_quality(data: &[u8]) -> Option<u8> {
    let jpeg = Jpeg::from_bytes(bytes::Bytes::copy_from_slice(data)).ok()?;

    for segment in jpeg.segments() {
        if segment.marker() != markers::DQT {
            continue;
        }
        let contents = segment.contents();
        let mut i = 0usize;
        // A DQT segment may concatenate several tables.
        while i < contents.len() {
            let precision = contents[i] >> 4;
            let table_id = contents[i] & 0x0f;
            let step = if precision == 1 { 2 } else { 1 };
            let end = i + 1 + 64 * step;
            if end > contents.len() {
                return None;
            }
            if table_id == 0 {
                let mut values = [0u16; 64];
                for (k, value) in values.iter_mut().enumerate() {
                    let at = i + 1 + k * step;
                    *value = if step == 2 {
                        u16::from_be_bytes([contents[at], contents[at + 1]])
                    } else {
                        contents[at] as u16
                    };
                }
                return Some(quality_from_luminance_table(&values));
            }
            i = end;
        }
    }
    None
}

fn quality_from_luminance_table(values: &[u16; 64]) -> u8 {
    let sum: u32 = values.iter().map(|&v| v as u32).sum();
    let sum_std: u32 = STD_LUMINANCE_QUANT.iter().map(|&v| v as u32).sum();

    // Recover the IJG scale factor the encoder applied, then invert it.
    let scale = ((200 * sum + sum_std) / (2 * sum_std)).max(1);
    let quality = if scale <= 100 {
        (200 - scale + 1) / 2
    } else {
        (5000 + scale / 2) / scale
    };
    quality.clamp(1, 100) as u8
}
