//! Built-in actions for the image processor.

mod auto_orient;
mod blur;
mod bright;
mod circle;
mod contrast;
mod crop;
mod format;
mod grey;
mod indexcrop;
mod info;
mod interlace;
mod quality;
mod resize;
mod rotate;
mod rounded_corners;
mod sharpen;
mod strip_metadata;
mod watermark;

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use image::Rgba;
use pictor_core::{AppError, AppResult};

use crate::action::Action;

pub use auto_orient::AutoOrientAction;
pub use blur::BlurAction;
pub use bright::BrightAction;
pub use circle::CircleAction;
pub use contrast::ContrastAction;
pub use crop::CropAction;
pub use format::FormatAction;
pub use grey::GreyAction;
pub use indexcrop::IndexCropAction;
pub use info::InfoAction;
pub use interlace::InterlaceAction;
pub use quality::QualityAction;
pub use resize::ResizeAction;
pub use rotate::RotateAction;
pub use rounded_corners::RoundedCornersAction;
pub use sharpen::SharpenAction;
pub use strip_metadata::StripMetadataAction;
pub use watermark::WatermarkAction;

/// All built-in actions. Registration order matters only for duplicate
/// names, where the first wins.
pub fn default_actions(font: Option<Arc<ab_glyph::FontVec>>) -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(ResizeAction),
        Arc::new(QualityAction),
        Arc::new(BrightAction),
        Arc::new(FormatAction),
        Arc::new(BlurAction),
        Arc::new(RotateAction),
        Arc::new(ContrastAction),
        Arc::new(SharpenAction),
        Arc::new(InterlaceAction),
        Arc::new(AutoOrientAction),
        Arc::new(GreyAction),
        Arc::new(CropAction),
        Arc::new(CircleAction),
        Arc::new(IndexCropAction),
        Arc::new(RoundedCornersAction),
        Arc::new(WatermarkAction::new(font)),
        Arc::new(InfoAction),
        Arc::new(StripMetadataAction),
    ]
}

/// Parse a number and require it to sit inside an inclusive range.
pub(crate) fn parse_number<T>(value: &str, min: T, max: T, what: &str) -> AppResult<T>
where
    T: FromStr + PartialOrd + Display,
{
    let out_of_range = || {
        AppError::invalid_argument(format!("{what} must be between {min} and {max}"))
    };
    let parsed: T = value.parse().map_err(|_| out_of_range())?;
    if parsed < min || parsed > max {
        return Err(out_of_range());
    }
    Ok(parsed)
}

/// Parse a bare 0/1 toggle.
pub(crate) fn parse_toggle(value: &str, what: &str) -> AppResult<bool> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(AppError::invalid_argument(format!("{what} must be 0 or 1"))),
    }
}

/// Parse a 3 or 6 digit hex color without the leading '#'.
pub(crate) fn parse_hex_color(value: &str) -> AppResult<Rgba<u8>> {
    fn hex_val(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0,
        }
    }

    let digits = value.as_bytes();
    let well_formed =
        matches!(digits.len(), 3 | 6) && digits.iter().all(|b| b.is_ascii_hexdigit());
    if !well_formed {
        return Err(AppError::invalid_argument(format!(
            "invalid color: \"{value}\""
        )));
    }

    let (r, g, b) = if digits.len() == 3 {
        (
            hex_val(digits[0]) * 17,
            hex_val(digits[1]) * 17,
            hex_val(digits[2]) * 17,
        )
    } else {
        (
            hex_val(digits[0]) * 16 + hex_val(digits[1]),
            hex_val(digits[2]) * 16 + hex_val(digits[3]),
            hex_val(digits[4]) * 16 + hex_val(digits[5]),
        )
    };
    Ok(Rgba([r, g, b, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_bounds() {
        assert_eq!(parse_number::<u32>("50", 1, 100, "Quality").unwrap(), 50);
        assert_eq!(parse_number::<u32>("1", 1, 100, "Quality").unwrap(), 1);
        assert_eq!(parse_number::<u32>("100", 1, 100, "Quality").unwrap(), 100);
        assert!(parse_number::<u32>("0", 1, 100, "Quality").is_err());
        assert!(parse_number::<u32>("101", 1, 100, "Quality").is_err());
        assert!(parse_number::<u32>("abc", 1, 100, "Quality").is_err());
        assert_eq!(parse_number::<i32>("-50", -100, 100, "Bright").unwrap(), -50);
    }

    #[test]
    fn test_parse_toggle() {
        assert!(!parse_toggle("0", "Grey").unwrap());
        assert!(parse_toggle("1", "Grey").unwrap());
        assert!(parse_toggle("2", "Grey").is_err());
        assert!(parse_toggle("", "Grey").is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("ffffff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("abc").unwrap(), Rgba([0xaa, 0xbb, 0xcc, 255]));
        assert_eq!(parse_hex_color("FF8000").unwrap(), Rgba([255, 128, 0, 255]));
        assert!(parse_hex_color("xyz").is_err());
        assert!(parse_hex_color("ffff").is_err());
        assert!(parse_hex_color("").is_err());
    }

    #[test]
    fn test_default_actions_have_unique_names() {
        let actions = default_actions(None);
        let mut names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
