//! Style records
//!
//! A style is a named, persisted action chain. The record's `style` field is
//! the chain string exactly as it would appear in a request, e.g.
//! `"image/resize,w_100,h_100"`; resolving a style re-parses that string and
//! dispatches it like a regular request.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRecord {
    pub id: String,
    pub style: String,
}

static STYLE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn style_name_re() -> &'static Regex {
    STYLE_NAME_RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z_.-]{1,63}$").expect("valid pattern"))
}

/// Style names are restricted identifiers: ASCII alphanumerics, underscore,
/// dot and dash, 1 to 63 characters.
pub fn validate_style_name(name: &str) -> AppResult<()> {
    if style_name_re().is_match(name) {
        Ok(())
    } else {
        Err(AppError::invalid_argument("Invalid style name!"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_style_names() {
        for name in ["style1", "box-100", "a.b_c", "A", &"x".repeat(63)] {
            assert!(validate_style_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_style_names() {
        for name in ["", "a/b", "style name", "style!", &"x".repeat(64)] {
            assert!(
                validate_style_name(name).is_err(),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_record_round_trip() {
        let record: StyleRecord =
            serde_json::from_str(r#"{"id":"box64","style":"image/resize,w_64,h_64"}"#).unwrap();
        assert_eq!(record.id, "box64");
        assert_eq!(record.style, "image/resize,w_64,h_64");
    }
}
