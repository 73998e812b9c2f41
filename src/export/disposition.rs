//! Suggested filename from a `Content-Disposition` header.
//!
//! The RFC 6266 extended form `filename*=UTF-8''<percent-encoded>` wins when
//! present, since it is the only one that can carry non-ASCII names
//! (`relat%C3%B3rio.pdf`). Otherwise the plain `filename="…"` (quoted or not)
//! is used, and failing both the caller's fallback.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

static RE_FILENAME_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename\*=UTF-8''([^;]+)"#).unwrap());

static RE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)filename="?([^";]+)"?"#).unwrap());

/// Extract the filename, or `None` when the header names none.
pub fn parse_filename(header: &str) -> Option<String> {
    if let Some(caps) = RE_FILENAME_EXT.captures(header) {
        let raw = caps[1].trim();
        if let Ok(decoded) = percent_decode_str(raw).decode_utf8() {
            if !decoded.trim().is_empty() {
                return Some(decoded.into_owned());
            }
        }
    }
    RE_FILENAME
        .captures(header)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Filename from an optional header, falling back to `fallback`.
pub fn filename_from_disposition(header: Option<&str>, fallback: &str) -> String {
    header
        .and_then(parse_filename)
        .unwrap_or_else(|| fallback.to_string())
}
