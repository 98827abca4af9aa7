//! Filename resolution from `content-disposition`.
//!
//! Two forms are understood, in this order of precedence:
//!
//! 1. RFC 5987 extended form: `filename*=UTF-8''r%C3%A9sum%C3%A9.pdf`
//! 2. Plain form, quoted or not: `filename="report.pdf"` / `filename=report.pdf`
//!
//! Whatever comes out is percent-decoded and then stripped of characters
//! that are unsafe in a local file name.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};

static EXTENDED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*UTF-8''([^;]+)"#).expect("valid regex")
});

static PLAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*(?:"([^"]*)"|([^;]+))"#).expect("valid regex")
});

const UNSAFE_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Pick the save name for a response.
///
/// Falls back to `fallback` verbatim when the header is absent, has no
/// filename parameter, or names an empty file or a bare run of dots. Raw non-ASCII bytes in the
/// header are read as lossy UTF-8.
pub fn resolve_filename(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| filename_from_disposition(&String::from_utf8_lossy(v.as_bytes())))
        .unwrap_or_else(|| fallback.to_string())
}

/// Extract and sanitize the filename from a raw `content-disposition` value.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let raw = EXTENDED_RE
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .or_else(|| {
            PLAIN_RE
                .captures(value)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().trim())
        })?;

    // A malformed escape sequence is kept literally; `%` is sanitized below.
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    let name = sanitize_filename(&decoded);
    let trimmed = name.trim();
    // "", "." and ".." name a directory, not a file.
    if trimmed.chars().all(|c| c == '.') {
        None
    } else {
        Some(name)
    }
}

/// Replace each of `/ \ ? % * : | " < >` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
