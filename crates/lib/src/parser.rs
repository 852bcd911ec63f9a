//! # Boundary-Marked Response Parsing
//!
//! Every generation prompt asks the model to wrap its answer in named `<tag>` /
//! `</tag>` pairs. This module is the only decoder for that protocol. Lookups
//! never panic: a missing marker is `None`, and a malformed payload is a
//! `ParseError` that callers degrade locally.

use crate::errors::ParseError;
use serde::de::DeserializeOwned;
use tracing::warn;

fn open_marker(tag: &str) -> String {
    format!("<{tag}>")
}

fn close_marker(tag: &str) -> String {
    format!("</{tag}>")
}

/// Returns the text strictly between the first `<tag>` and the first `</tag>` after it.
pub fn extract<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = open_marker(tag);
    let close = close_marker(tag);
    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(&text[start..end])
}

/// Like [`extract`], but trimmed and `None` when the section is blank.
pub fn extract_trimmed<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    extract(text, tag)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Returns every complete `<tag>...</tag>` section in order of appearance.
pub fn extract_all<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let open = open_marker(tag);
    let close = close_marker(tag);
    let mut sections = Vec::new();
    let mut cursor = 0;
    while let Some(found) = text[cursor..].find(&open) {
        let start = cursor + found + open.len();
        match text[start..].find(&close) {
            Some(len) => {
                sections.push(&text[start..start + len]);
                cursor = start + len + close.len();
            }
            None => break,
        }
    }
    sections
}

/// Strips a surrounding markdown code fence (```json ... ```) if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decodes an extracted section as a structured (JSON) payload.
pub fn decode_structured<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let payload = strip_code_fence(text);
    serde_json::from_str(payload).map_err(|e| ParseError {
        raw: text.to_string(),
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })
}

/// Extracts and decodes `<tag>` from `response`, falling back to `T::default()`.
///
/// Used for optional fields where a bad section must not abort the stage.
pub fn decode_section_or_default<T: DeserializeOwned + Default>(response: &str, tag: &str) -> T {
    let Some(section) = extract(response, tag) else {
        warn!(section = tag, "Section missing from response, using default");
        return T::default();
    };
    match decode_structured(section) {
        Ok(value) => value,
        Err(e) => {
            warn!(section = tag, line = e.line, column = e.column, error = %e.message, "Section malformed, using default");
            T::default()
        }
    }
}
