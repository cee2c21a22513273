//! Lenient decoding of model output
//!
//! Models are asked for bare JSON but often wrap it in code fences or add a
//! sentence around it. Decoding escalates through strategies:
//! 1. Strip surrounding code fences and parse strictly
//! 2. Parse the first balanced top-level `{...}` region

use serde::de::DeserializeOwned;

/// Removes a leading ```` ``` ```` / ```` ```json ```` fence and a trailing ```` ``` ````
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Skip an optional language tag such as `json`
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = rest[tag_len..].trim_start();
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text
}

/// Finds the first balanced top-level JSON object in free-form text
///
/// Braces inside JSON strings are ignored. Returns `None` when no `{` has a
/// matching `}`.
pub fn find_json_object(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(&text[start..]) {
            return Some(&text[start..start + end + 1]);
        }
        search_from = start + 1;
    }

    None
}

/// Byte index of the `}` closing the `{` at index 0
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decodes model output into `T`, tolerating fences and surrounding prose
///
/// Returns `None` when no strategy yields a valid `T`.
pub fn parse_lenient<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str(cleaned) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Strict JSON parse failed, scanning for an object");
            serde_json::from_str(find_json_object(cleaned)?).ok()
        }
    }
}
