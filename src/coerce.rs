//! Response coercion — turns free-form model output into a JSON object.
//!
//! Model responses are untrusted input: they may wrap the JSON in fenced
//! code blocks, surround it with prose, omit keys, or be garbage. Every
//! function here degrades to a default instead of erroring; stage-level
//! fallbacks handle the `None` case.

use serde_json::{Map, Value};

/// Strip a fenced code block (with or without a language tag) and return
/// the inner text. Text without fences is returned trimmed as-is.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[fence_start + 3..];
    // Skip the language tag line, if any.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Extract a JSON object from free-form model text.
///
/// Tries, in order: the content of a fenced block, the raw text, and the
/// outermost `{...}` span. Returns `None` when nothing parses as an
/// object — callers substitute their stage default.
pub fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let candidate = strip_fences(text);

    if let Some(obj) = parse_object(candidate) {
        return Some(obj);
    }

    // Prose around the object: scan for the outermost brace span.
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&candidate[start..=end])
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// String field with a default for missing or non-string values.
pub fn str_field(map: &Map<String, Value>, key: &str, default: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Boolean field, `false` when missing or mistyped.
pub fn bool_field(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Bool(true)))
}

/// Array field, empty when missing or mistyped.
pub fn array_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match map.get(key) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Array of strings, skipping non-string elements.
pub fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    array_field(map, key)
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect()
}
